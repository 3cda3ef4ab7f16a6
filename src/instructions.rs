use crate::decoder::Operation;

/// Major opcode reserved for the complex coprocessor (custom-3 space).
pub const CUSTOM_OPCODE: u8 = 0x7B;

#[derive(Debug, Clone, Copy)]
pub struct InstrDesc {
    pub op: Operation,
    pub mnemonic: &'static str,
    pub func3: u8,
    pub operands: usize,
}

pub const TABLE: &[InstrDesc] = &[
    InstrDesc {
        op: Operation::Add,
        mnemonic: "cx.add",
        func3: 0,
        operands: 2,
    },
    InstrDesc {
        op: Operation::Conjugate,
        mnemonic: "cx.conj",
        func3: 1,
        operands: 1,
    },
];

pub fn desc(op: Operation) -> &'static InstrDesc {
    match op {
        Operation::Add => &TABLE[0],
        Operation::Conjugate => &TABLE[1],
    }
}

pub fn by_func3(func3: u8) -> Option<&'static InstrDesc> {
    TABLE.iter().find(|d| d.func3 == func3)
}

pub fn by_mnemonic(mnemonic: &str) -> Option<&'static InstrDesc> {
    TABLE.iter().find(|d| d.mnemonic.eq_ignore_ascii_case(mnemonic))
}
