use bitflags::bitflags;
use bitvec::prelude::*;
use serde::{Deserialize, Serialize};

use crate::instructions::{self, CUSTOM_OPCODE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Add,
    Conjugate,
}

impl Operation {
    pub fn operand_count(self) -> usize {
        instructions::desc(self).operands
    }

    /// Register-valid bitmask the register phase has to present.
    pub fn required_mask(self) -> OperandMask {
        match self.operand_count() {
            1 => OperandMask::RS1,
            _ => OperandMask::RS1 | OperandMask::RS2,
        }
    }

    pub fn func3(self) -> u8 {
        instructions::desc(self).func3
    }
}

bitflags! {
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperandMask: u8 {
const RS1 = 0b01;
const RS2 = 0b10;
}
}

/// Raw 32-bit instruction word with R-type field accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instruction(pub u32);

impl Instruction {
    /// Encode a coprocessor instruction (func7 = 0, opcode = 0x7B).
    pub fn new(op: Operation, rd: u8, rs1: u8, rs2: u8) -> Self {
        Self::from_fields(0, rs2, rs1, op.func3(), rd, CUSTOM_OPCODE)
    }

    pub fn from_fields(func7: u8, rs2: u8, rs1: u8, func3: u8, rd: u8, opcode: u8) -> Self {
        let mut word = 0u32;
        {
            let bits = word.view_bits_mut::<Lsb0>();
            bits[0..7].store_le(opcode & 0x7F);
            bits[7..12].store_le(rd & 0x1F);
            bits[12..15].store_le(func3 & 0x7);
            bits[15..20].store_le(rs1 & 0x1F);
            bits[20..25].store_le(rs2 & 0x1F);
            bits[25..32].store_le(func7 & 0x7F);
        }
        Self(word)
    }

    fn field(self, lo: usize, hi: usize) -> u8 {
        self.0.view_bits::<Lsb0>()[lo..hi].load_le::<u8>()
    }

    pub fn opcode(self) -> u8 {
        self.field(0, 7)
    }
    pub fn rd(self) -> u8 {
        self.field(7, 12)
    }
    pub fn func3(self) -> u8 {
        self.field(12, 15)
    }
    pub fn rs1(self) -> u8 {
        self.field(15, 20)
    }
    pub fn rs2(self) -> u8 {
        self.field(20, 25)
    }
    pub fn func7(self) -> u8 {
        self.field(25, 32)
    }
}

impl From<u32> for Instruction {
    fn from(word: u32) -> Self {
        Self(word)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoded {
    pub op: Operation,
    pub mask: OperandMask,
    pub rd: u8,
    pub rs1: u8,
    pub rs2: u8,
}

/// Reason an instruction word is not handled by this coprocessor.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    #[error("opcode {opcode:#04x} is not a coprocessor opcode")]
    Opcode { opcode: u8 },
    #[error("func3 {func3} does not select a complex operation")]
    Func3 { func3: u8 },
}

pub trait Decoder {
    fn decode(&self, word: u32) -> Result<Decoded, Rejected>;
}

/// Decoder for the complex-arithmetic custom opcode.
#[derive(Debug, Clone, Copy)]
pub struct CvxifDecoder {
    opcode: u8,
}

impl CvxifDecoder {
    pub fn new() -> Self {
        Self::with_opcode(CUSTOM_OPCODE)
    }

    pub fn with_opcode(opcode: u8) -> Self {
        Self { opcode: opcode & 0x7F }
    }
}

impl Default for CvxifDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for CvxifDecoder {
    fn decode(&self, word: u32) -> Result<Decoded, Rejected> {
        let instr = Instruction(word);
        let opcode = instr.opcode();
        if opcode != self.opcode {
            return Err(Rejected::Opcode { opcode });
        }
        let func3 = instr.func3();
        let desc = instructions::by_func3(func3).ok_or(Rejected::Func3 { func3 })?;
        Ok(Decoded {
            op: desc.op,
            mask: desc.op.required_mask(),
            rd: instr.rd(),
            rs1: instr.rs1(),
            rs2: instr.rs2(),
        })
    }
}

/// Decode with the default opcode.
pub fn decode(word: u32) -> Result<Decoded, Rejected> {
    CvxifDecoder::new().decode(word)
}
