use crate::decoder::{Decoded, Operation};
use crate::instructions;

pub fn fmt_decoded(d: &Decoded) -> String {
    let mn = instructions::desc(d.op).mnemonic;
    match d.op {
        Operation::Add => format!("{} x{}, x{}, x{}", mn, d.rd, d.rs1, d.rs2),
        Operation::Conjugate => format!("{} x{}, x{}", mn, d.rd, d.rs1),
    }
}

/// Parse `xN` (or plain `N`) as a 5-bit register index.
pub fn parse_reg(s: &str) -> Option<u8> {
    let s = s.trim();
    let n = s.strip_prefix('x').or_else(|| s.strip_prefix('X')).unwrap_or(s);
    let v: u8 = n.parse().ok()?;
    (v < 32).then_some(v)
}
