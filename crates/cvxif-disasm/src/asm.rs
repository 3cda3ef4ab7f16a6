use anyhow::{anyhow, bail, Result};

use cvxif_complex::disasm::parse_reg;
use cvxif_complex::instructions::by_mnemonic;
use cvxif_complex::Instruction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Item {
    Instr(Instruction),
    Word(u32),
}

impl Item {
    pub fn word(self) -> u32 {
        match self {
            Item::Instr(i) => i.0,
            Item::Word(w) => w,
        }
    }
}

fn parse_num(s: &str) -> Option<u32> {
    let t = s.trim();
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        u32::from_str_radix(&hex.replace('_', ""), 16).ok()
    } else {
        t.parse::<u32>().ok()
    }
}

/// Parse one source line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Item>> {
    let line = line.split('#').next().unwrap_or("").trim();
    if line.is_empty() {
        return Ok(None);
    }
    if let Some(rest) = line.strip_prefix(".word") {
        let v = parse_num(rest).ok_or_else(|| anyhow!("bad .word: {}", line))?;
        return Ok(Some(Item::Word(v)));
    }

    let (mn, args) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let desc = by_mnemonic(mn).ok_or_else(|| anyhow!("unknown mnemonic: {}", mn))?;
    let regs: Vec<u8> = args
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_reg(s).ok_or_else(|| anyhow!("bad reg: {}", s.trim())))
        .collect::<Result<_>>()?;
    // rd plus one register per source operand
    if regs.len() != desc.operands + 1 {
        bail!("{} takes {} registers: {}", desc.mnemonic, desc.operands + 1, line);
    }
    let rs2 = regs.get(2).copied().unwrap_or(0);
    Ok(Some(Item::Instr(Instruction::new(desc.op, regs[0], regs[1], rs2))))
}

/// Assemble a whole source file into little-endian bytes.
pub fn assemble(src: &str) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for (n, line) in src.lines().enumerate() {
        let item = parse_line(line).map_err(|e| anyhow!("line {}: {}", n + 1, e))?;
        if let Some(item) = item {
            out.extend_from_slice(&item.word().to_le_bytes());
        }
    }
    Ok(out)
}
