use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::alu::ArithmeticUnit;
use crate::complex::Complex16;
use crate::decoder::{CvxifDecoder, Decoded, Decoder, OperandMask};
use crate::instructions::CUSTOM_OPCODE;

/// Decode-side settings. The controller itself is not configurable; the
/// opcode reaches it only through the decoder built by [`Self::decoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoprocessorConfig {
    pub opcode: u8, // major opcode the decoder claims
}

impl Default for CoprocessorConfig {
    fn default() -> Self {
        Self {
            opcode: CUSTOM_OPCODE,
        }
    }
}

impl CoprocessorConfig {
    pub fn decoder(&self) -> CvxifDecoder {
        CvxifDecoder::with_opcode(self.opcode)
    }
}

/// Signals driven by the host for one clock step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Inputs {
    pub reset: bool,
    pub issue_valid: bool,
    pub issue_instruction: u32,
    pub register_valid: bool,
    pub register_operands: [u32; 2], // packed Complex16 words
    pub register_valid_mask: u8,     // [1:0]
    pub result_ready: bool,
}

/// Signals driven by the coprocessor for one clock step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Outputs {
    pub issue_ready: bool,
    pub issue_accept: bool,
    pub issue_writeback: bool,
    pub issue_register_read_mask: u8,
    pub register_ready: bool,
    pub result_valid: bool,
    pub result_data: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum State {
    #[default]
    Idle,
    AwaitOperands,
    Computing,
    AwaitResultAccept,
}

// Phase plus the in-flight transaction record it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    AwaitOperands(Decoded),
    Computing(Decoded, [Complex16; 2]),
    AwaitResultAccept(Decoded, Complex16),
}

impl Phase {
    fn state(&self) -> State {
        match self {
            Phase::Idle => State::Idle,
            Phase::AwaitOperands(_) => State::AwaitOperands,
            Phase::Computing(..) => State::Computing,
            Phase::AwaitResultAccept(..) => State::AwaitResultAccept,
        }
    }
}

/// CVXIF-style adapter around the complex unit. One transaction in flight.
///
/// Which instructions are claimed is decided entirely by the decoder handed
/// to [`Coprocessor::step`].
#[derive(Debug, Clone)]
pub struct Coprocessor {
    phase: Phase,
    cycle: u64,
}

impl Coprocessor {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            cycle: 0,
        }
    }

    /// Abandon any in-flight transaction and return to `Idle`.
    pub fn reset(&mut self) {
        if self.phase != Phase::Idle {
            debug!(cycle = self.cycle, from = ?self.phase.state(), "reset abandons transaction");
        }
        self.phase = Phase::Idle;
    }

    pub fn state(&self) -> State {
        self.phase.state()
    }

    /// Steps taken since construction, reset steps included.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// The instruction currently being served, if any.
    pub fn in_flight(&self) -> Option<Decoded> {
        match self.phase {
            Phase::Idle => None,
            Phase::AwaitOperands(d) | Phase::Computing(d, _) | Phase::AwaitResultAccept(d, _) => {
                Some(d)
            }
        }
    }

    /// Result waiting on the result channel.
    pub fn held_result(&self) -> Option<Complex16> {
        match self.phase {
            Phase::AwaitResultAccept(_, r) => Some(r),
            _ => None,
        }
    }

    /// Advance one clock step. Outputs are the values seen by the host during
    /// this step; the phase change takes effect at the end of it.
    pub fn step<D: Decoder, X: ArithmeticUnit>(
        &mut self,
        inp: &Inputs,
        dec: &D,
        alu: &X,
    ) -> Outputs {
        self.cycle += 1;
        trace!(cycle = self.cycle, state = ?self.state(), ?inp, "step");

        if inp.reset {
            self.reset();
            return Outputs::default();
        }

        let mut out = Outputs::default();
        let next = match self.phase {
            Phase::Idle => {
                out.issue_ready = true;
                if inp.issue_valid {
                    match dec.decode(inp.issue_instruction) {
                        Ok(d) => {
                            out.issue_accept = true;
                            out.issue_writeback = true;
                            out.issue_register_read_mask = d.mask.bits();
                            debug!(cycle = self.cycle, op = ?d.op, rd = d.rd, "issue accepted");
                            Phase::AwaitOperands(d)
                        }
                        Err(why) => {
                            debug!(
                                cycle = self.cycle,
                                instr = inp.issue_instruction,
                                %why,
                                "issue rejected"
                            );
                            Phase::Idle
                        }
                    }
                } else {
                    Phase::Idle
                }
            }
            Phase::AwaitOperands(d) => {
                out.register_ready = true;
                let mask = OperandMask::from_bits_truncate(inp.register_valid_mask);
                if !inp.register_valid {
                    Phase::AwaitOperands(d)
                } else if mask != d.mask {
                    debug!(
                        cycle = self.cycle,
                        got = mask.bits(),
                        want = d.mask.bits(),
                        "operand mask mismatch, still waiting"
                    );
                    Phase::AwaitOperands(d)
                } else {
                    let rs1 = Complex16::unpack(inp.register_operands[0]);
                    let rs2 = if mask.contains(OperandMask::RS2) {
                        Complex16::unpack(inp.register_operands[1])
                    } else {
                        Complex16::default()
                    };
                    debug!(cycle = self.cycle, %rs1, %rs2, "operands captured");
                    Phase::Computing(d, [rs1, rs2])
                }
            }
            Phase::Computing(d, [a, b]) => {
                let b = d.mask.contains(OperandMask::RS2).then_some(b);
                let r = alu.apply(d.op, a, b);
                debug!(cycle = self.cycle, op = ?d.op, result = %r, "result computed");
                Phase::AwaitResultAccept(d, r)
            }
            Phase::AwaitResultAccept(d, r) => {
                out.result_valid = true;
                out.result_data = r.pack();
                if inp.result_ready {
                    debug!(cycle = self.cycle, result = %r, "result delivered");
                    Phase::Idle
                } else {
                    Phase::AwaitResultAccept(d, r)
                }
            }
        };
        self.phase = next;
        out
    }
}

impl Default for Coprocessor {
    fn default() -> Self {
        Self::new()
    }
}
