//! Host-side model of the three-phase handshake.
//!
//! [`Host`] plays the processor: it offers an instruction on the issue
//! channel, feeds the operand registers once the coprocessor accepts, then
//! collects the result under whatever backpressure the caller supplies. While
//! doing so it checks the properties the coprocessor must keep, most notably
//! that a held result never changes while `result_ready` is withheld.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::alu::ArithmeticUnit;
use crate::complex::Complex16;
use crate::coprocessor::{Coprocessor, Inputs, Outputs, State};
use crate::decoder::{Decoder, OperandMask};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Steps the host waits in one phase before giving up.
    pub max_phase_cycles: u32,
    /// Reset is held for this many steps by [`Host::reset`].
    pub reset_cycles: u32,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            max_phase_cycles: 1024,
            reset_cycles: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostPhase {
    Issue,
    Register,
    Result,
}

impl fmt::Display for HostPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HostPhase::Issue => "issue",
            HostPhase::Register => "register",
            HostPhase::Result => "result",
        })
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("{phase} phase did not complete within {cycles} cycles")]
    Stalled { phase: HostPhase, cycles: u32 },
    #[error("held result changed under backpressure: {before:#010x} -> {after:#010x}")]
    ResultChanged { before: u32, after: u32 },
    #[error(
        "instruction {instr:#010x} accepted with writeback={writeback}, register mask {mask:#04b} (expected {expected:#04b})"
    )]
    BadIssueResponse {
        instr: u32,
        writeback: bool,
        mask: u8,
        expected: u8,
    },
    #[error("instruction needs {needed} operands, {given} supplied")]
    MissingOperands { needed: usize, given: usize },
}

/// How a transaction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Completion {
    /// `issue_accept` was low; no register or result phase took place.
    Rejected,
    Completed { result: Complex16, cycles: u64 },
}

impl Completion {
    pub fn result(&self) -> Option<Complex16> {
        match self {
            Completion::Rejected => None,
            Completion::Completed { result, .. } => Some(*result),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TraceStep {
    pub cycle: u64,
    pub state: State, // state at the start of the step
    pub inputs: Inputs,
    pub outputs: Outputs,
}

/// Watches the result channel step by step.
///
/// Once `result_valid` is seen, `result_data` must stay put until the step
/// that also carries `result_ready`; that step yields the delivered value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultMonitor {
    held: Option<u32>,
}

impl ResultMonitor {
    pub fn observe(
        &mut self,
        inputs: &Inputs,
        out: &Outputs,
    ) -> Result<Option<Complex16>, HostError> {
        if !out.result_valid {
            return Ok(None);
        }
        match self.held {
            Some(before) if before != out.result_data => {
                return Err(HostError::ResultChanged {
                    before,
                    after: out.result_data,
                });
            }
            _ => self.held = Some(out.result_data),
        }
        if inputs.result_ready {
            self.held = None;
            return Ok(Some(Complex16::unpack(out.result_data)));
        }
        Ok(None)
    }
}

pub struct Host<D: Decoder, X: ArithmeticUnit> {
    pub cop: Coprocessor,
    dec: D,
    alu: X,
    cfg: HostConfig,
    record: bool,
    trace: Vec<TraceStep>,
}

impl<D: Decoder, X: ArithmeticUnit> Host<D, X> {
    pub fn new(cop: Coprocessor, dec: D, alu: X, cfg: HostConfig) -> Self {
        Self {
            cop,
            dec,
            alu,
            cfg,
            record: false,
            trace: Vec::new(),
        }
    }

    /// Keep a per-step trace of the most recent transaction.
    pub fn with_trace(mut self, record: bool) -> Self {
        self.record = record;
        self
    }

    pub fn trace(&self) -> &[TraceStep] {
        &self.trace
    }

    /// Drive one step and record it.
    pub fn clock(&mut self, inputs: Inputs) -> Outputs {
        let state = self.cop.state();
        let outputs = self.cop.step(&inputs, &self.dec, &self.alu);
        if self.record {
            self.trace.push(TraceStep {
                cycle: self.cop.cycle(),
                state,
                inputs,
                outputs,
            });
        }
        outputs
    }

    /// Hold reset for the configured number of steps, then release it.
    pub fn reset(&mut self) {
        let inputs = Inputs {
            reset: true,
            ..Inputs::default()
        };
        for _ in 0..self.cfg.reset_cycles.max(1) {
            self.clock(inputs);
        }
    }

    /// Run `instr` through issue, register and result phases.
    ///
    /// `ready` is sampled once per result-phase step to drive `result_ready`,
    /// which lets callers inject arbitrary backpressure.
    pub fn execute<R>(
        &mut self,
        instr: u32,
        operands: &[Complex16],
        mut ready: R,
    ) -> Result<Completion, HostError>
    where
        R: FnMut() -> bool,
    {
        self.trace.clear();
        let start = self.cop.cycle();

        // Issue
        let issue = Inputs {
            issue_valid: true,
            issue_instruction: instr,
            ..Inputs::default()
        };
        let resp = self.wait(HostPhase::Issue, issue, |o| o.issue_ready)?;
        if !resp.issue_accept {
            debug!(instr, "not handled by coprocessor");
            return Ok(Completion::Rejected);
        }
        // The mask must name exactly the registers the host was handed.
        let expected = if operands.len() > 1 {
            OperandMask::RS1 | OperandMask::RS2
        } else {
            OperandMask::RS1
        };
        let bad = |mask: u8| HostError::BadIssueResponse {
            instr,
            writeback: resp.issue_writeback,
            mask,
            expected: expected.bits(),
        };
        let raw = resp.issue_register_read_mask;
        let mask = OperandMask::from_bits(raw)
            .filter(|m| resp.issue_writeback && m.contains(OperandMask::RS1))
            .ok_or_else(|| bad(raw))?;
        let needed = mask.bits().count_ones() as usize;
        if operands.len() < needed {
            return Err(HostError::MissingOperands {
                needed,
                given: operands.len(),
            });
        }
        if mask != expected {
            return Err(bad(raw));
        }

        // Register
        let mut words = [0u32; 2];
        for (w, c) in words.iter_mut().zip(operands.iter().take(needed)) {
            *w = c.pack();
        }
        let regs = Inputs {
            register_valid: true,
            register_operands: words,
            register_valid_mask: mask.bits(),
            ..Inputs::default()
        };
        self.wait(HostPhase::Register, regs, |o| o.register_ready)?;

        // Result
        let mut monitor = ResultMonitor::default();
        let mut cycles = 0u32;
        loop {
            let inputs = Inputs {
                result_ready: ready(),
                ..Inputs::default()
            };
            let out = self.clock(inputs);
            if let Some(result) = monitor.observe(&inputs, &out)? {
                return Ok(Completion::Completed {
                    result,
                    cycles: self.cop.cycle() - start,
                });
            }
            cycles += 1;
            if cycles >= self.cfg.max_phase_cycles {
                return Err(HostError::Stalled {
                    phase: HostPhase::Result,
                    cycles,
                });
            }
        }
    }

    // Hold `inputs` until `done` sees the handshake complete.
    fn wait<F>(&mut self, phase: HostPhase, inputs: Inputs, done: F) -> Result<Outputs, HostError>
    where
        F: Fn(&Outputs) -> bool,
    {
        for _ in 0..self.cfg.max_phase_cycles {
            let out = self.clock(inputs);
            if done(&out) {
                return Ok(out);
            }
        }
        Err(HostError::Stalled {
            phase,
            cycles: self.cfg.max_phase_cycles,
        })
    }
}
