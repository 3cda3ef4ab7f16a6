pub mod alu;
pub mod complex;
pub mod coprocessor;
pub mod decoder;
pub mod disasm;
pub mod host;
pub mod instructions;

pub use alu::{ArithmeticUnit, ComplexAlu};
pub use complex::{wrap, Complex16};
pub use coprocessor::{Coprocessor, CoprocessorConfig, Inputs, Outputs, State};
pub use decoder::{CvxifDecoder, Decoded, Decoder, Instruction, OperandMask, Operation, Rejected};
pub use host::{Completion, Host, HostConfig, HostError};
