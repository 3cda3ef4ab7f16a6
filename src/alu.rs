use num_traits::{WrappingAdd, Zero};

use crate::complex::Complex16;
use crate::decoder::Operation;

pub trait ArithmeticUnit {
    fn apply(&self, op: Operation, a: Complex16, b: Option<Complex16>) -> Complex16;
}

/// Combinational complex unit: add and conjugate with 16-bit wraparound.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplexAlu;

impl ArithmeticUnit for ComplexAlu {
    fn apply(&self, op: Operation, a: Complex16, b: Option<Complex16>) -> Complex16 {
        match op {
            // An unused source reads as zero on the register bus.
            Operation::Add => a.wrapping_add(&b.unwrap_or_else(Complex16::zero)),
            Operation::Conjugate => a.conj(),
        }
    }
}

/// Evaluate `op` with the default unit.
pub fn apply(op: Operation, a: Complex16, b: Option<Complex16>) -> Complex16 {
    ComplexAlu.apply(op, a, b)
}
