use std::fmt;
use std::ops::Add;

use num_traits::{WrappingAdd, Zero};
use serde::{Deserialize, Serialize};

const MODULUS: i32 = 1 << 16;

/// Fold an integer back into the signed 16-bit range by adding or
/// subtracting the modulus. One correction is enough for any sum or
/// negation of in-range values; the loops make it total anyway.
pub fn wrap(mut x: i32) -> i16 {
    while x < i16::MIN as i32 {
        x += MODULUS;
    }
    while x > i16::MAX as i32 {
        x -= MODULUS;
    }
    x as i16
}

/// Complex number with 16-bit two's-complement parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Complex16 {
    pub re: i16,
    pub im: i16,
}

impl Complex16 {
    pub const fn new(re: i16, im: i16) -> Self {
        Self { re, im }
    }

    /// Wire form: real part in bits [15:0], imaginary part in bits [31:16].
    pub fn pack(self) -> u32 {
        ((self.im as u16 as u32) << 16) | (self.re as u16 as u32)
    }

    pub fn unpack(word: u32) -> Self {
        Self {
            re: (word & 0xFFFF) as u16 as i16,
            im: (word >> 16) as u16 as i16,
        }
    }

    pub fn conj(self) -> Self {
        Self {
            re: self.re,
            im: wrap(-(self.im as i32)),
        }
    }
}

impl From<u32> for Complex16 {
    fn from(word: u32) -> Self {
        Self::unpack(word)
    }
}

impl From<Complex16> for u32 {
    fn from(c: Complex16) -> Self {
        c.pack()
    }
}

impl From<(i16, i16)> for Complex16 {
    fn from((re, im): (i16, i16)) -> Self {
        Self { re, im }
    }
}

// Addition wraps per part, matching the register width.
impl Add for Complex16 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            re: wrap(self.re as i32 + rhs.re as i32),
            im: wrap(self.im as i32 + rhs.im as i32),
        }
    }
}

impl WrappingAdd for Complex16 {
    fn wrapping_add(&self, v: &Self) -> Self {
        *self + *v
    }
}

impl Zero for Complex16 {
    fn zero() -> Self {
        Self::new(0, 0)
    }

    fn is_zero(&self) -> bool {
        self.re == 0 && self.im == 0
    }
}

impl fmt::Display for Complex16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.re, self.im)
    }
}
