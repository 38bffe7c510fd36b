//! Merit - the nonnegative priority that decides how many cycles an item gets
//!
//! The double `value` is canonical. Alongside it we keep a binary
//! decomposition `value ≈ base * 2^offset` with `bits` significant bits so the
//! integrated scheduler can ask for individual bits without touching floats.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, MulAssign};

/// Nonnegative scheduling priority
///
/// Comparisons look at the double value only; the decomposition is an
/// implementation detail for bit-level scheduling.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Merit {
    value: f64,
    base: u64,
    bits: u32,
    offset: u32,
}

impl Merit {
    /// Width of `base`. An f64 has 53 significant bits, so 64 keeps all of them.
    pub const BASE_WIDTH: u32 = u64::BITS;

    /// Create a merit, clamping negative (and NaN) values to zero
    pub fn new(value: f64) -> Self {
        let mut merit = Self::default();
        merit.update_value(value);
        merit
    }

    /// Replace the value and recompute the bit decomposition
    pub fn update_value(&mut self, value: f64) {
        let value = if value.is_nan() || value <= 0.0 {
            0.0
        } else if value.is_infinite() {
            f64::MAX
        } else {
            value
        };

        self.value = value;
        self.bits = significant_bits(value);
        self.offset = self.bits.saturating_sub(Self::BASE_WIDTH);
        self.base = if self.bits == 0 {
            0
        } else {
            // Dividing by a power of two is exact; the result is < 2^64.
            (value / 2f64.powi(self.offset as i32)).floor() as u64
        };
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Number of integer bits (position of the highest set bit + 1)
    pub fn num_bits(&self) -> u32 {
        self.bits
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Is bit `bit_num` of the integer part of the merit set?
    #[inline]
    pub fn bit(&self, bit_num: u32) -> bool {
        bit_num >= self.offset
            && bit_num < self.bits
            && (self.base >> (bit_num - self.offset)) & 1 == 1
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0.0
    }

    /// Merit earned per cycle of gestation; zero for a zero gestation time
    pub fn calc_fitness(&self, gestation_time: u32) -> f64 {
        if gestation_time == 0 {
            0.0
        } else {
            self.value / gestation_time as f64
        }
    }
}

/// frexp-style exponent of `value`, floored at zero
fn significant_bits(value: f64) -> u32 {
    if value < 1.0 {
        return 0;
    }
    let biased = ((value.to_bits() >> 52) & 0x7ff) as u32;
    biased - 1022
}

impl From<f64> for Merit {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Merit> for f64 {
    fn from(merit: Merit) -> Self {
        merit.value
    }
}

impl PartialEq for Merit {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl PartialOrd for Merit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

impl Add for Merit {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.value + rhs.value)
    }
}

impl AddAssign for Merit {
    fn add_assign(&mut self, rhs: Self) {
        self.update_value(self.value + rhs.value);
    }
}

impl Mul<f64> for Merit {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.value * rhs)
    }
}

impl MulAssign<f64> for Merit {
    fn mul_assign(&mut self, rhs: f64) {
        self.update_value(self.value * rhs);
    }
}

impl fmt::Display for Merit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
