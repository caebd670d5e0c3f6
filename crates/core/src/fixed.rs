//! Exact decimal arithmetic
//!
//! `Fixed` wraps a `rust_decimal::Decimal` so that prices, quantities, fees
//! and balances coming from exchanges keep the exact digits they were
//! reported with. Unlike a float, `"0.10"` stays distinguishable from `"0.1"`
//! through `scale()`, which precision inference relies on.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::ops::Neg;
use std::str::FromStr;

/// Largest number of fractional digits a `Decimal` can represent.
pub const MAX_SCALE: u32 = 28;

/// Exact decimal value for financial quantities
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fixed {
    value: Decimal,
}

impl Fixed {
    pub const ZERO: Fixed = Fixed { value: Decimal::ZERO };

    pub const ONE: Fixed = Fixed { value: Decimal::ONE };

    pub fn from_i64(value: i64) -> Self {
        Fixed {
            value: Decimal::from(value),
        }
    }

    /// Parse decimal text exactly as written, keeping its scale.
    pub fn from_str_exact(s: &str) -> Result<Self, FixedError> {
        let decimal = Decimal::from_str(s.trim()).map_err(|_| FixedError::InvalidValue)?;
        Ok(Fixed { value: decimal })
    }

    /// Parse a rendered float, which may use exponent notation (`1.23e-6`).
    pub fn from_float_text(s: &str) -> Result<Self, FixedError> {
        let text = s.trim();
        let decimal = if text.contains(['e', 'E']) {
            Decimal::from_scientific(text)
        } else {
            Decimal::from_str(text)
        };
        Ok(Fixed {
            value: decimal.map_err(|_| FixedError::InvalidValue)?,
        })
    }

    /// `10^(-digits)`: the granularity of a value with `digits` fractional digits.
    pub fn pow10_neg(digits: u32) -> Result<Self, FixedError> {
        if digits > MAX_SCALE {
            return Err(FixedError::ScaleTooLarge(digits));
        }
        Ok(Fixed {
            value: Decimal::new(1, digits),
        })
    }

    /// Number of fractional digits as written, trailing zeros included.
    pub fn scale(&self) -> u32 {
        self.value.scale()
    }

    /// Same value with trailing fractional zeros removed.
    pub fn normalize(&self) -> Self {
        Fixed {
            value: self.value.normalize(),
        }
    }

    /// True for 1, 0.1, 0.01, ... regardless of trailing zeros.
    pub fn is_unit_fraction_of_ten(&self) -> bool {
        let normalized = self.value.normalize();
        normalized.mantissa() == 1
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.value.is_sign_positive() && !self.value.is_zero()
    }

    pub fn checked_add(&self, rhs: Fixed) -> Result<Self, FixedError> {
        let value = self.value.checked_add(rhs.value).ok_or(FixedError::Overflow)?;
        Ok(Fixed { value })
    }

    pub fn checked_sub(&self, rhs: Fixed) -> Result<Self, FixedError> {
        let value = self.value.checked_sub(rhs.value).ok_or(FixedError::Overflow)?;
        Ok(Fixed { value })
    }

    pub fn checked_mul(&self, rhs: Fixed) -> Result<Self, FixedError> {
        let value = self.value.checked_mul(rhs.value).ok_or(FixedError::Overflow)?;
        Ok(Fixed { value })
    }

    pub fn checked_div(&self, rhs: Fixed) -> Result<Self, FixedError> {
        if rhs.is_zero() {
            return Err(FixedError::DivisionByZero);
        }
        let value = self.value.checked_div(rhs.value).ok_or(FixedError::Overflow)?;
        Ok(Fixed { value })
    }

    /// Round down to a multiple of `step` (a lot size or price filter).
    pub fn floor_to_step(&self, step: Fixed) -> Result<Self, FixedError> {
        let steps = self.checked_div(step)?.value.floor();
        let value = steps.checked_mul(step.value).ok_or(FixedError::Overflow)?;
        Ok(Fixed {
            value: value.normalize(),
        })
    }
}

/// Decimal conversion errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FixedError {
    #[error("Invalid decimal value")]
    InvalidValue,
    #[error("Scale {0} exceeds decimal precision")]
    ScaleTooLarge(u32),
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Decimal overflow")]
    Overflow,
}

impl Neg for Fixed {
    type Output = Fixed;

    fn neg(self) -> Self::Output {
        Fixed { value: -self.value }
    }
}

impl Default for Fixed {
    fn default() -> Self {
        Fixed::ZERO
    }
}

impl Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl FromStr for Fixed {
    type Err = FixedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_exact(s)
    }
}

/// Convenience macro for creating Fixed values in tests and constants
#[macro_export]
macro_rules! fixed {
    ($value:expr) => {
        $crate::fixed::Fixed::from_str_exact(stringify!($value)).unwrap()
    };
}
