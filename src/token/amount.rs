//! Fixed-point token amounts
//!
//! Amounts are stored as a count of base units (10^-6 of a whole token).
//! Arithmetic is checked: overflow and underflow are errors, never wraparound.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Amount arithmetic and parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Arithmetic overflow combining {lhs} with {rhs}")]
    Overflow { lhs: u128, rhs: u128 },
    #[error("Arithmetic underflow: {lhs} - {rhs}")]
    Underflow { lhs: u128, rhs: u128 },
    #[error("Invalid amount '{0}'")]
    Invalid(String),
    #[error("Too many fractional digits in '{0}': at most {max}", max = Amount::DECIMALS)]
    TooPrecise(String),
}

/// A non-negative quantity of tokens in base units
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u128);

impl Amount {
    /// Number of fractional digits
    pub const DECIMALS: u8 = 6;

    /// Base units per whole token
    pub const UNIT: u128 = 1_000_000;

    pub const ZERO: Amount = Amount(0);
    pub const MAX: Amount = Amount(u128::MAX);

    /// Wrap a raw base-unit count
    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    /// Whole tokens, if representable
    pub fn from_whole(tokens: u128) -> Result<Self, AmountError> {
        tokens
            .checked_mul(Self::UNIT)
            .map(Self)
            .ok_or(AmountError::Overflow {
                lhs: tokens,
                rhs: Self::UNIT,
            })
    }

    /// Raw base-unit count
    pub const fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Amount) -> Result<Amount, AmountError> {
        self.0
            .checked_add(rhs.0)
            .map(Amount)
            .ok_or(AmountError::Overflow {
                lhs: self.0,
                rhs: rhs.0,
            })
    }

    pub fn checked_sub(self, rhs: Amount) -> Result<Amount, AmountError> {
        self.0
            .checked_sub(rhs.0)
            .map(Amount)
            .ok_or(AmountError::Underflow {
                lhs: self.0,
                rhs: rhs.0,
            })
    }

    /// Parse a human-readable amount such as `"1000"` or `"12.345678"`
    pub fn parse_units(text: &str) -> Result<Self, AmountError> {
        let text = text.trim();
        let (whole, frac) = match text.split_once('.') {
            Some((w, f)) => (w, f),
            None => (text, ""),
        };

        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac) {
            return Err(AmountError::Invalid(text.to_string()));
        }
        if frac.len() > Self::DECIMALS as usize {
            return Err(AmountError::TooPrecise(text.to_string()));
        }

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| AmountError::Invalid(text.to_string()))?
        };

        let mut frac_units: u128 = 0;
        if !frac.is_empty() {
            let padded = format!("{:0<width$}", frac, width = Self::DECIMALS as usize);
            frac_units = padded
                .parse()
                .map_err(|_| AmountError::Invalid(text.to_string()))?;
        }

        Self::from_whole(whole)?.checked_add(Amount(frac_units))
    }
}

impl fmt::Display for Amount {
    /// Renders whole tokens with trailing fractional zeros trimmed
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::UNIT;
        let frac = self.0 % Self::UNIT;
        if frac == 0 {
            return write!(f, "{}", whole);
        }

        let digits = format!("{:0width$}", frac, width = Self::DECIMALS as usize);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_units(s)
    }
}

impl From<u128> for Amount {
    fn from(raw: u128) -> Self {
        Self(raw)
    }
}
