//! Token amount parsing
//!
//! Chain nodes report token quantities in wire form, e.g. `"1000.0000 KARMA"`.
//! Everything served by the proxy is a [`TokenAmount`] fixed to the configured
//! number of decimal places.

use crate::errors::AmountError;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use std::str::FromStr;

/// Highest precision an EOSIO symbol can carry
pub const MAX_DECIMALS: u32 = 18;

/// Token quantity fixed to a number of decimal places
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenAmount {
    value: Decimal,
    decimals: u32,
}

impl TokenAmount {
    /// Create an amount, rounding `value` to `decimals` places.
    ///
    /// Fails when the rounded value cannot keep `decimals` fractional digits.
    pub fn new(value: Decimal, decimals: u32) -> Result<Self, AmountError> {
        Ok(Self {
            value: fix(value, decimals)?,
            decimals,
        })
    }

    /// Zero at `decimals` places; `decimals` must not exceed [`MAX_DECIMALS`]
    pub fn zero(decimals: u32) -> Self {
        let mut value = Decimal::ZERO;
        value.rescale(decimals);
        Self { value, decimals }
    }

    /// Parse a wire-form amount (`"<number> <symbol>"`).
    ///
    /// Input that does not split on a single space into exactly two parts,
    /// or whose numeric part is not a number, is treated as zero. Only a
    /// quantity too large for the precision is an error.
    pub fn parse(wire: &str, decimals: u32) -> Result<Self, AmountError> {
        let parts: Vec<&str> = wire.split(' ').collect();
        if parts.len() != 2 {
            return Ok(Self::zero(decimals));
        }

        match parse_quantity(parts[0]) {
            Some(value) => Self::new(value, decimals),
            None => Ok(Self::zero(decimals)),
        }
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// Subtract `other` and round the difference back to this amount's precision
    pub fn checked_sub(self, other: TokenAmount) -> Result<TokenAmount, AmountError> {
        let value = self
            .value
            .checked_sub(other.value)
            .ok_or(AmountError::Overflow)?;
        Self::new(value, self.decimals)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

fn parse_quantity(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// Round half away from zero, then pad the scale so that exactly `decimals`
/// fractional digits are rendered.
fn fix(value: Decimal, decimals: u32) -> Result<Decimal, AmountError> {
    let mut fixed = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    // rescale quietly settles for a smaller scale when the mantissa would overflow
    fixed.rescale(decimals);
    if fixed.scale() != decimals {
        return Err(AmountError::Precision {
            value: value.to_string(),
            decimals,
        });
    }
    Ok(fixed)
}
