//! Amounts with an explicit denomination.
//!
//! Amounts are integer minor units; a [`Denomination`] names the asset and
//! how many of those units make up one whole token. The pool never mixes
//! denominations, so arithmetic happens on raw `u64` amounts and an
//! [`Asset`] is only built at the boundary (inbound quantities, outbound
//! transfers).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    ASSET_PRECISION, BASE_SYMBOL, MAX_ASSET_AMOUNT, RESERVE_SYMBOL, REWARD_SYMBOL,
};
use crate::error::ValidationError;

/// Asset symbol plus decimal precision.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash,
    bincode::Encode, bincode::Decode,
)]
pub struct Denomination {
    pub symbol: String,
    pub precision: u8,
}

impl Denomination {
    pub fn new(symbol: impl Into<String>, precision: u8) -> Self {
        Self {
            symbol: symbol.into(),
            precision,
        }
    }

    /// The staked asset.
    pub fn base() -> Self {
        Self::new(BASE_SYMBOL, ASSET_PRECISION)
    }

    /// The emitted reward asset.
    pub fn reward() -> Self {
        Self::new(REWARD_SYMBOL, ASSET_PRECISION)
    }

    /// Units of the external yield reserve.
    pub fn reserve() -> Self {
        Self::new(RESERVE_SYMBOL, ASSET_PRECISION)
    }

    /// Build an asset of this denomination.
    pub fn amount(&self, amount: u64) -> Asset {
        Asset {
            amount,
            denomination: self.clone(),
        }
    }
}

impl fmt::Display for Denomination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision, self.symbol)
    }
}

/// A quantity of one denomination, in minor units.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash,
    bincode::Encode, bincode::Decode,
)]
pub struct Asset {
    pub amount: u64,
    pub denomination: Denomination,
}

impl Asset {
    /// Whether the amount fits the representable range.
    pub fn is_valid(&self) -> bool {
        self.amount <= MAX_ASSET_AMOUNT && self.denomination.precision <= 18
    }

    /// Check that this asset has the `expected` denomination and a
    /// representable, positive amount.
    pub fn require(&self, expected: &Denomination) -> Result<u64, ValidationError> {
        if &self.denomination != expected {
            return Err(ValidationError::WrongDenomination {
                expected: expected.to_string(),
                got: self.denomination.to_string(),
            });
        }
        if !self.is_valid() {
            return Err(ValidationError::InvalidQuantity(self.to_string()));
        }
        if self.amount == 0 {
            return Err(ValidationError::NonPositiveAmount);
        }
        Ok(self.amount)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = u32::from(self.denomination.precision);
        if precision == 0 {
            return write!(f, "{} {}", self.amount, self.denomination.symbol);
        }
        let scale = 10u128.pow(precision);
        let amount = u128::from(self.amount);
        write!(
            f,
            "{}.{:0width$} {}",
            amount / scale,
            amount % scale,
            self.denomination.symbol,
            width = precision as usize
        )
    }
}

/// Parses `"12.3456 EOS"`; the precision is the number of fractional digits.
impl FromStr for Asset {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidQuantity(s.to_string());

        let (number, symbol) = s.trim().split_once(' ').ok_or_else(invalid)?;
        if symbol.is_empty()
            || symbol.len() > 7
            || !symbol.bytes().all(|b| b.is_ascii_uppercase())
        {
            return Err(invalid());
        }

        let (whole, fraction) = match number.split_once('.') {
            Some((w, f)) if !f.is_empty() => (w, f),
            Some(_) => return Err(invalid()),
            None => (number, ""),
        };
        if whole.is_empty()
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
            || fraction.len() > 18
        {
            return Err(invalid());
        }

        let precision = fraction.len() as u8;
        let scale = 10u128.pow(u32::from(precision));
        let whole: u128 = whole.parse().map_err(|_| invalid())?;
        let fraction: u128 = if fraction.is_empty() {
            0
        } else {
            fraction.parse().map_err(|_| invalid())?
        };
        let amount = whole
            .checked_mul(scale)
            .and_then(|v| v.checked_add(fraction))
            .filter(|v| *v <= u128::from(MAX_ASSET_AMOUNT))
            .ok_or_else(invalid)?;

        Ok(Asset {
            amount: amount as u64,
            denomination: Denomination::new(symbol, precision),
        })
    }
}
