//! Fixed-point reward-per-share ratio.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConsistencyError;

/// Fixed-point denominator of [`RewardRatio`] (18 decimal places).
pub const RATIO_PRECISION: u128 = 1_000_000_000_000_000_000;

/// Reward emitted per 100 units of pool weight on one day, stored as a
/// fixed-point number with [`RATIO_PRECISION`] as denominator.
///
/// A zero ratio marks an inactive day.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct RewardRatio(pub u128);

impl RewardRatio {
    pub const ZERO: Self = Self(0);

    /// `numerator / denominator`, floored to the fixed-point grid.
    /// Returns [`RewardRatio::ZERO`] when `denominator` is zero.
    pub fn from_fraction(numerator: u64, denominator: u64) -> Result<Self, ConsistencyError> {
        if denominator == 0 {
            return Ok(Self::ZERO);
        }
        let scaled = u128::from(numerator)
            .checked_mul(RATIO_PRECISION)
            .ok_or(ConsistencyError::ArithmeticOverflow)?;
        Ok(Self(scaled / u128::from(denominator)))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// `amount * self`, still scaled by [`RATIO_PRECISION`]. Callers sum
    /// these and truncate once with [`RewardRatio::truncate`].
    pub fn scaled_mul(&self, amount: u64) -> Result<u128, ConsistencyError> {
        u128::from(amount)
            .checked_mul(self.0)
            .ok_or(ConsistencyError::ArithmeticOverflow)
    }

    /// Drop the fixed-point fraction of a scaled value.
    pub fn truncate(scaled: u128) -> u128 {
        scaled / RATIO_PRECISION
    }
}

impl fmt::Display for RewardRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:018}",
            self.0 / RATIO_PRECISION,
            self.0 % RATIO_PRECISION
        )
    }
}
