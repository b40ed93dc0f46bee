//! The external yield reserve seen from the pool.
//!
//! The reserve converts base asset into reserve units and back at a pooled
//! exchange rate. The pool never moves funds itself: it prices a conversion
//! from the current [`ReserveRates`] and emits the matching effect.

use serde::{Deserialize, Serialize};

use crate::error::{ConsistencyError, PoolError};

/// Pooled totals that define the exchange rate.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReserveRates {
    /// Base asset held by the reserve, in minor units.
    pub total_lendable: u64,
    /// Reserve units outstanding.
    pub total_units: u64,
}

impl ReserveRates {
    /// Units received for depositing `deposit` base asset:
    /// `floor(units * (lendable + deposit) / lendable) - units`.
    pub fn buy_units(&self, deposit: u64) -> Result<u64, ConsistencyError> {
        if self.total_lendable == 0 {
            return Err(ConsistencyError::ReserveConversion(
                "reserve has no lendable balance".into(),
            ));
        }
        let lendable = u128::from(self.total_lendable);
        let units = u128::from(self.total_units);
        let after = units
            .checked_mul(lendable + u128::from(deposit))
            .ok_or(ConsistencyError::ArithmeticOverflow)?
            / lendable;
        let received = after - units;
        if received == 0 {
            return Err(ConsistencyError::ReserveConversion(format!(
                "buying with {deposit} yields no units"
            )));
        }
        u64::try_from(received).map_err(|_| ConsistencyError::ArithmeticOverflow)
    }

    /// Base asset received for selling `units`:
    /// `floor(units * lendable / total_units)`.
    pub fn sell_proceeds(&self, units: u64) -> Result<u64, ConsistencyError> {
        if self.total_units == 0 {
            return Err(ConsistencyError::ReserveConversion(
                "reserve has no units outstanding".into(),
            ));
        }
        let proceeds = u128::from(units)
            .checked_mul(u128::from(self.total_lendable))
            .ok_or(ConsistencyError::ArithmeticOverflow)?
            / u128::from(self.total_units);
        if proceeds == 0 {
            return Err(ConsistencyError::ReserveConversion(format!(
                "selling {units} units yields nothing"
            )));
        }
        u64::try_from(proceeds).map_err(|_| ConsistencyError::ArithmeticOverflow)
    }
}

/// Read access to the yield reserve's current rates.
pub trait YieldReserve {
    fn rates(&self) -> Result<ReserveRates, PoolError>;
}
