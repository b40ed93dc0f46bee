//! Simulated yield reserve.
//!
//! [`ReserveMarket`] keeps the pooled totals of a reserve in memory and
//! settles the conversions a committed operation asked for. Hosts that talk
//! to a real reserve implement [`YieldReserve`] themselves.

use serde::{Deserialize, Serialize};
use tracing::debug;

use wane_core::effects::{Effect, Effects};
use wane_core::error::{ConsistencyError, PoolError};
use wane_core::reserve::{ReserveRates, YieldReserve};

/// In-memory reserve with a pooled exchange rate.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReserveMarket {
    rates: ReserveRates,
}

impl ReserveMarket {
    pub fn new(rates: ReserveRates) -> Self {
        Self { rates }
    }

    /// Credit interest: the lendable balance grows while units stay put,
    /// so every outstanding unit is worth more.
    pub fn accrue_income(&mut self, income: u64) -> Result<(), ConsistencyError> {
        self.rates.total_lendable = self
            .rates
            .total_lendable
            .checked_add(income)
            .ok_or(ConsistencyError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Settle every reserve conversion in `effects`, in order. Either all of
    /// them apply or, on overflow, none do.
    pub fn settle(&mut self, effects: &Effects) -> Result<(), ConsistencyError> {
        let mut rates = self.rates;
        for effect in effects.iter() {
            match effect {
                Effect::BuyReserve { payment, units } => {
                    rates.total_lendable = rates
                        .total_lendable
                        .checked_add(payment.amount)
                        .ok_or(ConsistencyError::ArithmeticOverflow)?;
                    rates.total_units = rates
                        .total_units
                        .checked_add(units.amount)
                        .ok_or(ConsistencyError::ArithmeticOverflow)?;
                }
                Effect::SellReserve { units, proceeds } => {
                    rates.total_lendable = rates
                        .total_lendable
                        .checked_sub(proceeds.amount)
                        .ok_or(ConsistencyError::ArithmeticOverflow)?;
                    rates.total_units = rates
                        .total_units
                        .checked_sub(units.amount)
                        .ok_or(ConsistencyError::ArithmeticOverflow)?;
                }
                Effect::Transfer(_) => {}
            }
        }
        self.rates = rates;
        debug!(
            total_lendable = rates.total_lendable,
            total_units = rates.total_units,
            "reserve settled"
        );
        Ok(())
    }
}

impl YieldReserve for ReserveMarket {
    fn rates(&self) -> Result<ReserveRates, PoolError> {
        Ok(self.rates)
    }
}
