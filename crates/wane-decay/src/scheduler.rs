//! Day-by-day catch-up of the global state.
//!
//! Every lifecycle operation first brings [`GlobalState::day`] up to the
//! current global day. Each skipped day produces exactly one [`Snapshot`]:
//! on an active day the day's emission is divided over the pool weight,
//! counted into the cumulative emission, and the pool weight then decays by
//! 1%. Inactive days record a zero ratio and leave everything unchanged.
//! The caller stages the returned snapshots; the scheduler never touches
//! storage.

use tracing::{debug, trace};

use wane_core::constants::DAILY_RETENTION_PERCENT;
use wane_core::error::ConsistencyError;
use wane_core::ratio::RewardRatio;
use wane_core::types::{GlobalState, Snapshot};

use crate::schedule::EmissionSchedule;

/// Change to the pool weight applied after catch-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightDelta {
    None,
    /// New principal entering the pool.
    Add(u64),
    /// Weight leaving the pool; the result is floored at zero.
    Remove(u64),
}

/// Decay scheduler over the global state.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    schedule: EmissionSchedule,
}

impl Scheduler {
    pub fn new(schedule: EmissionSchedule) -> Self {
        Self { schedule }
    }

    pub fn schedule(&self) -> &EmissionSchedule {
        &self.schedule
    }

    /// Catch `state` up to `today`, then apply `delta`.
    ///
    /// Returns the snapshots for every processed day in day order. Calling
    /// it again with the same `today` and [`WeightDelta::None`] changes
    /// nothing and returns no snapshots.
    pub fn advance(
        &self,
        state: &mut GlobalState,
        today: u64,
        delta: WeightDelta,
    ) -> Result<Vec<Snapshot>, ConsistencyError> {
        let snapshots = self.catch_up(state, today)?;
        apply_weight_delta(state, delta)?;
        Ok(snapshots)
    }

    /// Process every day in `state.day..today`. A `today` in the past is
    /// ignored; the day never moves backwards.
    pub fn catch_up(
        &self,
        state: &mut GlobalState,
        today: u64,
    ) -> Result<Vec<Snapshot>, ConsistencyError> {
        if state.day >= today {
            return Ok(Vec::new());
        }

        let mut snapshots = Vec::with_capacity((today - state.day).min(4_096) as usize);
        while state.day < today {
            snapshots.push(self.process_day(state)?);
            state.day += 1;
        }

        debug!(
            days = snapshots.len(),
            today,
            pool_weight = state.pool_weight,
            total_reward_emitted = state.total_reward_emitted,
            "global state caught up"
        );
        Ok(snapshots)
    }

    /// Write the snapshot for `state.day` and apply that day's emission.
    fn process_day(&self, state: &mut GlobalState) -> Result<Snapshot, ConsistencyError> {
        let day = state.day;
        let pool_weight = state.pool_weight;

        if !self.schedule.is_active(pool_weight) {
            trace!(day, pool_weight, "inactive day");
            return Ok(Snapshot {
                day,
                pool_weight,
                reward_per_share: RewardRatio::ZERO,
            });
        }

        let emission = state
            .reward_per_day
            .checked_mul(100)
            .ok_or(ConsistencyError::ArithmeticOverflow)?;
        let reward_per_share = RewardRatio::from_fraction(emission, pool_weight)?;

        state.total_reward_emitted = state
            .total_reward_emitted
            .checked_add(state.reward_per_day)
            .ok_or(ConsistencyError::ArithmeticOverflow)?;
        self.schedule.update_reward_rate(state);

        state.pool_weight = retain(pool_weight);
        trace!(day, pool_weight, %reward_per_share, "active day");

        Ok(Snapshot {
            day,
            pool_weight,
            reward_per_share,
        })
    }
}

/// Apply a weight delta; removals floor at zero.
pub fn apply_weight_delta(
    state: &mut GlobalState,
    delta: WeightDelta,
) -> Result<(), ConsistencyError> {
    match delta {
        WeightDelta::None => {}
        WeightDelta::Add(amount) => {
            state.pool_weight = state
                .pool_weight
                .checked_add(amount)
                .ok_or(ConsistencyError::ArithmeticOverflow)?;
        }
        WeightDelta::Remove(amount) => {
            state.pool_weight = state.pool_weight.saturating_sub(amount);
        }
    }
    Ok(())
}

/// One active day of decay: keep [`DAILY_RETENTION_PERCENT`] percent,
/// floored.
pub fn retain(weight: u64) -> u64 {
    (u128::from(weight) * u128::from(DAILY_RETENTION_PERCENT) / 100) as u64
}
