//! Per-position reward accrual over the snapshot ledger.
//!
//! A position is never touched by the scheduler. Instead, each time its
//! owner acts, the days between `last_reward_day + 1` and the current
//! global day are replayed from the ledger: every active day the position
//! has fully lived through on its own calendar pays
//! `mining_pool * reward_per_share / 100` and shrinks the mining pool by
//! 1%, in lockstep with the global pool.

use wane_core::calendar::{Timestamp, global_day, position_day};
use wane_core::constants::MINING_DUST_FLOOR;
use wane_core::error::{ConsistencyError, PoolError};
use wane_core::pool_state::SnapshotSource;
use wane_core::ratio::RewardRatio;
use wane_core::types::Position;

use crate::scheduler::retain;

/// Outcome of replaying the ledger for one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accrual {
    /// Reward earned since `last_reward_day`, truncated.
    pub reward: u64,
    /// Mining pool after the replayed days.
    pub mining_pool: u64,
    /// New `last_reward_day`.
    pub last_reward_day: u64,
    /// The position's contribution to the global pool weight: the starting
    /// mining pool decayed on every replayed active day, whether or not the
    /// position's own calendar had reached it.
    pub decayed_weight: u64,
}

impl Accrual {
    /// Nothing to replay.
    fn unchanged(position: &Position) -> Self {
        Self {
            reward: 0,
            mining_pool: position.mining_pool,
            last_reward_day: position.last_reward_day,
            decayed_weight: position.mining_pool,
        }
    }

    /// Write the decay and day cursor back. The reward is left to the
    /// caller, which decides whether it is paid out or forfeited.
    pub fn apply_to(&self, position: &mut Position) {
        position.mining_pool = self.mining_pool;
        position.last_reward_day = self.last_reward_day;
    }
}

/// Replay the ledger for `position` as of `now`.
///
/// The ledger must already be caught up to `global_day(now)`.
///
/// # Errors
///
/// - [`ConsistencyError::SnapshotMissing`] if a day in range has no snapshot
/// - [`ConsistencyError::SnapshotMismatch`] if the ledger returns the wrong day
/// - [`ConsistencyError::RewardOverflow`] if the reward exceeds `i64::MAX`
pub fn accrue<L>(position: &Position, now: Timestamp, ledger: &L) -> Result<Accrual, PoolError>
where
    L: SnapshotSource + ?Sized,
{
    let today = global_day(now);
    if position.last_reward_day.saturating_add(1) >= today {
        return Ok(Accrual::unchanged(position));
    }
    let uday = position_day(now, position.created);

    let mut scaled: u128 = 0;
    let mut mining_pool = position.mining_pool;
    let mut decayed_weight = position.mining_pool;

    for day in position.last_reward_day + 1..today {
        let snapshot = ledger
            .snapshot(day)?
            .ok_or(ConsistencyError::SnapshotMissing(day))?;
        if snapshot.day != day {
            return Err(ConsistencyError::SnapshotMismatch {
                expected: day,
                got: snapshot.day,
            }
            .into());
        }
        if !snapshot.is_active() {
            continue;
        }

        if day < uday {
            if mining_pool > MINING_DUST_FLOOR {
                let earned = snapshot
                    .reward_per_share
                    .scaled_mul(mining_pool)
                    .map_err(|_| ConsistencyError::RewardOverflow)?;
                scaled = scaled
                    .checked_add(earned)
                    .ok_or(ConsistencyError::RewardOverflow)?;
            }
            mining_pool = retain(mining_pool);
        }
        decayed_weight = retain(decayed_weight);
    }

    let reward = RewardRatio::truncate(scaled / 100);
    if reward >= i64::MAX as u128 {
        return Err(ConsistencyError::RewardOverflow.into());
    }

    Ok(Accrual {
        reward: reward as u64,
        mining_pool,
        last_reward_day: uday.saturating_sub(1),
        decayed_weight,
    })
}
