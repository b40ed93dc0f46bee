//! Pool state records: the global schedule state, daily snapshots and
//! staking positions.
//!
//! All monetary values are minor units (see [`crate::constants::UNIT`]).
//! Base-asset amounts: `pool_weight`, `staking`, `mining_pool`.
//! Reward-asset amounts: `reward_per_day`, `total_reward_emitted`,
//! `total_reward`. Reserve units: `total_rex`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::account::AccountName;
use crate::calendar::Timestamp;
use crate::ratio::RewardRatio;

/// The single schedule record.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct GlobalState {
    /// Global day up to which snapshots have been written (exclusive).
    pub day: u64,
    /// Aggregate weight sizing the daily reward-per-share ratio.
    pub pool_weight: u64,
    /// Reward emitted on each active day at the current decay round.
    pub reward_per_day: u64,
    /// Everything ever emitted, net of reward returned on redemption.
    pub total_reward_emitted: u64,
    /// `total_reward_emitted / REDUCE_AMOUNT` as of the last rate update.
    pub decay_round: u64,
    /// Whether deposits are accepted.
    pub started: bool,
}

impl GlobalState {
    /// Fresh state for a pool first touched on `day`, emitting
    /// `reward_per_day` until the first reduction round.
    pub fn genesis(day: u64, reward_per_day: u64) -> Self {
        Self {
            day,
            pool_weight: 0,
            reward_per_day,
            total_reward_emitted: 0,
            decay_round: 0,
            started: false,
        }
    }
}

/// One day of the append-only snapshot ledger.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct Snapshot {
    pub day: u64,
    /// Pool weight at the start of the day, before the active-day shrink.
    pub pool_weight: u64,
    /// Zero on inactive days.
    pub reward_per_share: RewardRatio,
}

impl Snapshot {
    pub fn is_active(&self) -> bool {
        !self.reward_per_share.is_zero()
    }
}

/// Composite key of a position: its owner and the owner-scoped sequence id.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
    bincode::Encode, bincode::Decode,
)]
pub struct PositionKey {
    pub owner: AccountName,
    pub id: u64,
}

impl PositionKey {
    pub fn new(owner: AccountName, id: u64) -> Self {
        Self { owner, id }
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.owner, self.id)
    }
}

/// One staking commitment.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct Position {
    pub created: Timestamp,
    /// Principal after the deposit fee.
    pub staking: u64,
    /// Decaying share weight; never exceeds `staking`.
    pub mining_pool: u64,
    /// Reward paid out through harvests; must be returned to redeem with
    /// reward, or be zero to redeem plainly.
    pub total_reward: u64,
    /// Reserve units bought with the principal.
    pub total_rex: u64,
    /// Last global day whose snapshot has been applied.
    pub last_reward_day: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::INIT_DAY_REWARDS;

    #[test]
    fn genesis_state() {
        let s = GlobalState::genesis(19_000, INIT_DAY_REWARDS);
        assert_eq!(s.day, 19_000);
        assert_eq!(s.reward_per_day, INIT_DAY_REWARDS);
        assert_eq!(s.decay_round, 0);
        assert!(!s.started);
    }

    #[test]
    fn snapshot_activity_follows_ratio() {
        let inactive = Snapshot { day: 1, pool_weight: 10, reward_per_share: RewardRatio::ZERO };
        let active = Snapshot { day: 1, pool_weight: 10, reward_per_share: RewardRatio(1) };
        assert!(!inactive.is_active());
        assert!(active.is_active());
    }

    #[test]
    fn position_key_display_and_order() {
        let a = PositionKey::new(AccountName::new("alice").unwrap(), 2);
        let b = PositionKey::new(AccountName::new("alice").unwrap(), 10);
        assert_eq!(a.to_string(), "alice#2");
        assert!(a < b);
    }

    #[test]
    fn position_bincode_round_trip() {
        let p = Position {
            created: 1_700_000_000,
            staking: 99_500,
            mining_pool: 98_505,
            total_reward: 0,
            total_rex: 1_234_567,
            last_reward_day: 19_675,
        };
        let bytes = bincode::encode_to_vec(&p, bincode::config::standard()).unwrap();
        let (back, _): (Position, _) =
            bincode::decode_from_slice(&bytes, bincode::config::standard()).unwrap();
        assert_eq!(back, p);
    }
}
