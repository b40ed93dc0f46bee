//! Emission schedule and reduction rounds.
//!
//! The daily emission starts at
//! [`INIT_DAY_REWARDS`](wane_core::constants::INIT_DAY_REWARDS) (13,000
//! reward tokens) and loses
//! [`REDUCE_PERCENT`](wane_core::constants::REDUCE_PERCENT) (12%) every
//! time the cumulative emission crosses another multiple of
//! [`REDUCE_AMOUNT`](wane_core::constants::REDUCE_AMOUNT) (520,000 tokens).
//!
//! Rounds:
//! - Round 0 (emitted 0–519,999.9999): 13,000.0000 per active day
//! - Round 1: 11,440.0000
//! - Round 2: 10,067.2000
//! - …
//!
//! The rate for a round is always recomputed from the initial emission,
//! never adjusted from the previous rate, so it is a pure function of the
//! round number.

use serde::{Deserialize, Serialize};
use tracing::debug;

use wane_core::constants::{
    ACTIVATION_THRESHOLD, INIT_DAY_REWARDS, REDUCE_AMOUNT, REDUCE_PERCENT,
};
use wane_core::types::GlobalState;

/// Parameters of the emission schedule.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct EmissionSchedule {
    /// Daily emission in round 0.
    pub init_day_rewards: u64,
    /// Cumulative emission per reduction round.
    pub reduce_amount: u64,
    /// Percentage removed per round.
    pub reduce_percent: u64,
    /// Minimum `pool_weight / 100` for a day to be active.
    pub activation_threshold: u64,
}

impl Default for EmissionSchedule {
    fn default() -> Self {
        Self {
            init_day_rewards: INIT_DAY_REWARDS,
            reduce_amount: REDUCE_AMOUNT,
            reduce_percent: REDUCE_PERCENT,
            activation_threshold: ACTIVATION_THRESHOLD,
        }
    }
}

impl EmissionSchedule {
    /// Reduction round reached after emitting `total_emitted`.
    pub fn decay_round(&self, total_emitted: u64) -> u64 {
        if self.reduce_amount == 0 {
            return 0;
        }
        total_emitted / self.reduce_amount
    }

    /// Daily emission in `round`: the initial emission reduced by
    /// `reduce_percent` (floored) `round` times. Bottoms out once the
    /// floored cut is zero.
    pub fn reward_for_round(&self, round: u64) -> u64 {
        let mut reward = u128::from(self.init_day_rewards);
        let percent = u128::from(self.reduce_percent.min(100));
        for _ in 0..round {
            let cut = reward * percent / 100;
            if cut == 0 {
                break;
            }
            reward -= cut;
        }
        reward as u64
    }

    /// Bring `state.reward_per_day` in line with `state.total_reward_emitted`.
    ///
    /// Does nothing while the round is unchanged. Returns whether the rate
    /// was recomputed.
    pub fn update_reward_rate(&self, state: &mut GlobalState) -> bool {
        let round = self.decay_round(state.total_reward_emitted);
        if round == state.decay_round {
            return false;
        }
        let previous = state.reward_per_day;
        state.decay_round = round;
        state.reward_per_day = self.reward_for_round(round);
        debug!(
            round,
            previous,
            reward_per_day = state.reward_per_day,
            "emission rate recomputed"
        );
        true
    }

    /// Whether a day with this pool weight emits.
    pub fn is_active(&self, pool_weight: u64) -> bool {
        pool_weight > 0 && pool_weight / 100 >= self.activation_threshold
    }

    /// Cumulative emission at which the next reduction happens.
    ///
    /// Returns `None` once further rounds no longer change the rate or the
    /// threshold overflows.
    pub fn next_reduction_at(&self, total_emitted: u64) -> Option<u64> {
        if self.reduce_amount == 0 {
            return None;
        }
        let round = self.decay_round(total_emitted);
        if self.reward_for_round(round + 1) == self.reward_for_round(round) {
            return None;
        }
        (round + 1).checked_mul(self.reduce_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use wane_core::constants::UNIT;

    fn schedule() -> EmissionSchedule {
        EmissionSchedule::default()
    }

    // ------------------------------------------------------------------
    // decay_round
    // ------------------------------------------------------------------

    #[test]
    fn round_zero_before_first_reduction() {
        assert_eq!(schedule().decay_round(0), 0);
        assert_eq!(schedule().decay_round(REDUCE_AMOUNT - 1), 0);
    }

    #[test]
    fn round_increments_at_multiples() {
        assert_eq!(schedule().decay_round(REDUCE_AMOUNT), 1);
        assert_eq!(schedule().decay_round(3 * REDUCE_AMOUNT + 5), 3);
    }

    #[test]
    fn zero_reduce_amount_never_reduces() {
        let s = EmissionSchedule { reduce_amount: 0, ..schedule() };
        assert_eq!(s.decay_round(u64::MAX), 0);
        assert_eq!(s.next_reduction_at(0), None);
    }

    // ------------------------------------------------------------------
    // reward_for_round
    // ------------------------------------------------------------------

    #[test]
    fn round_zero_is_initial() {
        assert_eq!(schedule().reward_for_round(0), INIT_DAY_REWARDS);
    }

    #[test]
    fn round_one_drops_twelve_percent() {
        assert_eq!(schedule().reward_for_round(1), 11_440 * UNIT);
    }

    #[test]
    fn round_two_compounds() {
        assert_eq!(schedule().reward_for_round(2), 100_672_000);
    }

    #[test]
    fn rate_strictly_decreasing_in_early_rounds() {
        let s = schedule();
        let mut prev = s.reward_for_round(0);
        for round in 1..=50 {
            let r = s.reward_for_round(round);
            assert!(r < prev, "round {round}: {r} not below {prev}");
            prev = r;
        }
    }

    #[test]
    fn rate_bottoms_out() {
        // 8 * 12 / 100 floors to zero, so the rate stops falling at 8.
        let s = schedule();
        assert_eq!(s.reward_for_round(10_000), 8);
        assert_eq!(s.reward_for_round(u64::MAX), 8);
        assert_eq!(s.next_reduction_at(10_000 * REDUCE_AMOUNT), None);
    }

    // ------------------------------------------------------------------
    // update_reward_rate
    // ------------------------------------------------------------------

    #[test]
    fn update_is_noop_within_round() {
        let mut state = GlobalState::genesis(1, INIT_DAY_REWARDS);
        state.total_reward_emitted = REDUCE_AMOUNT - 1;
        assert!(!schedule().update_reward_rate(&mut state));
        assert_eq!(state.reward_per_day, INIT_DAY_REWARDS);
        assert_eq!(state.decay_round, 0);
    }

    #[test]
    fn update_recomputes_on_round_change() {
        let mut state = GlobalState::genesis(1, INIT_DAY_REWARDS);
        state.total_reward_emitted = 2 * REDUCE_AMOUNT;
        assert!(schedule().update_reward_rate(&mut state));
        assert_eq!(state.decay_round, 2);
        assert_eq!(state.reward_per_day, schedule().reward_for_round(2));
    }

    #[test]
    fn update_moves_back_when_emission_is_returned() {
        let s = schedule();
        let mut state = GlobalState::genesis(1, INIT_DAY_REWARDS);
        state.total_reward_emitted = REDUCE_AMOUNT;
        s.update_reward_rate(&mut state);
        state.total_reward_emitted = REDUCE_AMOUNT - 10;
        assert!(s.update_reward_rate(&mut state));
        assert_eq!(state.decay_round, 0);
        assert_eq!(state.reward_per_day, INIT_DAY_REWARDS);
    }

    // ------------------------------------------------------------------
    // is_active / next_reduction_at
    // ------------------------------------------------------------------

    #[test]
    fn activation_threshold_boundary() {
        let s = schedule();
        assert!(s.is_active(ACTIVATION_THRESHOLD * 100));
        assert!(!s.is_active(ACTIVATION_THRESHOLD * 100 - 1));
        assert!(!s.is_active(0));
    }

    #[test]
    fn zero_threshold_still_needs_weight() {
        let s = EmissionSchedule { activation_threshold: 0, ..schedule() };
        assert!(!s.is_active(0));
        assert!(s.is_active(1));
    }

    #[test]
    fn next_reduction_points_to_next_multiple() {
        assert_eq!(schedule().next_reduction_at(0), Some(REDUCE_AMOUNT));
        assert_eq!(
            schedule().next_reduction_at(REDUCE_AMOUNT),
            Some(2 * REDUCE_AMOUNT)
        );
    }

    proptest! {
        #[test]
        fn rate_is_pure_in_round(round in 0u64..500) {
            let s = schedule();
            prop_assert_eq!(s.reward_for_round(round), s.reward_for_round(round));
        }

        #[test]
        fn rate_never_exceeds_initial(round in 0u64..500) {
            prop_assert!(schedule().reward_for_round(round) <= INIT_DAY_REWARDS);
        }

        #[test]
        fn update_is_idempotent(total in 0u64..u64::MAX / 2) {
            let s = schedule();
            let mut state = GlobalState::genesis(1, INIT_DAY_REWARDS);
            state.total_reward_emitted = total;
            s.update_reward_rate(&mut state);
            let once = state.clone();
            prop_assert!(!s.update_reward_rate(&mut state));
            prop_assert_eq!(state, once);
        }
    }
}
