//! Multi-day lifecycle scenarios across the scheduler, the ledger and
//! positions.

use wane_core::constants::{INIT_DAY_REWARDS, UNIT};
use wane_core::error::{PoolError, PreconditionError};
use wane_core::pool_state::{PoolStore, SnapshotSource};
use wane_core::types::PositionKey;
use wane_pool::{PoolConfig, ReserveMarket};
use wane_tests::helpers::*;

fn key(user: &str, id: u64) -> PositionKey {
    PositionKey::new(name(user), id)
}

// ---------------------------------------------------------------------------
// Sharing the emission
// ---------------------------------------------------------------------------

#[test]
fn emission_split_by_weight() {
    let mut pool = started_memory_pool(PoolConfig::default());
    stake(&mut pool, "alice", 600_000 * UNIT, at(START_DAY)).unwrap();
    stake(&mut pool, "bob", 200_000 * UNIT, at(START_DAY)).unwrap();

    let alice = harvest(&mut pool, "alice", 0, at(START_DAY + 3)).unwrap();
    let bob = harvest(&mut pool, "bob", 0, at(START_DAY + 3)).unwrap();

    // Principal is 3:1 after fees and both decay in lockstep.
    assert!(bob > 0);
    assert!(alice >= 3 * bob && alice <= 3 * bob + 3, "alice {alice}, bob {bob}");

    let state = pool.global_state(at(START_DAY + 3)).unwrap();
    assert_eq!(state.total_reward_emitted, 3 * INIT_DAY_REWARDS);
    assert!(alice + bob <= state.total_reward_emitted);
    assert!(alice + bob + 10 >= state.total_reward_emitted);
}

#[test]
fn late_depositor_earns_only_from_its_first_day() {
    let mut pool = started_memory_pool(PoolConfig::default());
    stake(&mut pool, "alice", 1_000_000 * UNIT, at(START_DAY)).unwrap();
    stake(&mut pool, "bob", 1_000_000 * UNIT, at(START_DAY + 2)).unwrap();

    let alice = harvest(&mut pool, "alice", 0, at(START_DAY + 4)).unwrap();
    let bob = harvest(&mut pool, "bob", 0, at(START_DAY + 4)).unwrap();

    // Alice alone for two days, then a little under half of two more since
    // her weight has already decayed twice.
    assert!(alice > 2 * INIT_DAY_REWARDS + INIT_DAY_REWARDS * 9 / 10);
    assert!(bob > INIT_DAY_REWARDS && bob < INIT_DAY_REWARDS * 11 / 10);
    assert!(alice + bob <= 4 * INIT_DAY_REWARDS);
    assert!(alice + bob + 10 >= 4 * INIT_DAY_REWARDS);

    let bob_position = pool.position(&key("bob", 0)).unwrap().unwrap();
    assert_eq!(bob_position.last_reward_day, START_DAY + 3);
    assert_eq!(bob_position.total_reward, bob);
}

#[test]
fn small_pool_stays_inactive_until_threshold() {
    let mut pool = started_memory_pool(PoolConfig::default());
    stake(&mut pool, "minnow", 10 * UNIT, at(START_DAY)).unwrap();

    assert_eq!(pool.pending_reward(&key("minnow", 0), at(START_DAY + 3)).unwrap(), Some(0));
    let state = pool.global_state(at(START_DAY + 3)).unwrap();
    assert_eq!(state.total_reward_emitted, 0);
    assert_eq!(state.pool_weight, 10 * UNIT * 995 / 1000);

    // A whale arriving on day 3 activates the pool from that day on.
    stake(&mut pool, "whale", 1_000_000 * UNIT, at(START_DAY + 3)).unwrap();
    let minnow = harvest(&mut pool, "minnow", 0, at(START_DAY + 5)).unwrap();
    assert!(minnow > 0);

    let ledger = pool.snapshots(START_DAY, START_DAY + 5).unwrap();
    let active: Vec<bool> = ledger.iter().map(|s| s.is_active()).collect();
    assert_eq!(active, vec![false, false, false, true, true]);
}

// ---------------------------------------------------------------------------
// Emission reduction rounds
// ---------------------------------------------------------------------------

/// Pool whose emission drops every two full days of emission.
fn fast_decay_pool() -> MemoryPool {
    let mut config = PoolConfig::default();
    config.schedule.reduce_amount = 2 * INIT_DAY_REWARDS;
    let mut pool = started_memory_pool(config);
    stake(&mut pool, "whale", 1_000_000 * UNIT, at(START_DAY)).unwrap();
    pool
}

#[test]
fn rate_drops_after_reduce_amount() {
    let pool = fast_decay_pool();
    let state = pool.global_state(at(START_DAY + 3)).unwrap();
    let round_one = INIT_DAY_REWARDS - INIT_DAY_REWARDS * 12 / 100;
    assert_eq!(state.decay_round, 1);
    assert_eq!(state.reward_per_day, round_one);
    assert_eq!(state.total_reward_emitted, 2 * INIT_DAY_REWARDS + round_one);
    assert_eq!(
        pool.config().schedule.next_reduction_at(state.total_reward_emitted),
        Some(4 * INIT_DAY_REWARDS)
    );
}

#[test]
fn returning_all_reward_restores_initial_rate() {
    let mut pool = fast_decay_pool();
    let owed = harvest(&mut pool, "whale", 0, at(START_DAY + 3)).unwrap();
    assert_eq!(pool.position(&key("whale", 0)).unwrap().unwrap().total_reward, owed);

    let before = pool.global_state(at(START_DAY + 6)).unwrap();
    assert!(before.decay_round >= 2);

    redeem_with_reward(&mut pool, "whale", 0, owed, at(START_DAY + 6)).unwrap();

    // Harvested and freshly accrued reward are both netted out; only
    // truncation dust remains.
    let after = pool.store().global_state().unwrap().unwrap();
    assert!(after.total_reward_emitted < 100, "{}", after.total_reward_emitted);
    assert_eq!(after.decay_round, 0);
    assert_eq!(after.reward_per_day, INIT_DAY_REWARDS);
    assert_eq!(after.pool_weight, 0);
    assert!(pool.position(&key("whale", 0)).unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Start / stop
// ---------------------------------------------------------------------------

#[test]
fn stopped_pool_keeps_paying_existing_positions() {
    let mut pool = started_memory_pool(PoolConfig::default());
    stake(&mut pool, "whale", 1_000_000 * UNIT, at(START_DAY)).unwrap();
    pool.stop(&name("pool.joker"), at(START_DAY + 1)).unwrap();

    assert_eq!(
        stake(&mut pool, "alice", 10 * UNIT, at(START_DAY + 2)).unwrap_err(),
        PoolError::Precondition(PreconditionError::NotStarted)
    );

    let owed = harvest(&mut pool, "whale", 0, at(START_DAY + 3)).unwrap();
    assert!(owed > 0);
    let effects = redeem_with_reward(&mut pool, "whale", 0, owed, at(START_DAY + 6)).unwrap();
    let memos: Vec<&str> = effects.transfers().map(|t| t.memo.as_str()).collect();
    assert_eq!(memos[0], "redeem");
}

#[test]
fn ids_never_reused_after_redeem() {
    let mut pool = started_memory_pool(PoolConfig::default());
    stake(&mut pool, "alice", 10 * UNIT, at(START_DAY)).unwrap();
    let alice = name("alice");
    pool.redeem(&alice, &alice, 0, at(START_DAY + 6)).unwrap();

    stake(&mut pool, "alice", 10 * UNIT, at(START_DAY + 6)).unwrap();
    let positions = pool.positions_of(&alice).unwrap();
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].0, 1);
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn disk_pool_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = PoolConfig::default();

    let mut pool = open_disk_pool(dir.path(), ReserveMarket::new(config.reserve));
    pool.start(&name("pool.joker"), at(START_DAY)).unwrap();
    stake(&mut pool, "whale", 1_000_000 * UNIT, at(START_DAY)).unwrap();
    let owed = harvest(&mut pool, "whale", 0, at(START_DAY + 3)).unwrap();
    let (store, reserve) = pool.into_parts();
    drop(store);

    let mut pool = open_disk_pool(dir.path(), reserve);
    let position = pool.position(&key("whale", 0)).unwrap().unwrap();
    assert_eq!(position.total_reward, owed);
    assert_eq!(position.last_reward_day, START_DAY + 2);
    assert_eq!(pool.store().last_snapshot_day().unwrap(), Some(START_DAY + 2));
    assert!(pool.store().snapshot(START_DAY + 1).unwrap().unwrap().is_active());

    redeem_with_reward(&mut pool, "whale", 0, owed, at(START_DAY + 6)).unwrap();
    assert!(pool.position(&key("whale", 0)).unwrap().is_none());
    assert_eq!(pool.snapshots(START_DAY, START_DAY + 6).unwrap().len(), 6);
}
