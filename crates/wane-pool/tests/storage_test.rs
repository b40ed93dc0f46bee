//! RocksDB store tests against a temporary directory.

use wane_core::account::AccountName;
use wane_core::error::{ConsistencyError, PoolError};
use wane_core::pool_state::{ChangeSet, PoolStore, SnapshotSource};
use wane_core::ratio::RewardRatio;
use wane_core::types::{GlobalState, Position, PositionKey, Snapshot};
use wane_pool::RocksStore;

fn name(s: &str) -> AccountName {
    AccountName::new(s).unwrap()
}

fn snap(day: u64, rps: u128) -> Snapshot {
    Snapshot {
        day,
        pool_weight: day * 10,
        reward_per_share: RewardRatio(rps),
    }
}

fn position(staking: u64) -> Position {
    Position {
        created: 1_700_000_000,
        staking,
        mining_pool: staking,
        total_reward: 0,
        total_rex: staking * 10_000,
        last_reward_day: 19_675,
    }
}

fn open_temp() -> (tempfile::TempDir, RocksStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = RocksStore::open(dir.path()).unwrap();
    (dir, store)
}

#[test]
fn empty_store() {
    let (_dir, store) = open_temp();
    assert_eq!(store.global_state().unwrap(), None);
    assert_eq!(store.snapshot(0).unwrap(), None);
    assert_eq!(store.last_snapshot_day().unwrap(), None);
    assert_eq!(store.next_position_id(&name("alice")).unwrap(), 0);
    assert!(store.positions_of(&name("alice")).unwrap().is_empty());
}

#[test]
fn commit_round_trips_every_collection() {
    let (_dir, mut store) = open_temp();
    let key = PositionKey::new(name("alice"), 4);
    let mut changes = ChangeSet {
        global: Some(GlobalState::genesis(300, 130_000_000)),
        snapshots: vec![snap(298, 7), snap(299, 0)],
        ..ChangeSet::default()
    };
    changes.positions.insert(key.clone(), Some(position(99_500)));
    changes.next_ids.insert(name("alice"), 5);
    store.commit(changes).unwrap();

    assert_eq!(store.global_state().unwrap().unwrap().day, 300);
    assert_eq!(store.snapshot(298).unwrap(), Some(snap(298, 7)));
    assert_eq!(store.snapshot(299).unwrap(), Some(snap(299, 0)));
    assert_eq!(store.last_snapshot_day().unwrap(), Some(299));
    assert_eq!(store.position(&key).unwrap(), Some(position(99_500)));
    assert_eq!(store.next_position_id(&name("alice")).unwrap(), 5);
}

#[test]
fn snapshot_rewrite_rejected_without_partial_write() {
    let (_dir, mut store) = open_temp();
    store
        .commit(ChangeSet {
            snapshots: vec![snap(10, 1)],
            ..ChangeSet::default()
        })
        .unwrap();

    let err = store
        .commit(ChangeSet {
            global: Some(GlobalState::genesis(12, 1)),
            snapshots: vec![snap(11, 1), snap(10, 2)],
            ..ChangeSet::default()
        })
        .unwrap_err();
    assert_eq!(err, PoolError::Consistency(ConsistencyError::SnapshotRewrite(10)));
    assert_eq!(store.snapshot(10).unwrap(), Some(snap(10, 1)));
    assert_eq!(store.snapshot(11).unwrap(), None);
    assert_eq!(store.global_state().unwrap(), None);
}

#[test]
fn snapshot_range_is_ordered_and_half_open() {
    let (_dir, mut store) = open_temp();
    // Crosses a byte boundary in the big-endian key.
    let snapshots: Vec<Snapshot> = (250..260).map(|d| snap(d, d as u128)).collect();
    store
        .commit(ChangeSet {
            snapshots,
            ..ChangeSet::default()
        })
        .unwrap();

    let days: Vec<u64> = store.snapshots(254, 258).unwrap().iter().map(|s| s.day).collect();
    assert_eq!(days, vec![254, 255, 256, 257]);
    assert!(store.snapshots(258, 258).unwrap().is_empty());
    assert_eq!(store.snapshots(0, 1_000).unwrap().len(), 10);
}

#[test]
fn positions_are_scoped_to_owner() {
    let (_dir, mut store) = open_temp();
    let mut changes = ChangeSet::default();
    for (owner, id) in [("alice", 0), ("alice", 300), ("alic", 1), ("alicea", 2), ("bob", 0)] {
        changes
            .positions
            .insert(PositionKey::new(name(owner), id), Some(position(id + 1)));
    }
    store.commit(changes).unwrap();

    let alice: Vec<u64> = store
        .positions_of(&name("alice"))
        .unwrap()
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    assert_eq!(alice, vec![0, 300]);
    assert_eq!(store.positions_of(&name("alic")).unwrap().len(), 1);
}

#[test]
fn deletion_removes_position() {
    let (_dir, mut store) = open_temp();
    let key = PositionKey::new(name("bob"), 1);
    let mut changes = ChangeSet::default();
    changes.positions.insert(key.clone(), Some(position(5)));
    store.commit(changes).unwrap();

    let mut changes = ChangeSet::default();
    changes.positions.insert(key.clone(), None);
    store.commit(changes).unwrap();
    assert_eq!(store.position(&key).unwrap(), None);
}

#[test]
fn state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let key = PositionKey::new(name("carol"), 0);
    {
        let mut store = RocksStore::open(dir.path()).unwrap();
        let mut changes = ChangeSet {
            global: Some(GlobalState::genesis(77, 5)),
            snapshots: vec![snap(76, 3)],
            ..ChangeSet::default()
        };
        changes.positions.insert(key.clone(), Some(position(42)));
        changes.next_ids.insert(name("carol"), 1);
        store.commit(changes).unwrap();
        store.flush().unwrap();
    }

    let store = RocksStore::open(dir.path()).unwrap();
    assert_eq!(store.global_state().unwrap().unwrap().day, 77);
    assert_eq!(store.snapshot(76).unwrap(), Some(snap(76, 3)));
    assert_eq!(store.position(&key).unwrap(), Some(position(42)));
    assert_eq!(store.next_position_id(&name("carol")).unwrap(), 1);
}
