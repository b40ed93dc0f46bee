//! Pool storage interface and in-memory implementation.
//!
//! Provides the [`PoolStore`] trait over the three persisted collections
//! (the global record, the snapshot ledger, the position registry) and the
//! [`ChangeSet`] an operation hands to [`PoolStore::commit`]. The
//! [`MemoryPoolStore`] is suitable for testing and simulation; the RocksDB
//! store lives in `wane-pool`.
//!
//! A commit is all-or-nothing: stores validate the whole change set before
//! applying any of it.

use std::collections::{BTreeMap, HashMap};

use crate::account::AccountName;
use crate::error::{ConsistencyError, PoolError};
use crate::types::{GlobalState, Position, PositionKey, Snapshot};

/// Read access to the snapshot ledger by day.
pub trait SnapshotSource {
    fn snapshot(&self, day: u64) -> Result<Option<Snapshot>, PoolError>;
}

/// Writes staged by one operation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// New global record, if it changed.
    pub global: Option<GlobalState>,
    /// Snapshots to append, in day order.
    pub snapshots: Vec<Snapshot>,
    /// Position upserts (`Some`) and deletions (`None`).
    pub positions: BTreeMap<PositionKey, Option<Position>>,
    /// Next free position id per owner.
    pub next_ids: BTreeMap<AccountName, u64>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.global.is_none()
            && self.snapshots.is_empty()
            && self.positions.is_empty()
            && self.next_ids.is_empty()
    }
}

/// Persistent pool state.
///
/// Not thread-safe; the pool engine holds it by exclusive reference.
pub trait PoolStore: SnapshotSource {
    /// The global record, `None` before the pool is first used.
    fn global_state(&self) -> Result<Option<GlobalState>, PoolError>;

    fn position(&self, key: &PositionKey) -> Result<Option<Position>, PoolError>;

    /// All positions of `owner`, ordered by id.
    fn positions_of(&self, owner: &AccountName) -> Result<Vec<(u64, Position)>, PoolError>;

    /// Next id the owner's counter will hand out (0 for a new owner).
    fn next_position_id(&self, owner: &AccountName) -> Result<u64, PoolError>;

    /// Snapshots with `from <= day < to`, ordered by day.
    fn snapshots(&self, from: u64, to: u64) -> Result<Vec<Snapshot>, PoolError>;

    /// Apply a change set atomically.
    ///
    /// # Errors
    ///
    /// - [`ConsistencyError::SnapshotRewrite`] if a snapshot day is already
    ///   stored or appears twice in `changes`; nothing is applied.
    fn commit(&mut self, changes: ChangeSet) -> Result<(), PoolError>;
}

/// In-memory pool storage for tests and simulations.
#[derive(Clone, Debug, Default)]
pub struct MemoryPoolStore {
    global: Option<GlobalState>,
    snapshots: BTreeMap<u64, Snapshot>,
    positions: BTreeMap<PositionKey, Position>,
    next_ids: HashMap<AccountName, u64>,
}

impl MemoryPoolStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of snapshots stored.
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    /// Number of live positions across all owners.
    pub fn position_count(&self) -> usize {
        self.positions.len()
    }
}

impl SnapshotSource for MemoryPoolStore {
    fn snapshot(&self, day: u64) -> Result<Option<Snapshot>, PoolError> {
        Ok(self.snapshots.get(&day).copied())
    }
}

impl PoolStore for MemoryPoolStore {
    fn global_state(&self) -> Result<Option<GlobalState>, PoolError> {
        Ok(self.global.clone())
    }

    fn position(&self, key: &PositionKey) -> Result<Option<Position>, PoolError> {
        Ok(self.positions.get(key).cloned())
    }

    fn positions_of(&self, owner: &AccountName) -> Result<Vec<(u64, Position)>, PoolError> {
        let start = PositionKey::new(owner.clone(), 0);
        Ok(self
            .positions
            .range(start..)
            .take_while(|(k, _)| &k.owner == owner)
            .map(|(k, p)| (k.id, p.clone()))
            .collect())
    }

    fn next_position_id(&self, owner: &AccountName) -> Result<u64, PoolError> {
        Ok(self.next_ids.get(owner).copied().unwrap_or(0))
    }

    fn snapshots(&self, from: u64, to: u64) -> Result<Vec<Snapshot>, PoolError> {
        if from >= to {
            return Ok(Vec::new());
        }
        Ok(self.snapshots.range(from..to).map(|(_, s)| *s).collect())
    }

    fn commit(&mut self, changes: ChangeSet) -> Result<(), PoolError> {
        let mut seen = std::collections::BTreeSet::new();
        for snapshot in &changes.snapshots {
            if self.snapshots.contains_key(&snapshot.day) || !seen.insert(snapshot.day) {
                return Err(ConsistencyError::SnapshotRewrite(snapshot.day).into());
            }
        }

        if let Some(global) = changes.global {
            self.global = Some(global);
        }
        for snapshot in changes.snapshots {
            self.snapshots.insert(snapshot.day, snapshot);
        }
        for (key, position) in changes.positions {
            match position {
                Some(p) => {
                    self.positions.insert(key, p);
                }
                None => {
                    self.positions.remove(&key);
                }
            }
        }
        for (owner, next) in changes.next_ids {
            self.next_ids.insert(owner, next);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratio::RewardRatio;

    fn name(s: &str) -> AccountName {
        AccountName::new(s).unwrap()
    }

    fn snap(day: u64) -> Snapshot {
        Snapshot {
            day,
            pool_weight: 1_000,
            reward_per_share: RewardRatio::ZERO,
        }
    }

    fn position(staking: u64) -> Position {
        Position {
            created: 0,
            staking,
            mining_pool: staking,
            total_reward: 0,
            total_rex: staking * 10,
            last_reward_day: 0,
        }
    }

    #[test]
    fn empty_store() {
        let store = MemoryPoolStore::new();
        assert_eq!(store.global_state().unwrap(), None);
        assert_eq!(store.snapshot(0).unwrap(), None);
        assert_eq!(store.next_position_id(&name("alice")).unwrap(), 0);
    }

    #[test]
    fn commit_applies_everything() {
        let mut store = MemoryPoolStore::new();
        let key = PositionKey::new(name("alice"), 0);
        let mut changes = ChangeSet {
            global: Some(GlobalState::genesis(10, 5)),
            snapshots: vec![snap(8), snap(9)],
            ..ChangeSet::default()
        };
        changes.positions.insert(key.clone(), Some(position(100)));
        changes.next_ids.insert(name("alice"), 1);
        store.commit(changes).unwrap();

        assert_eq!(store.global_state().unwrap().unwrap().day, 10);
        assert_eq!(store.snapshot_count(), 2);
        assert_eq!(store.position(&key).unwrap(), Some(position(100)));
        assert_eq!(store.next_position_id(&name("alice")).unwrap(), 1);
    }

    #[test]
    fn snapshot_rewrite_rejected_atomically() {
        let mut store = MemoryPoolStore::new();
        store
            .commit(ChangeSet {
                snapshots: vec![snap(5)],
                ..ChangeSet::default()
            })
            .unwrap();

        let err = store
            .commit(ChangeSet {
                global: Some(GlobalState::genesis(7, 5)),
                snapshots: vec![snap(6), snap(5)],
                ..ChangeSet::default()
            })
            .unwrap_err();
        assert_eq!(err, PoolError::Consistency(ConsistencyError::SnapshotRewrite(5)));
        assert_eq!(store.global_state().unwrap(), None);
        assert_eq!(store.snapshot(6).unwrap(), None);
    }

    #[test]
    fn duplicate_day_within_change_set_rejected() {
        let mut store = MemoryPoolStore::new();
        let err = store
            .commit(ChangeSet {
                snapshots: vec![snap(3), snap(3)],
                ..ChangeSet::default()
            })
            .unwrap_err();
        assert_eq!(err, PoolError::Consistency(ConsistencyError::SnapshotRewrite(3)));
    }

    #[test]
    fn deletion_removes_position() {
        let mut store = MemoryPoolStore::new();
        let key = PositionKey::new(name("bob"), 3);
        let mut changes = ChangeSet::default();
        changes.positions.insert(key.clone(), Some(position(5)));
        store.commit(changes).unwrap();

        let mut changes = ChangeSet::default();
        changes.positions.insert(key.clone(), None);
        store.commit(changes).unwrap();
        assert_eq!(store.position(&key).unwrap(), None);
        assert_eq!(store.position_count(), 0);
    }

    #[test]
    fn positions_of_is_owner_scoped() {
        let mut store = MemoryPoolStore::new();
        let mut changes = ChangeSet::default();
        changes.positions.insert(PositionKey::new(name("alice"), 1), Some(position(1)));
        changes.positions.insert(PositionKey::new(name("alice"), 0), Some(position(2)));
        changes.positions.insert(PositionKey::new(name("alicf"), 0), Some(position(3)));
        changes.positions.insert(PositionKey::new(name("alic"), 0), Some(position(4)));
        store.commit(changes).unwrap();

        let ids: Vec<u64> = store
            .positions_of(&name("alice"))
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn snapshot_range_is_half_open() {
        let mut store = MemoryPoolStore::new();
        store
            .commit(ChangeSet {
                snapshots: vec![snap(1), snap(2), snap(3)],
                ..ChangeSet::default()
            })
            .unwrap();
        let days: Vec<u64> = store.snapshots(2, 4).unwrap().iter().map(|s| s.day).collect();
        assert_eq!(days, vec![2, 3]);
        assert!(store.snapshots(3, 3).unwrap().is_empty());
    }
}
