//! Staging overlay for one pool operation.
//!
//! Reads go through the staged [`ChangeSet`] first and fall back to the
//! store. Nothing reaches the store until the engine hands the change set
//! to [`PoolStore::commit`]; dropping a [`Txn`] discards everything.

use wane_core::account::AccountName;
use wane_core::error::{ConsistencyError, PoolError};
use wane_core::pool_state::{ChangeSet, PoolStore, SnapshotSource};
use wane_core::types::{GlobalState, Position, PositionKey, Snapshot};

pub(crate) struct Txn<'a, S: ?Sized> {
    store: &'a S,
    changes: ChangeSet,
}

impl<'a, S: PoolStore + ?Sized> Txn<'a, S> {
    pub(crate) fn new(store: &'a S) -> Self {
        Self {
            store,
            changes: ChangeSet::default(),
        }
    }

    pub(crate) fn global(&self) -> Result<Option<GlobalState>, PoolError> {
        match &self.changes.global {
            Some(state) => Ok(Some(state.clone())),
            None => self.store.global_state(),
        }
    }

    pub(crate) fn set_global(&mut self, state: GlobalState) {
        self.changes.global = Some(state);
    }

    /// Stage snapshots; they must continue the staged run without gaps.
    pub(crate) fn append_snapshots(
        &mut self,
        snapshots: Vec<Snapshot>,
    ) -> Result<(), ConsistencyError> {
        let mut expected = self.changes.snapshots.last().map(|s| s.day + 1);
        for snapshot in &snapshots {
            if let Some(day) = expected {
                if snapshot.day != day {
                    return Err(ConsistencyError::SnapshotMismatch {
                        expected: day,
                        got: snapshot.day,
                    });
                }
            }
            expected = Some(snapshot.day + 1);
        }
        self.changes.snapshots.extend(snapshots);
        Ok(())
    }

    pub(crate) fn position(&self, key: &PositionKey) -> Result<Option<Position>, PoolError> {
        match self.changes.positions.get(key) {
            Some(staged) => Ok(staged.clone()),
            None => self.store.position(key),
        }
    }

    pub(crate) fn put_position(&mut self, key: PositionKey, position: Position) {
        self.changes.positions.insert(key, Some(position));
    }

    pub(crate) fn delete_position(&mut self, key: PositionKey) {
        self.changes.positions.insert(key, None);
    }

    /// Hand out the owner's next position id. Ids are never reused, even
    /// after the position is redeemed.
    pub(crate) fn allocate_id(&mut self, owner: &AccountName) -> Result<u64, PoolError> {
        let next = match self.changes.next_ids.get(owner) {
            Some(next) => *next,
            None => self.store.next_position_id(owner)?,
        };
        let after = next.checked_add(1).ok_or(ConsistencyError::ArithmeticOverflow)?;
        self.changes.next_ids.insert(owner.clone(), after);
        Ok(next)
    }

    pub(crate) fn into_changes(self) -> ChangeSet {
        self.changes
    }
}

impl<S: PoolStore + ?Sized> SnapshotSource for Txn<'_, S> {
    fn snapshot(&self, day: u64) -> Result<Option<Snapshot>, PoolError> {
        if let Some(first) = self.changes.snapshots.first() {
            if day >= first.day {
                let staged = self.changes.snapshots.get((day - first.day) as usize).copied();
                if staged.is_some() {
                    return Ok(staged);
                }
            }
        }
        self.store.snapshot(day)
    }
}
