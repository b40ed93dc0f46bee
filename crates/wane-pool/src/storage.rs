//! RocksDB-backed persistent pool storage.
//!
//! Implements [`PoolStore`] using RocksDB column families for the global
//! record, the snapshot ledger, positions and per-owner id counters. Every
//! [`PoolStore::commit`] is a single atomic [`WriteBatch`].
//!
//! Key layout:
//! - `snapshots`: day as big-endian `u64`, so iteration is in day order
//! - `positions`: `[owner length][owner bytes][id as big-endian u64]`; the
//!   length byte keeps one owner's keys from prefixing another's
//! - `counters`: owner bytes, value big-endian `u64`

use std::collections::BTreeSet;
use std::path::Path;

use rocksdb::{ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch};

use wane_core::account::AccountName;
use wane_core::error::{ConsistencyError, PoolError};
use wane_core::pool_state::{ChangeSet, PoolStore, SnapshotSource};
use wane_core::types::{GlobalState, Position, PositionKey, Snapshot};

// --- Column family names ---

const CF_STATE: &str = "state";
const CF_SNAPSHOTS: &str = "snapshots";
const CF_POSITIONS: &str = "positions";
const CF_COUNTERS: &str = "counters";

/// All column family names.
const ALL_CFS: &[&str] = &[CF_STATE, CF_SNAPSHOTS, CF_POSITIONS, CF_COUNTERS];

const STATE_GLOBAL: &[u8] = b"global";

/// RocksDB-backed persistent pool storage.
pub struct RocksStore {
    db: DB,
}

impl RocksStore {
    /// Open or create a RocksDB database at the given path.
    ///
    /// Creates all column families if they don't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PoolError> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = ALL_CFS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&db_opts, path.as_ref(), cf_descriptors)
            .map_err(|e| PoolError::Storage(e.to_string()))?;

        Ok(Self { db })
    }

    /// Flush all in-memory buffers to disk.
    pub fn flush(&self) -> Result<(), PoolError> {
        self.db
            .flush()
            .map_err(|e| PoolError::Storage(e.to_string()))
    }

    /// Highest snapshot day written, if any.
    pub fn last_snapshot_day(&self) -> Result<Option<u64>, PoolError> {
        let cf = self.cf_handle(CF_SNAPSHOTS)?;
        match self.db.iterator_cf(&cf, IteratorMode::End).next() {
            Some(item) => {
                let (key, _) = item.map_err(|e| PoolError::Storage(e.to_string()))?;
                Ok(Some(decode_u64(&key)?))
            }
            None => Ok(None),
        }
    }

    // --- Private helpers ---

    fn cf_handle(&self, name: &str) -> Result<&rocksdb::ColumnFamily, PoolError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| PoolError::Storage(format!("missing column family: {name}")))
    }

    fn get<T: bincode::Decode<()>>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>, PoolError> {
        let cf = self.cf_handle(cf_name)?;
        match self
            .db
            .get_cf(&cf, key)
            .map_err(|e| PoolError::Storage(e.to_string()))?
        {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn owner_prefix(owner: &AccountName) -> Vec<u8> {
        let name = owner.as_str().as_bytes();
        let mut prefix = Vec::with_capacity(1 + name.len());
        prefix.push(name.len() as u8);
        prefix.extend_from_slice(name);
        prefix
    }

    fn position_key(key: &PositionKey) -> Vec<u8> {
        let mut bytes = Self::owner_prefix(&key.owner);
        bytes.extend_from_slice(&key.id.to_be_bytes());
        bytes
    }
}

impl SnapshotSource for RocksStore {
    fn snapshot(&self, day: u64) -> Result<Option<Snapshot>, PoolError> {
        self.get(CF_SNAPSHOTS, &day.to_be_bytes())
    }
}

impl PoolStore for RocksStore {
    fn global_state(&self) -> Result<Option<GlobalState>, PoolError> {
        self.get(CF_STATE, STATE_GLOBAL)
    }

    fn position(&self, key: &PositionKey) -> Result<Option<Position>, PoolError> {
        self.get(CF_POSITIONS, &Self::position_key(key))
    }

    fn positions_of(&self, owner: &AccountName) -> Result<Vec<(u64, Position)>, PoolError> {
        let cf = self.cf_handle(CF_POSITIONS)?;
        let prefix = Self::owner_prefix(owner);
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&prefix, Direction::Forward));

        let mut positions = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| PoolError::Storage(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            let id = decode_u64(&key[prefix.len()..])?;
            positions.push((id, decode(&value)?));
        }
        Ok(positions)
    }

    fn next_position_id(&self, owner: &AccountName) -> Result<u64, PoolError> {
        let cf = self.cf_handle(CF_COUNTERS)?;
        match self
            .db
            .get_cf(&cf, owner.as_str().as_bytes())
            .map_err(|e| PoolError::Storage(e.to_string()))?
        {
            Some(bytes) => decode_u64(&bytes),
            None => Ok(0),
        }
    }

    fn snapshots(&self, from: u64, to: u64) -> Result<Vec<Snapshot>, PoolError> {
        if from >= to {
            return Ok(Vec::new());
        }
        let cf = self.cf_handle(CF_SNAPSHOTS)?;
        let start = from.to_be_bytes();
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&start, Direction::Forward));

        let mut snapshots = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| PoolError::Storage(e.to_string()))?;
            if decode_u64(&key)? >= to {
                break;
            }
            snapshots.push(decode(&value)?);
        }
        Ok(snapshots)
    }

    fn commit(&mut self, changes: ChangeSet) -> Result<(), PoolError> {
        let cf_state = self.cf_handle(CF_STATE)?;
        let cf_snapshots = self.cf_handle(CF_SNAPSHOTS)?;
        let cf_positions = self.cf_handle(CF_POSITIONS)?;
        let cf_counters = self.cf_handle(CF_COUNTERS)?;

        let mut seen = BTreeSet::new();
        for snapshot in &changes.snapshots {
            let exists = self
                .db
                .get_cf(&cf_snapshots, snapshot.day.to_be_bytes())
                .map_err(|e| PoolError::Storage(e.to_string()))?
                .is_some();
            if exists || !seen.insert(snapshot.day) {
                return Err(ConsistencyError::SnapshotRewrite(snapshot.day).into());
            }
        }

        let mut batch = WriteBatch::default();
        if let Some(global) = &changes.global {
            batch.put_cf(&cf_state, STATE_GLOBAL, encode(global)?);
        }
        for snapshot in &changes.snapshots {
            batch.put_cf(&cf_snapshots, snapshot.day.to_be_bytes(), encode(snapshot)?);
        }
        for (key, position) in &changes.positions {
            let db_key = Self::position_key(key);
            match position {
                Some(p) => batch.put_cf(&cf_positions, db_key, encode(p)?),
                None => batch.delete_cf(&cf_positions, db_key),
            }
        }
        for (owner, next) in &changes.next_ids {
            batch.put_cf(&cf_counters, owner.as_str().as_bytes(), next.to_be_bytes());
        }

        self.db
            .write(batch)
            .map_err(|e| PoolError::Storage(e.to_string()))
    }
}

fn encode<T: bincode::Encode>(value: &T) -> Result<Vec<u8>, PoolError> {
    bincode::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| PoolError::Storage(e.to_string()))
}

fn decode<T: bincode::Decode<()>>(bytes: &[u8]) -> Result<T, PoolError> {
    bincode::decode_from_slice(bytes, bincode::config::standard())
        .map(|(value, _)| value)
        .map_err(|e| PoolError::Storage(e.to_string()))
}

fn decode_u64(bytes: &[u8]) -> Result<u64, PoolError> {
    let array: [u8; 8] = bytes
        .try_into()
        .map_err(|_| PoolError::Storage(format!("invalid u64 key length: {}", bytes.len())))?;
    Ok(u64::from_be_bytes(array))
}
