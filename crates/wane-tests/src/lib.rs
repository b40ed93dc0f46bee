//! End-to-end test suite for the Wane staking pool.
//!
//! The integration tests under `tests/` drive whole pools through deposits,
//! harvests and redemptions across many days, on both the in-memory store
//! and RocksDB, and check the invariants that must hold between the
//! scheduler, the ledger and individual positions.

pub mod helpers;
