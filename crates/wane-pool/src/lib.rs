//! # wane-pool — Lifecycle engine, storage, and configuration.
//!
//! Composes the Wane accounting core into a usable pool:
//! - [`engine::Pool`] — deposit, harvest and both redemption paths, each one
//!   atomic transaction returning its outbound effects
//! - [`storage::RocksStore`] — persistent pool state backed by RocksDB
//! - [`reserve::ReserveMarket`] — in-memory yield reserve for hosts and tests
//! - [`config::PoolConfig`] — pool configuration

pub mod config;
pub mod engine;
pub mod reserve;
pub mod storage;
mod txn;

pub use config::PoolConfig;
pub use engine::Pool;
pub use reserve::ReserveMarket;
pub use storage::RocksStore;
