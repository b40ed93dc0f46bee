//! # wane-core
//! Foundation types and traits for the Wane staking pool.

pub mod account;
pub mod asset;
pub mod calendar;
pub mod constants;
pub mod effects;
pub mod error;
pub mod memo;
pub mod pool_state;
pub mod ratio;
pub mod reserve;
pub mod types;
