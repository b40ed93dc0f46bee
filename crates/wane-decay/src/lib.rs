//! # wane-decay — Daily emission schedule and position accrual.
//!
//! All calculations use integer arithmetic only for determinism.
//!
//! - **Emission schedule**: the daily emission drops 12% each time the
//!   cumulative emission crosses another reduction step, recomputed from the
//!   initial rate every time.
//! - **Scheduler**: catches the global state up one day at a time, writing
//!   one snapshot per day and decaying the pool weight 1% per active day.
//! - **Accrual**: replays the snapshot ledger for a single position,
//!   crediting reward and decaying its mining pool in lockstep.

pub mod accrual;
pub mod schedule;
pub mod scheduler;

pub use accrual::{Accrual, accrue};
pub use schedule::EmissionSchedule;
pub use scheduler::{Scheduler, WeightDelta, apply_weight_delta, retain};
