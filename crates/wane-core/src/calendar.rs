//! Day arithmetic.
//!
//! Two calendars coexist. The global calendar (snapshots, the scheduler)
//! rolls over at a fixed hour shared by everyone. Each position also keeps
//! its own calendar whose days roll over at the position's creation
//! time-of-day; accrual only credits global days that the position has
//! fully lived through on its own calendar.

use crate::constants::{DAY_OFFSET_SECS, LOCK_DAYS, MAX_TIMESTAMP, SECONDS_PER_DAY};
use crate::error::ValidationError;

/// Unix time in seconds.
pub type Timestamp = u64;

/// Reject host timestamps past [`MAX_TIMESTAMP`].
pub fn check_timestamp(now: Timestamp) -> Result<Timestamp, ValidationError> {
    if now > MAX_TIMESTAMP {
        return Err(ValidationError::TimestampOutOfRange {
            got: now,
            max: MAX_TIMESTAMP,
        });
    }
    Ok(now)
}

/// Global day index for a timestamp.
///
/// # Examples
///
/// ```
/// use wane_core::calendar::global_day;
/// assert_eq!(global_day(0), 0);
/// // Rolls over one hour before UTC midnight.
/// assert_eq!(global_day(86_400 - 3_600), 1);
/// ```
pub fn global_day(now: Timestamp) -> u64 {
    now.saturating_add(DAY_OFFSET_SECS) / SECONDS_PER_DAY
}

/// Day index of `now` on the calendar of a position created at `created`.
///
/// Starts at the global day of creation and advances every full
/// [`SECONDS_PER_DAY`] elapsed since `created`. Never exceeds
/// [`global_day`]`(now)` and trails it by at most one.
pub fn position_day(now: Timestamp, created: Timestamp) -> u64 {
    now.saturating_sub(created) / SECONDS_PER_DAY + global_day(created)
}

/// Last locked second of a position created at `created`: [`LOCK_DAYS`]
/// whole days after the UTC midnight that starts the creation day.
pub fn unlock_time(created: Timestamp) -> Timestamp {
    (created - created % SECONDS_PER_DAY).saturating_add(LOCK_DAYS * SECONDS_PER_DAY)
}

/// Strictly after [`unlock_time`]; the boundary second itself is locked.
pub fn is_unlocked(created: Timestamp, now: Timestamp) -> bool {
    now > unlock_time(created)
}
