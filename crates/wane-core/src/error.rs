//! Error types for the Wane pool.
//!
//! Every error aborts the operation that raised it; nothing it staged is
//! committed. The three kinds only differ in who is to blame: the caller's
//! input ([`ValidationError`]), the current pool or position state
//! ([`PreconditionError`]), or the bookkeeping itself ([`ConsistencyError`]).
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid memo: {0}")] InvalidMemo(String),
    #[error("memo has {len} bytes, limit is {max}")] MemoTooLong { len: usize, max: usize },
    #[error("invalid account name: {0}")] InvalidAccountName(String),
    #[error("invalid position id: {0}")] InvalidPositionId(String),
    #[error("wrong denomination: expected {expected}, got {got}")] WrongDenomination { expected: String, got: String },
    #[error("invalid quantity: {0}")] InvalidQuantity(String),
    #[error("amount must be positive")] NonPositiveAmount,
    #[error("amount {got} below minimum {min}")] BelowMinimum { got: u64, min: u64 },
    #[error("insufficient payment: have {have}, need {need}")] InsufficientPayment { have: u64, need: u64 },
    #[error("timestamp {got} out of range, latest is {max}")] TimestampOutOfRange { got: u64, max: u64 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("the pool has not started")] NotStarted,
    #[error("position {owner}#{id} not found")] PositionNotFound { owner: String, id: u64 },
    #[error("position is frozen until {unlock_at}")] StillLocked { unlock_at: u64 },
    #[error("outstanding reward {0} must be returned first")] OutstandingReward(u64),
    #[error("caller {caller} is not authorized, requires {required}")] Unauthorized { caller: String, required: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyError {
    #[error("snapshot missing for day {0}")] SnapshotMissing(u64),
    #[error("snapshot key mismatch: expected day {expected}, got {got}")] SnapshotMismatch { expected: u64, got: u64 },
    #[error("snapshot for day {0} already written")] SnapshotRewrite(u64),
    #[error("reserve proceeds {proceeds} below principal {principal}")] ReserveShortfall { proceeds: u64, principal: u64 },
    #[error("reserve conversion produced nothing: {0}")] ReserveConversion(String),
    #[error("position principal is zero")] ZeroPrincipal,
    #[error("position reserve units are zero")] ZeroReserveUnits,
    #[error("reward accumulation overflow")] RewardOverflow,
    #[error("arithmetic overflow")] ArithmeticOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error(transparent)] Validation(#[from] ValidationError),
    #[error(transparent)] Precondition(#[from] PreconditionError),
    #[error(transparent)] Consistency(#[from] ConsistencyError),
    #[error("storage: {0}")] Storage(String),
}

impl PoolError {
    /// Whether the error points at a bookkeeping defect rather than at the
    /// caller or the pool state.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Consistency(_) | Self::Storage(_))
    }
}
