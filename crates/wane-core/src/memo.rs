//! Strict parsing of inbound transfer memos.
//!
//! Every memo is matched as an exact prefix followed by an exact format;
//! anything else is a [`ValidationError`].

use crate::account::AccountName;
use crate::constants::{ADMIN_MEMO, MAX_MEMO_LEN, ORDER_MEMO_PREFIX, STAKING_MEMO_PREFIX};
use crate::error::ValidationError;

/// What an inbound reward-asset transfer asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardMemo {
    /// Administrative top-up; accepted and otherwise ignored.
    Admin,
    /// Return reward and redeem the caller's position with this id.
    Order(u64),
}

/// Extract the beneficiary from a relayed `"staking:<account>"` memo.
pub fn parse_staking_memo(memo: &str) -> Result<AccountName, ValidationError> {
    let user = strip_prefixed(memo, STAKING_MEMO_PREFIX)?;
    AccountName::new(user).map_err(|_| ValidationError::InvalidMemo(memo.to_string()))
}

/// Classify a reward-asset memo: `"adminop"` or `"order:<digits>"`.
pub fn parse_reward_memo(memo: &str) -> Result<RewardMemo, ValidationError> {
    if memo == ADMIN_MEMO {
        return Ok(RewardMemo::Admin);
    }
    let digits = strip_prefixed(memo, ORDER_MEMO_PREFIX)?;
    parse_position_id(digits).map(RewardMemo::Order)
}

/// Parse a decimal position id: ASCII digits only, no sign, no whitespace.
pub fn parse_position_id(s: &str) -> Result<u64, ValidationError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidPositionId(s.to_string()));
    }
    s.parse()
        .map_err(|_| ValidationError::InvalidPositionId(s.to_string()))
}

/// Check the length bounds, then strip `prefix` and return a non-empty rest.
fn strip_prefixed<'a>(memo: &'a str, prefix: &str) -> Result<&'a str, ValidationError> {
    if memo.len() > MAX_MEMO_LEN {
        return Err(ValidationError::MemoTooLong {
            len: memo.len(),
            max: MAX_MEMO_LEN,
        });
    }
    match memo.strip_prefix(prefix) {
        Some(rest) if !rest.is_empty() => Ok(rest),
        _ => Err(ValidationError::InvalidMemo(memo.to_string())),
    }
}
