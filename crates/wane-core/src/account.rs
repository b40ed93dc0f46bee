//! Account names on the host ledger.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{FEE_ACCOUNT, POOL_ACCOUNT, RELAY_ACCOUNT, SYSTEM_ACCOUNT};
use crate::error::ValidationError;

/// Longest account name the host ledger accepts.
pub const MAX_ACCOUNT_NAME_LEN: usize = 12;

/// A validated host-ledger account name: 1 to 12 characters from
/// `a-z`, `1-5` and `.`, not ending in `.`.
///
/// # Examples
///
/// ```
/// use wane_core::account::AccountName;
/// let alice: AccountName = "alice.x".parse().unwrap();
/// assert_eq!(alice.as_str(), "alice.x");
/// assert!("Alice".parse::<AccountName>().is_err());
/// ```
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
    bincode::Encode, bincode::Decode,
)]
#[serde(try_from = "String", into = "String")]
pub struct AccountName(String);

impl AccountName {
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        let valid = !name.is_empty()
            && name.len() <= MAX_ACCOUNT_NAME_LEN
            && !name.ends_with('.')
            && name
                .bytes()
                .all(|b| b.is_ascii_lowercase() || (b'1'..=b'5').contains(&b) || b == b'.');
        if !valid {
            return Err(ValidationError::InvalidAccountName(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the system account `root` itself or one of its
    /// `root.*` sub-accounts.
    pub fn is_system(&self, root: &AccountName) -> bool {
        self.0 == root.0
            || self
                .0
                .strip_prefix(root.as_str())
                .is_some_and(|rest| rest.starts_with('.'))
    }
}

/// Built-in default accounts.
impl AccountName {
    pub fn default_pool() -> Self {
        Self(POOL_ACCOUNT.to_string())
    }

    pub fn default_fee() -> Self {
        Self(FEE_ACCOUNT.to_string())
    }

    pub fn default_relay() -> Self {
        Self(RELAY_ACCOUNT.to_string())
    }

    pub fn default_system() -> Self {
        Self(SYSTEM_ACCOUNT.to_string())
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AccountName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for AccountName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<AccountName> for String {
    fn from(name: AccountName) -> Self {
        name.0
    }
}

impl AsRef<str> for AccountName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
