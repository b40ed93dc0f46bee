//! Pool configuration.
//!
//! Provides [`PoolConfig`] with defaults for every setting. The configuration
//! can be customized programmatically or loaded with [`PoolConfig::load`]
//! from an optional TOML file overlaid with `WANE__*` environment variables
//! (`WANE__ACCOUNTS__FEE=fees`, `WANE__LIMITS__MIN_DEPOSIT=20000`, ...).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use wane_core::account::AccountName;
use wane_core::asset::Denomination;
use wane_core::constants::{DEPOSIT_FEE_PER_MILLE, MIN_DEPOSIT, REDEEM_FEE_PER_MILLE};
use wane_core::reserve::ReserveRates;
use wane_decay::EmissionSchedule;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "WANE";

/// Configuration for a pool instance.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PoolConfig {
    /// Root directory for all persistent data.
    pub data_dir: PathBuf,
    /// Log level filter string (e.g. "info", "debug", "wane_pool=trace").
    pub log_level: String,
    pub accounts: Accounts,
    pub denominations: Denominations,
    pub schedule: EmissionSchedule,
    pub limits: Limits,
    /// Exchange rate a fresh simulated reserve starts from.
    pub reserve: ReserveRates,
}

/// Accounts the pool talks to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Accounts {
    /// The pool's own account; outbound transfers come from here and only it
    /// may start or stop the pool.
    pub pool: AccountName,
    /// Receives deposit fees, redemption fees, reserve income and strays.
    pub fee: AccountName,
    /// The only sender whose base transfers are treated as deposits.
    pub relay: AccountName,
    /// Root of the privileged system accounts whose transfers are ignored.
    pub system: AccountName,
}

/// The three assets the pool handles.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Denominations {
    pub base: Denomination,
    pub reward: Denomination,
    pub reserve: Denomination,
}

/// Deposit minimum and fee rates.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Limits {
    /// Smallest accepted deposit, in base minor units.
    pub min_deposit: u64,
    /// Deposit fee in parts per thousand.
    pub deposit_fee_per_mille: u64,
    /// Fee on returned reward in parts per thousand.
    pub redeem_fee_per_mille: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wane");

        Self {
            data_dir,
            log_level: "info".to_string(),
            accounts: Accounts::default(),
            denominations: Denominations::default(),
            schedule: EmissionSchedule::default(),
            limits: Limits::default(),
            reserve: ReserveRates {
                total_lendable: 1_000_000_000,
                total_units: 10_000_000_000_000,
            },
        }
    }
}

impl Default for Accounts {
    fn default() -> Self {
        Self {
            pool: AccountName::default_pool(),
            fee: AccountName::default_fee(),
            relay: AccountName::default_relay(),
            system: AccountName::default_system(),
        }
    }
}

impl Default for Denominations {
    fn default() -> Self {
        Self {
            base: Denomination::base(),
            reward: Denomination::reward(),
            reserve: Denomination::reserve(),
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            min_deposit: MIN_DEPOSIT,
            deposit_fee_per_mille: DEPOSIT_FEE_PER_MILLE,
            redeem_fee_per_mille: REDEEM_FEE_PER_MILLE,
        }
    }
}

impl PoolConfig {
    /// Load defaults, then `file` if given and present, then `WANE__*`
    /// environment overrides.
    pub fn load(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Path to the RocksDB pool database.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("pooldata")
    }

    /// Path to the simulated reserve state kept next to the database.
    pub fn reserve_path(&self) -> PathBuf {
        self.data_dir.join("reserve.json")
    }
}
