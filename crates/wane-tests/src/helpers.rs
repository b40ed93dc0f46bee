//! Shared fixtures for the end-to-end tests.

use std::path::Path;

use wane_core::account::AccountName;
use wane_core::asset::{Asset, Denomination};
use wane_core::calendar::Timestamp;
use wane_core::constants::SECONDS_PER_DAY;
use wane_core::effects::{Effects, Transfer};
use wane_core::error::PoolError;
use wane_core::pool_state::{MemoryPoolStore, PoolStore};
use wane_pool::{Pool, PoolConfig, ReserveMarket, RocksStore};

/// Global day every scenario starts on.
pub const START_DAY: u64 = 19_000;

pub type MemoryPool = Pool<MemoryPoolStore, ReserveMarket>;
pub type DiskPool = Pool<RocksStore, ReserveMarket>;

/// Midday of global day `day`, well clear of the rollover hour.
pub fn at(day: u64) -> Timestamp {
    day * SECONDS_PER_DAY + SECONDS_PER_DAY / 2
}

pub fn name(s: &str) -> AccountName {
    AccountName::new(s).unwrap()
}

pub fn base(amount: u64) -> Asset {
    Denomination::base().amount(amount)
}

pub fn reward(amount: u64) -> Asset {
    Denomination::reward().amount(amount)
}

/// A transfer addressed to the default pool account.
pub fn inbound(from: &str, quantity: Asset, memo: &str) -> Transfer {
    Transfer {
        from: name(from),
        to: AccountName::default_pool(),
        quantity,
        memo: memo.to_string(),
    }
}

/// In-memory pool with `config`, started on [`START_DAY`].
pub fn started_memory_pool(config: PoolConfig) -> MemoryPool {
    let reserve = ReserveMarket::new(config.reserve);
    let mut pool = Pool::new(MemoryPoolStore::new(), reserve, config);
    pool.start(&AccountName::default_pool(), at(START_DAY)).unwrap();
    pool
}

/// RocksDB-backed pool under `dir` with default settings.
pub fn open_disk_pool(dir: &Path, reserve: ReserveMarket) -> DiskPool {
    let config = PoolConfig {
        data_dir: dir.to_path_buf(),
        ..PoolConfig::default()
    };
    let store = RocksStore::open(config.db_path()).unwrap();
    Pool::new(store, reserve, config)
}

/// Deposit `amount` for `user` through the relay and settle the reserve
/// purchase.
pub fn stake<S: PoolStore>(
    pool: &mut Pool<S, ReserveMarket>,
    user: &str,
    amount: u64,
    now: Timestamp,
) -> Result<Effects, PoolError> {
    let t = inbound("stake.joker", base(amount), &format!("staking:{user}"));
    let effects = pool.on_base_transfer(&t, now)?;
    pool.reserve_mut().settle(&effects)?;
    Ok(effects)
}

/// Harvest `user`'s position `id` and return the reward paid.
pub fn harvest<S: PoolStore>(
    pool: &mut Pool<S, ReserveMarket>,
    user: &str,
    id: u64,
    now: Timestamp,
) -> Result<u64, PoolError> {
    let user = name(user);
    let effects = pool.harvest(&user, &user, id, now)?;
    Ok(effects.transfers().map(|t| t.quantity.amount).sum())
}

/// Return `user`'s harvested reward plus the fee and redeem position `id`.
pub fn redeem_with_reward<S: PoolStore>(
    pool: &mut Pool<S, ReserveMarket>,
    user: &str,
    id: u64,
    owed: u64,
    now: Timestamp,
) -> Result<Effects, PoolError> {
    let fee = owed * pool.config().limits.redeem_fee_per_mille / 1_000;
    let t = inbound(user, reward(owed + fee), &format!("order:{id}"));
    let effects = pool.on_reward_transfer(&t, now)?;
    pool.reserve_mut().settle(&effects)?;
    Ok(effects)
}
