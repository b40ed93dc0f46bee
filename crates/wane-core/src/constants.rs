//! Pool constants. All monetary values are in minor units (4 decimal places,
//! so `1.0000` of any pool asset is `10_000` units).

/// Minor units per whole asset unit.
pub const UNIT: u64 = 10_000;

/// Decimal places carried by every pool denomination.
pub const ASSET_PRECISION: u8 = 4;

/// Largest amount an inbound quantity may carry (`2^62 - 1`).
pub const MAX_ASSET_AMOUNT: u64 = (1 << 62) - 1;

pub const SECONDS_PER_DAY: u64 = 86_400;

/// Global days roll over one hour before UTC midnight.
pub const DAY_OFFSET_SECS: u64 = 3_600;

/// Latest accepted host timestamp; host clocks are 32-bit seconds.
pub const MAX_TIMESTAMP: u64 = u32::MAX as u64;

/// Whole days a position stays frozen after its creation day starts.
pub const LOCK_DAYS: u64 = 5;

/// Daily emission before any reduction round.
pub const INIT_DAY_REWARDS: u64 = 13_000 * UNIT;

/// Cumulative emission per reduction round.
pub const REDUCE_AMOUNT: u64 = 520_000 * UNIT;

/// Percentage removed from the daily emission each reduction round.
pub const REDUCE_PERCENT: u64 = 12;

/// A day is active when `pool_weight / 100` reaches this weight.
pub const ACTIVATION_THRESHOLD: u64 = 5_400 * UNIT;

/// Percentage of pool weight (and each position's mining pool) kept after
/// an active day.
pub const DAILY_RETENTION_PERCENT: u64 = 99;

/// Positions at or below this mining pool stop earning.
pub const MINING_DUST_FLOOR: u64 = 10_000;

/// Smallest accepted deposit.
pub const MIN_DEPOSIT: u64 = UNIT;

/// Deposit fee, parts per thousand of the transferred amount.
pub const DEPOSIT_FEE_PER_MILLE: u64 = 5;

/// Redemption fee, parts per thousand of the reward being returned.
pub const REDEEM_FEE_PER_MILLE: u64 = 5;

/// Longest memo an inbound transfer may carry.
pub const MAX_MEMO_LEN: usize = 256;

pub const STAKING_MEMO_PREFIX: &str = "staking:";
pub const ORDER_MEMO_PREFIX: &str = "order:";
pub const ADMIN_MEMO: &str = "adminop";

/// Default account of the pool itself.
pub const POOL_ACCOUNT: &str = "pool.joker";
/// Default recipient of fees and reserve income.
pub const FEE_ACCOUNT: &str = "fee.joker";
/// Default relay that forwards staking transfers.
pub const RELAY_ACCOUNT: &str = "stake.joker";
/// Default root of the privileged system accounts.
pub const SYSTEM_ACCOUNT: &str = "eosio";

pub const BASE_SYMBOL: &str = "EOS";
pub const REWARD_SYMBOL: &str = "JOKER";
pub const RESERVE_SYMBOL: &str = "REX";
