//! wane-cli — Command-line host for a Wane staking pool.
//!
//! Plays the role of the host ledger: feeds inbound transfers and signed
//! actions to a RocksDB-backed pool, settles the resulting reserve
//! conversions against a simulated reserve kept in the data directory, and
//! prints the outbound effects as JSON.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing::info;

use wane_core::account::AccountName;
use wane_core::asset::Asset;
use wane_core::calendar::{Timestamp, global_day};
use wane_core::effects::{Effects, Transfer};
use wane_core::reserve::YieldReserve;
use wane_core::types::PositionKey;
use wane_pool::{Pool, PoolConfig, ReserveMarket, RocksStore};

type CliPool = Pool<RocksStore, ReserveMarket>;

/// Wane staking pool command-line host.
#[derive(Parser, Debug)]
#[command(name = "wane-cli", version, about = "Time-decaying staking pool host")]
struct Cli {
    /// TOML configuration file (optional; WANE__* variables override it).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory for the pool database and reserve state.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Current time as unix seconds or RFC 3339 (default: the system clock).
    #[arg(long, global = true)]
    now: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides the config.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format ("text" or "json")
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start accepting deposits.
    Start(AdminArgs),
    /// Stop accepting deposits.
    Stop(AdminArgs),
    /// Deliver an inbound base-asset transfer to the pool.
    TransferBase(TransferArgs),
    /// Deliver an inbound reward-asset transfer to the pool.
    TransferReward(TransferArgs),
    /// Pay out a position's accrued reward.
    Harvest(PositionArgs),
    /// Redeem a position that holds no harvested reward.
    Redeem(PositionArgs),
    /// Show the caught-up global state and the reserve rates.
    Status,
    /// List an owner's positions.
    Positions(OwnerArgs),
    /// List committed snapshots.
    Snapshots(SnapshotArgs),
    /// Preview the reward a harvest would pay.
    Pending(PendingArgs),
}

#[derive(Args, Debug)]
struct AdminArgs {
    /// Signing account (default: the pool account).
    #[arg(long)]
    caller: Option<AccountName>,
}

#[derive(Args, Debug)]
struct TransferArgs {
    /// Sending account.
    #[arg(long)]
    from: AccountName,

    /// Receiving account (default: the pool account).
    #[arg(long)]
    to: Option<AccountName>,

    /// Quantity with symbol, e.g. "10.0000 EOS".
    #[arg(long)]
    quantity: Asset,

    #[arg(long, default_value = "")]
    memo: String,
}

#[derive(Args, Debug)]
struct PositionArgs {
    /// Position owner.
    #[arg(long)]
    user: AccountName,

    /// Position id.
    #[arg(long)]
    id: u64,

    /// Signing account (default: the owner).
    #[arg(long)]
    caller: Option<AccountName>,
}

#[derive(Args, Debug)]
struct OwnerArgs {
    #[arg(long)]
    owner: AccountName,
}

#[derive(Args, Debug)]
struct SnapshotArgs {
    /// First day (default: 30 days before today).
    #[arg(long)]
    from: Option<u64>,

    /// Day after the last one (default: today).
    #[arg(long)]
    to: Option<u64>,
}

#[derive(Args, Debug)]
struct PendingArgs {
    #[arg(long)]
    user: AccountName,

    #[arg(long)]
    id: u64,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run_main(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run_main(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    init_logging(level, &cli.log_format);

    let output = run(cli, config)?;
    println!("{output}");
    Ok(())
}

/// Resolve the configuration: defaults, then file and environment, then
/// command-line overrides.
fn load_config(cli: &Cli) -> Result<PoolConfig> {
    let mut config = PoolConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

/// Execute one command against the pool in `config.data_dir` and return
/// the JSON to print.
fn run(cli: Cli, config: PoolConfig) -> Result<String> {
    let now = match &cli.now {
        Some(s) => parse_now(s)?,
        None => system_now()?,
    };

    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("Failed to create directory: {}", config.data_dir.display()))?;
    let store = RocksStore::open(config.db_path()).context("Failed to open pool database")?;
    let reserve = load_reserve(&config.reserve_path(), &config)?;
    let reserve_path = config.reserve_path();
    let pool_account = config.accounts.pool.clone();
    let mut pool = Pool::new(store, reserve, config);

    let output = match cli.command {
        Commands::Start(args) => {
            let caller = args.caller.unwrap_or_else(|| pool_account.clone());
            pool.start(&caller, now)?;
            flush(&pool)?;
            json!({ "started": true })
        }
        Commands::Stop(args) => {
            let caller = args.caller.unwrap_or_else(|| pool_account.clone());
            pool.stop(&caller, now)?;
            flush(&pool)?;
            json!({ "started": false })
        }
        Commands::TransferBase(args) => {
            let transfer = inbound(args, &pool_account);
            let effects = pool.on_base_transfer(&transfer, now)?;
            settle(&mut pool, &effects, &reserve_path)?
        }
        Commands::TransferReward(args) => {
            let transfer = inbound(args, &pool_account);
            let effects = pool.on_reward_transfer(&transfer, now)?;
            settle(&mut pool, &effects, &reserve_path)?
        }
        Commands::Harvest(args) => {
            let caller = args.caller.unwrap_or_else(|| args.user.clone());
            let effects = pool.harvest(&caller, &args.user, args.id, now)?;
            settle(&mut pool, &effects, &reserve_path)?
        }
        Commands::Redeem(args) => {
            let caller = args.caller.unwrap_or_else(|| args.user.clone());
            let effects = pool.redeem(&caller, &args.user, args.id, now)?;
            settle(&mut pool, &effects, &reserve_path)?
        }
        Commands::Status => status(&pool, now)?,
        Commands::Positions(args) => {
            let positions: Vec<_> = pool
                .positions_of(&args.owner)?
                .into_iter()
                .map(|(id, p)| {
                    json!({
                        "id": id,
                        "unlock_time": wane_core::calendar::unlock_time(p.created),
                        "position": p,
                    })
                })
                .collect();
            json!(positions)
        }
        Commands::Snapshots(args) => {
            let today = global_day(now);
            let to = args.to.unwrap_or(today);
            let from = args.from.unwrap_or_else(|| to.saturating_sub(30));
            json!(pool.snapshots(from, to)?)
        }
        Commands::Pending(args) => {
            let key = PositionKey::new(args.user, args.id);
            match pool.pending_reward(&key, now)? {
                Some(reward) => json!({
                    "position": key.to_string(),
                    "reward": pool.config().denominations.reward.amount(reward).to_string(),
                }),
                None => bail!("position {key} not found"),
            }
        }
    };

    serde_json::to_string_pretty(&output).context("Failed to serialize output")
}

fn status(pool: &CliPool, now: Timestamp) -> Result<serde_json::Value> {
    let state = pool.global_state(now)?;
    let schedule = &pool.config().schedule;
    Ok(json!({
        "now": now,
        "global_day": global_day(now),
        "state": state,
        "active": schedule.is_active(state.pool_weight),
        "next_reduction_at": schedule.next_reduction_at(state.total_reward_emitted),
        "reserve": pool.reserve().rates()?,
    }))
}

fn inbound(args: TransferArgs, pool_account: &AccountName) -> Transfer {
    Transfer {
        from: args.from,
        to: args.to.unwrap_or_else(|| pool_account.clone()),
        quantity: args.quantity,
        memo: args.memo,
    }
}

/// Apply reserve conversions to the simulated reserve, persist it, and
/// render the effects.
fn settle(pool: &mut CliPool, effects: &Effects, reserve_path: &Path) -> Result<serde_json::Value> {
    pool.reserve_mut()
        .settle(effects)
        .context("Failed to settle reserve conversions")?;
    save_reserve(reserve_path, pool.reserve())?;
    flush(pool)?;
    info!(effects = effects.len(), "operation committed");
    Ok(json!(effects))
}

/// Push the committed batch out of the memtable before the process exits.
fn flush(pool: &CliPool) -> Result<()> {
    pool.store().flush().context("Failed to flush pool database")
}

fn load_reserve(path: &Path, config: &PoolConfig) -> Result<ReserveMarket> {
    if !path.exists() {
        return Ok(ReserveMarket::new(config.reserve));
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read reserve state: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid reserve state: {}", path.display()))
}

fn save_reserve(path: &Path, reserve: &ReserveMarket) -> Result<()> {
    let text = serde_json::to_string_pretty(reserve).context("Failed to serialize reserve")?;
    std::fs::write(path, text)
        .with_context(|| format!("Failed to write reserve state: {}", path.display()))
}

/// Parse `--now`: unix seconds, or an RFC 3339 timestamp.
fn parse_now(s: &str) -> Result<Timestamp> {
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(secs);
    }
    let dt = chrono::DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Invalid time (expected unix seconds or RFC 3339): {s}"))?;
    u64::try_from(dt.timestamp()).context("Time before the unix epoch")
}

fn system_now() -> Result<Timestamp> {
    u64::try_from(chrono::Utc::now().timestamp()).context("System clock before the unix epoch")
}

/// Initialize tracing/logging.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
