//! The pool engine.
//!
//! [`Pool`] owns the store and a handle on the yield reserve and exposes the
//! lifecycle entry points the host calls: the two inbound-transfer handlers,
//! [`Pool::harvest`], [`Pool::redeem`], [`Pool::start`] and [`Pool::stop`].
//!
//! Every entry point runs as one transaction:
//!
//! 1. Catch the global state up to today, staging one snapshot per day.
//! 2. Read and update at most one position against the staged ledger.
//! 3. Price reserve conversions and queue the outbound effects.
//! 4. Commit the change set in one write and return the effects.
//!
//! Any error before step 4 drops the staged writes, so a failed call leaves
//! no trace in the store and produces no effects.

use tracing::{debug, info, warn};

use wane_core::account::AccountName;
use wane_core::calendar::{self, Timestamp, global_day};
use wane_core::constants::ADMIN_MEMO;
use wane_core::effects::{Effect, Effects, Transfer};
use wane_core::error::{ConsistencyError, PoolError, PreconditionError, ValidationError};
use wane_core::memo::{RewardMemo, parse_reward_memo, parse_staking_memo};
use wane_core::pool_state::{ChangeSet, PoolStore};
use wane_core::reserve::YieldReserve;
use wane_core::types::{GlobalState, Position, PositionKey, Snapshot};
use wane_decay::{Scheduler, WeightDelta, accrue, apply_weight_delta};

use crate::config::PoolConfig;
use crate::txn::Txn;

// --- Outbound transfer memos ---

const MEMO_STAKING_FEE: &str = "staking fee";
const MEMO_REWARD: &str = "reward";
const MEMO_REDEEM: &str = "redeem";
const MEMO_RESERVE_INCOME: &str = "rex income";
const MEMO_REDEEM_FEE: &str = "redeem fee";
const MEMO_REDEEM_CHANGE: &str = "redeem change";

/// A staking pool over a store `S` and a yield reserve `R`.
pub struct Pool<S, R> {
    store: S,
    reserve: R,
    scheduler: Scheduler,
    config: PoolConfig,
}

impl<S: PoolStore, R: YieldReserve> Pool<S, R> {
    pub fn new(store: S, reserve: R, config: PoolConfig) -> Self {
        let scheduler = Scheduler::new(config.schedule);
        Self {
            store,
            reserve,
            scheduler,
            config,
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn reserve(&self) -> &R {
        &self.reserve
    }

    /// Mutable access for hosts that settle reserve effects in place.
    pub fn reserve_mut(&mut self) -> &mut R {
        &mut self.reserve
    }

    pub fn into_parts(self) -> (S, R) {
        (self.store, self.reserve)
    }

    // ------------------------------------------------------------------
    // Inbound transfers
    // ------------------------------------------------------------------

    /// Handle a base-asset transfer observed by the host.
    ///
    /// Transfers not addressed to the pool, sent by the pool itself, or sent
    /// by a system account are ignored. Transfers relayed by the staking
    /// relay are deposits; anything else is forwarded untouched to the fee
    /// account.
    pub fn on_base_transfer(
        &mut self,
        transfer: &Transfer,
        now: Timestamp,
    ) -> Result<Effects, PoolError> {
        calendar::check_timestamp(now)?;
        if self.is_ignored(transfer) {
            return Ok(self.effects());
        }
        if transfer.from != self.config.accounts.relay {
            return Ok(self.forward_stray(transfer));
        }
        self.deposit(transfer, now)
    }

    /// Handle a reward-asset transfer observed by the host.
    ///
    /// `"adminop"` top-ups are accepted without effect; `"order:<id>"`
    /// returns the harvested reward of the sender's position `id` and
    /// redeems it.
    pub fn on_reward_transfer(
        &mut self,
        transfer: &Transfer,
        now: Timestamp,
    ) -> Result<Effects, PoolError> {
        calendar::check_timestamp(now)?;
        if self.is_ignored(transfer) || transfer.memo == ADMIN_MEMO {
            return Ok(self.effects());
        }
        let payment = transfer.quantity.require(&self.config.denominations.reward)?;
        match parse_reward_memo(&transfer.memo)? {
            RewardMemo::Admin => Ok(self.effects()),
            RewardMemo::Order(id) => self.redeem_with_reward(&transfer.from, id, payment, now),
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle operations
    // ------------------------------------------------------------------

    /// Pay out the reward accrued by `user`'s position `id`.
    ///
    /// A missing position is not an error; the global catch-up still
    /// commits.
    pub fn harvest(
        &mut self,
        caller: &AccountName,
        user: &AccountName,
        id: u64,
        now: Timestamp,
    ) -> Result<Effects, PoolError> {
        authorize(caller, user)?;
        calendar::check_timestamp(now)?;
        let mut txn = Txn::new(&self.store);
        self.catch_up(&mut txn, now, WeightDelta::None)?;

        let key = PositionKey::new(user.clone(), id);
        let mut effects = self.effects();
        match txn.position(&key)? {
            None => debug!(position = %key, "harvest of unknown position"),
            Some(mut position) => {
                let accrual = accrue(&position, now, &txn)?;
                accrual.apply_to(&mut position);
                position.total_reward = position
                    .total_reward
                    .checked_add(accrual.reward)
                    .ok_or(ConsistencyError::ArithmeticOverflow)?;
                txn.put_position(key.clone(), position);
                effects.transfer(
                    user,
                    &self.config.denominations.reward,
                    accrual.reward,
                    MEMO_REWARD,
                );
                info!(
                    position = %key,
                    reward = accrual.reward,
                    mining_pool = accrual.mining_pool,
                    last_reward_day = accrual.last_reward_day,
                    "harvested"
                );
            }
        }

        let changes = txn.into_changes();
        self.commit(changes)?;
        Ok(effects)
    }

    /// Redeem a position whose harvested reward is zero, forfeiting any
    /// reward accrued since the last harvest.
    pub fn redeem(
        &mut self,
        caller: &AccountName,
        user: &AccountName,
        id: u64,
        now: Timestamp,
    ) -> Result<Effects, PoolError> {
        authorize(caller, user)?;
        calendar::check_timestamp(now)?;
        let mut txn = Txn::new(&self.store);
        let key = PositionKey::new(user.clone(), id);
        let position = txn.position(&key)?.ok_or_else(|| not_found(&key))?;
        check_unlocked(&position, now)?;
        if position.total_reward != 0 {
            return Err(PreconditionError::OutstandingReward(position.total_reward).into());
        }

        let mut effects = self.effects();
        let forfeited = self.settle_redemption(&mut txn, &key, &position, 0, now, &mut effects)?;

        let changes = txn.into_changes();
        self.commit(changes)?;
        info!(position = %key, principal = position.staking, forfeited, "redeemed");
        Ok(effects)
    }

    /// Start accepting deposits. Only the pool account may call this.
    pub fn start(&mut self, caller: &AccountName, now: Timestamp) -> Result<(), PoolError> {
        self.set_started(caller, now, true)
    }

    /// Stop accepting deposits. Harvests and redemptions keep working.
    pub fn stop(&mut self, caller: &AccountName, now: Timestamp) -> Result<(), PoolError> {
        self.set_started(caller, now, false)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The global state as it would be after catching up to `now`. Nothing
    /// is written.
    pub fn global_state(&self, now: Timestamp) -> Result<GlobalState, PoolError> {
        calendar::check_timestamp(now)?;
        let mut txn = Txn::new(&self.store);
        self.catch_up(&mut txn, now, WeightDelta::None)
    }

    pub fn position(&self, key: &PositionKey) -> Result<Option<Position>, PoolError> {
        self.store.position(key)
    }

    pub fn positions_of(&self, owner: &AccountName) -> Result<Vec<(u64, Position)>, PoolError> {
        self.store.positions_of(owner)
    }

    /// Committed snapshots with `from <= day < to`.
    pub fn snapshots(&self, from: u64, to: u64) -> Result<Vec<Snapshot>, PoolError> {
        self.store.snapshots(from, to)
    }

    /// Reward a harvest at `now` would pay, or `None` if the position does
    /// not exist. Nothing is written.
    pub fn pending_reward(
        &self,
        key: &PositionKey,
        now: Timestamp,
    ) -> Result<Option<u64>, PoolError> {
        calendar::check_timestamp(now)?;
        let mut txn = Txn::new(&self.store);
        self.catch_up(&mut txn, now, WeightDelta::None)?;
        match txn.position(key)? {
            Some(position) => Ok(Some(accrue(&position, now, &txn)?.reward)),
            None => Ok(None),
        }
    }

    /// Last locked second of a position; redeemable strictly after it.
    pub fn unlock_time(&self, key: &PositionKey) -> Result<Option<Timestamp>, PoolError> {
        Ok(self
            .store
            .position(key)?
            .map(|p| calendar::unlock_time(p.created)))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn deposit(&mut self, transfer: &Transfer, now: Timestamp) -> Result<Effects, PoolError> {
        let mut txn = Txn::new(&self.store);
        if !self.load_global(&txn, now)?.started {
            return Err(PreconditionError::NotStarted.into());
        }

        let user = parse_staking_memo(&transfer.memo)?;
        let denominations = &self.config.denominations;
        let amount = transfer.quantity.require(&denominations.base)?;
        let min = self.config.limits.min_deposit;
        if amount < min {
            return Err(ValidationError::BelowMinimum { got: amount, min }.into());
        }
        let fee = per_mille(amount, self.config.limits.deposit_fee_per_mille)?;
        let staking = amount
            .checked_sub(fee)
            .ok_or(ConsistencyError::ArithmeticOverflow)?;

        self.catch_up(&mut txn, now, WeightDelta::Add(staking))?;
        let units = self.reserve.rates()?.buy_units(staking)?;

        let id = txn.allocate_id(&user)?;
        let key = PositionKey::new(user, id);
        txn.put_position(
            key.clone(),
            Position {
                created: now,
                staking,
                mining_pool: staking,
                total_reward: 0,
                total_rex: units,
                last_reward_day: global_day(now).saturating_sub(1),
            },
        );

        let mut effects = self.effects();
        effects.push(Effect::BuyReserve {
            payment: denominations.base.amount(staking),
            units: denominations.reserve.amount(units),
        });
        effects.transfer(
            &self.config.accounts.fee,
            &denominations.base,
            fee,
            MEMO_STAKING_FEE,
        );

        let changes = txn.into_changes();
        self.commit(changes)?;
        info!(position = %key, staking, fee, units, "deposit accepted");
        Ok(effects)
    }

    fn redeem_with_reward(
        &mut self,
        owner: &AccountName,
        id: u64,
        payment: u64,
        now: Timestamp,
    ) -> Result<Effects, PoolError> {
        let mut txn = Txn::new(&self.store);
        let key = PositionKey::new(owner.clone(), id);
        let position = txn.position(&key)?.ok_or_else(|| not_found(&key))?;
        check_unlocked(&position, now)?;

        let fee = per_mille(position.total_reward, self.config.limits.redeem_fee_per_mille)?;
        let need = position
            .total_reward
            .checked_add(fee)
            .ok_or(ConsistencyError::ArithmeticOverflow)?;
        if payment < need {
            return Err(ValidationError::InsufficientPayment { have: payment, need }.into());
        }
        let change = payment - need;

        let mut effects = self.effects();
        let forfeited = self.settle_redemption(
            &mut txn,
            &key,
            &position,
            position.total_reward,
            now,
            &mut effects,
        )?;
        let reward = &self.config.denominations.reward;
        effects.transfer(&self.config.accounts.fee, reward, fee, MEMO_REDEEM_FEE);
        effects.transfer(owner, reward, change, MEMO_REDEEM_CHANGE);

        let changes = txn.into_changes();
        self.commit(changes)?;
        info!(
            position = %key,
            principal = position.staking,
            returned = position.total_reward,
            forfeited,
            fee,
            change,
            "redeemed with reward"
        );
        Ok(effects)
    }

    /// Shared tail of both redemption paths: final accrual, emission
    /// netting, weight removal, deletion and the reserve sale.
    ///
    /// `returned` is reward the owner paid back; it is netted out of the
    /// cumulative emission together with the newly accrued reward. Returns
    /// the newly accrued reward, which is never paid.
    fn settle_redemption(
        &self,
        txn: &mut Txn<'_, S>,
        key: &PositionKey,
        position: &Position,
        returned: u64,
        now: Timestamp,
        effects: &mut Effects,
    ) -> Result<u64, PoolError> {
        if position.staking == 0 {
            return Err(ConsistencyError::ZeroPrincipal.into());
        }
        if position.total_rex == 0 {
            return Err(ConsistencyError::ZeroReserveUnits.into());
        }

        let mut state = self.catch_up(txn, now, WeightDelta::None)?;
        let accrual = accrue(position, now, &*txn)?;

        let netted = returned
            .checked_add(accrual.reward)
            .ok_or(ConsistencyError::ArithmeticOverflow)?;
        state.total_reward_emitted = state.total_reward_emitted.saturating_sub(netted);
        self.scheduler.schedule().update_reward_rate(&mut state);
        apply_weight_delta(&mut state, WeightDelta::Remove(accrual.decayed_weight))?;
        txn.set_global(state);
        txn.delete_position(key.clone());

        let proceeds = self.reserve.rates()?.sell_proceeds(position.total_rex)?;
        if proceeds < position.staking {
            return Err(ConsistencyError::ReserveShortfall {
                proceeds,
                principal: position.staking,
            }
            .into());
        }

        let base = &self.config.denominations.base;
        effects.push(Effect::SellReserve {
            units: self.config.denominations.reserve.amount(position.total_rex),
            proceeds: base.amount(proceeds),
        });
        effects.transfer(&key.owner, base, position.staking, MEMO_REDEEM);
        effects.transfer(
            &self.config.accounts.fee,
            base,
            proceeds - position.staking,
            MEMO_RESERVE_INCOME,
        );
        Ok(accrual.reward)
    }

    fn set_started(
        &mut self,
        caller: &AccountName,
        now: Timestamp,
        started: bool,
    ) -> Result<(), PoolError> {
        authorize(caller, &self.config.accounts.pool)?;
        calendar::check_timestamp(now)?;
        let mut txn = Txn::new(&self.store);
        let mut state = self.load_global(&txn, now)?;
        state.started = started;
        txn.set_global(state);
        let changes = txn.into_changes();
        self.commit(changes)?;
        info!(started, "deposit acceptance changed");
        Ok(())
    }

    /// The stored global state, or a fresh one anchored at `now`.
    fn load_global(&self, txn: &Txn<'_, S>, now: Timestamp) -> Result<GlobalState, PoolError> {
        Ok(match txn.global()? {
            Some(state) => state,
            None => GlobalState::genesis(global_day(now), self.config.schedule.init_day_rewards),
        })
    }

    /// Run the scheduler up to `now`, stage its snapshots and the new global
    /// state, and return that state.
    fn catch_up(
        &self,
        txn: &mut Txn<'_, S>,
        now: Timestamp,
        delta: WeightDelta,
    ) -> Result<GlobalState, PoolError> {
        let stored = txn.global()?;
        let mut state = match &stored {
            Some(state) => state.clone(),
            None => GlobalState::genesis(global_day(now), self.config.schedule.init_day_rewards),
        };
        let snapshots = self.scheduler.advance(&mut state, global_day(now), delta)?;
        txn.append_snapshots(snapshots)?;
        if stored.as_ref() != Some(&state) {
            txn.set_global(state.clone());
        }
        Ok(state)
    }

    fn commit(&mut self, changes: ChangeSet) -> Result<(), PoolError> {
        if changes.is_empty() {
            return Ok(());
        }
        self.store.commit(changes)
    }

    fn is_ignored(&self, transfer: &Transfer) -> bool {
        let accounts = &self.config.accounts;
        transfer.from == accounts.pool
            || transfer.to != accounts.pool
            || transfer.from.is_system(&accounts.system)
    }

    fn forward_stray(&self, transfer: &Transfer) -> Effects {
        let mut effects = self.effects();
        if transfer.quantity.amount > 0 {
            effects.push(Effect::Transfer(Transfer {
                from: self.config.accounts.pool.clone(),
                to: self.config.accounts.fee.clone(),
                quantity: transfer.quantity.clone(),
                memo: transfer.memo.clone(),
            }));
        }
        warn!(
            from = %transfer.from,
            quantity = %transfer.quantity,
            "stray transfer forwarded to fee account"
        );
        effects
    }

    fn effects(&self) -> Effects {
        Effects::new(self.config.accounts.pool.clone())
    }
}

fn authorize(caller: &AccountName, required: &AccountName) -> Result<(), PreconditionError> {
    if caller != required {
        return Err(PreconditionError::Unauthorized {
            caller: caller.to_string(),
            required: required.to_string(),
        });
    }
    Ok(())
}

fn check_unlocked(position: &Position, now: Timestamp) -> Result<(), PreconditionError> {
    if !calendar::is_unlocked(position.created, now) {
        return Err(PreconditionError::StillLocked {
            unlock_at: calendar::unlock_time(position.created),
        });
    }
    Ok(())
}

fn not_found(key: &PositionKey) -> PoolError {
    PreconditionError::PositionNotFound {
        owner: key.owner.to_string(),
        id: key.id,
    }
    .into()
}

/// `amount * rate / 1000`, floored.
fn per_mille(amount: u64, rate: u64) -> Result<u64, ConsistencyError> {
    let fee = u128::from(amount) * u128::from(rate) / 1_000;
    u64::try_from(fee).map_err(|_| ConsistencyError::ArithmeticOverflow)
}
