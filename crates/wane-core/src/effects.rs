//! Side effects an operation asks the host to perform once it commits.

use serde::{Deserialize, Serialize};

use crate::account::AccountName;
use crate::asset::{Asset, Denomination};

/// An outbound transfer from the pool account.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub from: AccountName,
    pub to: AccountName,
    pub quantity: Asset,
    pub memo: String,
}

/// One side effect, in the order it must be applied.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    Transfer(Transfer),
    /// Convert base asset into reserve units.
    BuyReserve { payment: Asset, units: Asset },
    /// Convert reserve units back into base asset.
    SellReserve { units: Asset, proceeds: Asset },
}

/// Ordered effect list built up by one operation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Effects {
    from: AccountName,
    items: Vec<Effect>,
}

impl Effects {
    /// Effect list for transfers sent from `pool`.
    pub fn new(pool: AccountName) -> Self {
        Self {
            from: pool,
            items: Vec::new(),
        }
    }

    /// Queue a transfer of `amount` units of `denomination`. Zero amounts
    /// are dropped.
    pub fn transfer(
        &mut self,
        to: &AccountName,
        denomination: &Denomination,
        amount: u64,
        memo: impl Into<String>,
    ) {
        if amount == 0 {
            return;
        }
        self.items.push(Effect::Transfer(Transfer {
            from: self.from.clone(),
            to: to.clone(),
            quantity: denomination.amount(amount),
            memo: memo.into(),
        }));
    }

    pub fn push(&mut self, effect: Effect) {
        self.items.push(effect);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.items.iter()
    }

    /// Only the transfers, in order.
    pub fn transfers(&self) -> impl Iterator<Item = &Transfer> {
        self.items.iter().filter_map(|e| match e {
            Effect::Transfer(t) => Some(t),
            _ => None,
        })
    }

    pub fn into_vec(self) -> Vec<Effect> {
        self.items
    }
}
