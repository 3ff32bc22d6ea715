//! Per-object money accounts.
//!
//! An [`Account`] holds two non-negative buckets, `cash` and `borrowed`,
//! and indexes the object's live transactions under the role it plays
//! (buyer or seller), by counterpart and by transaction kind. Index lists
//! are ordered and may hold duplicates.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use hive_types::{ObjectId, TransactionId};

use crate::transaction::TransactionKind;

/// Which side of a transaction an account is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Receives the resource, pays money.
    Buyer,
    /// Gives the resource, receives money.
    Seller,
}

/// Transactions indexed for one role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct RoleIndex {
    by_counterpart: BTreeMap<ObjectId, Vec<TransactionId>>,
    by_kind: BTreeMap<TransactionKind, Vec<TransactionId>>,
}

impl RoleIndex {
    fn insert(&mut self, counterpart: ObjectId, kind: TransactionKind, id: TransactionId) {
        self.by_counterpart.entry(counterpart).or_default().push(id);
        self.by_kind.entry(kind).or_default().push(id);
    }

    fn remove(&mut self, counterpart: ObjectId, kind: TransactionKind, id: TransactionId) {
        remove_first(&mut self.by_counterpart, &counterpart, id);
        remove_first(&mut self.by_kind, &kind, id);
    }
}

/// Remove the first occurrence of `id` under `key`, dropping empty lists.
fn remove_first<K: Ord>(map: &mut BTreeMap<K, Vec<TransactionId>>, key: &K, id: TransactionId) {
    if let Some(list) = map.get_mut(key) {
        if let Some(pos) = list.iter().position(|t| *t == id) {
            list.remove(pos);
        }
        if list.is_empty() {
            map.remove(key);
        }
    }
}

/// Money held by one game object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: ObjectId,
    cash: Decimal,
    borrowed: Decimal,
    as_buyer: RoleIndex,
    as_seller: RoleIndex,
}

impl Account {
    /// Create an empty account.
    pub fn new(id: ObjectId) -> Self {
        Self {
            id,
            cash: Decimal::ZERO,
            borrowed: Decimal::ZERO,
            as_buyer: RoleIndex::default(),
            as_seller: RoleIndex::default(),
        }
    }

    /// Owner of the account.
    pub const fn id(&self) -> ObjectId {
        self.id
    }

    /// Own money.
    pub const fn cash(&self) -> Decimal {
        self.cash
    }

    /// Money borrowed from the bank and not yet spent.
    pub const fn borrowed(&self) -> Decimal {
        self.borrowed
    }

    /// `cash + borrowed`.
    pub fn balance(&self) -> Decimal {
        self.cash.saturating_add(self.borrowed)
    }

    pub(crate) fn credit_cash(&mut self, amount: Decimal) {
        self.cash = self.cash.saturating_add(amount);
    }

    pub(crate) fn credit_borrowed(&mut self, amount: Decimal) {
        self.borrowed = self.borrowed.saturating_add(amount);
    }

    /// Drain `amount`, cash first. Caller guarantees the balance covers it.
    pub(crate) fn debit_cash_first(&mut self, amount: Decimal) {
        let from_cash = amount.min(self.cash);
        self.cash = self.cash.saturating_sub(from_cash);
        let rest = amount.saturating_sub(from_cash);
        self.borrowed = self.borrowed.saturating_sub(rest).max(Decimal::ZERO);
    }

    /// Drain `amount`, borrowed first. Used when repaying loans.
    pub(crate) fn debit_borrowed_first(&mut self, amount: Decimal) {
        let from_borrowed = amount.min(self.borrowed);
        self.borrowed = self.borrowed.saturating_sub(from_borrowed);
        let rest = amount.saturating_sub(from_borrowed);
        self.cash = self.cash.saturating_sub(rest).max(Decimal::ZERO);
    }

    /// Index a transaction under `role`.
    pub fn make(
        &mut self,
        role: Role,
        counterpart: ObjectId,
        kind: TransactionKind,
        id: TransactionId,
    ) {
        self.index_mut(role).insert(counterpart, kind, id);
    }

    /// Remove a transaction from the `role` index.
    pub fn dealt(
        &mut self,
        role: Role,
        counterpart: ObjectId,
        kind: TransactionKind,
        id: TransactionId,
    ) {
        self.index_mut(role).remove(counterpart, kind, id);
    }

    /// Live transactions with `counterpart` in `role`, oldest first.
    pub fn transactions_with(&self, role: Role, counterpart: ObjectId) -> &[TransactionId] {
        self.index(role)
            .by_counterpart
            .get(&counterpart)
            .map_or(&[], Vec::as_slice)
    }

    /// Live transactions of `kind` in `role`, oldest first.
    pub fn transactions_of_kind(&self, role: Role, kind: TransactionKind) -> &[TransactionId] {
        self.index(role)
            .by_kind
            .get(&kind)
            .map_or(&[], Vec::as_slice)
    }

    const fn index(&self, role: Role) -> &RoleIndex {
        match role {
            Role::Buyer => &self.as_buyer,
            Role::Seller => &self.as_seller,
        }
    }

    const fn index_mut(&mut self, role: Role) -> &mut RoleIndex {
        match role {
            Role::Buyer => &mut self.as_buyer,
            Role::Seller => &mut self.as_seller,
        }
    }
}
