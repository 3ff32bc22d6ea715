//! The colony bank: loan books and lending policy.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use hive_types::ObjectId;

/// Whether the bank grants a loan request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LendingPolicy {
    /// Every request is granted.
    #[default]
    Unlimited,
    /// Requests are granted while an object's outstanding debt stays at or
    /// below the ceiling.
    Ceiling(Decimal),
}

impl LendingPolicy {
    /// Build from an optional ceiling, `None` meaning unlimited.
    pub const fn from_ceiling(ceiling: Option<Decimal>) -> Self {
        match ceiling {
            Some(limit) => Self::Ceiling(limit),
            None => Self::Unlimited,
        }
    }

    /// Whether lending `amount` on top of `outstanding` is allowed.
    pub fn permits(&self, outstanding: Decimal, amount: Decimal) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Ceiling(limit) => outstanding.saturating_add(amount) <= *limit,
        }
    }
}

/// Serializable state of the bank, persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankSnapshot {
    /// Outstanding debt per object.
    pub account_books: BTreeMap<ObjectId, Decimal>,
    /// Money held by the bank. Negative while loans are outstanding.
    pub reserves: Decimal,
}

/// Lender of last resort for every account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bank {
    account_books: BTreeMap<ObjectId, Decimal>,
    reserves: Decimal,
    policy: LendingPolicy,
}

impl Bank {
    /// Create a bank with no loans.
    pub const fn new(policy: LendingPolicy) -> Self {
        Self {
            account_books: BTreeMap::new(),
            reserves: Decimal::ZERO,
            policy,
        }
    }

    /// Restore loan books from a snapshot.
    pub fn restore(snapshot: BankSnapshot, policy: LendingPolicy) -> Self {
        Self {
            account_books: snapshot.account_books,
            reserves: snapshot.reserves,
            policy,
        }
    }

    /// Capture loan books for persistence.
    pub fn snapshot(&self) -> BankSnapshot {
        BankSnapshot {
            account_books: self.account_books.clone(),
            reserves: self.reserves,
        }
    }

    /// Active lending policy.
    pub const fn policy(&self) -> LendingPolicy {
        self.policy
    }

    /// Money held by the bank.
    pub const fn reserves(&self) -> Decimal {
        self.reserves
    }

    /// Outstanding debt of an object.
    pub fn outstanding(&self, id: ObjectId) -> Decimal {
        self.account_books.get(&id).copied().unwrap_or(Decimal::ZERO)
    }

    /// Sum of all outstanding debt.
    pub fn total_outstanding(&self) -> Decimal {
        self.account_books
            .values()
            .fold(Decimal::ZERO, |acc, d| acc.saturating_add(*d))
    }

    /// Whether the policy allows lending `amount` to `id`.
    pub fn may_lend(&self, id: ObjectId, amount: Decimal) -> bool {
        self.policy.permits(self.outstanding(id), amount)
    }

    /// Book a loan. Policy is checked by the caller.
    pub(crate) fn lend(&mut self, id: ObjectId, amount: Decimal) {
        let debt = self.account_books.entry(id).or_insert(Decimal::ZERO);
        *debt = debt.saturating_add(amount);
        self.reserves = self.reserves.saturating_sub(amount);
    }

    /// Book a repayment, capped at the outstanding debt. Returns the amount
    /// actually booked.
    pub(crate) fn repay(&mut self, id: ObjectId, amount: Decimal) -> Decimal {
        let outstanding = self.outstanding(id);
        let paid = amount.min(outstanding);
        let left = outstanding.saturating_sub(paid);
        if left.is_zero() {
            self.account_books.remove(&id);
        } else {
            self.account_books.insert(id, left);
        }
        self.reserves = self.reserves.saturating_add(paid);
        paid
    }

    /// Receive a fee.
    pub(crate) fn collect(&mut self, amount: Decimal) {
        self.reserves = self.reserves.saturating_add(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceiling_limits_total_debt() {
        let policy = LendingPolicy::Ceiling(Decimal::new(100, 0));
        assert!(policy.permits(Decimal::new(60, 0), Decimal::new(40, 0)));
        assert!(!policy.permits(Decimal::new(60, 0), Decimal::new(41, 0)));
        assert!(LendingPolicy::Unlimited.permits(Decimal::MAX, Decimal::ONE));
    }

    #[test]
    fn repay_is_capped_at_debt() {
        let mut bank = Bank::new(LendingPolicy::Unlimited);
        let id = ObjectId::new();
        bank.lend(id, Decimal::new(30, 0));
        assert_eq!(bank.reserves(), Decimal::new(-30, 0));

        let paid = bank.repay(id, Decimal::new(50, 0));
        assert_eq!(paid, Decimal::new(30, 0));
        assert_eq!(bank.outstanding(id), Decimal::ZERO);
        assert_eq!(bank.reserves(), Decimal::ZERO);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut bank = Bank::new(LendingPolicy::Unlimited);
        let id = ObjectId::new();
        bank.lend(id, Decimal::new(125, 1));

        let json = serde_json::to_string(&bank.snapshot()).ok();
        assert!(json.is_some());
        let parsed: Option<BankSnapshot> =
            json.and_then(|j| serde_json::from_str(&j).ok());
        assert!(parsed.is_some());
        if let Some(snapshot) = parsed {
            let restored = Bank::restore(snapshot, LendingPolicy::Unlimited);
            assert_eq!(restored.outstanding(id), Decimal::new(125, 1));
            assert_eq!(restored, bank);
        }
    }
}
