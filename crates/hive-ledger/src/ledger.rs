//! The ledger: accounts, bank, transactions, and the money journal.
//!
//! The [`Ledger`] is the single owner of every [`Account`] (created lazily
//! on first access), the [`Bank`], and all live [`Transaction`]s. Every
//! money movement appends one [`MoneyEntry`] per side to the journal so
//! the balances can be replayed and checked by [`crate::conservation`].
//!
//! # Money movement rules
//!
//! - `money_in` credits cash or borrowed money and, for cash, immediately
//!   repays any outstanding loan with what the account now holds.
//! - `money_out` drains cash first, then borrowed money. A shortfall is
//!   borrowed from the bank. When the bank refuses, a non-absolute payment
//!   fails and an absolute payment is forced through as a bankruptcy.
//! - Repayment drains borrowed money first, then cash, capped at the debt.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use hive_types::{ObjectId, TransactionId};

use crate::account::{Account, Role};
use crate::bank::{Bank, BankSnapshot, LendingPolicy};
use crate::conservation::{Checkpoint, ConservationResult, verify_conservation};
use crate::transaction::{Transaction, TransactionState};

// ---------------------------------------------------------------------------
// Journal types
// ---------------------------------------------------------------------------

/// A holder of money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Party {
    /// A game object's account.
    Account(ObjectId),
    /// The colony bank.
    Bank,
    /// Money entering circulation through grants.
    Mint,
}

impl core::fmt::Display for Party {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Account(id) => write!(f, "account {id}"),
            Self::Bank => f.write_str("bank"),
            Self::Mint => f.write_str("mint"),
        }
    }
}

/// Bucket credited by `money_in`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoneyKind {
    /// Own money.
    Cash,
    /// Money lent by the bank.
    Borrowed,
}

/// Direction of a journal entry from the point of view of `party`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySide {
    /// `party` gained money.
    Credit,
    /// `party` lost money.
    Debit,
}

/// One side of a money movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyEntry {
    /// Tick on which the movement happened.
    pub tick: u64,
    /// Party whose balance changed.
    pub party: Party,
    /// The other side of the movement.
    pub counterpart: Party,
    /// Whether `party` gained or lost.
    pub side: EntrySide,
    /// Positive amount moved.
    pub amount: Decimal,
    /// Transaction being settled, if any.
    pub transaction: Option<TransactionId>,
    /// Wall-clock time of recording.
    pub recorded_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Owner of all colony money.
#[derive(Debug, Clone)]
pub struct Ledger {
    accounts: BTreeMap<ObjectId, Account>,
    bank: Bank,
    transactions: BTreeMap<TransactionId, Transaction>,
    journal: Vec<MoneyEntry>,
    /// Baseline the journal is replayed from.
    checkpoint: Checkpoint,
    tick: u64,
}

impl Ledger {
    /// Create an empty ledger with a fresh bank.
    pub fn new(policy: LendingPolicy) -> Self {
        Self::with_bank(Bank::new(policy))
    }

    /// Create an empty ledger around an existing bank.
    pub fn with_bank(bank: Bank) -> Self {
        let checkpoint = Checkpoint::opening(bank.reserves());
        Self {
            accounts: BTreeMap::new(),
            bank,
            transactions: BTreeMap::new(),
            journal: Vec::new(),
            checkpoint,
            tick: 0,
        }
    }

    /// Create a ledger whose bank is restored from a snapshot.
    pub fn restore(snapshot: BankSnapshot, policy: LendingPolicy) -> Self {
        Self::with_bank(Bank::restore(snapshot, policy))
    }

    /// Set the tick stamped on subsequent journal entries.
    pub const fn begin_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    /// Current tick.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// The bank.
    pub const fn bank(&self) -> &Bank {
        &self.bank
    }

    /// Serializable bank state.
    pub fn bank_snapshot(&self) -> BankSnapshot {
        self.bank.snapshot()
    }

    /// Journal entries since the last compaction, in recording order.
    pub fn journal(&self) -> &[MoneyEntry] {
        &self.journal
    }

    /// An account, if it has been touched.
    pub fn account(&self, id: ObjectId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    /// An account, created on first access.
    pub fn account_mut(&mut self, id: ObjectId) -> &mut Account {
        self.accounts.entry(id).or_insert_with(|| Account::new(id))
    }

    /// Iterate over all accounts.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// `cash + borrowed` of an object, zero if it has no account.
    pub fn balance(&self, id: ObjectId) -> Decimal {
        self.accounts
            .get(&id)
            .map_or(Decimal::ZERO, Account::balance)
    }

    // -----------------------------------------------------------------------
    // Money movement
    // -----------------------------------------------------------------------

    /// Mint new money into an account as cash.
    pub fn grant(&mut self, id: ObjectId, amount: Decimal) {
        self.money_in(id, Party::Mint, amount, MoneyKind::Cash);
    }

    /// Credit an account. Always succeeds.
    ///
    /// Only a [`MoneyKind::Cash`] credit triggers automatic loan repayment.
    /// A [`MoneyKind::Borrowed`] credit is money the account just owes; repaying
    /// from it would hand the loan straight back to the bank.
    pub fn money_in(&mut self, id: ObjectId, giver: Party, amount: Decimal, kind: MoneyKind) {
        self.credit(id, giver, amount, kind, None);
    }

    /// Debit an account, borrowing any shortfall.
    ///
    /// Returns `false` only when the bank refuses the shortfall and
    /// `is_absolute` is unset. An absolute payment always goes through.
    pub fn money_out(
        &mut self,
        id: ObjectId,
        receiver: Party,
        amount: Decimal,
        is_absolute: bool,
    ) -> bool {
        self.debit(id, receiver, amount, is_absolute, None)
    }

    /// Ask the bank for a loan. Returns whether it was granted.
    pub fn borrow(&mut self, id: ObjectId, amount: Decimal) -> bool {
        if amount <= Decimal::ZERO {
            return true;
        }
        if !self.bank.may_lend(id, amount) {
            warn!(
                tick = self.tick,
                account = %id,
                amount = %amount,
                outstanding = %self.bank.outstanding(id),
                "loan refused"
            );
            return false;
        }
        self.lend(id, amount);
        true
    }

    /// Repay up to `amount` of an object's loan from its balance. Returns
    /// the amount repaid.
    pub fn pay_back(&mut self, id: ObjectId, amount: Decimal) -> Decimal {
        let payable = amount
            .min(self.bank.outstanding(id))
            .min(self.balance(id));
        if payable <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        self.account_mut(id).debit_borrowed_first(payable);
        self.record(Party::Account(id), Party::Bank, EntrySide::Debit, payable, None);
        let paid = self.bank.repay(id, payable);
        self.record(Party::Bank, Party::Account(id), EntrySide::Credit, paid, None);

        debug!(
            tick = self.tick,
            account = %id,
            amount = %paid,
            outstanding = %self.bank.outstanding(id),
            "loan repaid"
        );
        paid
    }

    fn credit(
        &mut self,
        id: ObjectId,
        giver: Party,
        amount: Decimal,
        kind: MoneyKind,
        transaction: Option<TransactionId>,
    ) {
        if amount <= Decimal::ZERO {
            return;
        }
        let account = self.account_mut(id);
        match kind {
            MoneyKind::Cash => account.credit_cash(amount),
            MoneyKind::Borrowed => account.credit_borrowed(amount),
        }
        self.record(Party::Account(id), giver, EntrySide::Credit, amount, transaction);

        debug!(
            tick = self.tick,
            account = %id,
            giver = %giver,
            amount = %amount,
            kind = ?kind,
            "money in"
        );

        if kind == MoneyKind::Cash {
            let balance = self.balance(id);
            self.pay_back(id, balance);
        }
    }

    fn debit(
        &mut self,
        id: ObjectId,
        receiver: Party,
        amount: Decimal,
        is_absolute: bool,
        transaction: Option<TransactionId>,
    ) -> bool {
        if amount <= Decimal::ZERO {
            return true;
        }

        let available = self.balance(id);
        if available < amount {
            let shortfall = amount.saturating_sub(available);
            if !self.borrow(id, shortfall) {
                if !is_absolute {
                    return false;
                }
                error!(
                    tick = self.tick,
                    account = %id,
                    receiver = %receiver,
                    amount = %amount,
                    shortfall = %shortfall,
                    "bankruptcy: absolute payment exceeds funds and credit"
                );
                self.lend(id, shortfall);
            }
        }

        self.account_mut(id).debit_cash_first(amount);
        self.record(Party::Account(id), receiver, EntrySide::Debit, amount, transaction);

        debug!(
            tick = self.tick,
            account = %id,
            receiver = %receiver,
            amount = %amount,
            "money out"
        );
        true
    }

    /// Book a loan regardless of policy.
    fn lend(&mut self, id: ObjectId, amount: Decimal) {
        self.bank.lend(id, amount);
        self.record(Party::Bank, Party::Account(id), EntrySide::Debit, amount, None);
        self.account_mut(id).credit_borrowed(amount);
        self.record(Party::Account(id), Party::Bank, EntrySide::Credit, amount, None);
        debug!(
            tick = self.tick,
            account = %id,
            amount = %amount,
            outstanding = %self.bank.outstanding(id),
            "loan granted"
        );
    }

    fn record(
        &mut self,
        party: Party,
        counterpart: Party,
        side: EntrySide,
        amount: Decimal,
        transaction: Option<TransactionId>,
    ) {
        self.journal.push(MoneyEntry {
            tick: self.tick,
            party,
            counterpart,
            side,
            amount,
            transaction,
            recorded_at: Utc::now(),
        });
    }

    // -----------------------------------------------------------------------
    // Transactions
    // -----------------------------------------------------------------------

    /// Track a new transaction. It starts in
    /// [`TransactionState::WaitingForConfirm`].
    pub fn open(&mut self, mut transaction: Transaction) -> TransactionId {
        let id = transaction.id;
        transaction.state = TransactionState::WaitingForConfirm;
        debug!(
            tick = self.tick,
            transaction = %id,
            buyer = %transaction.buyer,
            seller = %transaction.seller,
            amount = transaction.amount(),
            "transaction opened"
        );
        self.transactions.insert(id, transaction);
        id
    }

    /// Look up a transaction.
    pub fn transaction(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.get(&id)
    }

    /// State of a transaction, `None` if unknown or pruned.
    pub fn state(&self, id: TransactionId) -> Option<TransactionState> {
        self.transactions.get(&id).map(|t| t.state)
    }

    /// Iterate over all tracked transactions.
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.values()
    }

    /// Confirm a waiting transaction against the seller's `available`
    /// stock. On success the transaction becomes working and is indexed in
    /// both accounts.
    pub fn confirm(&mut self, id: TransactionId, available: u32) -> bool {
        let Some(tx) = self.transactions.get_mut(&id) else {
            return false;
        };
        if tx.state != TransactionState::WaitingForConfirm || available < tx.amount() {
            return false;
        }
        tx.state = TransactionState::Working;
        let (buyer, seller, kind) = (tx.buyer, tx.seller, tx.description.kind());

        self.account_mut(buyer).make(Role::Buyer, seller, kind, id);
        self.account_mut(seller).make(Role::Seller, buyer, kind, id);
        debug!(tick = self.tick, transaction = %id, "transaction confirmed");
        true
    }

    /// Settle a waiting transaction on the spot and hand it to a fast-path
    /// transfer mechanism. It becomes [`TransactionState::Delegated`] and is
    /// never tracked through `done`/`cancel`.
    pub fn delegate(&mut self, id: TransactionId, available: u32) -> bool {
        let Some(tx) = self.transactions.get_mut(&id) else {
            return false;
        };
        if tx.state != TransactionState::WaitingForConfirm || available < tx.amount() {
            return false;
        }
        tx.state = TransactionState::Delegated;
        let (buyer, seller, money) = (tx.buyer, tx.seller, tx.money);

        self.settle(id, buyer, seller, money);
        debug!(tick = self.tick, transaction = %id, "transaction delegated");
        true
    }

    /// Complete a working transaction: the buyer pays the seller. Returns
    /// `false` in any other state.
    pub fn done(&mut self, id: TransactionId) -> bool {
        let Some(tx) = self.transactions.get_mut(&id) else {
            return false;
        };
        if tx.state != TransactionState::Working {
            return false;
        }
        tx.state = TransactionState::Dead;
        let (buyer, seller, money, kind) = (tx.buyer, tx.seller, tx.money, tx.description.kind());

        self.account_mut(buyer).dealt(Role::Buyer, seller, kind, id);
        self.account_mut(seller).dealt(Role::Seller, buyer, kind, id);
        self.settle(id, buyer, seller, money);
        debug!(tick = self.tick, transaction = %id, money = %money, "transaction done");
        true
    }

    /// Cancel a transaction. Free while waiting for confirmation; once
    /// working, the buyer pays the cancel fee to the bank. Returns `false`
    /// for terminal transactions.
    pub fn cancel(&mut self, id: TransactionId) -> bool {
        let Some(tx) = self.transactions.get_mut(&id) else {
            return false;
        };
        let previous = tx.state;
        if previous.is_terminal() {
            return false;
        }
        tx.state = TransactionState::Dead;
        let (buyer, seller, fee, kind) = (tx.buyer, tx.seller, tx.fee(), tx.description.kind());

        if previous == TransactionState::Working {
            self.account_mut(buyer).dealt(Role::Buyer, seller, kind, id);
            self.account_mut(seller).dealt(Role::Seller, buyer, kind, id);
            if self.debit(buyer, Party::Bank, fee, false, Some(id)) && fee > Decimal::ZERO {
                self.bank.collect(fee);
                self.record(Party::Bank, Party::Account(buyer), EntrySide::Credit, fee, Some(id));
            }
        }
        debug!(
            tick = self.tick,
            transaction = %id,
            was = ?previous,
            "transaction cancelled"
        );
        true
    }

    /// Drop terminal transactions. Returns how many were removed.
    pub fn prune_settled(&mut self) -> usize {
        let before = self.transactions.len();
        self.transactions.retain(|_, t| !t.state.is_terminal());
        before.saturating_sub(self.transactions.len())
    }

    fn settle(&mut self, id: TransactionId, buyer: ObjectId, seller: ObjectId, money: Decimal) {
        self.debit(buyer, Party::Account(seller), money, true, Some(id));
        self.credit(seller, Party::Account(buyer), money, MoneyKind::Cash, Some(id));
    }

    // -----------------------------------------------------------------------
    // Verification
    // -----------------------------------------------------------------------

    /// Replay the journal against live balances.
    pub fn verify_conservation(&self) -> ConservationResult {
        verify_conservation(
            self.tick,
            &self.journal,
            &self.accounts,
            &self.bank,
            &self.checkpoint,
        )
    }

    /// Fold the journal into the replay baseline and clear it.
    ///
    /// Only a balanced journal is folded; on an anomaly the entries are kept
    /// so the drift stays visible. Returns the check that gated the fold.
    pub fn compact_journal(&mut self) -> ConservationResult {
        let result = self.verify_conservation();
        if result != ConservationResult::Balanced {
            return result;
        }
        if let Some(next) = self.checkpoint.advance(&self.journal) {
            debug!(tick = self.tick, folded = self.journal.len(), "money journal compacted");
            self.checkpoint = next;
            self.journal.clear();
        }
        result
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(LendingPolicy::Unlimited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TransactionBuilder;
    use hive_types::ResourceType;

    fn open(ledger: &mut Ledger, buyer: ObjectId, seller: ObjectId, money: i64) -> TransactionId {
        let tx = TransactionBuilder::new(buyer, seller)
            .resource(ResourceType::Energy, 50)
            .money(Decimal::new(money, 0))
            .cancel_fee(Decimal::new(5, 1))
            .build();
        assert!(tx.is_ok());
        match tx {
            Ok(tx) => ledger.open(tx),
            Err(_) => TransactionId::new(),
        }
    }

    #[test]
    fn done_moves_money_from_buyer_to_seller() {
        let mut ledger = Ledger::default();
        let buyer = ObjectId::new();
        let seller = ObjectId::new();
        ledger.grant(buyer, Decimal::new(100, 0));

        let id = open(&mut ledger, buyer, seller, 30);
        assert!(ledger.confirm(id, 50));
        assert!(ledger.done(id));

        assert_eq!(ledger.balance(buyer), Decimal::new(70, 0));
        assert_eq!(
            ledger.account(seller).map(Account::cash),
            Some(Decimal::new(30, 0))
        );
        assert_eq!(ledger.verify_conservation(), ConservationResult::Balanced);
    }

    #[test]
    fn done_and_cancel_are_noops_once_dead() {
        let mut ledger = Ledger::default();
        let buyer = ObjectId::new();
        let seller = ObjectId::new();
        ledger.grant(buyer, Decimal::new(100, 0));

        let id = open(&mut ledger, buyer, seller, 30);
        assert!(ledger.confirm(id, 50));
        assert!(ledger.done(id));
        assert!(!ledger.done(id));
        assert!(!ledger.cancel(id));
        assert!(!ledger.confirm(id, 50));
        assert_eq!(ledger.balance(seller), Decimal::new(30, 0));
    }

    #[test]
    fn confirm_requires_waiting_state_and_stock() {
        let mut ledger = Ledger::default();
        let buyer = ObjectId::new();
        let seller = ObjectId::new();

        let id = open(&mut ledger, buyer, seller, 10);
        assert!(!ledger.confirm(id, 49));
        assert_eq!(ledger.state(id), Some(TransactionState::WaitingForConfirm));
        assert!(ledger.confirm(id, 50));
        assert!(!ledger.confirm(id, 50));
        assert_eq!(
            ledger
                .account(buyer)
                .map(|a| a.transactions_with(Role::Buyer, seller).len()),
            Some(1)
        );
    }

    #[test]
    fn cancel_waiting_is_free() {
        let mut ledger = Ledger::default();
        let buyer = ObjectId::new();
        let seller = ObjectId::new();
        ledger.grant(buyer, Decimal::new(100, 0));

        let id = open(&mut ledger, buyer, seller, 40);
        assert!(ledger.cancel(id));
        assert_eq!(ledger.balance(buyer), Decimal::new(100, 0));
        assert_eq!(ledger.bank().reserves(), Decimal::ZERO);
    }

    #[test]
    fn cancel_working_pays_fee_to_bank() {
        let mut ledger = Ledger::default();
        let buyer = ObjectId::new();
        let seller = ObjectId::new();
        ledger.grant(buyer, Decimal::new(100, 0));

        let id = open(&mut ledger, buyer, seller, 40);
        assert!(ledger.confirm(id, 50));
        assert!(ledger.cancel(id));
        assert_eq!(ledger.balance(buyer), Decimal::new(80, 0));
        assert_eq!(ledger.bank().reserves(), Decimal::new(20, 0));
        assert!(
            ledger
                .account(buyer)
                .is_some_and(|a| a.transactions_with(Role::Buyer, seller).is_empty())
        );
        assert_eq!(ledger.verify_conservation(), ConservationResult::Balanced);
    }

    #[test]
    fn shortfall_is_borrowed_and_repaid_on_cash_in() {
        let mut ledger = Ledger::default();
        let buyer = ObjectId::new();
        let seller = ObjectId::new();
        ledger.grant(buyer, Decimal::new(10, 0));

        let id = open(&mut ledger, buyer, seller, 25);
        assert!(ledger.confirm(id, 50));
        assert!(ledger.done(id));
        assert_eq!(ledger.balance(buyer), Decimal::ZERO);
        assert_eq!(ledger.bank().outstanding(buyer), Decimal::new(15, 0));

        ledger.grant(buyer, Decimal::new(20, 0));
        assert_eq!(ledger.bank().outstanding(buyer), Decimal::ZERO);
        assert_eq!(ledger.balance(buyer), Decimal::new(5, 0));
        assert_eq!(ledger.verify_conservation(), ConservationResult::Balanced);
    }

    #[test]
    fn refused_loan_fails_non_absolute_payment() {
        let mut ledger = Ledger::new(LendingPolicy::Ceiling(Decimal::new(5, 0)));
        let payer = ObjectId::new();
        ledger.grant(payer, Decimal::new(10, 0));

        assert!(!ledger.money_out(payer, Party::Bank, Decimal::new(20, 0), false));
        assert_eq!(ledger.balance(payer), Decimal::new(10, 0));
        assert!(ledger.money_out(payer, Party::Bank, Decimal::new(14, 0), false));
        assert_eq!(ledger.bank().outstanding(payer), Decimal::new(4, 0));
    }

    #[test]
    fn absolute_payment_goes_through_bankruptcy() {
        let mut ledger = Ledger::new(LendingPolicy::Ceiling(Decimal::ZERO));
        let buyer = ObjectId::new();
        let seller = ObjectId::new();

        let id = open(&mut ledger, buyer, seller, 30);
        assert!(ledger.confirm(id, 50));
        assert!(ledger.done(id));
        assert_eq!(ledger.balance(seller), Decimal::new(30, 0));
        assert_eq!(ledger.bank().outstanding(buyer), Decimal::new(30, 0));
        assert_eq!(ledger.verify_conservation(), ConservationResult::Balanced);
    }

    #[test]
    fn delegated_transaction_is_paid_once() {
        let mut ledger = Ledger::default();
        let buyer = ObjectId::new();
        let seller = ObjectId::new();
        ledger.grant(buyer, Decimal::new(50, 0));

        let id = open(&mut ledger, buyer, seller, 20);
        assert!(ledger.delegate(id, 50));
        assert_eq!(ledger.state(id), Some(TransactionState::Delegated));
        assert!(!ledger.done(id));
        assert!(!ledger.cancel(id));
        assert_eq!(ledger.balance(seller), Decimal::new(20, 0));
        assert_eq!(ledger.prune_settled(), 1);
        assert!(ledger.transaction(id).is_none());
    }

    #[test]
    fn journal_entries_carry_tick() {
        let mut ledger = Ledger::default();
        ledger.begin_tick(42);
        ledger.grant(ObjectId::new(), Decimal::new(1, 0));
        assert_eq!(ledger.journal().len(), 1);
        assert!(ledger.journal().iter().all(|e| e.tick == 42));
    }

    #[test]
    fn compaction_folds_the_journal_and_keeps_the_books() {
        let mut ledger = Ledger::default();
        let buyer = ObjectId::new();
        let seller = ObjectId::new();
        ledger.grant(buyer, Decimal::new(100, 0));
        let first = open(&mut ledger, buyer, seller, 30);
        assert!(ledger.confirm(first, 50));
        assert!(ledger.done(first));
        assert!(!ledger.journal().is_empty());

        assert_eq!(ledger.compact_journal(), ConservationResult::Balanced);
        assert!(ledger.journal().is_empty());
        assert_eq!(ledger.balance(seller), Decimal::new(30, 0));

        let second = open(&mut ledger, buyer, seller, 20);
        assert!(ledger.confirm(second, 50));
        assert!(ledger.done(second));
        ledger.grant(seller, Decimal::new(5, 0));
        assert_eq!(ledger.verify_conservation(), ConservationResult::Balanced);
        assert_eq!(ledger.compact_journal(), ConservationResult::Balanced);
        assert_eq!(ledger.verify_conservation(), ConservationResult::Balanced);
        assert_eq!(ledger.balance(buyer), Decimal::new(50, 0));
    }

    #[test]
    fn only_cash_credits_repay_loans() {
        let mut ledger = Ledger::default();
        let id = ObjectId::new();
        assert!(ledger.money_out(id, Party::Bank, Decimal::new(10, 0), false));
        assert_eq!(ledger.bank().outstanding(id), Decimal::new(10, 0));

        ledger.money_in(id, Party::Bank, Decimal::new(4, 0), MoneyKind::Borrowed);
        assert_eq!(ledger.bank().outstanding(id), Decimal::new(10, 0));

        ledger.grant(id, Decimal::new(6, 0));
        assert_eq!(ledger.bank().outstanding(id), Decimal::ZERO);
    }

    #[test]
    fn unbalanced_journal_is_not_compacted() {
        let mut ledger = Ledger::default();
        let a = ObjectId::new();
        let b = ObjectId::new();
        ledger.grant(a, Decimal::new(10, 0));
        ledger.money_in(b, Party::Account(a), Decimal::new(5, 0), MoneyKind::Cash);
        let entries = ledger.journal().len();

        assert!(matches!(ledger.compact_journal(), ConservationResult::Anomaly(_)));
        assert_eq!(ledger.journal().len(), entries);
    }
}
