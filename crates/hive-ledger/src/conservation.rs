//! Money conservation check for the ledger.
//!
//! Replays the money journal from the opening state and compares the result
//! with live balances. Two things must hold:
//!
//! ```text
//! for every party P: opening(P) + credits(P) - debits(P) == balance(P)
//! sum(account balances) + bank reserves == opening supply + minted
//! ```
//!
//! The opening state is a [`Checkpoint`]. Compacting the ledger folds the
//! journal into a new checkpoint so replay cost stays bounded.
//!
//! The first catches a balance mutated without a journal entry, the second
//! catches money credited without a matching debit. A violation produces a
//! [`LedgerAnomaly`].

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;

use hive_types::ObjectId;

use crate::LedgerAnomaly;
use crate::account::Account;
use crate::bank::Bank;
use crate::ledger::{EntrySide, MoneyEntry, Party};

/// Outcome of a conservation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConservationResult {
    /// Journal and balances agree.
    Balanced,
    /// One or more balances drifted from the journal.
    Anomaly(LedgerAnomaly),
}

/// Replay baseline: balances and total supply as of the last compaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checkpoint {
    /// Balance of every party with a non-zero balance.
    pub balances: BTreeMap<Party, Decimal>,
    /// Money in existence: account balances plus bank reserves.
    pub supply: Decimal,
}

impl Checkpoint {
    /// Baseline of a fresh ledger whose bank holds `reserves`.
    pub fn opening(reserves: Decimal) -> Self {
        let mut balances = BTreeMap::new();
        if !reserves.is_zero() {
            balances.insert(Party::Bank, reserves);
        }
        Self {
            balances,
            supply: reserves,
        }
    }

    /// Fold `journal` into a new baseline. `None` on overflow.
    pub fn advance(&self, journal: &[MoneyEntry]) -> Option<Self> {
        let (mut balances, minted) = replay(self, journal)?;
        balances.retain(|_, balance| !balance.is_zero());
        Some(Self {
            balances,
            supply: self.supply.checked_add(minted)?,
        })
    }
}

/// Balances after `journal`, and the money minted along the way.
fn replay(
    opening: &Checkpoint,
    journal: &[MoneyEntry],
) -> Option<(BTreeMap<Party, Decimal>, Decimal)> {
    let mut replayed = opening.balances.clone();
    let mut minted = Decimal::ZERO;

    for entry in journal {
        let balance = replayed.entry(entry.party).or_insert(Decimal::ZERO);
        *balance = match entry.side {
            EntrySide::Credit => balance.checked_add(entry.amount)?,
            EntrySide::Debit => balance.checked_sub(entry.amount)?,
        };
        if entry.side == EntrySide::Credit && entry.counterpart == Party::Mint {
            minted = minted.checked_add(entry.amount)?;
        }
    }
    Some((replayed, minted))
}

/// Verify the journal, replayed from `opening`, against live account
/// balances and bank reserves.
pub fn verify_conservation(
    tick: u64,
    journal: &[MoneyEntry],
    accounts: &BTreeMap<ObjectId, Account>,
    bank: &Bank,
    opening: &Checkpoint,
) -> ConservationResult {
    let Some((replayed, minted)) = replay(opening, journal) else {
        return overflow_anomaly(tick);
    };

    let parties: BTreeSet<Party> = replayed
        .keys()
        .copied()
        .chain(accounts.keys().map(|id| Party::Account(*id)))
        .chain(std::iter::once(Party::Bank))
        .collect();

    let mut mismatches: BTreeMap<Party, (Decimal, Decimal)> = BTreeMap::new();
    let mut supply = Decimal::ZERO;

    for party in parties {
        let actual = match party {
            Party::Account(id) => accounts
                .get(&id)
                .map_or(Decimal::ZERO, Account::balance),
            Party::Bank => bank.reserves(),
            // Mint balances are never tracked.
            Party::Mint => continue,
        };
        let expected = replayed.get(&party).copied().unwrap_or(Decimal::ZERO);
        if expected != actual {
            mismatches.insert(party, (expected, actual));
        }
        supply = match supply.checked_add(actual) {
            Some(val) => val,
            None => return overflow_anomaly(tick),
        };
    }

    let expected_supply = opening.supply.saturating_add(minted);
    let supply_drift = (supply != expected_supply).then_some((expected_supply, supply));

    if mismatches.is_empty() && supply_drift.is_none() {
        return ConservationResult::Balanced;
    }

    let count = mismatches.len();
    ConservationResult::Anomaly(LedgerAnomaly {
        tick,
        mismatches,
        supply: supply_drift,
        message: format!(
            "LEDGER_ANOMALY at tick {tick}: {count} balance(s) disagree with the journal, supply drift: {}",
            supply_drift.is_some()
        ),
    })
}

/// Construct an anomaly result for arithmetic overflow during replay.
fn overflow_anomaly(tick: u64) -> ConservationResult {
    ConservationResult::Anomaly(LedgerAnomaly {
        tick,
        mismatches: BTreeMap::new(),
        supply: None,
        message: format!("LEDGER_ANOMALY at tick {tick}: arithmetic overflow during replay"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::{BankSnapshot, LendingPolicy};
    use crate::ledger::{Ledger, MoneyKind};

    #[test]
    fn empty_ledger_is_balanced() {
        let ledger = Ledger::default();
        assert_eq!(ledger.verify_conservation(), ConservationResult::Balanced);
    }

    #[test]
    fn one_sided_credit_is_flagged() {
        let mut ledger = Ledger::default();
        let a = ObjectId::new();
        let b = ObjectId::new();
        ledger.grant(a, Decimal::new(10, 0));
        // Credit without a matching debit creates money.
        ledger.money_in(b, Party::Account(a), Decimal::new(5, 0), MoneyKind::Cash);

        let result = ledger.verify_conservation();
        assert!(matches!(
            result,
            ConservationResult::Anomaly(LedgerAnomaly { supply: Some(_), .. })
        ));
    }

    #[test]
    fn paired_movement_is_balanced() {
        let mut ledger = Ledger::default();
        let a = ObjectId::new();
        let b = ObjectId::new();
        ledger.grant(a, Decimal::new(10, 0));
        assert!(ledger.money_out(a, Party::Account(b), Decimal::new(4, 0), false));
        ledger.money_in(b, Party::Account(a), Decimal::new(4, 0), MoneyKind::Cash);
        assert_eq!(ledger.verify_conservation(), ConservationResult::Balanced);
    }

    #[test]
    fn restored_bank_starts_balanced() {
        let mut books = BTreeMap::new();
        books.insert(ObjectId::new(), Decimal::new(50, 0));
        let snapshot = BankSnapshot {
            account_books: books,
            reserves: Decimal::new(-50, 0),
        };
        let ledger = Ledger::restore(snapshot, LendingPolicy::Unlimited);
        assert_eq!(ledger.verify_conservation(), ConservationResult::Balanced);
    }

    #[test]
    fn journal_mismatch_is_flagged() {
        let mut accounts = BTreeMap::new();
        let id = ObjectId::new();
        accounts.insert(id, Account::new(id));
        let bank = Bank::new(LendingPolicy::Unlimited);
        let journal = vec![MoneyEntry {
            tick: 1,
            party: Party::Account(id),
            counterpart: Party::Mint,
            side: EntrySide::Credit,
            amount: Decimal::new(3, 0),
            transaction: None,
            recorded_at: chrono::Utc::now(),
        }];

        let result = verify_conservation(1, &journal, &accounts, &bank, &Checkpoint::default());
        assert!(matches!(
            result,
            ConservationResult::Anomaly(LedgerAnomaly { ref mismatches, .. })
                if mismatches.contains_key(&Party::Account(id))
        ));
    }
}
