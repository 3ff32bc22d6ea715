//! Money accounting for the Hive colony agent.
//!
//! Every game object that buys or sells resources owns an [`Account`] holding
//! cash and borrowed money. Resource movements between objects are paid for
//! through escrow [`Transaction`]s: opened, confirmed once the seller's stock
//! is validated, then either completed (buyer pays seller) or cancelled
//! (free before confirmation, a fee to the [`Bank`] afterwards). A transaction
//! is paid for at most once.
//!
//! # Modules
//!
//! - [`account`] -- Per-object balances and transaction indices by role.
//! - [`bank`] -- Loan books and the configurable [`LendingPolicy`].
//! - [`transaction`] -- [`Transaction`] data and the validating [`TransactionBuilder`].
//! - [`ledger`] -- The [`Ledger`] that owns accounts, bank, transactions, and the money journal.
//! - [`conservation`] -- Replay of the money journal against live balances.
//!
//! # Money Supply
//!
//! Money only enters through grants (minted) and only moves between
//! accounts and the bank. At any point:
//!
//! ```text
//! sum(account balances) + bank reserves == total minted
//! ```
//!
//! Bank reserves go negative while loans are outstanding.
//!
//! # Usage
//!
//! ```
//! use hive_ledger::{Ledger, LendingPolicy, TransactionBuilder};
//! use hive_ledger::conservation::ConservationResult;
//! use hive_types::{ObjectId, ResourceType};
//! use rust_decimal::Decimal;
//!
//! let mut ledger = Ledger::new(LendingPolicy::Unlimited);
//! let container = ObjectId::new();
//! let creep = ObjectId::new();
//! ledger.grant(creep, Decimal::new(100, 0));
//!
//! let tx = TransactionBuilder::new(creep, container)
//!     .resource(ResourceType::Energy, 50)
//!     .money(Decimal::new(10, 0))
//!     .build();
//! assert!(tx.is_ok());
//! if let Ok(tx) = tx {
//!     let id = ledger.open(tx);
//!     assert!(ledger.confirm(id, 100));
//!     assert!(ledger.done(id));
//!     assert!(!ledger.done(id));
//! }
//!
//! assert_eq!(ledger.balance(container), Decimal::new(10, 0));
//! assert_eq!(ledger.verify_conservation(), ConservationResult::Balanced);
//! ```

pub mod account;
pub mod bank;
pub mod conservation;
pub mod ledger;
pub mod transaction;

pub use account::{Account, Role};
pub use bank::{Bank, BankSnapshot, LendingPolicy};
pub use conservation::{Checkpoint, ConservationResult};
pub use ledger::{EntrySide, Ledger, MoneyEntry, MoneyKind, Party};
pub use transaction::{
    Transaction, TransactionBuilder, TransactionDescription, TransactionKind, TransactionState,
};

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use hive_types::ObjectId;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised when constructing a transaction.
///
/// Runtime shortfalls (unconfirmable stock, refused loans) are reported as
/// `bool` returns on [`Ledger`], never as errors.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Resource amount must be non-zero.
    #[error("transaction amount must be non-zero")]
    ZeroAmount,

    /// Money must not be negative.
    #[error("transaction money must not be negative, got {money}")]
    NegativeMoney {
        /// The invalid amount.
        money: Decimal,
    },

    /// Cancel fee must be a fraction in `[0, 1]`.
    #[error("cancel fee must be within [0, 1], got {fee}")]
    InvalidCancelFee {
        /// The invalid fee.
        fee: Decimal,
    },

    /// Buyer and seller are the same object.
    #[error("object {0} cannot trade with itself")]
    SelfDealing(ObjectId),

    /// A required field was not set on the builder.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// A mismatch between replayed journal balances and live balances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerAnomaly {
    /// Tick on which the check ran.
    pub tick: u64,
    /// Per-party (expected, actual) balance for every party that disagreed.
    pub mismatches: BTreeMap<Party, (Decimal, Decimal)>,
    /// Total money supply (expected, actual) when the supply itself drifted.
    pub supply: Option<(Decimal, Decimal)>,
    /// Human-readable description.
    pub message: String,
}

impl core::fmt::Display for LedgerAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}
