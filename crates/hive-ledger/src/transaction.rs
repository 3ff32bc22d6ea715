//! Escrow transactions between a buyer and a seller.
//!
//! A [`Transaction`] is created in [`TransactionState::WaitingForConfirm`],
//! confirmed into [`TransactionState::Working`] once the seller's stock is
//! validated, and settled into [`TransactionState::Dead`] by either `done`
//! (buyer pays seller) or `cancel` (free before confirmation, a fee to the
//! bank afterwards). The state machine itself lives on [`Ledger`]; this
//! module defines the data and the validating [`TransactionBuilder`].
//!
//! [`Ledger`]: crate::Ledger

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use hive_types::{ObjectId, ResourceType, TransactionId};

use crate::LedgerError;

/// Lifecycle state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    /// Created, stock not yet validated. Cancelling is free.
    WaitingForConfirm,
    /// Confirmed and indexed in both accounts. Stock is reserved.
    Working,
    /// Settled or cancelled. Terminal.
    Dead,
    /// Handed to the same-room fast-path transfer queue and paid on the
    /// spot. Terminal, never reaches [`TransactionState::Dead`].
    Delegated,
}

impl TransactionState {
    /// Whether no further transition is possible.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Dead | Self::Delegated)
    }
}

/// What is being exchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransactionDescription {
    /// A quantity of a resource moving from seller to buyer.
    Resource {
        /// The resource moved.
        resource: ResourceType,
        /// Units moved.
        amount: u32,
    },
}

/// Index key for transactions of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    /// [`TransactionDescription::Resource`].
    Resource,
}

impl TransactionDescription {
    /// The index kind of this description.
    pub const fn kind(&self) -> TransactionKind {
        match self {
            Self::Resource { .. } => TransactionKind::Resource,
        }
    }
}

/// A pending or completed exchange between two game objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier.
    pub id: TransactionId,
    /// The party receiving the resource and paying money.
    pub buyer: ObjectId,
    /// The party giving the resource and receiving money.
    pub seller: ObjectId,
    /// Money owed on completion.
    pub money: Decimal,
    /// Fraction of `money` charged when a confirmed transaction is cancelled.
    pub cancel_fee: Decimal,
    /// What is exchanged.
    pub description: TransactionDescription,
    /// Current lifecycle state.
    pub state: TransactionState,
    /// Tick on which the transaction was opened.
    pub opened_at_tick: u64,
}

impl Transaction {
    /// Resource moved by this transaction.
    pub const fn resource(&self) -> ResourceType {
        match self.description {
            TransactionDescription::Resource { resource, .. } => resource,
        }
    }

    /// Units moved by this transaction.
    pub const fn amount(&self) -> u32 {
        match self.description {
            TransactionDescription::Resource { amount, .. } => amount,
        }
    }

    /// Fee charged if cancelled while working.
    pub fn fee(&self) -> Decimal {
        self.money
            .checked_mul(self.cancel_fee)
            .unwrap_or(Decimal::ZERO)
    }
}

/// Builder for validated [`Transaction`] values.
///
/// # Examples
///
/// ```
/// use hive_ledger::TransactionBuilder;
/// use hive_types::{ObjectId, ResourceType};
/// use rust_decimal::Decimal;
///
/// let tx = TransactionBuilder::new(ObjectId::new(), ObjectId::new())
///     .resource(ResourceType::Energy, 50)
///     .money(Decimal::new(5, 0))
///     .build();
///
/// assert!(tx.is_ok());
/// ```
#[derive(Debug)]
pub struct TransactionBuilder {
    buyer: ObjectId,
    seller: ObjectId,
    money: Decimal,
    cancel_fee: Decimal,
    description: Option<TransactionDescription>,
    tick: u64,
}

impl TransactionBuilder {
    /// Start building a transaction between `buyer` and `seller`.
    pub const fn new(buyer: ObjectId, seller: ObjectId) -> Self {
        Self {
            buyer,
            seller,
            money: Decimal::ZERO,
            cancel_fee: Decimal::ZERO,
            description: None,
            tick: 0,
        }
    }

    /// Describe a resource exchange.
    #[must_use]
    pub const fn resource(mut self, resource: ResourceType, amount: u32) -> Self {
        self.description = Some(TransactionDescription::Resource { resource, amount });
        self
    }

    /// Money owed on completion.
    #[must_use]
    pub const fn money(mut self, money: Decimal) -> Self {
        self.money = money;
        self
    }

    /// Fraction of the money charged on cancellation after confirmation.
    #[must_use]
    pub const fn cancel_fee(mut self, fee: Decimal) -> Self {
        self.cancel_fee = fee;
        self
    }

    /// Tick on which the transaction is opened.
    #[must_use]
    pub const fn tick(mut self, tick: u64) -> Self {
        self.tick = tick;
        self
    }

    /// Validate inputs and produce a [`Transaction`] in
    /// [`TransactionState::WaitingForConfirm`].
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::MissingField`] without a description,
    /// [`LedgerError::ZeroAmount`] for an empty resource amount,
    /// [`LedgerError::NegativeMoney`] for a negative price,
    /// [`LedgerError::InvalidCancelFee`] for a fee outside `[0, 1]`, and
    /// [`LedgerError::SelfDealing`] when buyer and seller are the same.
    pub fn build(self) -> Result<Transaction, LedgerError> {
        let description = self
            .description
            .ok_or(LedgerError::MissingField("description"))?;

        let TransactionDescription::Resource { amount, .. } = description;
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        if self.money.is_sign_negative() && !self.money.is_zero() {
            return Err(LedgerError::NegativeMoney { money: self.money });
        }
        if self.cancel_fee < Decimal::ZERO || self.cancel_fee > Decimal::ONE {
            return Err(LedgerError::InvalidCancelFee {
                fee: self.cancel_fee,
            });
        }
        if self.buyer == self.seller {
            return Err(LedgerError::SelfDealing(self.buyer));
        }

        Ok(Transaction {
            id: TransactionId::new(),
            buyer: self.buyer,
            seller: self.seller,
            money: self.money,
            cancel_fee: self.cancel_fee,
            description,
            state: TransactionState::WaitingForConfirm,
            opened_at_tick: self.tick,
        })
    }
}
