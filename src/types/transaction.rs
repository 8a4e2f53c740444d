//! Transaction-related types for the shop ledger
//!
//! This module defines transaction types, statuses, stored transaction records,
//! and the input shapes used to create and patch them.

use super::customer::CustomerId;
use super::error::LedgerError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// Transaction identifier, assigned by the transaction store
pub type TransactionId = u64;

/// How a transaction was settled
///
/// Credit transactions increase what a customer owes; cash and cheque
/// transactions are payments that decrease it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    /// Payment settled immediately
    Cash,

    /// Sale on account
    Credit,

    /// Payment by cheque, awaiting clearance
    Cheque,
}

impl TransactionType {
    /// Sign applied to the amount when summing a customer's balance
    ///
    /// `Credit` is `+1`; `Cash` and `Cheque` are both `-1`.
    pub fn sign(self) -> Decimal {
        match self {
            TransactionType::Credit => Decimal::ONE,
            TransactionType::Cash | TransactionType::Cheque => Decimal::NEGATIVE_ONE,
        }
    }

    /// Status a freshly created transaction of this type starts in
    ///
    /// Cash is settled on the spot. Credit and cheque carry settlement risk and
    /// wait for an explicit confirmation.
    pub fn initial_status(self) -> TransactionStatus {
        match self {
            TransactionType::Cash => TransactionStatus::Confirmed,
            TransactionType::Credit | TransactionType::Cheque => TransactionStatus::Pending,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Cash => "Cash",
            TransactionType::Credit => "Credit",
            TransactionType::Cheque => "Cheque",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(TransactionType::Cash),
            "credit" => Ok(TransactionType::Credit),
            "cheque" => Ok(TransactionType::Cheque),
            _ => Err(LedgerError::invalid_transaction_type(s)),
        }
    }
}

/// Settlement state of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionStatus {
    /// Recorded, counted in the pending balance only
    Pending,

    /// Authorized, counted in the credit balance
    Confirmed,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionStatus::Pending => "Pending",
            TransactionStatus::Confirmed => "Confirmed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(TransactionStatus::Pending),
            "confirmed" => Ok(TransactionStatus::Confirmed),
            _ => Err(LedgerError::invalid_status(s)),
        }
    }
}

/// A transaction as held by the transaction store
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Store-assigned identifier
    pub id: TransactionId,

    /// Non-negative amount
    pub amount: Decimal,

    /// Cash, Credit or Cheque
    pub tx_type: TransactionType,

    /// Customer this transaction is booked against, `None` for walk-in sales
    pub customer_id: Option<CustomerId>,

    /// Required for cheques
    pub cheque_number: Option<String>,

    /// Required for cheques
    pub cheque_date: Option<NaiveDate>,

    /// Pending or Confirmed
    pub status: TransactionStatus,

    /// When the transaction happened
    pub date: DateTime<Utc>,

    pub description: Option<String>,
}

impl Transaction {
    /// Amount with the type's sign applied
    pub fn signed_amount(&self) -> Decimal {
        self.amount * self.tx_type.sign()
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == TransactionStatus::Confirmed
    }

    /// Check the shape rules that depend on the transaction type
    ///
    /// Customer existence is checked by the ledger, which owns the customer store.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The amount is negative
    /// - A credit transaction has no customer
    /// - A cheque transaction has no cheque number or cheque date
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.amount < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount {
                amount: self.amount,
            });
        }

        match self.tx_type {
            TransactionType::Credit if self.customer_id.is_none() => {
                Err(LedgerError::missing_field(self.tx_type, "customer"))
            }
            TransactionType::Cheque if self.cheque_number.is_none() => {
                Err(LedgerError::missing_field(self.tx_type, "cheque_number"))
            }
            TransactionType::Cheque if self.cheque_date.is_none() => {
                Err(LedgerError::missing_field(self.tx_type, "cheque_date"))
            }
            _ => Ok(()),
        }
    }
}

/// Input for creating a transaction
///
/// Status is not part of the input: it always starts at
/// [`TransactionType::initial_status`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub amount: Decimal,
    pub tx_type: TransactionType,
    pub customer_id: Option<CustomerId>,
    pub cheque_number: Option<String>,
    pub cheque_date: Option<NaiveDate>,
    /// Defaults to the creation time when `None`
    pub date: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

impl NewTransaction {
    pub fn new(tx_type: TransactionType, amount: Decimal) -> Self {
        NewTransaction {
            amount,
            tx_type,
            customer_id: None,
            cheque_number: None,
            cheque_date: None,
            date: None,
            description: None,
        }
    }

    pub fn customer(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn cheque(mut self, number: impl Into<String>, date: NaiveDate) -> Self {
        self.cheque_number = Some(number.into());
        self.cheque_date = Some(date);
        self
    }

    pub fn dated(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Build the stored record for this input
    pub(crate) fn into_transaction(self, id: TransactionId, now: DateTime<Utc>) -> Transaction {
        Transaction {
            id,
            amount: self.amount,
            tx_type: self.tx_type,
            customer_id: self.customer_id,
            cheque_number: non_blank(self.cheque_number),
            cheque_date: self.cheque_date,
            status: self.tx_type.initial_status(),
            date: self.date.unwrap_or(now),
            description: non_blank(self.description),
        }
    }
}

/// Partial update of a transaction
///
/// `None` leaves a field untouched. For optional fields the inner `Option`
/// is the new value, so `customer_id: Some(None)` detaches the customer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    pub amount: Option<Decimal>,
    pub tx_type: Option<TransactionType>,
    pub customer_id: Option<Option<CustomerId>>,
    pub cheque_number: Option<Option<String>>,
    pub cheque_date: Option<Option<NaiveDate>>,
    pub description: Option<Option<String>>,
    pub date: Option<DateTime<Utc>>,
    pub status: Option<TransactionStatus>,
}

impl TransactionPatch {
    pub fn is_empty(&self) -> bool {
        *self == TransactionPatch::default()
    }

    /// Produce the patched copy of `tx`, leaving `tx` itself untouched
    pub(crate) fn apply_to(self, tx: &Transaction) -> Transaction {
        let mut updated = tx.clone();
        if let Some(amount) = self.amount {
            updated.amount = amount;
        }
        if let Some(tx_type) = self.tx_type {
            updated.tx_type = tx_type;
        }
        if let Some(customer_id) = self.customer_id {
            updated.customer_id = customer_id;
        }
        if let Some(cheque_number) = self.cheque_number {
            updated.cheque_number = non_blank(cheque_number);
        }
        if let Some(cheque_date) = self.cheque_date {
            updated.cheque_date = cheque_date;
        }
        if let Some(description) = self.description {
            updated.description = non_blank(description);
        }
        if let Some(date) = self.date {
            updated.date = date;
        }
        if let Some(status) = self.status {
            updated.status = status;
        }
        updated
    }
}

/// Treat empty or whitespace-only text as absent
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
