//! Error types for the shop ledger
//!
//! This module defines all error types that can occur while operating on the
//! ledger. Errors are designed to be descriptive and user-friendly for CLI output.
//!
//! # Error Categories
//!
//! Every variant maps onto one of four kinds (see [`ErrorKind`]):
//!
//! - **Validation**: malformed or incomplete input, caller's fault, no state changed
//! - **NotFound**: a referenced transaction or customer does not exist
//! - **Conflict**: the operation is not valid for the current state (double confirm)
//! - **Persistence**: the underlying store or data files failed

use super::customer::CustomerId;
use super::transaction::{TransactionId, TransactionType};
use rust_decimal::Decimal;
use thiserror::Error;

/// Coarse classification of a [`LedgerError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Persistence,
}

/// Main error type for the ledger
///
/// Each variant includes the context needed to diagnose the failure without
/// consulting the store again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Transaction type text is not one of Cash, Credit, Cheque
    #[error("Invalid transaction type '{value}'")]
    InvalidTransactionType {
        /// The rejected text
        value: String,
    },

    /// Transaction status text is not one of Pending, Confirmed
    #[error("Invalid transaction status '{value}'")]
    InvalidStatus {
        /// The rejected text
        value: String,
    },

    /// Amount text could not be parsed as a decimal
    #[error("Invalid amount '{amount}'")]
    InvalidAmount {
        /// The rejected text
        amount: String,
    },

    /// Amount parsed but is below zero
    #[error("Amount must not be negative, got {amount}")]
    NegativeAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// Date or timestamp text could not be parsed
    #[error("Invalid {field} '{value}'")]
    InvalidDate {
        /// Which field was being parsed
        field: String,
        /// The rejected text
        value: String,
    },

    /// A field required by the transaction type is absent
    #[error("{tx_type} transaction requires {field}")]
    MissingField {
        /// Type of the offending transaction
        tx_type: TransactionType,
        /// Name of the missing field
        field: String,
    },

    /// Customer name is empty or blank
    #[error("Customer name is required")]
    MissingCustomerName,

    /// A transaction references a customer that does not exist
    #[error("Unknown customer {customer}")]
    UnknownCustomer {
        /// The dangling customer id
        customer: CustomerId,
    },

    /// A CSV row could not be read or converted
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// Transaction id does not exist
    #[error("Transaction {tx} not found for {operation}")]
    TransactionNotFound {
        /// Transaction ID that was not found
        tx: TransactionId,
        /// Operation that failed
        operation: String,
    },

    /// Customer id does not exist
    #[error("Customer {customer} not found for {operation}")]
    CustomerNotFound {
        /// Customer ID that was not found
        customer: CustomerId,
        /// Operation that failed
        operation: String,
    },

    /// Confirm was requested for a transaction that is already confirmed
    #[error("Transaction {tx} is already confirmed")]
    AlreadyConfirmed {
        /// Transaction ID
        tx: TransactionId,
    },

    /// A balance or income sum would exceed the decimal range
    ///
    /// The operation is rejected before anything is stored.
    #[error("Arithmetic overflow in {operation}{}", customer.map(|c| format!(" for customer {}", c)).unwrap_or_default())]
    ArithmeticOverflow {
        /// Sum that would overflow
        operation: String,
        /// Customer whose balance was being summed, if any
        customer: Option<CustomerId>,
    },

    /// Store or data file failure
    #[error("Persistence error: {message}")]
    Persistence {
        /// Description of the failure
        message: String,
    },
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::Persistence {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(_) => LedgerError::Persistence {
                message: error.to_string(),
            },
            _ => LedgerError::ParseError {
                line: error.position().map(|pos| pos.line()),
                message: error.to_string(),
            },
        }
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Classify this error into the ledger's error taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidTransactionType { .. }
            | LedgerError::InvalidStatus { .. }
            | LedgerError::InvalidAmount { .. }
            | LedgerError::NegativeAmount { .. }
            | LedgerError::InvalidDate { .. }
            | LedgerError::MissingField { .. }
            | LedgerError::MissingCustomerName
            | LedgerError::UnknownCustomer { .. }
            | LedgerError::ArithmeticOverflow { .. }
            | LedgerError::ParseError { .. } => ErrorKind::Validation,
            LedgerError::TransactionNotFound { .. } | LedgerError::CustomerNotFound { .. } => {
                ErrorKind::NotFound
            }
            LedgerError::AlreadyConfirmed { .. } => ErrorKind::Conflict,
            LedgerError::Persistence { .. } => ErrorKind::Persistence,
        }
    }

    /// Create an InvalidTransactionType error
    pub fn invalid_transaction_type(value: &str) -> Self {
        LedgerError::InvalidTransactionType {
            value: value.to_string(),
        }
    }

    /// Create an InvalidStatus error
    pub fn invalid_status(value: &str) -> Self {
        LedgerError::InvalidStatus {
            value: value.to_string(),
        }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: &str) -> Self {
        LedgerError::InvalidAmount {
            amount: amount.to_string(),
        }
    }

    /// Create an InvalidDate error
    pub fn invalid_date(field: &str, value: &str) -> Self {
        LedgerError::InvalidDate {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(tx_type: TransactionType, field: &str) -> Self {
        LedgerError::MissingField {
            tx_type,
            field: field.to_string(),
        }
    }

    /// Create a TransactionNotFound error
    pub fn transaction_not_found(tx: TransactionId, operation: &str) -> Self {
        LedgerError::TransactionNotFound {
            tx,
            operation: operation.to_string(),
        }
    }

    /// Create a CustomerNotFound error
    pub fn customer_not_found(customer: CustomerId, operation: &str) -> Self {
        LedgerError::CustomerNotFound {
            customer,
            operation: operation.to_string(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, customer: Option<CustomerId>) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            customer,
        }
    }

    /// Create a Persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        LedgerError::Persistence {
            message: message.into(),
        }
    }
}
