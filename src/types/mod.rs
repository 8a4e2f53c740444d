//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `customer`: Customer records and their inputs
//! - `transaction`: Transaction records, types, statuses and inputs
//! - `balance`: The derived balance pair written by the reconciler
//! - `import`: Parsed import rows and rejected rows
//! - `snapshot`: Whole-ledger copies for persistence and strategy hand-off
//! - `error`: Error types for the ledger

pub mod balance;
pub mod customer;
pub mod error;
pub mod import;
pub mod snapshot;
pub mod transaction;

pub use balance::Balances;
pub use customer::{Customer, CustomerId, CustomerPatch, NewCustomer};
pub use error::{ErrorKind, LedgerError};
pub use import::{ImportRecord, ImportRejection};
pub use snapshot::LedgerSnapshot;
pub use transaction::{
    NewTransaction, Transaction, TransactionId, TransactionPatch, TransactionStatus,
    TransactionType,
};
