//! Import row types shared by the readers and the processing strategies

use super::customer::CustomerId;
use super::error::LedgerError;
use super::transaction::NewTransaction;

/// A parsed import row, ready to be applied to a ledger
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRecord {
    /// Line in the source file (the header is line 1)
    pub line: u64,

    pub transaction: NewTransaction,

    /// Confirm the transaction right after creating it
    ///
    /// Set for rows whose status column says Confirmed. Ignored for cash,
    /// which is confirmed on creation.
    pub confirm: bool,
}

impl ImportRecord {
    pub fn customer_id(&self) -> Option<CustomerId> {
        self.transaction.customer_id
    }
}

/// An import row that could not be parsed or applied
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRejection {
    pub line: u64,
    pub error: LedgerError,
}
