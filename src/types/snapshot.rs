//! Point-in-time copy of a whole ledger
//!
//! Used to move state between the single-writer [`crate::core::Ledger`], the
//! concurrent [`crate::core::SharedLedger`] and the data files on disk.

use super::customer::Customer;
use super::transaction::Transaction;

/// Every customer and every transaction, in ascending id order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerSnapshot {
    pub customers: Vec<Customer>,
    pub transactions: Vec<Transaction>,
}

impl LedgerSnapshot {
    /// Sort both collections by id so snapshots compare and serialize deterministically
    pub fn normalize(mut self) -> Self {
        self.customers.sort_by_key(|customer| customer.id);
        self.transactions.sort_by_key(|tx| tx.id);
        self
    }
}
