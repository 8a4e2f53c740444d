//! In-memory transaction storage
//!
//! This module provides the `MemoryTransactionStore` that keeps every transaction
//! record of a ledger. It implements only the CRUD primitives of
//! [`TransactionStore`]; nothing here knows about balances.
//!
//! # Id Allocation
//!
//! Ids come from a monotonic counter that starts after the highest id the store
//! was seeded with. Removed ids are never handed out again.

use crate::core::traits::TransactionStore;
use crate::types::{CustomerId, LedgerError, Transaction, TransactionId};
use std::collections::HashMap;

/// Transaction store backed by a HashMap
#[derive(Debug, Clone)]
pub struct MemoryTransactionStore {
    /// Map of transaction ID to transaction
    transactions: HashMap<TransactionId, Transaction>,

    /// Id handed out by the next `allocate_id` call
    next_id: TransactionId,
}

impl MemoryTransactionStore {
    /// Create a new empty transaction store
    pub fn new() -> Self {
        MemoryTransactionStore {
            transactions: HashMap::new(),
            next_id: 1,
        }
    }

    /// Seed a store with existing records
    ///
    /// If two records share an id, the first one wins.
    pub fn from_records(records: impl IntoIterator<Item = Transaction>) -> Self {
        let mut store = Self::new();
        for tx in records {
            store.next_id = store.next_id.max(tx.id.saturating_add(1));
            store.transactions.entry(tx.id).or_insert(tx);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

impl TransactionStore for MemoryTransactionStore {
    fn allocate_id(&mut self) -> TransactionId {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    fn insert(&mut self, transaction: Transaction) -> Result<(), LedgerError> {
        if self.transactions.contains_key(&transaction.id) {
            return Err(LedgerError::persistence(format!(
                "transaction {} already exists",
                transaction.id
            )));
        }
        self.next_id = self.next_id.max(transaction.id.saturating_add(1));
        self.transactions.insert(transaction.id, transaction);
        Ok(())
    }

    fn get(&self, tx_id: TransactionId) -> Option<&Transaction> {
        self.transactions.get(&tx_id)
    }

    fn replace(&mut self, transaction: Transaction) -> Result<Transaction, LedgerError> {
        let slot = self
            .transactions
            .get_mut(&transaction.id)
            .ok_or_else(|| LedgerError::transaction_not_found(transaction.id, "replace"))?;
        Ok(std::mem::replace(slot, transaction))
    }

    fn remove(&mut self, tx_id: TransactionId) -> Option<Transaction> {
        self.transactions.remove(&tx_id)
    }

    fn list(&self) -> Vec<&Transaction> {
        let mut transactions: Vec<&Transaction> = self.transactions.values().collect();
        transactions.sort_by_key(|tx| tx.id);
        transactions
    }

    fn for_customer(&self, customer_id: CustomerId) -> Vec<&Transaction> {
        let mut transactions: Vec<&Transaction> = self
            .transactions
            .values()
            .filter(|tx| tx.customer_id == Some(customer_id))
            .collect();
        transactions.sort_by_key(|tx| tx.id);
        transactions
    }

    fn detach_customer(&mut self, customer_id: CustomerId) -> usize {
        let mut detached = 0;
        for tx in self.transactions.values_mut() {
            if tx.customer_id == Some(customer_id) {
                tx.customer_id = None;
                detached += 1;
            }
        }
        detached
    }

    fn clear(&mut self) -> usize {
        let removed = self.transactions.len();
        self.transactions.clear();
        removed
    }
}

impl Default for MemoryTransactionStore {
    fn default() -> Self {
        Self::new()
    }
}
