//! Thread-safe transaction storage for the shared ledger
//!
//! This module provides the `SharedTransactionStore` struct, which stores
//! transaction records using concurrent data structures so several tasks can
//! record transactions at once.
//!
//! # Design
//!
//! Records live in a `DashMap` (a concurrent HashMap) with fine-grained locking
//! per shard. Ids come from an atomic counter, so two concurrent creates never
//! receive the same id.
//!
//! Every method returns owned clones; no map guard escapes this module. Callers
//! therefore cannot hold a transaction guard while acquiring a customer guard.

use crate::types::{CustomerId, LedgerError, Transaction, TransactionId};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe transaction store backed by DashMap
#[derive(Debug)]
pub struct SharedTransactionStore {
    transactions: DashMap<TransactionId, Transaction>,
    next_id: AtomicU64,
}

impl SharedTransactionStore {
    pub fn new() -> Self {
        Self {
            transactions: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Seed a store with existing records
    ///
    /// If two records share an id, the first one wins.
    pub fn from_records(records: impl IntoIterator<Item = Transaction>) -> Self {
        let store = Self::new();
        for tx in records {
            store.next_id.fetch_max(tx.id.saturating_add(1), Ordering::Relaxed);
            store.transactions.entry(tx.id).or_insert(tx);
        }
        store
    }

    /// Reserve a fresh transaction id
    pub fn allocate_id(&self) -> TransactionId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Insert a new record
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the id is already taken.
    pub fn insert(&self, transaction: Transaction) -> Result<(), LedgerError> {
        use dashmap::mapref::entry::Entry;

        match self.transactions.entry(transaction.id) {
            Entry::Occupied(_) => Err(LedgerError::persistence(format!(
                "transaction {} already exists",
                transaction.id
            ))),
            Entry::Vacant(slot) => {
                self.next_id.fetch_max(transaction.id.saturating_add(1), Ordering::Relaxed);
                slot.insert(transaction);
                Ok(())
            }
        }
    }

    pub fn get(&self, tx_id: TransactionId) -> Option<Transaction> {
        self.transactions
            .get(&tx_id)
            .map(|entry| entry.value().clone())
    }

    /// Mutate a transaction in place under its entry lock
    ///
    /// `f` builds the replacement from the current record or rejects the change,
    /// in which case the record is left as it was. Returns the old and new
    /// versions of the record on success.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` if the id is unknown, or whatever `f` returns.
    pub fn update<F>(
        &self,
        tx_id: TransactionId,
        operation: &str,
        f: F,
    ) -> Result<(Transaction, Transaction), LedgerError>
    where
        F: FnOnce(&Transaction) -> Result<Transaction, LedgerError>,
    {
        let mut entry = self
            .transactions
            .get_mut(&tx_id)
            .ok_or_else(|| LedgerError::transaction_not_found(tx_id, operation))?;

        let updated = f(entry.value())?;
        let old = std::mem::replace(entry.value_mut(), updated.clone());
        Ok((old, updated))
    }

    pub fn remove(&self, tx_id: TransactionId) -> Option<Transaction> {
        self.transactions.remove(&tx_id).map(|(_, tx)| tx)
    }

    /// Every record, ascending by id
    pub fn list(&self) -> Vec<Transaction> {
        let mut transactions: Vec<Transaction> = self
            .transactions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        transactions.sort_by_key(|tx| tx.id);
        transactions
    }

    /// Records booked against `customer_id`, ascending by id
    pub fn for_customer(&self, customer_id: CustomerId) -> Vec<Transaction> {
        let mut transactions: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|entry| entry.customer_id == Some(customer_id))
            .map(|entry| entry.value().clone())
            .collect();
        transactions.sort_by_key(|tx| tx.id);
        transactions
    }

    /// Clear the customer of every record that references it
    pub fn detach_customer(&self, customer_id: CustomerId) -> usize {
        let mut detached = 0;
        for mut entry in self.transactions.iter_mut() {
            if entry.customer_id == Some(customer_id) {
                entry.customer_id = None;
                detached += 1;
            }
        }
        detached
    }

    pub fn clear(&self) -> usize {
        let removed = self.transactions.len();
        self.transactions.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

impl Default for SharedTransactionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewTransaction, TransactionStatus, TransactionType};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn record(id: TransactionId, customer: Option<CustomerId>) -> Transaction {
        let mut new = NewTransaction::new(TransactionType::Credit, dec!(10));
        new.customer_id = customer;
        new.into_transaction(id, Utc::now())
    }

    #[test]
    fn test_store_and_retrieve_transaction() {
        let store = SharedTransactionStore::new();
        let id = store.allocate_id();
        store.insert(record(id, Some(2))).unwrap();

        let retrieved = store.get(id).unwrap();
        assert_eq!(retrieved.customer_id, Some(2));
        assert_eq!(retrieved.status, TransactionStatus::Pending);
        assert!(store.get(999).is_none());
    }

    #[test]
    fn test_largest_id_does_not_overflow_sequence() {
        let store = SharedTransactionStore::from_records(vec![record(u64::MAX, None)]);
        assert_eq!(store.allocate_id(), u64::MAX);
        assert!(store.insert(record(u64::MAX, Some(1))).is_err());

        let fresh = SharedTransactionStore::new();
        fresh.insert(record(u64::MAX, None)).unwrap();
        assert_eq!(fresh.get(u64::MAX).unwrap().customer_id, None);
    }

    #[test]
    fn test_duplicate_insert_is_rejected() {
        let store = SharedTransactionStore::new();
        store.insert(record(4, None)).unwrap();

        assert!(matches!(
            store.insert(record(4, Some(1))),
            Err(LedgerError::Persistence { .. })
        ));
        assert_eq!(store.get(4).unwrap().customer_id, None);
        assert_eq!(store.allocate_id(), 5);
    }

    #[test]
    fn test_update_returns_old_and_new() {
        let store = SharedTransactionStore::new();
        store.insert(record(1, Some(1))).unwrap();

        let (old, new) = store
            .update(1, "confirm", |tx| {
                let mut next = tx.clone();
                next.status = TransactionStatus::Confirmed;
                Ok(next)
            })
            .unwrap();

        assert_eq!(old.status, TransactionStatus::Pending);
        assert_eq!(new.status, TransactionStatus::Confirmed);
        assert_eq!(store.get(1).unwrap().status, TransactionStatus::Confirmed);
    }

    #[test]
    fn test_rejected_update_leaves_record() {
        let store = SharedTransactionStore::new();
        store.insert(record(1, Some(1))).unwrap();

        let before = store.get(1).unwrap();
        let result = store.update(1, "confirm", |_| Err(LedgerError::AlreadyConfirmed { tx: 1 }));
        assert!(result.is_err());
        assert_eq!(store.get(1).unwrap(), before);
    }

    #[test]
    fn test_update_nonexistent_transaction() {
        let store = SharedTransactionStore::new();
        let result = store.update(8, "update", |tx| Ok(tx.clone()));
        assert!(matches!(
            result,
            Err(LedgerError::TransactionNotFound { tx: 8, .. })
        ));
    }

    #[test]
    fn test_for_customer_detach_and_clear() {
        let store = SharedTransactionStore::new();
        for (id, customer) in [(1, Some(1)), (2, Some(2)), (3, Some(1)), (4, None)] {
            store.insert(record(id, customer)).unwrap();
        }

        let ids: Vec<TransactionId> = store.for_customer(1).iter().map(|tx| tx.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(store.detach_customer(1), 2);
        assert!(store.for_customer(1).is_empty());
        assert_eq!(store.clear(), 4);
        assert!(store.is_empty());
    }

    #[test]
    fn test_concurrent_id_allocation_is_unique() {
        let store = Arc::new(SharedTransactionStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || (0..100).map(|_| store.allocate_id()).collect::<Vec<_>>())
            })
            .collect();

        let ids: HashSet<TransactionId> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(ids.len(), 800);
    }
}
