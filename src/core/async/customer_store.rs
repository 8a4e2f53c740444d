//! Thread-safe customer storage for the shared ledger
//!
//! This module provides the `SharedCustomerStore` struct, which manages customer
//! records using concurrent data structures to enable safe multi-threaded access.
//!
//! # Design
//!
//! The store uses `DashMap` to lock each customer entry independently. Balance
//! write-back goes through [`SharedCustomerStore::write_balances_with`], which
//! runs the balance computation while the customer's entry is write-locked. Two
//! recomputes for the same customer are therefore serialized and the later one
//! always observes every transaction the earlier one did.

use crate::types::{Balances, Customer, CustomerId, CustomerPatch, LedgerError, NewCustomer};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe customer store backed by DashMap
#[derive(Debug)]
pub struct SharedCustomerStore {
    customers: DashMap<CustomerId, Customer>,
    next_id: AtomicU64,
}

impl SharedCustomerStore {
    pub fn new() -> Self {
        Self {
            customers: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Seed a store with existing records, keeping their stored balances
    pub fn from_records(records: impl IntoIterator<Item = Customer>) -> Self {
        let store = Self::new();
        for customer in records {
            store.next_id.fetch_max(customer.id.saturating_add(1), Ordering::Relaxed);
            store.customers.entry(customer.id).or_insert(customer);
        }
        store
    }

    /// Register a customer with zero balances
    pub fn insert(&self, details: NewCustomer) -> Customer {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let customer = Customer::new(id, details);
        self.customers.insert(id, customer.clone());
        customer
    }

    pub fn get(&self, customer_id: CustomerId) -> Option<Customer> {
        self.customers
            .get(&customer_id)
            .map(|entry| entry.value().clone())
    }

    pub fn contains(&self, customer_id: CustomerId) -> bool {
        self.customers.contains_key(&customer_id)
    }

    /// Apply a details patch; balances are untouched
    pub fn update(
        &self,
        customer_id: CustomerId,
        patch: CustomerPatch,
    ) -> Result<Customer, LedgerError> {
        let mut entry = self
            .customers
            .get_mut(&customer_id)
            .ok_or_else(|| LedgerError::customer_not_found(customer_id, "update"))?;

        let mut updated = entry.value().clone();
        updated.apply(patch)?;
        *entry.value_mut() = updated.clone();
        Ok(updated)
    }

    /// Compute and store a customer's balances under the entry lock
    ///
    /// `compute` runs while the customer's entry is write-locked, so it must not
    /// touch this store. It may read the transaction store.
    ///
    /// # Errors
    ///
    /// Returns `CustomerNotFound` if the customer does not exist; `compute` is
    /// not called in that case. An error from `compute` is returned as is and
    /// the stored balances stay unchanged.
    pub fn write_balances_with<F>(
        &self,
        customer_id: CustomerId,
        compute: F,
    ) -> Result<Customer, LedgerError>
    where
        F: FnOnce(CustomerId) -> Result<Balances, LedgerError>,
    {
        let mut entry = self
            .customers
            .get_mut(&customer_id)
            .ok_or_else(|| LedgerError::customer_not_found(customer_id, "write_balances"))?;

        let balances = compute(customer_id)?;
        entry.value_mut().set_balances(balances);
        Ok(entry.value().clone())
    }

    /// Every customer, ascending by id
    pub fn list(&self) -> Vec<Customer> {
        let mut customers: Vec<Customer> = self
            .customers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        customers.sort_by_key(|c| c.id);
        customers
    }

    pub fn ids(&self) -> Vec<CustomerId> {
        let mut ids: Vec<CustomerId> = self.customers.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn remove(&self, customer_id: CustomerId) -> Option<Customer> {
        self.customers.remove(&customer_id).map(|(_, c)| c)
    }

    pub fn clear(&self) -> usize {
        let removed = self.customers.len();
        self.customers.clear();
        removed
    }
}

impl Default for SharedCustomerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_insert_assigns_ids_and_zero_balances() {
        let store = SharedCustomerStore::new();
        let a = store.insert(NewCustomer::new("Ayesha"));
        let b = store.insert(NewCustomer::new("Bilal").phone("0300"));

        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(b.balances(), Balances::ZERO);
        assert_eq!(store.get(2).unwrap().phone.as_deref(), Some("0300"));
        assert_eq!(store.ids(), vec![1, 2]);
    }

    #[test]
    fn test_update_keeps_balances() {
        let store = SharedCustomerStore::new();
        let id = store.insert(NewCustomer::new("Old")).id;
        store
            .write_balances_with(id, |_| Ok(Balances::new(dec!(5), dec!(1))))
            .unwrap();

        let updated = store
            .update(
                id,
                CustomerPatch {
                    name: Some("New".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.name, "New");
        assert_eq!(updated.credit_balance(), dec!(5));
    }

    #[test]
    fn test_update_rejects_blank_name() {
        let store = SharedCustomerStore::new();
        let id = store.insert(NewCustomer::new("Kept")).id;

        let result = store.update(
            id,
            CustomerPatch {
                name: Some(" ".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(result, Err(LedgerError::MissingCustomerName));
        assert_eq!(store.get(id).unwrap().name, "Kept");
    }

    #[test]
    fn test_write_balances_with_missing_customer_skips_compute() {
        let store = SharedCustomerStore::new();
        let mut called = false;

        let result = store.write_balances_with(3, |_| {
            called = true;
            Ok(Balances::ZERO)
        });

        assert!(matches!(
            result,
            Err(LedgerError::CustomerNotFound { customer: 3, .. })
        ));
        assert!(!called);
    }

    #[test]
    fn test_write_balances_with_failed_compute_keeps_balances() {
        let store = SharedCustomerStore::new();
        let id = store.insert(NewCustomer::new("Kept")).id;
        store
            .write_balances_with(id, |_| Ok(Balances::new(dec!(7), dec!(2))))
            .unwrap();

        let result = store.write_balances_with(id, |id| {
            Err(LedgerError::arithmetic_overflow("credit balance", Some(id)))
        });

        assert!(matches!(result, Err(LedgerError::ArithmeticOverflow { .. })));
        assert_eq!(store.get(id).unwrap().balances(), Balances::new(dec!(7), dec!(2)));
    }

    #[test]
    fn test_from_records_with_largest_id() {
        let last = Customer::new(u64::MAX, NewCustomer::new("Last"));

        let store = SharedCustomerStore::from_records(vec![last]);
        assert_eq!(store.ids(), vec![u64::MAX]);
        assert_eq!(store.next_id.load(Ordering::Relaxed), u64::MAX);
    }

    #[test]
    fn test_from_records_continues_ids() {
        let seeded = SharedCustomerStore::new();
        seeded.insert(NewCustomer::new("A"));
        seeded.insert(NewCustomer::new("B"));
        seeded.remove(1);

        let store = SharedCustomerStore::from_records(seeded.list());
        assert_eq!(store.insert(NewCustomer::new("C")).id, 3);
        assert_eq!(store.clear(), 2);
    }
}
