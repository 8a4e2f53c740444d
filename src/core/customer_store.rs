//! In-memory customer storage
//!
//! This module provides the `MemoryCustomerStore` struct which keeps customer
//! records together with their cached balances.
//!
//! The MemoryCustomerStore is responsible for:
//! - Assigning customer ids
//! - Applying detail patches (name, phone, address)
//! - Accepting balance writes from the reconciler
//! - Providing sorted customer listings for output

use crate::core::traits::CustomerStore;
use crate::types::{Balances, Customer, CustomerId, CustomerPatch, LedgerError, NewCustomer};
use std::collections::HashMap;

/// Customer store backed by a HashMap
#[derive(Debug, Clone)]
pub struct MemoryCustomerStore {
    /// Map of customer IDs to customer records
    customers: HashMap<CustomerId, Customer>,

    next_id: CustomerId,
}

impl MemoryCustomerStore {
    /// Create a new MemoryCustomerStore with no customers
    pub fn new() -> Self {
        MemoryCustomerStore {
            customers: HashMap::new(),
            next_id: 1,
        }
    }

    /// Seed a store with existing records, balances included as stored
    pub fn from_records(records: impl IntoIterator<Item = Customer>) -> Self {
        let mut store = Self::new();
        for customer in records {
            store.next_id = store.next_id.max(customer.id.saturating_add(1));
            store.customers.entry(customer.id).or_insert(customer);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }
}

impl CustomerStore for MemoryCustomerStore {
    fn insert(&mut self, details: NewCustomer) -> Customer {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        let customer = Customer::new(id, details);
        self.customers.insert(id, customer.clone());
        customer
    }

    fn get(&self, customer_id: CustomerId) -> Option<&Customer> {
        self.customers.get(&customer_id)
    }

    fn update(
        &mut self,
        customer_id: CustomerId,
        patch: CustomerPatch,
    ) -> Result<Customer, LedgerError> {
        let customer = self
            .customers
            .get_mut(&customer_id)
            .ok_or_else(|| LedgerError::customer_not_found(customer_id, "update"))?;
        customer.apply(patch)?;
        Ok(customer.clone())
    }

    fn write_balances(
        &mut self,
        customer_id: CustomerId,
        balances: Balances,
    ) -> Result<Customer, LedgerError> {
        let customer = self
            .customers
            .get_mut(&customer_id)
            .ok_or_else(|| LedgerError::customer_not_found(customer_id, "write_balances"))?;
        customer.set_balances(balances);
        Ok(customer.clone())
    }

    fn list(&self) -> Vec<&Customer> {
        let mut customers: Vec<&Customer> = self.customers.values().collect();
        customers.sort_by_key(|customer| customer.id);
        customers
    }

    fn remove(&mut self, customer_id: CustomerId) -> Option<Customer> {
        self.customers.remove(&customer_id)
    }

    fn clear(&mut self) -> usize {
        let removed = self.customers.len();
        self.customers.clear();
        removed
    }
}

impl Default for MemoryCustomerStore {
    fn default() -> Self {
        Self::new()
    }
}
