//! Core traits for the customer and transaction stores
//!
//! The single-writer [`crate::core::Ledger`] is generic over these traits so the
//! lifecycle rules do not depend on how records are kept. Both stores are plain
//! CRUD: validation and balance rules live in the ledger and the reconciler.

use crate::types::{
    Balances, Customer, CustomerId, CustomerPatch, LedgerError, NewCustomer, Transaction,
    TransactionId,
};

/// Storage for transaction records
pub trait TransactionStore {
    /// Reserve the next transaction id
    fn allocate_id(&mut self) -> TransactionId;

    /// Store a new transaction under its id
    ///
    /// Fails if a transaction with the same id already exists.
    fn insert(&mut self, transaction: Transaction) -> Result<(), LedgerError>;

    /// Get a transaction by ID
    fn get(&self, tx_id: TransactionId) -> Option<&Transaction>;

    /// Overwrite an existing transaction, returning the previous version
    fn replace(&mut self, transaction: Transaction) -> Result<Transaction, LedgerError>;

    /// Remove a transaction, returning it if it existed
    fn remove(&mut self, tx_id: TransactionId) -> Option<Transaction>;

    /// Every stored transaction, in ascending id order
    fn list(&self) -> Vec<&Transaction>;

    /// Every transaction booked against `customer_id`, with no limit
    fn for_customer(&self, customer_id: CustomerId) -> Vec<&Transaction> {
        self.list()
            .into_iter()
            .filter(|tx| tx.customer_id == Some(customer_id))
            .collect()
    }

    /// Clear the customer reference of every transaction booked against `customer_id`
    fn detach_customer(&mut self, customer_id: CustomerId) -> usize;

    /// Remove every transaction, returning how many were removed
    fn clear(&mut self) -> usize;
}

/// Storage for customer records
pub trait CustomerStore {
    /// Store a new customer with zero balances and a fresh id
    fn insert(&mut self, details: NewCustomer) -> Customer;

    /// Get a customer by ID
    fn get(&self, customer_id: CustomerId) -> Option<&Customer>;

    /// Apply a details patch, returning the updated customer
    fn update(
        &mut self,
        customer_id: CustomerId,
        patch: CustomerPatch,
    ) -> Result<Customer, LedgerError>;

    /// Replace both balance fields in a single write
    fn write_balances(
        &mut self,
        customer_id: CustomerId,
        balances: Balances,
    ) -> Result<Customer, LedgerError>;

    /// Every customer, in ascending id order
    fn list(&self) -> Vec<&Customer>;

    /// Ids of every customer, in ascending order
    fn ids(&self) -> Vec<CustomerId> {
        self.list().into_iter().map(|customer| customer.id).collect()
    }

    /// Remove a customer, returning it if it existed
    fn remove(&mut self, customer_id: CustomerId) -> Option<Customer>;

    /// Remove every customer, returning how many were removed
    fn clear(&mut self) -> usize;
}
