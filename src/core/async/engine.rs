//! Thread-safe ledger for concurrent writers
//!
//! This module provides `SharedLedger`, the concurrent counterpart of
//! [`crate::core::Ledger`]. It runs the same lifecycle rules over DashMap-backed
//! stores and can be cloned cheaply and shared across tokio tasks.
//!
//! # Locking
//!
//! Every balance recompute runs inside
//! [`SharedCustomerStore::write_balances_with`]: the customer's entry is
//! write-locked while the transaction map is scanned and the balances are
//! written. Concurrent recomputes of one customer are serialized, and whichever
//! runs last sees every committed transaction, so no update is lost.
//!
//! Lock order is always customer entry, then transaction shards. Transaction
//! store methods release their guards before returning, so no code path holds a
//! transaction guard while waiting for a customer entry.

use std::sync::Arc;

use super::{SharedCustomerStore, SharedTransactionStore};
use crate::core::analytics::{self, MonthlyIncome};
use crate::core::engine::PurgeSummary;
use crate::core::reconciler::{
    balances_after_replacement, compute_balances, BalanceDrift, RecalculationFailure,
    RecalculationReport,
};
use crate::types::{
    Customer, CustomerId, CustomerPatch, ImportRecord, LedgerError, LedgerSnapshot, NewCustomer,
    NewTransaction, Transaction, TransactionId, TransactionPatch, TransactionStatus,
};
use chrono::Utc;
use tracing::{debug, error, info, warn};

/// Concurrent transaction lifecycle controller
///
/// All operations take `&self`. Operations on different customers proceed in
/// parallel.
#[derive(Debug, Clone)]
pub struct SharedLedger {
    /// Thread-safe customer records
    ///
    /// Wrapped in Arc to enable sharing across async tasks.
    customers: Arc<SharedCustomerStore>,

    /// Thread-safe transaction records
    transactions: Arc<SharedTransactionStore>,
}

impl SharedLedger {
    pub fn new() -> Self {
        Self::with_stores(
            Arc::new(SharedTransactionStore::new()),
            Arc::new(SharedCustomerStore::new()),
        )
    }

    pub fn with_stores(
        transactions: Arc<SharedTransactionStore>,
        customers: Arc<SharedCustomerStore>,
    ) -> Self {
        Self {
            customers,
            transactions,
        }
    }

    /// Rebuild a shared ledger from a snapshot, keeping stored balances as they are
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self::with_stores(
            Arc::new(SharedTransactionStore::from_records(snapshot.transactions)),
            Arc::new(SharedCustomerStore::from_records(snapshot.customers)),
        )
    }

    /// Copy every record out of the stores
    ///
    /// Not atomic with respect to concurrent writers; take it once they have
    /// finished.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            customers: self.customers.list(),
            transactions: self.transactions.list(),
        }
    }

    // ---- customers ----

    pub fn create_customer(&self, details: NewCustomer) -> Result<Customer, LedgerError> {
        details.validate()?;
        let customer = self.customers.insert(details);
        info!(customer = customer.id, name = %customer.name, "Created customer");
        Ok(customer)
    }

    pub fn update_customer(
        &self,
        customer_id: CustomerId,
        patch: CustomerPatch,
    ) -> Result<Customer, LedgerError> {
        let customer = self.customers.update(customer_id, patch)?;
        info!(customer = customer_id, "Updated customer");
        Ok(customer)
    }

    /// Remove a customer and clear the customer of their transactions
    pub fn delete_customer(&self, customer_id: CustomerId) -> Result<Customer, LedgerError> {
        let customer = self
            .customers
            .remove(customer_id)
            .ok_or_else(|| LedgerError::customer_not_found(customer_id, "delete"))?;
        let detached = self.transactions.detach_customer(customer_id);
        info!(customer = customer_id, detached, "Deleted customer");
        Ok(customer)
    }

    /// Remove every transaction and every customer
    pub fn delete_all_customers(&self) -> PurgeSummary {
        let transactions = self.transactions.clear();
        let customers = self.customers.clear();
        info!(customers, transactions, "Deleted all customers and transactions");
        PurgeSummary {
            customers,
            transactions,
        }
    }

    pub fn customer(&self, customer_id: CustomerId) -> Option<Customer> {
        self.customers.get(customer_id)
    }

    pub fn customers(&self) -> Vec<Customer> {
        self.customers.list()
    }

    // ---- transaction lifecycle ----

    /// Record a new transaction and recompute its customer
    ///
    /// # Errors
    ///
    /// Same as [`crate::core::Ledger::create_transaction`].
    pub fn create_transaction(&self, new: NewTransaction) -> Result<Transaction, LedgerError> {
        let mut tx = new.into_transaction(0, Utc::now());
        tx.validate()?;
        self.ensure_customer_exists(tx.customer_id)?;
        if let Some(customer_id) = tx.customer_id {
            let existing = self.transactions.for_customer(customer_id);
            compute_balances(existing.iter().chain([&tx]))?;
        }

        tx.id = self.transactions.allocate_id();
        self.transactions.insert(tx.clone())?;
        info!(
            tx = tx.id,
            customer = ?tx.customer_id,
            tx_type = %tx.tx_type,
            amount = %tx.amount,
            status = %tx.status,
            "Created transaction"
        );

        self.reconcile_after(tx.id, "create", &[tx.customer_id])?;
        Ok(tx)
    }

    /// Apply a partial update and recompute the old and new customers
    pub fn update_transaction(
        &self,
        tx_id: TransactionId,
        patch: TransactionPatch,
    ) -> Result<Transaction, LedgerError> {
        let current = self
            .transactions
            .get(tx_id)
            .ok_or_else(|| LedgerError::transaction_not_found(tx_id, "update"))?;
        let candidate = patch.clone().apply_to(&current);
        candidate.validate()?;
        if candidate.customer_id != current.customer_id {
            self.ensure_customer_exists(candidate.customer_id)?;
        }
        self.check_replacement(
            tx_id,
            Some(&candidate),
            &[current.customer_id, candidate.customer_id],
        )?;

        let (old, updated) = self.transactions.update(tx_id, "update", |tx| {
            let updated = patch.apply_to(tx);
            updated.validate()?;
            Ok(updated)
        })?;
        info!(
            tx = tx_id,
            old_customer = ?old.customer_id,
            customer = ?updated.customer_id,
            "Updated transaction"
        );

        self.reconcile_after(tx_id, "update", &[old.customer_id, updated.customer_id])?;
        Ok(updated)
    }

    pub fn delete_transaction(&self, tx_id: TransactionId) -> Result<Transaction, LedgerError> {
        let current = self
            .transactions
            .get(tx_id)
            .ok_or_else(|| LedgerError::transaction_not_found(tx_id, "delete"))?;
        self.check_replacement(tx_id, None, &[current.customer_id])?;

        let removed = self
            .transactions
            .remove(tx_id)
            .ok_or_else(|| LedgerError::transaction_not_found(tx_id, "delete"))?;
        info!(tx = tx_id, customer = ?removed.customer_id, "Deleted transaction");

        self.reconcile_after(tx_id, "delete", &[removed.customer_id])?;
        Ok(removed)
    }

    /// Move a pending transaction to confirmed
    ///
    /// The status check and the status change happen under the transaction's
    /// entry lock, so of two concurrent confirms exactly one succeeds.
    pub fn confirm_transaction(&self, tx_id: TransactionId) -> Result<Transaction, LedgerError> {
        let mut candidate = self
            .transactions
            .get(tx_id)
            .ok_or_else(|| LedgerError::transaction_not_found(tx_id, "confirm"))?;
        if !candidate.is_confirmed() {
            candidate.status = TransactionStatus::Confirmed;
            self.check_replacement(tx_id, Some(&candidate), &[candidate.customer_id])?;
        }

        let (_, confirmed) = self.transactions.update(tx_id, "confirm", |tx| {
            if tx.is_confirmed() {
                return Err(LedgerError::AlreadyConfirmed { tx: tx_id });
            }
            let mut confirmed = tx.clone();
            confirmed.status = TransactionStatus::Confirmed;
            Ok(confirmed)
        })?;
        info!(tx = tx_id, customer = ?confirmed.customer_id, "Confirmed transaction");

        self.reconcile_after(tx_id, "confirm", &[confirmed.customer_id])?;
        Ok(confirmed)
    }

    /// Remove every transaction and reset every customer's balances
    pub fn delete_all_transactions(&self) -> Result<usize, LedgerError> {
        let removed = self.transactions.clear();
        info!(removed, "Deleted all transactions");

        let report = self.recalculate_all();
        match report.failures.into_iter().next() {
            Some(failure) => Err(failure.error),
            None => Ok(removed),
        }
    }

    /// Create the transaction described by an import row
    ///
    /// Rows that ask for confirmation are confirmed right after creation. If
    /// the confirm step fails, the created transaction stays pending.
    pub fn apply_import(&self, record: ImportRecord) -> Result<Transaction, LedgerError> {
        let tx = self.create_transaction(record.transaction)?;
        if record.confirm && !tx.is_confirmed() {
            return self.confirm_transaction(tx.id);
        }
        Ok(tx)
    }

    pub fn transaction(&self, tx_id: TransactionId) -> Option<Transaction> {
        self.transactions.get(tx_id)
    }

    /// Transactions, newest first, optionally restricted to one customer
    pub fn transactions(&self, customer: Option<CustomerId>) -> Vec<Transaction> {
        let mut transactions = match customer {
            Some(customer_id) => self.transactions.for_customer(customer_id),
            None => self.transactions.list(),
        };
        transactions.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        transactions
    }

    // ---- reconciliation ----

    /// Recompute one customer under their entry lock
    pub fn recompute(&self, customer_id: CustomerId) -> Result<Customer, LedgerError> {
        let transactions = &self.transactions;
        let customer = self.customers.write_balances_with(customer_id, |id| {
            compute_balances(&transactions.for_customer(id))
        })?;

        debug!(
            customer = customer_id,
            credit = %customer.credit_balance(),
            pending = %customer.pending_balance(),
            "Recalculated customer balances"
        );
        Ok(customer)
    }

    pub fn recalculate_all(&self) -> RecalculationReport {
        let mut report = RecalculationReport::default();

        for customer_id in self.customers.ids() {
            match self.recompute(customer_id) {
                Ok(_) => report.recalculated.push(customer_id),
                Err(error) => {
                    warn!(customer = customer_id, error = %error, "Failed to recalculate customer balances");
                    report
                        .failures
                        .push(RecalculationFailure { customer_id, error });
                }
            }
        }

        info!(
            recalculated = report.recalculated.len(),
            failed = report.failures.len(),
            "Recalculated all customer balances"
        );
        report
    }

    pub fn audit(&self) -> Vec<BalanceDrift> {
        self.customers
            .list()
            .into_iter()
            .filter_map(|customer| {
                let transactions = self.transactions.for_customer(customer.id);
                let expected = match compute_balances(&transactions) {
                    Ok(expected) => expected,
                    Err(error) => {
                        warn!(customer = customer.id, error = %error, "Cannot audit customer balances");
                        return None;
                    }
                };
                (customer.balances() != expected).then(|| BalanceDrift {
                    customer_id: customer.id,
                    stored: customer.balances(),
                    expected,
                    name: customer.name,
                })
            })
            .collect()
    }

    pub fn income_by_month(&self) -> Result<Vec<MonthlyIncome>, LedgerError> {
        analytics::income_by_month(&self.transactions.list())
    }

    fn ensure_customer_exists(&self, customer_id: Option<CustomerId>) -> Result<(), LedgerError> {
        match customer_id {
            Some(customer) if !self.customers.contains(customer) => {
                Err(LedgerError::UnknownCustomer { customer })
            }
            _ => Ok(()),
        }
    }

    /// Fail if replacing `tx_id` would push an affected balance out of range
    ///
    /// Runs before the store is touched. A concurrent writer may still change
    /// the customer in between; the recompute then reports the overflow.
    fn check_replacement(
        &self,
        tx_id: TransactionId,
        replacement: Option<&Transaction>,
        affected: &[Option<CustomerId>],
    ) -> Result<(), LedgerError> {
        for customer_id in affected.iter().flatten() {
            balances_after_replacement(
                &self.transactions.for_customer(*customer_id),
                *customer_id,
                tx_id,
                replacement,
            )?;
        }
        Ok(())
    }

    fn reconcile_after(
        &self,
        tx_id: TransactionId,
        operation: &str,
        affected: &[Option<CustomerId>],
    ) -> Result<(), LedgerError> {
        let mut seen: Vec<CustomerId> = Vec::with_capacity(affected.len());

        for customer_id in affected.iter().flatten() {
            if seen.contains(customer_id) {
                continue;
            }
            seen.push(*customer_id);

            if let Err(e) = self.recompute(*customer_id) {
                error!(
                    tx = tx_id,
                    customer = customer_id,
                    operation,
                    error = %e,
                    "Transaction saved but balance write-back failed; run recalculate to repair"
                );
                return Err(e);
            }
        }

        Ok(())
    }
}

impl Default for SharedLedger {
    fn default() -> Self {
        Self::new()
    }
}
