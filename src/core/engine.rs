//! Transaction lifecycle orchestration
//!
//! This module provides the `Ledger` that orchestrates every operation on the
//! ledger by coordinating between the transaction store, the customer store and
//! the reconciler.
//!
//! The ledger enforces business rules such as:
//! - Initial status by type (cash is confirmed, credit and cheque are pending)
//! - Required fields per type and existence of referenced customers
//! - Single confirmation (re-confirming is a conflict)
//! - Recompute of every customer a mutation touches, old and new

use crate::core::analytics::{self, MonthlyIncome};
use crate::core::customer_store::MemoryCustomerStore;
use crate::core::reconciler::{self, BalanceDrift, RecalculationReport};
use crate::core::traits::{CustomerStore, TransactionStore};
use crate::core::transaction_store::MemoryTransactionStore;
use crate::types::{
    Customer, CustomerId, CustomerPatch, ImportRecord, LedgerError, LedgerSnapshot, NewCustomer,
    NewTransaction, Transaction, TransactionId, TransactionPatch, TransactionStatus,
};
use chrono::Utc;
use tracing::{error, info};

/// Counts returned by [`Ledger::delete_all_customers`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeSummary {
    pub customers: usize,
    pub transactions: usize,
}

/// Transaction lifecycle controller
///
/// Owns both stores. Every mutation takes `&mut self`, so operations never
/// interleave: each one runs its store mutation and the reconciler pass to
/// completion before returning.
#[derive(Debug, Clone)]
pub struct Ledger<T = MemoryTransactionStore, C = MemoryCustomerStore> {
    transactions: T,
    customers: C,
}

impl Ledger {
    /// Create an empty in-memory ledger
    pub fn new() -> Self {
        Ledger {
            transactions: MemoryTransactionStore::new(),
            customers: MemoryCustomerStore::new(),
        }
    }

    /// Rebuild an in-memory ledger from a snapshot
    ///
    /// Stored balances are taken as they are. Use [`Ledger::audit`] to look for
    /// drift and [`Ledger::recalculate_all`] to repair it.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        Ledger {
            transactions: MemoryTransactionStore::from_records(snapshot.transactions),
            customers: MemoryCustomerStore::from_records(snapshot.customers),
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C> Ledger<T, C>
where
    T: TransactionStore,
    C: CustomerStore,
{
    /// Create a ledger over caller-provided stores
    pub fn with_stores(transactions: T, customers: C) -> Self {
        Ledger {
            transactions,
            customers,
        }
    }

    /// Copy every record out of the stores
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            customers: self.customers.list().into_iter().cloned().collect(),
            transactions: self.transactions.list().into_iter().cloned().collect(),
        }
    }

    // ---- customers ----

    /// Register a customer with zero balances
    ///
    /// # Errors
    ///
    /// Returns a validation error if the name is blank.
    pub fn create_customer(&mut self, details: NewCustomer) -> Result<Customer, LedgerError> {
        details.validate()?;
        let customer = self.customers.insert(details);
        info!(customer = customer.id, name = %customer.name, "Created customer");
        Ok(customer)
    }

    /// Change a customer's name, phone or address
    pub fn update_customer(
        &mut self,
        customer_id: CustomerId,
        patch: CustomerPatch,
    ) -> Result<Customer, LedgerError> {
        let customer = self.customers.update(customer_id, patch)?;
        info!(customer = customer_id, "Updated customer");
        Ok(customer)
    }

    /// Remove a customer, keeping their transactions as walk-in records
    ///
    /// Transactions that referenced the customer have their customer cleared,
    /// so no transaction is left pointing at a missing customer.
    pub fn delete_customer(&mut self, customer_id: CustomerId) -> Result<Customer, LedgerError> {
        let customer = self
            .customers
            .remove(customer_id)
            .ok_or_else(|| LedgerError::customer_not_found(customer_id, "delete"))?;
        let detached = self.transactions.detach_customer(customer_id);
        info!(customer = customer_id, detached, "Deleted customer");
        Ok(customer)
    }

    /// Remove every transaction and every customer
    pub fn delete_all_customers(&mut self) -> PurgeSummary {
        let transactions = self.transactions.clear();
        let customers = self.customers.clear();
        info!(customers, transactions, "Deleted all customers and transactions");
        PurgeSummary {
            customers,
            transactions,
        }
    }

    pub fn customer(&self, customer_id: CustomerId) -> Option<&Customer> {
        self.customers.get(customer_id)
    }

    /// Every customer, ascending by id
    pub fn customers(&self) -> Vec<&Customer> {
        self.customers.list()
    }

    // ---- transaction lifecycle ----

    /// Record a new transaction
    ///
    /// Cash is stored as confirmed, credit and cheque as pending. If the
    /// transaction belongs to a customer, that customer's balances are
    /// recomputed before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The amount is negative
    /// - A credit transaction has no customer
    /// - A cheque transaction lacks cheque number or date
    /// - The referenced customer does not exist
    /// - The customer's balance would overflow (nothing is stored)
    /// - The balance write-back fails (the transaction stays recorded)
    pub fn create_transaction(&mut self, new: NewTransaction) -> Result<Transaction, LedgerError> {
        let mut tx = new.into_transaction(0, Utc::now());
        tx.validate()?;
        self.ensure_customer_exists(tx.customer_id)?;
        if let Some(customer_id) = tx.customer_id {
            // new ids are the highest, so the new row sums last
            let existing = self.transactions.for_customer(customer_id);
            reconciler::compute_balances(existing.into_iter().chain([&tx]))?;
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

    /// Apply a partial update to a transaction
    ///
    /// Both the customer the transaction belonged to before the update and the
    /// one it belongs to afterwards are recomputed.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The transaction ID is not found
    /// - The patched transaction breaks a validation rule (nothing is changed)
    /// - An affected balance would overflow (nothing is changed)
    /// - The balance write-back fails
    pub fn update_transaction(
        &mut self,
        tx_id: TransactionId,
        patch: TransactionPatch,
    ) -> Result<Transaction, LedgerError> {
        let old = self
            .transactions
            .get(tx_id)
            .cloned()
            .ok_or_else(|| LedgerError::transaction_not_found(tx_id, "update"))?;

        let updated = patch.apply_to(&old);
        updated.validate()?;
        if updated.customer_id != old.customer_id {
            self.ensure_customer_exists(updated.customer_id)?;
        }
        reconciler::check_replacement(
            &self.transactions,
            tx_id,
            Some(&updated),
            &[old.customer_id, updated.customer_id],
        )?;

        self.transactions.replace(updated.clone())?;
        info!(
            tx = tx_id,
            old_customer = ?old.customer_id,
            customer = ?updated.customer_id,
            "Updated transaction"
        );

        self.reconcile_after(tx_id, "update", &[old.customer_id, updated.customer_id])?;
        Ok(updated)
    }

    /// Remove a transaction and recompute its customer
    ///
    /// Returns the removed transaction.
    pub fn delete_transaction(&mut self, tx_id: TransactionId) -> Result<Transaction, LedgerError> {
        let customer_id = self
            .transactions
            .get(tx_id)
            .ok_or_else(|| LedgerError::transaction_not_found(tx_id, "delete"))?
            .customer_id;
        reconciler::check_replacement(&self.transactions, tx_id, None, &[customer_id])?;

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
    /// # Errors
    ///
    /// Returns an error if:
    /// - The transaction ID is not found
    /// - The transaction is already confirmed (nothing is changed)
    /// - The balance write-back fails
    pub fn confirm_transaction(&mut self, tx_id: TransactionId) -> Result<Transaction, LedgerError> {
        let mut tx = self
            .transactions
            .get(tx_id)
            .cloned()
            .ok_or_else(|| LedgerError::transaction_not_found(tx_id, "confirm"))?;

        if tx.is_confirmed() {
            return Err(LedgerError::AlreadyConfirmed { tx: tx_id });
        }

        tx.status = TransactionStatus::Confirmed;
        reconciler::check_replacement(&self.transactions, tx_id, Some(&tx), &[tx.customer_id])?;
        self.transactions.replace(tx.clone())?;
        info!(tx = tx_id, customer = ?tx.customer_id, "Confirmed transaction");

        self.reconcile_after(tx_id, "confirm", &[tx.customer_id])?;
        Ok(tx)
    }

    /// Remove every transaction and reset every customer's balances to zero
    ///
    /// Returns the number of transactions removed.
    pub fn delete_all_transactions(&mut self) -> Result<usize, LedgerError> {
        let removed = self.transactions.clear();
        info!(removed, "Deleted all transactions");

        let report = reconciler::recalculate_all(&self.transactions, &mut self.customers);
        match report.failures.into_iter().next() {
            Some(failure) => Err(failure.error),
            None => Ok(removed),
        }
    }

    /// Create the transaction described by an import row
    ///
    /// Rows that ask for confirmation are confirmed right after creation. If
    /// the confirm step fails, the created transaction stays pending.
    pub fn apply_import(&mut self, record: ImportRecord) -> Result<Transaction, LedgerError> {
        let tx = self.create_transaction(record.transaction)?;
        if record.confirm && !tx.is_confirmed() {
            return self.confirm_transaction(tx.id);
        }
        Ok(tx)
    }

    pub fn transaction(&self, tx_id: TransactionId) -> Option<&Transaction> {
        self.transactions.get(tx_id)
    }

    /// Transactions, newest first, optionally restricted to one customer
    pub fn transactions(&self, customer: Option<CustomerId>) -> Vec<&Transaction> {
        let mut transactions = match customer {
            Some(customer_id) => self.transactions.for_customer(customer_id),
            None => self.transactions.list(),
        };
        transactions.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        transactions
    }

    // ---- reconciliation ----

    /// Recompute one customer's balances from their transactions
    pub fn recompute(&mut self, customer_id: CustomerId) -> Result<Customer, LedgerError> {
        reconciler::recompute(&self.transactions, &mut self.customers, Some(customer_id))?
            .ok_or_else(|| LedgerError::customer_not_found(customer_id, "recompute"))
    }

    /// Recompute every customer, collecting per-customer failures
    pub fn recalculate_all(&mut self) -> RecalculationReport {
        let report = reconciler::recalculate_all(&self.transactions, &mut self.customers);
        info!(
            recalculated = report.recalculated.len(),
            failed = report.failures.len(),
            "Recalculated all customer balances"
        );
        report
    }

    /// Customers whose stored balances disagree with their transactions
    pub fn audit(&self) -> Vec<BalanceDrift> {
        reconciler::audit(&self.transactions, &self.customers)
    }

    /// Confirmed income grouped by month
    pub fn income_by_month(&self) -> Result<Vec<MonthlyIncome>, LedgerError> {
        analytics::income_by_month(self.transactions.list())
    }

    fn ensure_customer_exists(&self, customer_id: Option<CustomerId>) -> Result<(), LedgerError> {
        match customer_id {
            Some(customer) if self.customers.get(customer).is_none() => {
                Err(LedgerError::UnknownCustomer { customer })
            }
            _ => Ok(()),
        }
    }

    /// Recompute each distinct customer in `affected`
    ///
    /// The transaction mutation has already been applied when this runs. A
    /// failed write-back leaves the customer's cached balances stale until the
    /// next successful recompute, so it is logged before being returned.
    fn reconcile_after(
        &mut self,
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

            if let Err(e) =
                reconciler::recompute(&self.transactions, &mut self.customers, Some(*customer_id))
            {
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
