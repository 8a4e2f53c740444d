//! Balance reconciliation
//!
//! A customer's `credit_balance` and `pending_balance` are caches of two sums
//! over that customer's transactions. This module is the only place that
//! computes them and the only caller of [`CustomerStore::write_balances`].
//!
//! Balances are always recomputed from the full transaction set rather than
//! adjusted by deltas, so running [`recompute`] or [`recalculate_all`] brings a
//! drifted store back to a consistent state.

use crate::core::traits::{CustomerStore, TransactionStore};
use crate::types::{Balances, Customer, CustomerId, LedgerError, Transaction, TransactionId};
use tracing::{debug, warn};

/// Sum signed amounts of `transactions` into confirmed and pending balances
///
/// Both sums come from the same pass over the input. Amounts are added in the
/// order given; stores hand them over in ascending id order.
///
/// # Errors
///
/// Returns an overflow error if either sum leaves the decimal range.
pub fn compute_balances<'a, I>(transactions: I) -> Result<Balances, LedgerError>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut balances = Balances::ZERO;
    for tx in transactions {
        balances.include(tx)?;
    }
    Ok(balances)
}

/// Balances `customer_id` would have if transaction `tx_id` became `replacement`
///
/// `existing` is the customer's current transactions in ascending id order.
/// `replacement` is the new version of the transaction, or `None` when it is
/// being removed; it only counts if it belongs to `customer_id`.
pub fn balances_after_replacement<'a, I>(
    existing: I,
    customer_id: CustomerId,
    tx_id: TransactionId,
    replacement: Option<&'a Transaction>,
) -> Result<Balances, LedgerError>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut candidate: Vec<&Transaction> = existing
        .into_iter()
        .filter(|tx| tx.id != tx_id)
        .collect();
    if let Some(tx) = replacement.filter(|tx| tx.customer_id == Some(customer_id)) {
        let position = candidate.partition_point(|other| other.id < tx.id);
        candidate.insert(position, tx);
    }
    compute_balances(candidate)
}

/// Check that replacing transaction `tx_id` keeps every affected balance in range
///
/// Nothing is written; lifecycle operations call this before touching the
/// store so an overflow leaves the ledger unchanged.
pub fn check_replacement<T>(
    transactions: &T,
    tx_id: TransactionId,
    replacement: Option<&Transaction>,
    affected: &[Option<CustomerId>],
) -> Result<(), LedgerError>
where
    T: TransactionStore + ?Sized,
{
    for customer_id in affected.iter().flatten() {
        balances_after_replacement(
            transactions.for_customer(*customer_id),
            *customer_id,
            tx_id,
            replacement,
        )?;
    }
    Ok(())
}

/// Recompute one customer's balances from the transaction store and write them back
///
/// Does nothing and returns `Ok(None)` when `customer_id` is `None`: walk-in
/// transactions never touch a customer balance.
///
/// # Errors
///
/// Returns an error if the sums overflow or the customer store rejects the
/// write (for example the customer no longer exists).
pub fn recompute<T, C>(
    transactions: &T,
    customers: &mut C,
    customer_id: Option<CustomerId>,
) -> Result<Option<Customer>, LedgerError>
where
    T: TransactionStore + ?Sized,
    C: CustomerStore + ?Sized,
{
    let Some(customer_id) = customer_id else {
        return Ok(None);
    };

    let balances = compute_balances(transactions.for_customer(customer_id))?;
    let customer = customers.write_balances(customer_id, balances)?;

    debug!(
        customer = customer_id,
        credit = %balances.credit(),
        pending = %balances.pending(),
        "Recalculated customer balances"
    );

    Ok(Some(customer))
}

/// A customer whose recompute failed during a bulk run
#[derive(Debug, Clone, PartialEq)]
pub struct RecalculationFailure {
    pub customer_id: CustomerId,
    pub error: LedgerError,
}

/// Outcome of [`recalculate_all`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecalculationReport {
    /// Customers whose balances were rewritten, in ascending id order
    pub recalculated: Vec<CustomerId>,

    /// Customers that could not be reconciled
    pub failures: Vec<RecalculationFailure>,
}

impl RecalculationReport {
    /// True when every customer was reconciled
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Recompute every customer independently
///
/// A failure on one customer is logged and recorded in the report; the
/// remaining customers are still reconciled.
pub fn recalculate_all<T, C>(transactions: &T, customers: &mut C) -> RecalculationReport
where
    T: TransactionStore + ?Sized,
    C: CustomerStore + ?Sized,
{
    let mut report = RecalculationReport::default();

    for customer_id in customers.ids() {
        match recompute(transactions, &mut *customers, Some(customer_id)) {
            Ok(_) => report.recalculated.push(customer_id),
            Err(error) => {
                warn!(customer = customer_id, error = %error, "Failed to recalculate customer balances");
                report.failures.push(RecalculationFailure { customer_id, error });
            }
        }
    }

    report
}

/// Stored balances that disagree with the transaction set
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceDrift {
    pub customer_id: CustomerId,
    pub name: String,
    /// What the customer store currently holds
    pub stored: Balances,
    /// What a recompute would write
    pub expected: Balances,
}

/// List every customer whose cached balances have drifted, without writing anything
///
/// A customer whose transactions cannot be summed is logged and left out;
/// [`recalculate_all`] reports it as a failure.
pub fn audit<T, C>(transactions: &T, customers: &C) -> Vec<BalanceDrift>
where
    T: TransactionStore + ?Sized,
    C: CustomerStore + ?Sized,
{
    customers
        .list()
        .into_iter()
        .filter_map(|customer| {
            let expected = match compute_balances(transactions.for_customer(customer.id)) {
                Ok(expected) => expected,
                Err(error) => {
                    warn!(customer = customer.id, error = %error, "Cannot audit customer balances");
                    return None;
                }
            };
            (customer.balances() != expected).then(|| BalanceDrift {
                customer_id: customer.id,
                name: customer.name.clone(),
                stored: customer.balances(),
                expected,
            })
        })
        .collect()
}
