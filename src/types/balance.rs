//! Derived balance pair for a customer
//!
//! `Balances` values are only produced by the reconciler (the constructors are
//! crate-private), which keeps every write to a customer's balance fields on
//! the recompute path.

use super::error::LedgerError;
use super::transaction::{Transaction, TransactionStatus};
use rust_decimal::Decimal;

/// Confirmed and pending sums of a customer's signed transaction amounts
///
/// Code outside the crate can read balances but cannot make them, so it
/// cannot hand arbitrary values to a customer store:
///
/// ```compile_fail
/// let zero = shop_ledger::Balances::ZERO;
/// ```
///
/// ```compile_fail
/// let zero = shop_ledger::Balances::default();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balances {
    credit: Decimal,
    pending: Decimal,
}

impl Balances {
    /// Balances of a customer with no transactions
    pub(crate) const ZERO: Balances = Balances {
        credit: Decimal::ZERO,
        pending: Decimal::ZERO,
    };

    pub(crate) fn new(credit: Decimal, pending: Decimal) -> Self {
        Balances { credit, pending }
    }

    /// Sum of signed amounts of confirmed transactions
    pub fn credit(&self) -> Decimal {
        self.credit
    }

    /// Sum of signed amounts of pending transactions
    pub fn pending(&self) -> Decimal {
        self.pending
    }

    /// Fold one transaction into the running sums
    ///
    /// # Errors
    ///
    /// Returns an overflow error if the affected sum leaves the decimal range;
    /// the balances are unchanged in that case.
    pub(crate) fn include(&mut self, tx: &Transaction) -> Result<(), LedgerError> {
        let amount = tx.signed_amount();
        let overflow = |sum: &str| LedgerError::arithmetic_overflow(sum, tx.customer_id);
        match tx.status {
            TransactionStatus::Confirmed => {
                self.credit = self
                    .credit
                    .checked_add(amount)
                    .ok_or_else(|| overflow("credit balance"))?;
            }
            TransactionStatus::Pending => {
                self.pending = self
                    .pending
                    .checked_add(amount)
                    .ok_or_else(|| overflow("pending balance"))?;
            }
        }
        Ok(())
    }
}
