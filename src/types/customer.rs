//! Customer-related types for the shop ledger
//!
//! This module defines the Customer record and the inputs used to create and
//! patch customer details. Balance fields are not part of either input.

use super::balance::Balances;
use super::error::LedgerError;
use super::transaction::non_blank;
use rust_decimal::Decimal;

/// Customer identifier, assigned by the customer store
pub type CustomerId = u64;

/// A customer and the cached balances derived from their transactions
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    /// Store-assigned identifier
    pub id: CustomerId,

    pub name: String,

    pub phone: Option<String>,

    pub address: Option<String>,

    /// Cache of the reconciler's last result for this customer
    balances: Balances,
}

impl Customer {
    /// Create a customer record with zero balances
    pub(crate) fn new(id: CustomerId, details: NewCustomer) -> Self {
        Customer {
            id,
            name: details.name.trim().to_string(),
            phone: non_blank(details.phone),
            address: non_blank(details.address),
            balances: Balances::ZERO,
        }
    }

    /// What the customer owes on settled transactions
    pub fn credit_balance(&self) -> Decimal {
        self.balances.credit()
    }

    /// What the customer would owe once pending transactions are confirmed
    pub fn pending_balance(&self) -> Decimal {
        self.balances.pending()
    }

    pub fn balances(&self) -> Balances {
        self.balances
    }

    pub(crate) fn set_balances(&mut self, balances: Balances) {
        self.balances = balances;
    }

    pub(crate) fn apply(&mut self, patch: CustomerPatch) -> Result<(), LedgerError> {
        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(LedgerError::MissingCustomerName);
            }
            self.name = name;
        }
        if let Some(phone) = patch.phone {
            self.phone = non_blank(phone);
        }
        if let Some(address) = patch.address {
            self.address = non_blank(address);
        }
        Ok(())
    }
}

/// Input for creating a customer
#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomer {
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl NewCustomer {
    pub fn new(name: impl Into<String>) -> Self {
        NewCustomer {
            name: name.into(),
            phone: None,
            address: None,
        }
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.name.trim().is_empty() {
            return Err(LedgerError::MissingCustomerName);
        }
        Ok(())
    }
}

/// Partial update of customer details
///
/// Same convention as [`crate::types::TransactionPatch`]: the outer `Option`
/// selects the field, the inner one is the new value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub phone: Option<Option<String>>,
    pub address: Option<Option<String>>,
}
