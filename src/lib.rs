//! Shop Ledger Library
//! # Overview
//!
//! This library keeps the customers and transactions of a small shop and
//! maintains each customer's balances as a pure function of their
//! transactions, with both a single-writer ledger and a concurrent one used
//! for bulk imports.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Customer, Transaction, Balances, etc.)
//! - [`cli`] - CLI arguments, command dispatch and logging setup
//! - [`core`] - Business logic components:
//!   - [`core::engine`] - Lifecycle operations that keep balances in step
//!   - [`core::reconciler`] - Balance recomputation and drift audit
//!   - [`core::customer_store`] - Customer records and stored balances
//!   - [`core::transaction_store`] - Transaction records and id allocation
//!   - [`core::analytics`] - Monthly income reporting
//! - [`io`] - CSV import rows, listings and the data directory
//! - [`strategy`] - Pluggable bulk import strategies
//!
//! # Transaction Types
//!
//! - **Cash**: Paid on the spot; confirmed when recorded and subtracts from credit
//! - **Credit**: Goods taken on account; pending until confirmed, then adds to credit
//! - **Cheque**: Payment by cheque; pending until cleared, then subtracts from credit
//!
//! # Customer Balances
//!
//! Each customer maintains:
//! - `credit_balance`: Signed sum of their confirmed transactions
//! - `pending_balance`: Signed sum of their pending transactions
//!
//! Transactions without a customer are walk-in sales and affect no balance.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{Ledger, SharedLedger};
pub use io::{load_snapshot, save_snapshot, write_customers_csv};
pub use types::{
    Balances, Customer, CustomerId, LedgerError, LedgerSnapshot, NewCustomer, NewTransaction,
    Transaction, TransactionId, TransactionStatus, TransactionType,
};
