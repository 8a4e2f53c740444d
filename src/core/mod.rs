//! Core business logic module
//!
//! This module contains the ledger's consistency machinery:
//! - `traits` - Store abstractions for interchangeable implementations
//! - `transaction_store` / `customer_store` - In-memory stores
//! - `reconciler` - Balance recompute, bulk recalculation and drift audit
//! - `engine` - Transaction lifecycle orchestration
//! - `analytics` - Monthly income summaries
//! - `async` - Concurrent implementations for multi-writer use

pub mod analytics;
pub mod r#async;
pub mod customer_store;
pub mod engine;
pub mod reconciler;
pub mod traits;
pub mod transaction_store;

pub use analytics::MonthlyIncome;
pub use customer_store::MemoryCustomerStore;
pub use engine::{Ledger, PurgeSummary};
pub use r#async::{BatchProcessor, SharedCustomerStore, SharedLedger, SharedTransactionStore};
pub use reconciler::{BalanceDrift, RecalculationFailure, RecalculationReport};
pub use traits::{CustomerStore, TransactionStore};
pub use transaction_store::MemoryTransactionStore;
