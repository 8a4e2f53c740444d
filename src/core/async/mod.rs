//! Concurrent implementations of core components
//!
//! This module provides thread-safe versions of the ledger's stores and
//! lifecycle controller, using DashMap for fine-grained locking.
//!
//! # Architecture
//!
//! - **SharedCustomerStore**: customer records with per-entry locking
//! - **SharedTransactionStore**: transaction records and an atomic id counter
//! - **SharedLedger**: the lifecycle rules of [`crate::core::Ledger`] over the shared stores
//! - **BatchProcessor**: partitions import rows by customer and applies them in parallel
//!
//! # Thread Safety
//!
//! - Operations on different customers proceed in parallel
//! - Balance recomputes for the same customer are serialized
//! - No global locks

pub mod batch_processor;
pub mod customer_store;
pub mod engine;
pub mod transaction_store;

pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use customer_store::SharedCustomerStore;
pub use engine::SharedLedger;
pub use transaction_store::SharedTransactionStore;
