//! Import strategy module
//!
//! This module defines the Strategy pattern for bulk CSV import pipelines,
//! covering both CSV parsing and applying rows to a ledger. This allows
//! different implementations (synchronous, asynchronous batch) to be selected
//! at runtime.
//!
//! Strategies take a [`LedgerSnapshot`] and return the updated one, so the
//! caller decides where ledger state comes from and whether to persist it.

use crate::cli::StrategyType;
use crate::types::{ImportRejection, LedgerError, LedgerSnapshot};
use std::path::Path;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncImportStrategy, BatchConfig};
pub use sync::SyncImportStrategy;

/// What an import did
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    /// Ledger state after every accepted row was applied
    pub snapshot: LedgerSnapshot,

    /// Number of rows that created a transaction
    pub imported: usize,

    /// Rows that failed to parse or were rejected by the ledger, by line
    pub rejected: Vec<ImportRejection>,
}

/// Import strategy trait for bulk CSV import pipelines
pub trait ImportStrategy: Send + Sync {
    /// Apply every row of `input_path` to the ledger held in `snapshot`
    ///
    /// # Arguments
    ///
    /// * `input_path` - Path to the import CSV file
    /// * `snapshot` - Ledger state to import into
    ///
    /// # Returns
    ///
    /// The updated ledger state along with per-row results.
    ///
    /// # Errors
    ///
    /// Returns an error only for failures that stop the whole import (the file
    /// cannot be opened, the runtime cannot start). Rejected rows are logged,
    /// listed in [`ImportOutcome::rejected`], and do not stop the import.
    fn import(
        &self,
        input_path: &Path,
        snapshot: LedgerSnapshot,
    ) -> Result<ImportOutcome, LedgerError>;
}

/// Create an import strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of strategy to create (Sync or Async)
/// * `config` - Optional configuration for async batch processing (ignored for sync)
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
) -> Box<dyn ImportStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncImportStrategy),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncImportStrategy::new(config))
        }
    }
}
