//! Synchronous import strategy
//!
//! Streams rows from a [`SyncReader`] and applies each one, in file order, to a
//! single-writer [`Ledger`].
//!
//! # Memory Efficiency
//!
//! Rows are read one at a time; only the ledger itself is held in memory.

use crate::core::Ledger;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{ImportOutcome, ImportStrategy};
use crate::types::{ImportRejection, LedgerError, LedgerSnapshot};
use std::path::Path;
use tracing::{info, warn};

/// Synchronous import strategy
#[derive(Debug, Clone, Copy)]
pub struct SyncImportStrategy;

impl ImportStrategy for SyncImportStrategy {
    fn import(
        &self,
        input_path: &Path,
        snapshot: LedgerSnapshot,
    ) -> Result<ImportOutcome, LedgerError> {
        let reader = SyncReader::new(input_path)?;
        let mut ledger = Ledger::from_snapshot(snapshot);
        let mut imported = 0;
        let mut rejected = Vec::new();

        for result in reader {
            let outcome = result.and_then(|record| {
                let line = record.line;
                ledger
                    .apply_import(record)
                    .map_err(|error| ImportRejection { line, error })
            });

            match outcome {
                Ok(_) => imported += 1,
                Err(rejection) => {
                    warn!(line = rejection.line, error = %rejection.error, "Rejected import row");
                    rejected.push(rejection);
                }
            }
        }

        info!(imported, rejected = rejected.len(), "Import finished");
        Ok(ImportOutcome {
            snapshot: ledger.snapshot(),
            imported,
            rejected,
        })
    }
}
