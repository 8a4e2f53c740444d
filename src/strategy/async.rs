//! Asynchronous batch import strategy
//!
//! This module provides a multi-threaded implementation of the ImportStrategy
//! trait. Rows are read in batches and applied with customer-based
//! partitioning.
//!
//! # Architecture
//!
//! ```text
//! AsyncImportStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReader (batch CSV reading)
//!     ├── BatchProcessor (customer partitioning + tokio tasks)
//!     └── SharedLedger (thread-safe lifecycle controller)
//!         ├── SharedCustomerStore
//!         └── SharedTransactionStore
//! ```
//!
//! # Ordering
//!
//! - Batches are processed one after another, so rows for one customer are
//!   applied in file order across the whole file
//! - Within a batch, different customers are processed in parallel
//! - Transaction ids are allocated as rows are applied, so ids of rows for
//!   different customers may not follow file order

use crate::core::r#async::{BatchProcessor, SharedLedger};
use crate::io::async_reader::AsyncReader;
use crate::strategy::{ImportOutcome, ImportStrategy};
use crate::types::{ImportRejection, LedgerError, LedgerSnapshot};
use std::path::Path;
use tracing::{info, warn};

/// Configuration for batch processing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of rows per batch
    pub batch_size: usize,
    /// Number of runtime worker threads
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig, replacing zero values with the defaults
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                batch_size,
                default = default.batch_size,
                "Invalid batch_size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                max_concurrent_batches,
                default = default.max_concurrent_batches,
                "Invalid max_concurrent_batches, using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Asynchronous batch import strategy
#[derive(Debug, Clone)]
pub struct AsyncImportStrategy {
    config: BatchConfig,
}

impl AsyncImportStrategy {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }
}

impl ImportStrategy for AsyncImportStrategy {
    /// Run the batch pipeline on a dedicated multi-threaded tokio runtime
    fn import(
        &self,
        input_path: &Path,
        snapshot: LedgerSnapshot,
    ) -> Result<ImportOutcome, LedgerError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| LedgerError::persistence(format!("Failed to create tokio runtime: {}", e)))?;

        runtime.block_on(async {
            let file = tokio::fs::File::open(input_path).await.map_err(|e| {
                LedgerError::persistence(format!(
                    "Failed to open file '{}': {}",
                    input_path.display(),
                    e
                ))
            })?;
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            let ledger = SharedLedger::from_snapshot(snapshot);
            let processor = BatchProcessor::new(ledger.clone());
            let mut imported = 0;
            let mut rejected: Vec<ImportRejection> = Vec::new();

            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                let mut records = Vec::with_capacity(batch.len());
                for result in batch {
                    match result {
                        Ok(record) => records.push(record),
                        Err(rejection) => rejected.push(rejection),
                    }
                }

                // finish this batch before reading the next
                for result in processor.process_batch(records).await {
                    match result.result {
                        Ok(_) => imported += 1,
                        Err(error) => rejected.push(ImportRejection {
                            line: result.line,
                            error,
                        }),
                    }
                }
            }

            rejected.sort_by_key(|rejection| rejection.line);
            for rejection in &rejected {
                warn!(line = rejection.line, error = %rejection.error, "Rejected import row");
            }
            info!(imported, rejected = rejected.len(), "Import finished");

            Ok(ImportOutcome {
                snapshot: ledger.snapshot(),
                imported,
                rejected,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Ledger;
    use crate::strategy::SyncImportStrategy;
    use crate::types::NewCustomer;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[rstest]
    #[case::defaults_kept(10, 2, 10, 2)]
    #[case::zero_batch_size(0, 2, 1000, 2)]
    fn test_batch_config_new(
        #[case] batch_size: usize,
        #[case] workers: usize,
        #[case] expected_batch_size: usize,
        #[case] expected_workers: usize,
    ) {
        let config = BatchConfig::new(batch_size, workers);
        assert_eq!(config.batch_size, expected_batch_size);
        assert_eq!(config.max_concurrent_batches, expected_workers);
    }

    #[test]
    fn test_zero_workers_falls_back_to_cpu_count() {
        assert_eq!(BatchConfig::new(5, 0).max_concurrent_batches, num_cpus::get());
    }

    #[test]
    fn test_async_matches_sync_balances() {
        let mut ledger = Ledger::new();
        for name in ["A", "B", "C"] {
            ledger.create_customer(NewCustomer::new(name)).unwrap();
        }

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "type,customer,amount,cheque_number,cheque_date,status").unwrap();
        for i in 0..60u32 {
            let customer = i % 3 + 1;
            match i % 4 {
                0 => writeln!(file, "credit,{customer},{},,,Confirmed", 100 + i).unwrap(),
                1 => writeln!(file, "cash,{customer},{},,,", 10 + i).unwrap(),
                2 => writeln!(file, "cheque,{customer},25,CH{i},2024-05-01,").unwrap(),
                _ => writeln!(file, "credit,,5,,,").unwrap(),
            }
        }

        let sync = SyncImportStrategy
            .import(file.path(), ledger.snapshot())
            .unwrap();
        let r#async = AsyncImportStrategy::new(BatchConfig::new(7, 4))
            .import(file.path(), ledger.snapshot())
            .unwrap();

        assert_eq!(sync.imported, r#async.imported);
        assert_eq!(sync.rejected, r#async.rejected);
        assert_eq!(sync.rejected.len(), 15);
        assert_eq!(sync.snapshot.customers, r#async.snapshot.customers);
    }
}
