//! Batch processing with customer-based partitioning for concurrent import
//!
//! This module provides the `BatchProcessor` struct, which applies batches of
//! import rows to a [`SharedLedger`], processing different customers in
//! parallel while keeping each customer's rows in file order.
//!
//! # Design
//!
//! A batch is partitioned by customer id. Walk-in rows (no customer) form their
//! own partition. Each partition is applied sequentially inside one tokio task;
//! partitions run concurrently.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     └── SharedLedger  (cloneable handle over Arc'd DashMap stores)
//! ```

use std::collections::HashMap;

use super::SharedLedger;
use crate::types::{CustomerId, ImportRecord, LedgerError, Transaction};
use tokio::task::JoinHandle;
use tracing::error;

/// Result of applying a single import row
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// Line of the row in the source file
    pub line: u64,

    /// The created transaction, or why the row was rejected
    pub result: Result<Transaction, LedgerError>,
}

/// Batch processor with customer-based partitioning
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    ledger: SharedLedger,
}

impl BatchProcessor {
    pub fn new(ledger: SharedLedger) -> Self {
        Self { ledger }
    }

    /// Partition a batch of import rows by customer
    ///
    /// # Guarantees
    ///
    /// - Each row appears in exactly one partition
    /// - Rows for each customer keep their original order
    pub fn partition_by_customer(
        &self,
        batch: Vec<ImportRecord>,
    ) -> HashMap<Option<CustomerId>, Vec<ImportRecord>> {
        let mut partitions: HashMap<Option<CustomerId>, Vec<ImportRecord>> = HashMap::new();

        for record in batch {
            partitions
                .entry(record.customer_id())
                .or_default()
                .push(record);
        }

        partitions
    }

    /// Apply one partition's rows in order
    ///
    /// A rejected row does not stop the rows after it.
    pub async fn process_customer_records(
        &self,
        records: Vec<ImportRecord>,
    ) -> Vec<ProcessingResult> {
        records
            .into_iter()
            .map(|record| ProcessingResult {
                line: record.line,
                result: self.ledger.apply_import(record),
            })
            .collect()
    }

    /// Apply a batch with one task per customer partition
    ///
    /// Results are grouped by partition, not in file order. Every row yields a
    /// result: if a partition's task dies, its rows are rejected.
    pub async fn process_batch(&self, batch: Vec<ImportRecord>) -> Vec<ProcessingResult> {
        let partitions = self.partition_by_customer(batch);

        let mut tasks = Vec::with_capacity(partitions.len());
        for (_customer, records) in partitions {
            let lines: Vec<u64> = records.iter().map(|record| record.line).collect();
            let processor = self.clone();
            let handle = tokio::spawn(async move {
                processor.process_customer_records(records).await
            });
            tasks.push((lines, handle));
        }

        collect_partition_results(tasks).await
    }
}

/// Await partition tasks, turning a failed task into one rejection per line
async fn collect_partition_results(
    tasks: Vec<(Vec<u64>, JoinHandle<Vec<ProcessingResult>>)>,
) -> Vec<ProcessingResult> {
    let mut results = Vec::new();
    for (lines, task) in tasks {
        match task.await {
            Ok(partition_results) => results.extend(partition_results),
            Err(e) => {
                error!(error = %e, rows = lines.len(), "Import task failed; rejecting its rows");
                let error = LedgerError::persistence(format!("import task failed: {}", e));
                results.extend(lines.into_iter().map(|line| ProcessingResult {
                    line,
                    result: Err(error.clone()),
                }));
            }
        }
    }
    results
}
