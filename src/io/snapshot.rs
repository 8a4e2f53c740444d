//! Data directory persistence
//!
//! A ledger is stored as two CSV files in one directory, `customers.csv` and
//! `transactions.csv` (see [`crate::io::csv_format`] for the layouts). A missing
//! file reads as an empty collection.
//!
//! Each file is written to a temporary file in the same directory and then
//! renamed over the old one, so a crash mid-write leaves the previous version
//! intact.

use crate::io::csv_format::{
    customer_from_row, customer_to_row, transaction_from_row, transaction_to_row, CustomerRow,
    TransactionRow,
};
use crate::types::{LedgerError, LedgerSnapshot};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

pub const CUSTOMERS_FILE: &str = "customers.csv";
pub const TRANSACTIONS_FILE: &str = "transactions.csv";

const CUSTOMER_HEADERS: [&str; 6] = [
    "id",
    "name",
    "phone",
    "address",
    "credit_balance",
    "pending_balance",
];

const TRANSACTION_HEADERS: [&str; 9] = [
    "id",
    "amount",
    "type",
    "customer_id",
    "cheque_number",
    "cheque_date",
    "date",
    "description",
    "status",
];

/// Read the ledger stored in `dir`
///
/// Stored balances are loaded as they are, even if they disagree with the
/// transactions.
///
/// # Errors
///
/// Returns a persistence error if a file cannot be read, or a parse error
/// naming the file and line if a row is malformed.
pub fn load_snapshot(dir: &Path) -> Result<LedgerSnapshot, LedgerError> {
    let customers = read_rows::<CustomerRow, _, _>(&dir.join(CUSTOMERS_FILE), customer_from_row)?;
    let transactions =
        read_rows::<TransactionRow, _, _>(&dir.join(TRANSACTIONS_FILE), transaction_from_row)?;

    debug!(
        dir = %dir.display(),
        customers = customers.len(),
        transactions = transactions.len(),
        "Loaded ledger"
    );

    Ok(LedgerSnapshot {
        customers,
        transactions,
    }
    .normalize())
}

/// Write `snapshot` into `dir`, creating the directory if needed
pub fn save_snapshot(dir: &Path, snapshot: &LedgerSnapshot) -> Result<(), LedgerError> {
    fs::create_dir_all(dir)?;

    let mut customers: Vec<_> = snapshot.customers.iter().collect();
    customers.sort_by_key(|c| c.id);
    write_rows(
        dir,
        CUSTOMERS_FILE,
        &CUSTOMER_HEADERS,
        customers.into_iter().map(customer_to_row),
    )?;

    let mut transactions: Vec<_> = snapshot.transactions.iter().collect();
    transactions.sort_by_key(|tx| tx.id);
    write_rows(
        dir,
        TRANSACTIONS_FILE,
        &TRANSACTION_HEADERS,
        transactions.into_iter().map(transaction_to_row),
    )?;

    debug!(
        dir = %dir.display(),
        customers = snapshot.customers.len(),
        transactions = snapshot.transactions.len(),
        "Saved ledger"
    );
    Ok(())
}

fn read_rows<R, T, F>(path: &Path, convert: F) -> Result<Vec<T>, LedgerError>
where
    R: DeserializeOwned,
    F: Fn(R) -> Result<T, LedgerError>,
{
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(file);

    let mut records = Vec::new();
    for (index, row) in reader.deserialize::<R>().enumerate() {
        // header is line 1
        let line = index as u64 + 2;
        let record = row
            .map_err(LedgerError::from)
            .and_then(&convert)
            .map_err(|e| LedgerError::ParseError {
                line: Some(line),
                message: format!("{}: {}", path.display(), e),
            })?;
        records.push(record);
    }
    Ok(records)
}

fn write_rows<S, I>(dir: &Path, name: &str, headers: &[&str], rows: I) -> Result<(), LedgerError>
where
    S: Serialize,
    I: IntoIterator<Item = S>,
{
    let mut staged = NamedTempFile::new_in(dir)?;
    {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(staged.as_file_mut());
        writer.write_record(headers)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    staged.as_file().sync_all()?;
    staged
        .persist(dir.join(name))
        .map_err(|e| LedgerError::from(e.error))?;
    Ok(())
}
