//! I/O module
//!
//! Handles CSV parsing, listing output and the data directory.
//!
//! # Components
//!
//! - `csv_format` - Row formats, conversions and listing writers
//! - `snapshot` - Load and atomically save the data directory
//! - `sync_reader` - Synchronous import reader with iterator interface
//! - `async_reader` - Asynchronous import reader with batch reading interface

pub mod async_reader;
pub mod csv_format;
pub mod snapshot;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{
    convert_import_row, write_customers_csv, write_drift_csv, write_income_csv,
    write_transactions_csv, ImportRow,
};
pub use snapshot::{load_snapshot, save_snapshot};
pub use sync_reader::SyncReader;
