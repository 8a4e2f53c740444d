//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over import rows from a CSV file. Delegates
//! CSV format concerns to the csv_format module.
//!
//! # Design
//!
//! The SyncReader uses csv::Reader to read and deserialize rows sequentially,
//! converting each with [`convert_import_row`]. Rows are processed one at a
//! time without loading the entire file into memory.
//!
//! # Error Handling
//!
//! - Fatal errors (file not found) are returned from `new()`
//! - Row-level parse and conversion errors are yielded as `Err` with the
//!   row's line number, and iteration continues

use crate::io::csv_format::{convert_import_row, ImportRow};
use crate::types::{ImportRecord, ImportRejection, LedgerError};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    /// Line of the last row read; the header is line 1
    line_num: u64,
}

impl SyncReader {
    /// Open an import file
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the file cannot be opened.
    pub fn new(path: &Path) -> Result<Self, LedgerError> {
        let file = File::open(path).map_err(|e| {
            LedgerError::persistence(format!("Failed to open file '{}': {}", path.display(), e))
        })?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 1,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<ImportRecord, ImportRejection>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut rows = self.reader.deserialize::<ImportRow>();
        let row = rows.next()?;
        self.line_num += 1;
        let line = self.line_num;

        let result = row
            .map_err(LedgerError::from)
            .and_then(|row| convert_import_row(row, line))
            .map_err(|error| ImportRejection { line, error });
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionType;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn import_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_reads_rows_in_order() {
        let file = import_file(
            "type,customer,amount,cheque_number,cheque_date,date,description,status\n\
             credit,1,5000,,,2024-01-10,,Confirmed\n\
             cash,,20.5,,,,walk-in,\n",
        );
        let records: Vec<_> = SyncReader::new(file.path())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line, 2);
        assert_eq!(records[0].transaction.tx_type, TransactionType::Credit);
        assert!(records[0].confirm);
        assert_eq!(records[1].transaction.amount, dec!(20.5));
        assert_eq!(records[1].customer_id(), None);
    }

    #[test]
    fn test_bad_rows_are_yielded_with_line_and_reading_continues() {
        let file = import_file(
            "type,customer,amount\n\
             barter,1,10\n\
             cash,1,ten\n\
             cash,1,10\n",
        );
        let results: Vec<_> = SyncReader::new(file.path()).unwrap().collect();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap_err().line, 2);
        assert_eq!(results[1].as_ref().unwrap_err().line, 3);
        assert_eq!(results[2].as_ref().unwrap().line, 4);
    }

    #[test]
    fn test_missing_file() {
        let result = SyncReader::new(Path::new("does/not/exist.csv"));
        assert!(matches!(result, Err(LedgerError::Persistence { .. })));
    }
}
