//! Asynchronous CSV reader with batch reading interface
//!
//! Reads import rows in batches using `csv-async`, for the async import
//! strategy. Each batch holds both parsed rows and rejected rows, in file
//! order, so the caller can report every rejected line.

use crate::io::csv_format::{convert_import_row, ImportRow};
use crate::types::{ImportRecord, ImportRejection, LedgerError};
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;

/// Async import reader over any `futures::io::AsyncRead`
///
/// Tokio files are adapted with `tokio_util::compat`.
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    /// Line of the last row read; the header is line 1
    line_num: u64,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line_num: 1,
        }
    }

    /// Read up to `batch_size` rows
    ///
    /// Returns an empty batch at end of file.
    pub async fn read_batch(
        &mut self,
        batch_size: usize,
    ) -> Vec<Result<ImportRecord, ImportRejection>> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut rows = self.csv_reader.deserialize::<ImportRow>();

        while batch.len() < batch_size {
            let Some(row) = rows.next().await else {
                break;
            };
            self.line_num += 1;
            let line = self.line_num;

            let result = match row {
                Ok(row) => convert_import_row(row, line),
                Err(e) => Err(LedgerError::ParseError {
                    line: Some(line),
                    message: e.to_string(),
                }),
            };
            batch.push(result.map_err(|error| ImportRejection { line, error }));
        }

        batch
    }
}
