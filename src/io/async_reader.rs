//! Asynchronous postings reader with a batch interface
//!
//! ```text
//! CSV bytes -> AsyncReader -> batches of PostRequest
//!                  |
//!           csv_format module
//!   (PostingCsvRecord, convert_posting_record)
//! ```
//!
//! Malformed rows are logged and skipped so a batch only ever holds requests
//! that parsed.

use crate::io::csv_format::{convert_posting_record, PostingCsvRecord};
use crate::types::PostRequest;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous postings CSV reader
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    line_num: usize,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line_num: 1,
        }
    }

    /// Read up to `batch_size` posting requests
    ///
    /// Returns an empty vector once the input is exhausted.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<PostRequest> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<PostingCsvRecord>();

        while batch.len() < batch_size {
            let Some(row) = records.next().await else {
                break;
            };
            self.line_num += 1;

            match row {
                Ok(record) => match convert_posting_record(record) {
                    Ok(request) => batch.push(request),
                    Err(e) => warn!(line = self.line_num, error = %e, "skipping posting"),
                },
                Err(e) => warn!(line = self.line_num, error = %e, "CSV parse error"),
            }
        }

        batch
    }
}
