//! Synchronous CSV readers
//!
//! `SyncReader` streams posting requests from a CSV file one row at a time.
//! Row-level problems are yielded as `Err` items carrying the line number, so
//! the caller decides whether to skip or stop. `read_accounts` loads the
//! (small) accounts file in one go.
//!
//! ```no_run
//! use account_ledger::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("postings.csv")).unwrap();
//! let requests: Vec<_> = reader.filter_map(Result::ok).collect();
//! println!("Parsed {} postings", requests.len());
//! ```

use crate::io::csv_format::{
    convert_account_record, convert_posting_record, AccountCsvRecord, PostingCsvRecord,
};
use crate::types::{Account, PostRequest};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

fn open_csv(path: &Path) -> Result<csv::Reader<File>, String> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

    Ok(ReaderBuilder::new()
        .trim(Trim::All)
        .buffer_capacity(8 * 1024)
        .from_reader(file))
}

/// Streaming reader over the postings CSV
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: usize,
}

impl SyncReader {
    /// Open a postings CSV file
    ///
    /// # Errors
    ///
    /// Returns an error message if the file cannot be opened.
    pub fn new(path: &Path) -> Result<Self, String> {
        Ok(Self {
            reader: open_csv(path)?,
            line_num: 1,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<PostRequest, String>;

    /// Next posting request, `Err` for a malformed row, `None` at end of file
    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<PostingCsvRecord>();
        let row = deserializer.next()?;
        self.line_num += 1;

        Some(match row {
            Ok(record) => {
                convert_posting_record(record).map_err(|e| format!("Line {}: {}", self.line_num, e))
            }
            Err(e) => Err(format!("Line {}: CSV parse error: {}", self.line_num, e)),
        })
    }
}

/// Load every account from an accounts CSV file
///
/// Unlike postings, a malformed account row fails the whole load: postings
/// against a silently dropped account would all be rejected.
pub fn read_accounts(path: &Path) -> Result<Vec<Account>, String> {
    let mut reader = open_csv(path)?;
    let mut accounts = Vec::new();

    for (index, row) in reader.deserialize::<AccountCsvRecord>().enumerate() {
        let record = row.map_err(|e| {
            format!(
                "{} line {}: CSV parse error: {}",
                path.display(),
                index + 2,
                e
            )
        })?;
        accounts.push(convert_account_record(record));
    }

    Ok(accounts)
}
