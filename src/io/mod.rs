//! I/O module
//!
//! Handles CSV parsing and output.
//!
//! - `csv_format` - Record types, conversion and ledger output serialization
//! - `sync_reader` - Streaming postings reader and accounts loader
//! - `async_reader` - Batch postings reader over csv-async

pub mod async_reader;
pub mod csv_format;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{
    convert_account_record, convert_posting_record, write_transactions_csv, AccountCsvRecord,
    PostingCsvRecord,
};
pub use sync_reader::{read_accounts, SyncReader};
