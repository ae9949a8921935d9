//! CSV format handling for postings, accounts and ledger output
//!
//! Everything here is pure (no file I/O); the readers and strategies own the
//! files.
//!
//! Formats:
//!
//! ```text
//! accounts.csv   account_id,document_number
//! postings.csv   account_id,operation_type_id,amount
//! output         transaction_id,account_id,operation_type_id,amount,balance
//! ```

use crate::types::{Account, AccountId, OperationTypeId, PostRequest, Transaction};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// Fractional digits written for amounts and balances
pub const OUTPUT_SCALE: usize = 2;

/// One row of the postings CSV
///
/// The amount stays a string so that parse failures carry the offending text.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PostingCsvRecord {
    pub account_id: AccountId,
    pub operation_type_id: OperationTypeId,
    pub amount: String,
}

/// One row of the accounts CSV
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AccountCsvRecord {
    pub account_id: AccountId,
    pub document_number: String,
}

/// Convert a postings row into a [`PostRequest`]
///
/// Only parsing happens here. Sign, scale and reference checks belong to the
/// ledger writer so both strategies report them the same way.
pub fn convert_posting_record(record: PostingCsvRecord) -> Result<PostRequest, String> {
    let amount_str = record.amount.trim();
    if amount_str.is_empty() {
        return Err(format!(
            "Posting for account {} requires an amount",
            record.account_id
        ));
    }

    let amount = Decimal::from_str(amount_str).map_err(|_| {
        format!(
            "Invalid amount '{}' for account {}",
            record.amount, record.account_id
        )
    })?;

    Ok(PostRequest::new(
        record.account_id,
        record.operation_type_id,
        amount,
    ))
}

pub fn convert_account_record(record: AccountCsvRecord) -> Account {
    Account::new(record.account_id, record.document_number.trim())
}

/// Write ledger rows as CSV, ordered by transaction id
pub fn write_transactions_csv(
    transactions: &[Transaction],
    output: &mut dyn Write,
) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record([
            "transaction_id",
            "account_id",
            "operation_type_id",
            "amount",
            "balance",
        ])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted = transactions.to_vec();
    sorted.sort_by_key(|tx| tx.id);

    for tx in sorted {
        writer
            .write_record(&[
                tx.id.to_string(),
                tx.account_id.to_string(),
                tx.operation_type_id.to_string(),
                format!("{:.*}", OUTPUT_SCALE, tx.amount),
                format!("{:.*}", OUTPUT_SCALE, tx.balance),
            ])
            .map_err(|e| format!("Failed to write transaction record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}
