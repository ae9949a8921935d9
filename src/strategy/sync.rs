//! Synchronous processing strategy
//!
//! Posts one request at a time in file order on the calling thread:
//!
//! - CSV parsing goes to `SyncReader`
//! - posting goes to `LedgerWriter`
//! - output goes to `csv_format::write_transactions_csv`
//!
//! Because postings are strictly sequential, transaction ids follow file order
//! and the output is fully deterministic.

use crate::config::LedgerConfig;
use crate::core::LedgerWriter;
use crate::io::csv_format::write_transactions_csv;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{seed_store, LedgerInput, ProcessingStrategy};
use std::io::Write;
use std::sync::Arc;
use tracing::{info_span, warn};

/// Synchronous processing strategy
///
/// ```no_run
/// use account_ledger::config::LedgerConfig;
/// use account_ledger::strategy::{LedgerInput, ProcessingStrategy, SyncProcessingStrategy};
/// use std::path::Path;
///
/// let strategy = SyncProcessingStrategy::new(LedgerConfig::default());
/// let input = LedgerInput::new(Path::new("accounts.csv"), Path::new("postings.csv"));
/// strategy.process(&input, &mut std::io::stdout()).expect("Processing failed");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SyncProcessingStrategy {
    config: LedgerConfig,
}

impl SyncProcessingStrategy {
    pub fn new(config: LedgerConfig) -> Self {
        Self { config }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(&self, input: &LedgerInput<'_>, output: &mut dyn Write) -> Result<(), String> {
        let store = Arc::new(seed_store(input.accounts_path, self.config.clone())?);
        let writer = LedgerWriter::new(
            Arc::clone(&store),
            &self.config,
            info_span!("ledger", strategy = "sync"),
        );

        let reader = SyncReader::new(input.postings_path)?;

        for (index, row) in reader.enumerate() {
            match row {
                Ok(request) => {
                    if let Err(e) = writer.post(request) {
                        warn!(
                            line = index + 2,
                            account_id = request.account_id,
                            class = ?e.class(),
                            error = %e,
                            "posting rejected"
                        );
                    }
                }
                Err(e) => warn!(error = %e, "skipping malformed posting"),
            }
        }

        write_transactions_csv(&store.all_transactions(), output)
    }
}
