//! Processing strategies for the ledger pipeline
//!
//! A strategy owns a complete run: seed the store from the accounts file, post
//! every request from the postings file, then write the resulting ledger. The
//! synchronous and asynchronous implementations are selected at runtime.

use crate::cli::StrategyType;
use crate::config::LedgerConfig;
use crate::core::InMemoryLedgerStore;
use crate::io::read_accounts;
use std::io::Write;
use std::path::Path;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Input files of one ledger run
#[derive(Debug, Clone, Copy)]
pub struct LedgerInput<'a> {
    /// `account_id,document_number` rows used to seed the store
    pub accounts_path: &'a Path,
    /// `account_id,operation_type_id,amount` rows to post
    pub postings_path: &'a Path,
}

impl<'a> LedgerInput<'a> {
    pub fn new(accounts_path: &'a Path, postings_path: &'a Path) -> Self {
        Self {
            accounts_path,
            postings_path,
        }
    }
}

/// Processing strategy trait for complete ledger pipelines
pub trait ProcessingStrategy: Send + Sync {
    /// Post every request in `input` and write the resulting ledger to `output`
    ///
    /// Rejected postings and malformed rows are logged and skipped; they never
    /// stop the run.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An input file cannot be opened
    /// - The accounts file is malformed or holds an invalid account
    /// - Output cannot be written
    fn process(&self, input: &LedgerInput<'_>, output: &mut dyn Write) -> Result<(), String>;
}

/// Build a store with the standard operation types and the accounts in `path`
pub(crate) fn seed_store(path: &Path, config: LedgerConfig) -> Result<InMemoryLedgerStore, String> {
    let store = InMemoryLedgerStore::with_standard_operation_types(config);

    for account in read_accounts(path)? {
        let account_id = account.id;
        store
            .insert_account(account)
            .map_err(|e| format!("{}: account {}: {}", path.display(), account_id, e))?;
    }

    tracing::debug!(accounts = store.accounts().len(), "store seeded");
    Ok(store)
}

/// Create a processing strategy
///
/// `batch` is ignored by the synchronous strategy.
pub fn create_strategy(
    strategy_type: StrategyType,
    batch: Option<BatchConfig>,
    ledger: LedgerConfig,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(ledger)),
        StrategyType::Async => Box::new(AsyncProcessingStrategy::new(
            batch.unwrap_or_default(),
            ledger,
        )),
    }
}
