//! Asynchronous batch processing strategy
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig     (batch_size, max_concurrent_batches)
//!     ├── AsyncReader     (batch CSV reading)
//!     └── BatchProcessor  (account partitioning, blocking tasks)
//!         └── LedgerWriter -> InMemoryLedgerStore
//! ```
//!
//! Batches are processed one after another so an account whose postings span
//! several batches still sees them in file order. Inside a batch, different
//! accounts post in parallel. Transaction ids are therefore only ordered within
//! an account; across accounts they depend on scheduling.

use crate::config::LedgerConfig;
use crate::core::{BatchProcessor, LedgerWriter};
use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::write_transactions_csv;
use crate::strategy::{seed_store, LedgerInput, ProcessingStrategy};
use std::io::Write;
use std::sync::Arc;
use tracing::{info_span, warn};

/// Configuration for batch processing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of postings per batch
    pub batch_size: usize,
    /// Worker threads of the tokio runtime
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig; zero values fall back to the defaults
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                default = default.batch_size,
                "invalid batch_size (0), using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                default = default.max_concurrent_batches,
                "invalid max_concurrent_batches (0), using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Asynchronous batch processing strategy
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    batch: BatchConfig,
    ledger: LedgerConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(batch: BatchConfig, ledger: LedgerConfig) -> Self {
        Self { batch, ledger }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn process(&self, input: &LedgerInput<'_>, output: &mut dyn Write) -> Result<(), String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.batch.max_concurrent_batches)
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        runtime.block_on(async {
            let store = Arc::new(seed_store(input.accounts_path, self.ledger.clone())?);
            let writer = LedgerWriter::new(
                Arc::clone(&store),
                &self.ledger,
                info_span!("ledger", strategy = "async"),
            );
            let processor = BatchProcessor::new(writer);

            let file = tokio::fs::File::open(input.postings_path)
                .await
                .map_err(|e| {
                    format!(
                        "Failed to open file '{}': {}",
                        input.postings_path.display(),
                        e
                    )
                })?;
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            loop {
                let batch = reader.read_batch(self.batch.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                for processed in processor.process_batch(batch).await {
                    if let Err(e) = processed.result {
                        warn!(
                            account_id = processed.request.account_id,
                            class = ?e.class(),
                            error = %e,
                            "posting rejected"
                        );
                    }
                }
            }

            write_transactions_csv(&store.all_transactions(), output)
        })
    }
}
