//! Batch posting with account-based partitioning
//!
//! The `BatchProcessor` splits a batch of posting requests by account so that
//! postings for different accounts run concurrently while each account's
//! postings still run one after another in input order.
//!
//! ```text
//! BatchProcessor
//!     └── LedgerWriter<S>  (shared, cloneable posting engine)
//! ```
//!
//! Posting blocks on the store's per-account lock, so every account partition
//! runs on tokio's blocking pool rather than on an async worker.

use std::collections::HashMap;

use crate::core::ledger_writer::LedgerWriter;
use crate::core::traits::LedgerStore;
use crate::types::{AccountId, LedgerError, PostRequest, PostedTransaction};

/// Outcome of posting one request
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingResult {
    /// The request that was posted
    pub request: PostRequest,

    /// The committed transaction, or why nothing was committed
    pub result: Result<PostedTransaction, LedgerError>,
}

/// Batch processor with account-based partitioning
#[derive(Debug)]
pub struct BatchProcessor<S: LedgerStore + 'static> {
    writer: LedgerWriter<S>,
}

impl<S: LedgerStore + 'static> Clone for BatchProcessor<S> {
    fn clone(&self) -> Self {
        Self {
            writer: self.writer.clone(),
        }
    }
}

impl<S: LedgerStore + 'static> BatchProcessor<S> {
    pub fn new(writer: LedgerWriter<S>) -> Self {
        Self { writer }
    }

    pub fn writer(&self) -> &LedgerWriter<S> {
        &self.writer
    }

    /// Partition a batch by account ID
    ///
    /// Every request lands in exactly one partition and each partition keeps
    /// the input order of its account's requests.
    pub fn partition_by_account(
        &self,
        batch: Vec<PostRequest>,
    ) -> HashMap<AccountId, Vec<PostRequest>> {
        let mut account_batches: HashMap<AccountId, Vec<PostRequest>> = HashMap::new();

        for request in batch {
            account_batches
                .entry(request.account_id)
                .or_default()
                .push(request);
        }

        account_batches
    }

    /// Post one account's requests sequentially
    ///
    /// A failed posting is captured in its result and does not stop the rest.
    pub fn process_account_postings(&self, requests: Vec<PostRequest>) -> Vec<ProcessingResult> {
        requests
            .into_iter()
            .map(|request| ProcessingResult {
                request,
                result: self.writer.post(request),
            })
            .collect()
    }

    /// Post a batch, running account partitions concurrently
    ///
    /// Results are grouped by account; the order between accounts is not
    /// specified.
    pub async fn process_batch(&self, batch: Vec<PostRequest>) -> Vec<ProcessingResult> {
        let account_batches = self.partition_by_account(batch);

        let mut tasks = Vec::with_capacity(account_batches.len());
        for (_account_id, requests) in account_batches {
            let processor = self.clone();
            tasks.push(tokio::task::spawn_blocking(move || {
                processor.process_account_postings(requests)
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(account_results) => results.extend(account_results),
                Err(e) => tracing::error!(error = %e, "posting task panicked"),
            }
        }

        results
    }
}
