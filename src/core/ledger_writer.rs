//! Transaction posting engine
//!
//! This module provides the `LedgerWriter`, which turns a [`PostRequest`] into a
//! committed ledger row. It coordinates the validation gate, the operation type
//! resolver, the outstanding debt reader and the settlement pass, and makes
//! sure every write a posting causes lands in one unit of work.
//!
//! A posting moves through these stages:
//!
//! ```text
//! Received -> Validated -> DirectPost (debit) -> Committed
//!                       -> Settled    (credit) -> Committed
//! any failure -> Failed (nothing written)
//! ```
//!
//! The writer never logs errors on its caller's behalf. It records stage
//! transitions at debug level under the span it was constructed with and
//! returns typed errors for the caller to report.

use crate::config::LedgerConfig;
use crate::core::resolver::resolve_kind;
use crate::core::settlement::settle;
use crate::core::traits::LedgerStore;
use crate::core::validation::{ensure_references, validate_request};
use crate::types::{
    LedgerError, NewTransaction, OperationKind, PostRequest, PostedTransaction,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, Span};

/// Stage a posting has reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostingStage {
    Received,
    Validated,
    DirectPost,
    Settled,
    Committed,
    Failed,
}

impl fmt::Display for PostingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PostingStage::Received => "received",
            PostingStage::Validated => "validated",
            PostingStage::DirectPost => "direct_post",
            PostingStage::Settled => "settled",
            PostingStage::Committed => "committed",
            PostingStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Posts transactions against a [`LedgerStore`]
///
/// Cheap to clone and safe to share across threads; postings for the same
/// account are isolated by the store's unit of work.
#[derive(Debug)]
pub struct LedgerWriter<S: LedgerStore> {
    store: Arc<S>,

    /// Extra attempts after an isolation conflict
    max_conflict_retries: u32,

    /// Span every engine event is recorded under
    span: Span,
}

impl<S: LedgerStore> Clone for LedgerWriter<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            max_conflict_retries: self.max_conflict_retries,
            span: self.span.clone(),
        }
    }
}

impl<S: LedgerStore> LedgerWriter<S> {
    /// Create a new LedgerWriter
    ///
    /// # Arguments
    ///
    /// * `store` - Store the writer posts against
    /// * `config` - Supplies the conflict retry budget
    /// * `span` - Logging capability; engine events are recorded under it
    pub fn new(store: Arc<S>, config: &LedgerConfig, span: Span) -> Self {
        Self {
            store,
            max_conflict_retries: config.max_conflict_retries,
            span,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Post a transaction
    ///
    /// Debits are recorded with a negated amount and balance. Credits first
    /// settle the account's outstanding debits oldest first; whatever is left
    /// becomes the credit's balance.
    ///
    /// An isolation conflict re-runs the whole read-settle-write sequence, up
    /// to the configured number of retries.
    ///
    /// # Errors
    ///
    /// * `LedgerError::Validation` - malformed request fields
    /// * `LedgerError::AccountNotFound` / `LedgerError::OperationTypeNotFound`
    /// * `LedgerError::Store` - store failure; nothing was committed
    /// * `LedgerError::Conflict` - retries exhausted; nothing was committed
    pub fn post(&self, request: PostRequest) -> Result<PostedTransaction, LedgerError> {
        let _entered = self.span.enter();
        debug!(
            stage = %PostingStage::Received,
            account_id = request.account_id,
            operation_type_id = request.operation_type_id,
            amount = %request.amount,
        );

        let result = self.run(request);
        match &result {
            Ok(posted) => debug!(
                stage = %PostingStage::Committed,
                transaction_id = posted.transaction_id,
                amount = %posted.amount,
                balance = %posted.balance,
            ),
            Err(error) => debug!(stage = %PostingStage::Failed, class = ?error.class()),
        }
        result
    }

    fn run(&self, request: PostRequest) -> Result<PostedTransaction, LedgerError> {
        validate_request(&request)?;
        ensure_references(self.store.as_ref(), &request)?;
        let kind = resolve_kind(self.store.as_ref(), request.operation_type_id)?;
        debug!(stage = %PostingStage::Validated, %kind);

        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            let result = match kind {
                OperationKind::Debit => self.post_debit(&request),
                OperationKind::Credit => self.post_credit(&request),
            };

            match result {
                Err(LedgerError::Conflict { .. }) if attempts <= self.max_conflict_retries => {
                    debug!(attempt = attempts, "settlement conflict, retrying");
                }
                Err(LedgerError::Conflict { account_id, .. }) => {
                    return Err(LedgerError::conflict(account_id, attempts));
                }
                other => return other,
            }
        }
    }

    /// Record a debit: no debt read, no settlement
    fn post_debit(&self, request: &PostRequest) -> Result<PostedTransaction, LedgerError> {
        let amount = -request.amount;

        self.store.unit_of_work(request.account_id, |unit| {
            debug!(stage = %PostingStage::DirectPost);
            let transaction_id = unit.insert_transaction(NewTransaction {
                account_id: request.account_id,
                operation_type_id: request.operation_type_id,
                amount,
                balance: amount,
            })?;

            Ok(PostedTransaction {
                transaction_id,
                amount,
                balance: amount,
            })
        })
    }

    /// Settle a credit against outstanding debt and record its remainder
    ///
    /// The debt read, every settlement update and the insert all happen inside
    /// the same unit of work.
    fn post_credit(&self, request: &PostRequest) -> Result<PostedTransaction, LedgerError> {
        self.store.unit_of_work(request.account_id, |unit| {
            let outstanding = unit.outstanding_debits()?;
            let settlement = settle(request.amount, &outstanding)?;
            debug!(
                stage = %PostingStage::Settled,
                outstanding = outstanding.len(),
                updated = settlement.updates.len(),
                remainder = %settlement.remainder,
            );

            for update in &settlement.updates {
                unit.update_balance(*update)?;
            }

            let transaction_id = unit.insert_transaction(NewTransaction {
                account_id: request.account_id,
                operation_type_id: request.operation_type_id,
                amount: request.amount,
                balance: settlement.remainder,
            })?;

            Ok(PostedTransaction {
                transaction_id,
                amount: request.amount,
                balance: settlement.remainder,
            })
        })
    }
}
