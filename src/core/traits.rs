//! Store capabilities the ledger engine depends on
//!
//! The engine only ever talks to its store through these two traits, which
//! lets tests substitute fault-injecting or instrumented doubles for the
//! in-memory implementation.

use crate::types::{
    AccountId, LedgerError, NewTransaction, OperationKind, OperationTypeId, OutstandingDebit,
    SettlementUpdate, TransactionId,
};

/// Result of the combined reference existence check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceCheck {
    pub account_exists: bool,
    pub operation_type_exists: bool,
}

/// Trait for the store backing the ledger
///
/// Implementations must be safe to share across threads; postings against the
/// same account may run concurrently.
pub trait LedgerStore: Send + Sync {
    /// Check that both the account and the operation type exist in one call
    fn check_references(
        &self,
        account_id: AccountId,
        operation_type_id: OperationTypeId,
    ) -> Result<ReferenceCheck, LedgerError>;

    /// Look up the kind of an operation type, `None` if it does not exist
    fn operation_kind(
        &self,
        operation_type_id: OperationTypeId,
    ) -> Result<Option<OperationKind>, LedgerError>;

    /// Run `work` as one atomic, isolated unit of work scoped to `account_id`
    ///
    /// Every read and write made through the [`UnitOfWork`] handle becomes
    /// visible only if `work` returns `Ok` and the commit succeeds. Any error,
    /// from `work` or from the commit, discards the whole unit.
    fn unit_of_work<T, F>(&self, account_id: AccountId, work: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, LedgerError>;
}

/// Handle to an open unit of work
pub trait UnitOfWork {
    /// Unsettled debits of the unit's account, oldest first
    fn outstanding_debits(&mut self) -> Result<Vec<OutstandingDebit>, LedgerError>;

    /// Stage a new balance for an existing transaction of the unit's account
    fn update_balance(&mut self, update: SettlementUpdate) -> Result<(), LedgerError>;

    /// Stage a new transaction row and return its identifier
    fn insert_transaction(&mut self, transaction: NewTransaction)
        -> Result<TransactionId, LedgerError>;
}
