//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account-related types
//! - `operation`: Operation-type reference data and transaction kinds
//! - `transaction`: Ledger rows, posting requests and settlement records
//! - `error`: Error types for the ledger engine

pub mod account;
pub mod error;
pub mod operation;
pub mod transaction;

pub use account::{Account, AccountId};
pub use error::{ErrorClass, LedgerError};
pub use operation::{OperationKind, OperationType, OperationTypeId};
pub use transaction::{
    NewTransaction, OutstandingDebit, PostRequest, PostedTransaction, SettlementUpdate,
    Transaction, TransactionId,
};
