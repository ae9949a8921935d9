//! Error types for the account ledger
//!
//! This module defines every failure the ledger engine can report to its
//! caller. The engine never logs on the caller's behalf; it returns one of
//! these and leaves reporting to the collaborator.
//!
//! # Error Categories
//!
//! - **Not found**: the referenced account or operation type does not exist
//! - **Validation**: malformed or out-of-range request fields
//! - **Store**: read/write failures of the underlying store (lock timeouts included)
//! - **Conflict**: an isolation conflict detected while settling concurrently

use super::account::AccountId;
use super::operation::OperationTypeId;
use thiserror::Error;

/// Main error type for the ledger engine
///
/// Every failure inside a unit of work rolls the unit back in full before the
/// error is returned, so no variant ever implies partially committed state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Referenced account does not exist
    #[error("Account {account_id} not found")]
    AccountNotFound { account_id: AccountId },

    /// Referenced operation type does not exist
    #[error("Operation type {operation_type_id} not found")]
    OperationTypeNotFound { operation_type_id: OperationTypeId },

    /// Malformed or out-of-range request field
    ///
    /// Raised before any settlement work starts.
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Name of the offending field
        field: String,
        /// What was wrong with it
        message: String,
    },

    /// Failure of the underlying store
    ///
    /// `retryable` is set for transient failures such as a lock wait that hit
    /// the configured timeout.
    #[error("Store error: {message}")]
    Store { message: String, retryable: bool },

    /// Isolation conflict while settling the account
    ///
    /// Nothing was committed; the whole posting may be retried from the top.
    #[error("Conflicting concurrent settlement on account {account_id} after {attempts} attempt(s)")]
    Conflict { account_id: AccountId, attempts: u32 },
}

/// How a collaborator should surface a [`LedgerError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The request referenced something that does not exist
    NotFound,
    /// The request itself was invalid
    InvalidRequest,
    /// The request lost a race and can be resubmitted
    Conflict,
    /// Internal failure
    Internal,
}

impl ErrorClass {
    /// Conventional HTTP status for this class
    pub fn status_code(self) -> u16 {
        match self {
            ErrorClass::NotFound => 404,
            ErrorClass::InvalidRequest => 400,
            ErrorClass::Conflict => 409,
            ErrorClass::Internal => 500,
        }
    }

    pub fn is_client_error(self) -> bool {
        !matches!(self, ErrorClass::Internal)
    }
}

impl LedgerError {
    /// Create an AccountNotFound error
    pub fn account_not_found(account_id: AccountId) -> Self {
        LedgerError::AccountNotFound { account_id }
    }

    /// Create an OperationTypeNotFound error
    pub fn operation_type_not_found(operation_type_id: OperationTypeId) -> Self {
        LedgerError::OperationTypeNotFound { operation_type_id }
    }

    /// Create a Validation error
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        LedgerError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Create a non-retryable Store error
    pub fn store(message: impl Into<String>) -> Self {
        LedgerError::Store {
            message: message.into(),
            retryable: false,
        }
    }

    /// Create a retryable Store error
    pub fn store_retryable(message: impl Into<String>) -> Self {
        LedgerError::Store {
            message: message.into(),
            retryable: true,
        }
    }

    /// Create a Conflict error
    pub fn conflict(account_id: AccountId, attempts: u32) -> Self {
        LedgerError::Conflict {
            account_id,
            attempts,
        }
    }

    /// Whether resubmitting the same posting may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            LedgerError::Store { retryable, .. } => *retryable,
            LedgerError::Conflict { .. } => true,
            _ => false,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            LedgerError::AccountNotFound { .. } | LedgerError::OperationTypeNotFound { .. } => {
                ErrorClass::NotFound
            }
            LedgerError::Validation { .. } => ErrorClass::InvalidRequest,
            LedgerError::Conflict { .. } => ErrorClass::Conflict,
            LedgerError::Store { .. } => ErrorClass::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::account_not_found(LedgerError::account_not_found(7), "Account 7 not found")]
    #[case::operation_type_not_found(
        LedgerError::operation_type_not_found(9),
        "Operation type 9 not found"
    )]
    #[case::validation(
        LedgerError::validation("amount", "must be positive"),
        "Invalid amount: must be positive"
    )]
    #[case::store(LedgerError::store("row 3 missing"), "Store error: row 3 missing")]
    #[case::conflict(
        LedgerError::conflict(1, 4),
        "Conflicting concurrent settlement on account 1 after 4 attempt(s)"
    )]
    fn test_error_display(#[case] error: LedgerError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::account_not_found(LedgerError::account_not_found(1), ErrorClass::NotFound, 404)]
    #[case::operation_type_not_found(
        LedgerError::operation_type_not_found(1),
        ErrorClass::NotFound,
        404
    )]
    #[case::validation(LedgerError::validation("amount", "x"), ErrorClass::InvalidRequest, 400)]
    #[case::conflict(LedgerError::conflict(1, 1), ErrorClass::Conflict, 409)]
    #[case::store(LedgerError::store("x"), ErrorClass::Internal, 500)]
    fn test_error_class(
        #[case] error: LedgerError,
        #[case] class: ErrorClass,
        #[case] status: u16,
    ) {
        assert_eq!(error.class(), class);
        assert_eq!(error.class().status_code(), status);
        assert_eq!(class.is_client_error(), status < 500);
    }

    #[rstest]
    #[case::lock_timeout(LedgerError::store_retryable("lock wait timed out"), true)]
    #[case::conflict(LedgerError::conflict(1, 3), true)]
    #[case::hard_store_failure(LedgerError::store("row missing"), false)]
    #[case::not_found(LedgerError::account_not_found(1), false)]
    #[case::validation(LedgerError::validation("amount", "x"), false)]
    fn test_is_retryable(#[case] error: LedgerError, #[case] expected: bool) {
        assert_eq!(error.is_retryable(), expected);
    }
}
