//! Validation gate for posting requests
//!
//! Runs before any unit of work is opened so that doomed requests never hold
//! an account's ledger lock. Two stages:
//!
//! 1. Shape checks on the request fields (no store access)
//! 2. One combined existence check of the account and the operation type

use crate::core::traits::LedgerStore;
use crate::types::{LedgerError, PostRequest};
use rust_decimal::Decimal;

/// Maximum number of fractional digits accepted in an amount
pub const MAX_AMOUNT_SCALE: u32 = 2;

/// Check the request fields themselves
///
/// # Errors
///
/// Returns `LedgerError::Validation` naming the first offending field.
pub fn validate_request(request: &PostRequest) -> Result<(), LedgerError> {
    if request.account_id <= 0 {
        return Err(LedgerError::validation(
            "account_id",
            format!("must be positive, got {}", request.account_id),
        ));
    }

    if request.operation_type_id <= 0 {
        return Err(LedgerError::validation(
            "operation_type_id",
            format!("must be positive, got {}", request.operation_type_id),
        ));
    }

    if request.amount <= Decimal::ZERO {
        return Err(LedgerError::validation(
            "amount",
            format!("must be positive, got {}", request.amount),
        ));
    }

    if request.amount.normalize().scale() > MAX_AMOUNT_SCALE {
        return Err(LedgerError::validation(
            "amount",
            format!(
                "at most {} fractional digits allowed, got {}",
                MAX_AMOUNT_SCALE, request.amount
            ),
        ));
    }

    Ok(())
}

/// Confirm the account and the operation type both exist
///
/// A missing account is reported ahead of a missing operation type.
pub fn ensure_references<S: LedgerStore + ?Sized>(
    store: &S,
    request: &PostRequest,
) -> Result<(), LedgerError> {
    let check = store.check_references(request.account_id, request.operation_type_id)?;

    if !check.account_exists {
        return Err(LedgerError::account_not_found(request.account_id));
    }
    if !check.operation_type_exists {
        return Err(LedgerError::operation_type_not_found(
            request.operation_type_id,
        ));
    }

    Ok(())
}
