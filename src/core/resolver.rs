//! Operation type resolution
//!
//! Maps an operation-type identifier to the [`OperationKind`] that decides
//! how a posting is recorded.

use crate::core::traits::LedgerStore;
use crate::types::{LedgerError, OperationKind, OperationTypeId};

/// Resolve `operation_type_id` to its kind
///
/// # Errors
///
/// * `LedgerError::OperationTypeNotFound` if the identifier does not exist
/// * `LedgerError::Store` if the lookup itself failed
pub fn resolve_kind<S: LedgerStore + ?Sized>(
    store: &S,
    operation_type_id: OperationTypeId,
) -> Result<OperationKind, LedgerError> {
    store
        .operation_kind(operation_type_id)?
        .ok_or_else(|| LedgerError::operation_type_not_found(operation_type_id))
}
