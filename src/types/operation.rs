//! Operation types and the transaction kinds they resolve to
//!
//! Operation types are immutable reference data. Every operation type maps to
//! exactly one [`OperationKind`], which decides whether a posting is recorded
//! as a negative debit or goes through the credit settlement pass.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation type identifier
pub type OperationTypeId = i64;

/// The kind a posting resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Money in. Settles outstanding debt first, oldest first.
    Credit,

    /// Money out. Always recorded as a negative amount and balance.
    Debit,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Credit => f.write_str("credit"),
            OperationKind::Debit => f.write_str("debit"),
        }
    }
}

/// Operation type reference data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationType {
    pub id: OperationTypeId,
    pub description: String,
    pub kind: OperationKind,
}

impl OperationType {
    pub fn new(id: OperationTypeId, description: impl Into<String>, kind: OperationKind) -> Self {
        OperationType {
            id,
            description: description.into(),
            kind,
        }
    }

    /// The operation types every ledger is seeded with
    ///
    /// | id | description                | kind   |
    /// |----|----------------------------|--------|
    /// | 1  | Normal Purchase            | debit  |
    /// | 2  | Purchase with installments | debit  |
    /// | 3  | Withdrawal                 | debit  |
    /// | 4  | Credit Voucher             | credit |
    pub fn standard_catalogue() -> Vec<OperationType> {
        vec![
            OperationType::new(1, "Normal Purchase", OperationKind::Debit),
            OperationType::new(2, "Purchase with installments", OperationKind::Debit),
            OperationType::new(3, "Withdrawal", OperationKind::Debit),
            OperationType::new(4, "Credit Voucher", OperationKind::Credit),
        ]
    }
}
