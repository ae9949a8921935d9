//! Account-related types for the account ledger
//!
//! Accounts are owned by the accounts collaborator. The settlement engine only
//! ever checks that one exists before posting against it.

use chrono::{DateTime, Utc};

/// Account identifier
pub type AccountId = i64;

/// Minimum accepted length of a document number
pub const DOCUMENT_NUMBER_MIN_LEN: usize = 3;

/// Maximum accepted length of a document number
pub const DOCUMENT_NUMBER_MAX_LEN: usize = 255;

/// Account holder record
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// The account ID
    pub id: AccountId,

    /// Document number identifying the account holder
    pub document_number: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account record was last changed
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account stamped with the current time
    pub fn new(id: AccountId, document_number: impl Into<String>) -> Self {
        let now = Utc::now();
        Account {
            id,
            document_number: document_number.into(),
            created_at: now,
            updated_at: now,
        }
    }
}
