//! Transaction-related types for the account ledger
//!
//! This module defines the persisted ledger row, the request that creates one,
//! the result reported back to the caller, and the transient records passed
//! between the debt reader, the settlement pass and the ledger writer.

use super::account::AccountId;
use super::operation::OperationTypeId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Transaction identifier
pub type TransactionId = i64;

/// A persisted ledger row
///
/// `amount` is the signed value actually posted (negative for debits).
/// `balance` is the part of `amount` that is still unsettled. It only ever
/// moves toward zero, and only through the settlement pass of a later credit
/// on the same account.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub operation_type_id: OperationTypeId,
    pub amount: Decimal,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Whether this row still carries unsettled debt
    pub fn is_outstanding_debit(&self) -> bool {
        self.balance.is_sign_negative() && !self.balance.is_zero()
    }
}

/// Inbound posting request
///
/// `amount` is always supplied positive; the sign is assigned from the
/// operation kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostRequest {
    pub account_id: AccountId,
    pub operation_type_id: OperationTypeId,
    pub amount: Decimal,
}

impl PostRequest {
    pub fn new(account_id: AccountId, operation_type_id: OperationTypeId, amount: Decimal) -> Self {
        PostRequest {
            account_id,
            operation_type_id,
            amount,
        }
    }
}

/// Result of a committed posting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostedTransaction {
    pub transaction_id: TransactionId,

    /// Signed amount as stored
    pub amount: Decimal,

    /// Signed balance as stored
    pub balance: Decimal,
}

/// A row about to be inserted by a unit of work
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewTransaction {
    pub account_id: AccountId,
    pub operation_type_id: OperationTypeId,
    pub amount: Decimal,
    pub balance: Decimal,
}

/// An unsettled debit as returned by the outstanding debt reader
///
/// `balance` is strictly negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutstandingDebit {
    pub transaction_id: TransactionId,
    pub balance: Decimal,
}

impl OutstandingDebit {
    pub fn new(transaction_id: TransactionId, balance: Decimal) -> Self {
        OutstandingDebit {
            transaction_id,
            balance,
        }
    }
}

/// A post-settlement balance for an existing transaction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettlementUpdate {
    pub transaction_id: TransactionId,
    pub balance: Decimal,
}

impl SettlementUpdate {
    pub fn new(transaction_id: TransactionId, balance: Decimal) -> Self {
        SettlementUpdate {
            transaction_id,
            balance,
        }
    }
}
