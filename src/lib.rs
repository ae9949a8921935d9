//! Account Ledger Library
//!
//! # Overview
//!
//! Records purchases, withdrawals and credit vouchers against accounts. Debits
//! are stored as negative amounts whose balance is the debt still unpaid. A
//! credit first pays those debts oldest first; whatever is left becomes the
//! credit's own balance. All writes a posting causes commit together or not at
//! all, and concurrent postings on one account never settle the same debt twice.
//!
//! # Architecture
//!
//! - [`types`] - Accounts, operation types, ledger rows and errors
//! - [`config`] - Isolation mode, lock timeout and conflict retries
//! - [`core`] - Ledger logic:
//!   - [`core::settlement`] - FIFO waterfall over outstanding debits
//!   - [`core::ledger_writer`] - Posting orchestration
//!   - [`core::memory_store`] - In-memory store with per-account units of work
//!   - [`core::batch_processor`] - Account-partitioned concurrent posting
//! - [`io`] - CSV readers and ledger output
//! - [`strategy`] - Sync and async processing pipelines
//! - [`cli`] - Command-line arguments
//! - [`telemetry`] - Logging setup

pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod strategy;
pub mod telemetry;
pub mod types;

pub use config::{IsolationMode, LedgerConfig};
pub use core::{InMemoryLedgerStore, LedgerStore, LedgerWriter, UnitOfWork};
pub use io::write_transactions_csv;
pub use types::{
    Account, AccountId, LedgerError, OperationKind, OperationType, PostRequest,
    PostedTransaction, Transaction, TransactionId,
};
