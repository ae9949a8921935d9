//! Core ledger logic
//!
//! - `traits` - Store capabilities the engine depends on
//! - `memory_store` - In-memory store with per-account isolation
//! - `validation` - Request validation and reference checks
//! - `resolver` - Operation type to credit/debit resolution
//! - `settlement` - FIFO settlement of credits against outstanding debt
//! - `ledger_writer` - Posting orchestration
//! - `batch_processor` - Concurrent posting partitioned by account

pub mod batch_processor;
pub mod ledger_writer;
pub mod memory_store;
pub mod resolver;
pub mod settlement;
pub mod traits;
pub mod validation;

pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use ledger_writer::{LedgerWriter, PostingStage};
pub use memory_store::InMemoryLedgerStore;
pub use resolver::resolve_kind;
pub use settlement::{settle, Settlement};
pub use traits::{LedgerStore, ReferenceCheck, UnitOfWork};
pub use validation::{ensure_references, validate_request, MAX_AMOUNT_SCALE};
