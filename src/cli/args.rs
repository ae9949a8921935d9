use crate::config::{IsolationMode, LedgerConfig};
use crate::strategy::BatchConfig;
use crate::telemetry::LogFormat;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Post account transactions, settling credits against outstanding debt
#[derive(Parser, Debug)]
#[command(name = "account-ledger")]
#[command(about = "Post account transactions with FIFO debt settlement", long_about = None)]
pub struct CliArgs {
    /// Postings CSV file (account_id,operation_type_id,amount)
    #[arg(value_name = "POSTINGS", help = "Path to the postings CSV file")]
    pub postings_file: PathBuf,

    /// Accounts CSV file (account_id,document_number)
    #[arg(long = "accounts", value_name = "ACCOUNTS")]
    pub accounts_file: PathBuf,

    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "sync",
        help = "Processing strategy: 'sync' posts in file order, 'async' posts accounts in parallel"
    )]
    pub strategy: StrategyType,

    /// Number of postings per batch (async mode only)
    #[arg(long = "batch-size", value_name = "SIZE")]
    pub batch_size: Option<usize>,

    /// Worker threads (async mode only, default: CPU cores)
    #[arg(long = "max-concurrent", value_name = "COUNT")]
    pub max_concurrent_batches: Option<usize>,

    /// How a settlement is isolated from concurrent postings
    #[arg(
        long = "isolation",
        value_name = "MODE",
        env = "LEDGER_ISOLATION",
        default_value = "locking"
    )]
    pub isolation: IsolationMode,

    /// Bound on waiting for an account's ledger lock
    #[arg(
        long = "lock-timeout-ms",
        value_name = "MS",
        env = "LEDGER_LOCK_TIMEOUT_MS",
        default_value_t = 5000
    )]
    pub lock_timeout_ms: u64,

    /// Re-settlement attempts after an optimistic conflict
    #[arg(
        long = "max-conflict-retries",
        value_name = "COUNT",
        env = "LEDGER_MAX_CONFLICT_RETRIES",
        default_value_t = 3
    )]
    pub max_conflict_retries: u32,

    /// Log filter used when RUST_LOG is unset
    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        env = "LEDGER_LOG_LEVEL",
        default_value = "warn"
    )]
    pub log_level: String,

    #[arg(long = "log-format", value_name = "FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Available processing strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments, defaults filling the gaps
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }

    pub fn to_ledger_config(&self) -> LedgerConfig {
        LedgerConfig::new(
            self.isolation,
            Duration::from_millis(self.lock_timeout_ms),
            self.max_conflict_retries,
        )
    }
}
