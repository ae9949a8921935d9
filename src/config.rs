//! Ledger configuration
//!
//! Controls how a unit of work is isolated from concurrent postings on the
//! same account and how long it may wait for that isolation.

use clap::ValueEnum;
use std::time::Duration;

/// Default bound on waiting for an account's ledger lock
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of re-settlement attempts after an isolation conflict
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 3;

/// Isolation strategy for the settlement unit of work
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum IsolationMode {
    /// Hold the account's ledger lock from the debt read until commit
    #[default]
    Locking,

    /// Settle against a versioned snapshot and validate the version on commit
    Optimistic,
}

/// Engine and store configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerConfig {
    pub isolation: IsolationMode,

    /// How long a unit of work may wait for the account's ledger lock.
    /// Expiry surfaces as a retryable store error.
    pub lock_timeout: Duration,

    /// Extra attempts the writer makes after a conflict before giving up
    pub max_conflict_retries: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            isolation: IsolationMode::default(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }
}

impl LedgerConfig {
    /// Create a new LedgerConfig
    ///
    /// A zero lock timeout would make every unit of work fail, so it falls
    /// back to the default with a warning.
    pub fn new(isolation: IsolationMode, lock_timeout: Duration, max_conflict_retries: u32) -> Self {
        let lock_timeout = if lock_timeout.is_zero() {
            tracing::warn!(
                default_ms = DEFAULT_LOCK_TIMEOUT.as_millis() as u64,
                "invalid lock timeout (0), using default"
            );
            DEFAULT_LOCK_TIMEOUT
        } else {
            lock_timeout
        };

        Self {
            isolation,
            lock_timeout,
            max_conflict_retries,
        }
    }

    pub fn with_isolation(mut self, isolation: IsolationMode) -> Self {
        self.isolation = isolation;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::default();
        assert_eq!(config.isolation, IsolationMode::Locking);
        assert_eq!(config.lock_timeout, Duration::from_secs(5));
        assert_eq!(config.max_conflict_retries, 3);
    }

    #[test]
    fn test_zero_lock_timeout_falls_back_to_default() {
        let config = LedgerConfig::new(IsolationMode::Optimistic, Duration::ZERO, 1);
        assert_eq!(config.lock_timeout, DEFAULT_LOCK_TIMEOUT);
        assert_eq!(config.isolation, IsolationMode::Optimistic);
        assert_eq!(config.max_conflict_retries, 1);
    }
}
