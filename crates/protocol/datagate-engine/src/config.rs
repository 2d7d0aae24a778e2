//! Configuration types for the engine.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use datagate_ledger::{duration_ms, Backoff, LedgerConfig};
use datagate_types::{
    Timestamp, DEFAULT_GRANT_BACKOFF_BASE_MS, DEFAULT_GRANT_BACKOFF_MAX_MS,
    DEFAULT_GRANT_DURATION_MS, DEFAULT_GRANT_RETRY_BATCH, DEFAULT_GRANT_RETRY_INTERVAL_MS,
};

use crate::error::{EngineError, EngineResult};

/// Configuration for the background grant retry worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrantRetryConfig {
    /// Time between drains of the obligation queue
    #[serde(with = "duration_ms")]
    pub interval: Duration,
    /// Maximum obligations resubmitted per drain
    pub batch_size: u32,
    /// Wait before the first resubmission of a failed grant; doubles per
    /// further failure
    #[serde(with = "duration_ms")]
    pub base_backoff: Duration,
    /// Cap on the wait between resubmissions
    #[serde(with = "duration_ms")]
    pub max_backoff: Duration,
}

impl Default for GrantRetryConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_GRANT_RETRY_INTERVAL_MS),
            batch_size: DEFAULT_GRANT_RETRY_BATCH,
            base_backoff: Duration::from_millis(DEFAULT_GRANT_BACKOFF_BASE_MS),
            max_backoff: Duration::from_millis(DEFAULT_GRANT_BACKOFF_MAX_MS),
        }
    }
}

impl GrantRetryConfig {
    /// Set the drain interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the resubmission backoff bounds.
    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.base_backoff = base;
        self.max_backoff = max;
        self
    }

    /// Resubmission schedule for failed grants.
    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.base_backoff, self.max_backoff)
    }
}

/// Engine configuration, passed explicitly at construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How long a grant lasts after payment
    #[serde(with = "duration_ms")]
    pub grant_duration: Duration,
    /// Ledger call bounds
    pub ledger: LedgerConfig,
    /// Grant retry worker
    pub grant_retry: GrantRetryConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grant_duration: Duration::from_millis(DEFAULT_GRANT_DURATION_MS),
            ledger: LedgerConfig::default(),
            grant_retry: GrantRetryConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Set the grant duration.
    pub fn with_grant_duration(mut self, duration: Duration) -> Self {
        self.grant_duration = duration;
        self
    }

    /// Set the ledger configuration.
    pub fn with_ledger(mut self, ledger: LedgerConfig) -> Self {
        self.ledger = ledger;
        self
    }

    /// Set the grant retry configuration.
    pub fn with_grant_retry(mut self, grant_retry: GrantRetryConfig) -> Self {
        self.grant_retry = grant_retry;
        self
    }

    /// Grant duration in milliseconds.
    pub fn grant_duration_ms(&self) -> Timestamp {
        self.grant_duration.as_millis().min(u128::from(u64::MAX)) as Timestamp
    }

    /// Validate the configuration.
    pub fn validate(&self) -> EngineResult<()> {
        if self.grant_duration.is_zero() {
            return Err(EngineError::invalid_argument(
                "grant_duration must be non-zero",
            ));
        }
        if self.grant_retry.interval.is_zero() {
            return Err(EngineError::invalid_argument(
                "grant_retry.interval must be non-zero",
            ));
        }
        if self.grant_retry.batch_size == 0 {
            return Err(EngineError::invalid_argument(
                "grant_retry.batch_size must be at least 1",
            ));
        }
        if self.grant_retry.base_backoff > self.grant_retry.max_backoff {
            return Err(EngineError::invalid_argument(
                "grant_retry.base_backoff must not exceed grant_retry.max_backoff",
            ));
        }
        self.ledger
            .validate()
            .map_err(|e| EngineError::invalid_argument(e.to_string()))
    }
}
