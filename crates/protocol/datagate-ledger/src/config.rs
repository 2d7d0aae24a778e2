//! Configuration for ledger access.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use datagate_types::DEFAULT_LEDGER_CALL_TIMEOUT_MS;

use crate::error::{LedgerError, LedgerResult};

/// Configuration for calls made through the ledger gateway.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Bound on a single ledger call
    #[serde(with = "duration_ms")]
    pub call_timeout: Duration,
    /// Retry policy for transient failures
    pub retry: RetryConfig,
}

impl LedgerConfig {
    /// Set the per-call timeout.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Set the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.call_timeout.is_zero() {
            return Err(LedgerError::config("call_timeout must be non-zero"));
        }
        self.retry.validate()
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_millis(DEFAULT_LEDGER_CALL_TIMEOUT_MS),
            retry: RetryConfig::default(),
        }
    }
}

/// Retry policy configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first)
    pub max_attempts: u32,
    /// Base delay between retries
    #[serde(with = "duration_ms")]
    pub base_delay: Duration,
    /// Maximum delay between retries
    #[serde(with = "duration_ms")]
    pub max_delay: Duration,
}

impl RetryConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.max_attempts == 0 {
            return Err(LedgerError::config("retry.max_attempts must be at least 1"));
        }
        if self.base_delay > self.max_delay {
            return Err(LedgerError::config(
                "retry.base_delay must not exceed retry.max_delay",
            ));
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Serde helper for `Duration` as integer milliseconds.
pub mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
