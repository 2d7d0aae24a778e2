//! Error types for the ledger gateway.

use thiserror::Error;

/// Result type alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors that can occur while talking to the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Network error (retryable).
    #[error("network error: {0}")]
    Network(String),

    /// A single call exceeded its bound (retryable).
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// Transaction submission failed transiently (retryable).
    #[error("submission failed: {0}")]
    SubmissionFailed(String),

    /// The ledger definitively rejected a transaction.
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// The caller's deadline elapsed before the call completed.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The ledger returned data that could not be interpreted.
    #[error("invalid ledger response: {0}")]
    InvalidResponse(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error (lock poisoning, unexpected state).
    #[error("internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Create a new Network error.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a new Timeout error.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a new SubmissionFailed error.
    pub fn submission_failed(msg: impl Into<String>) -> Self {
        Self::SubmissionFailed(msg.into())
    }

    /// Create a new Rejected error.
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Create a new InvalidResponse error.
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Create a new Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout(_) | Self::SubmissionFailed(_)
        )
    }

    /// Whether the ledger gave a final answer that resubmitting cannot change.
    pub fn is_definitive(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Whether the failure is a timeout of some kind (per-call or deadline).
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::DeadlineExceeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(LedgerError::network("connection refused").is_retryable());
        assert!(LedgerError::timeout("30s elapsed").is_retryable());
        assert!(LedgerError::submission_failed("mempool full").is_retryable());
        assert!(!LedgerError::rejected("sequence number too old").is_retryable());
        assert!(!LedgerError::DeadlineExceeded.is_retryable());
        assert!(!LedgerError::invalid_response("bad json").is_retryable());
    }

    #[test]
    fn test_is_definitive() {
        assert!(LedgerError::rejected("dataset delisted").is_definitive());
        assert!(!LedgerError::submission_failed("mempool full").is_definitive());
        assert!(!LedgerError::DeadlineExceeded.is_definitive());
    }

    #[test]
    fn test_is_timeout() {
        assert!(LedgerError::DeadlineExceeded.is_timeout());
        assert!(LedgerError::timeout("x").is_timeout());
        assert!(!LedgerError::network("x").is_timeout());
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::rejected("EINSUFFICIENT_BALANCE");
        assert_eq!(err.to_string(), "transaction rejected: EINSUFFICIENT_BALANCE");
    }
}
