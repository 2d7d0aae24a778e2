//! Error types for the storage layer.

use datagate_types::{RequestKey, TxHash, TypesError};
use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored value failed validation when read back.
    #[error("Invalid stored value: {0}")]
    Types(#[from] TypesError),

    /// An open (pending or approved) request already exists for the tuple.
    #[error("Open request already exists for {0}")]
    OpenRequestExists(RequestKey),

    /// The payment transaction already confirmed another request.
    #[error("Payment transaction {tx_hash} already confirmed request {request_id}")]
    PaymentTxInUse {
        /// The reused transaction
        tx_hash: TxHash,
        /// The request it confirmed
        request_id: i64,
    },

    /// Conditional update lost: the record's version or status changed.
    #[error("Request {0} was modified concurrently")]
    VersionConflict(i64),

    /// Request not found.
    #[error("Request not found: {0}")]
    RequestNotFound(i64),

    /// Schema initialization error.
    #[error("Schema error: {0}")]
    Schema(String),

    /// Invalid data format.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Lock poisoning error.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

impl StoreError {
    /// Create a schema error.
    pub fn schema(msg: impl Into<String>) -> Self {
        StoreError::Schema(msg.into())
    }

    /// Create an invalid data error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        StoreError::InvalidData(msg.into())
    }

    /// Create a lock poisoned error.
    pub fn lock_poisoned(msg: impl Into<String>) -> Self {
        StoreError::LockPoisoned(msg.into())
    }

    /// Whether this error reports a lost conditional update.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::VersionConflict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let key = RequestKey::parse("0x1", "0x2", "d").unwrap();
        let err = StoreError::OpenRequestExists(key);
        assert_eq!(err.to_string(), "Open request already exists for 0x1/0x2/d");

        let err = StoreError::PaymentTxInUse {
            tx_hash: TxHash::parse("0xabc").unwrap(),
            request_id: 7,
        };
        assert!(err.to_string().contains("0xabc"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let store_err: StoreError = io_err.into();
        assert!(matches!(store_err, StoreError::Io(_)));
    }

    #[test]
    fn test_is_conflict() {
        assert!(StoreError::VersionConflict(1).is_conflict());
        assert!(!StoreError::RequestNotFound(1).is_conflict());
    }
}
