//! Error types for the engine.
//!
//! Every failure surfaced to callers is one [`EngineError`] kind with a
//! stable [`ErrorCode`]. Ledger and store errors are folded into those
//! kinds at the crate boundary.

use datagate_ledger::LedgerError;
use datagate_store::StoreError;
use datagate_types::{ErrorCode, TypesError};
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    // =========================================================================
    // Client Errors
    // =========================================================================
    /// Malformed input or a self-request.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No such request, or the dataset is unknown or inactive.
    #[error("not found: {0}")]
    NotFound(String),

    /// The ledger transaction does not pay for this request.
    #[error("payment not verified: {0}")]
    PaymentNotVerified(String),

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    /// Caller is not the dataset owner.
    #[error("forbidden: {0}")]
    Forbidden(String),

    // =========================================================================
    // State Errors
    // =========================================================================
    /// An open request already exists for the tuple.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The request is not in a state that allows this operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    // =========================================================================
    // Ledger Errors
    // =========================================================================
    /// The ledger call failed after retries.
    #[error("ledger submission failed: {0}")]
    SubmissionFailed(String),

    /// The ledger call or the caller's deadline timed out.
    #[error("timed out: {0}")]
    Timeout(String),

    /// Definitive ledger failure (rejection, malformed response).
    #[error("ledger error: {0}")]
    Ledger(LedgerError),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Storage failure.
    #[error("store error: {0}")]
    Store(StoreError),

    /// Unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a payment-not-verified error.
    pub fn payment_not_verified(msg: impl Into<String>) -> Self {
        Self::PaymentNotVerified(msg.into())
    }

    /// Create a forbidden error.
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Create a conflict error.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create an invalid state error.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::PaymentNotVerified(_) => ErrorCode::PaymentNotVerified,
            Self::Forbidden(_) => ErrorCode::Forbidden,
            Self::Conflict(_) => ErrorCode::Conflict,
            Self::InvalidState(_) => ErrorCode::InvalidState,
            Self::SubmissionFailed(_) => ErrorCode::SubmissionFailed,
            Self::Timeout(_) => ErrorCode::Timeout,
            Self::Ledger(_) | Self::Store(_) | Self::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Whether the caller may retry the same operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SubmissionFailed(_) | Self::Timeout(_))
    }
}

impl From<TypesError> for EngineError {
    fn from(e: TypesError) -> Self {
        Self::InvalidArgument(e.to_string())
    }
}

impl From<LedgerError> for EngineError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Timeout(_) | LedgerError::DeadlineExceeded => {
                Self::Timeout(e.to_string())
            }
            LedgerError::Network(_) | LedgerError::SubmissionFailed(_) => {
                Self::SubmissionFailed(e.to_string())
            }
            other => Self::Ledger(other),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::OpenRequestExists(key) => {
                Self::Conflict(format!("open request already exists for {}", key))
            }
            StoreError::VersionConflict(id) => {
                Self::InvalidState(format!("request {} was modified concurrently", id))
            }
            StoreError::RequestNotFound(id) => Self::NotFound(format!("request {}", id)),
            StoreError::PaymentTxInUse {
                tx_hash,
                request_id,
            } => Self::PaymentNotVerified(format!(
                "transaction {} already confirmed request {}",
                tx_hash, request_id
            )),
            other => Self::Store(other),
        }
    }
}
