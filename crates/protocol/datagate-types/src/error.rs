//! Error codes and shared error types.
//!
//! Every failure an inbound caller can observe maps to exactly one
//! [`ErrorCode`]. Codes are grouped into ranges so a client can tell
//! "try again" from "this request is stale" from "you are not authorized"
//! without parsing messages.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Caller-facing error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
#[non_exhaustive]
pub enum ErrorCode {
    // =========================================================================
    // Client Errors (0x0001 - 0x00FF)
    // =========================================================================
    /// Malformed input, or owner and requester are the same account
    InvalidArgument = 0x0001,
    /// Unknown or inactive dataset, or no request for the tuple
    NotFound = 0x0002,
    /// Ledger transaction does not satisfy the payment conditions
    PaymentNotVerified = 0x0003,

    // =========================================================================
    // Authorization Errors (0x0100 - 0x01FF)
    // =========================================================================
    /// Caller is not the record's owner
    Forbidden = 0x0100,

    // =========================================================================
    // Stale-State Errors (0x0200 - 0x02FF)
    // =========================================================================
    /// An open request already exists for the tuple
    Conflict = 0x0200,
    /// Transition not legal from the current status
    InvalidState = 0x0201,

    // =========================================================================
    // Retryable Errors (0x0300 - 0x03FF)
    // =========================================================================
    /// Transient ledger or network fault
    SubmissionFailed = 0x0300,
    /// Caller deadline or call bound elapsed
    Timeout = 0x0301,

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Internal server error
    InternalError = 0xFFFF,
}

/// Coarse classification of an [`ErrorCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The request itself is wrong; do not retry unchanged
    Client,
    /// The caller lacks authority for the action
    Unauthorized,
    /// The record moved on; refresh before acting again
    Stale,
    /// Transient; the same call may succeed later
    Retry,
    /// Unexpected failure inside the engine
    Internal,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the category of this code, based on its range.
    pub fn category(&self) -> ErrorCategory {
        match self.code() {
            0x0001..=0x00FF => ErrorCategory::Client,
            0x0100..=0x01FF => ErrorCategory::Unauthorized,
            0x0200..=0x02FF => ErrorCategory::Stale,
            0x0300..=0x03FF => ErrorCategory::Retry,
            _ => ErrorCategory::Internal,
        }
    }

    /// Returns true if a caller may retry the same call unchanged.
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Retry
    }

    /// Get a user-facing hint for recovering from this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::InvalidArgument => Some("Check the addresses, dataset id and transaction hash format."),
            Self::NotFound => Some("The dataset is unknown or inactive, or no request exists yet."),
            Self::PaymentNotVerified => Some("Make sure the transfer succeeded and covers the full price."),
            Self::Forbidden => Some("Only the dataset owner can approve or deny a request."),
            Self::Conflict => Some("An open request already exists. Wait for the owner to respond."),
            Self::InvalidState => Some("The request has moved on. Reload it before acting again."),
            Self::SubmissionFailed => Some("The ledger could not be reached. Try again shortly."),
            Self::Timeout => Some("The operation timed out. Try again."),
            Self::InternalError => None,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::PaymentNotVerified => "PAYMENT_NOT_VERIFIED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::InvalidState => "INVALID_STATE",
            ErrorCode::SubmissionFailed => "SUBMISSION_FAILED",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        f.write_str(name)
    }
}

/// Errors from parsing or validating data-model values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TypesError {
    /// A value failed validation.
    #[error("invalid {kind}: {reason}")]
    Invalid {
        /// What was being parsed
        kind: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// Unknown request status string.
    #[error("unknown request status: {0}")]
    UnknownStatus(String),
}

impl TypesError {
    /// Create an Invalid error.
    pub fn invalid(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            kind,
            reason: reason.into(),
        }
    }
}
