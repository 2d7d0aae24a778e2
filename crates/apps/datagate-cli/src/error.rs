//! CLI error types.

use datagate_store::StoreError;
use datagate_types::{ErrorCode, TypesError};
use thiserror::Error;

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;

/// CLI error enum wrapping all crate errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Store error.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// An argument failed validation.
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] TypesError),

    /// IO error.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// No request exists for the tuple.
    #[error("No access request found for {0}")]
    NotFound(String),

    /// The escrow database has not been created.
    #[error("No escrow database at {0}. Run 'datagate init' first.")]
    NotInitialized(String),
}

impl CliError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidArgument(_) => 1,
            Self::NotFound(_) => 2,
            Self::Config(_) | Self::Toml(_) => 3,
            Self::NotInitialized(_) => 4,
            Self::Store(_) => 6,
            Self::Io(_) => 9,
            Self::Json(_) => 10,
        }
    }

    /// Get the caller-facing error code for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Store(e) if e.is_conflict() => ErrorCode::Conflict,
            Self::Config(_)
            | Self::Toml(_)
            | Self::Json(_)
            | Self::NotInitialized(_)
            | Self::Store(_)
            | Self::Io(_) => ErrorCode::InternalError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_per_kind() {
        let not_found = CliError::NotFound("0xa11ce/0xb0b/weather".into());
        let config = CliError::config("bad");
        let invalid = CliError::from(TypesError::invalid("address", "empty"));

        assert_eq!(not_found.exit_code(), 2);
        assert_eq!(config.exit_code(), 3);
        assert_eq!(invalid.exit_code(), 1);
    }

    #[test]
    fn test_error_codes() {
        let invalid = CliError::from(TypesError::invalid("address", "empty"));
        assert_eq!(invalid.error_code(), ErrorCode::InvalidArgument);
        assert!(invalid.error_code().suggestion().is_some());

        let missing = CliError::NotInitialized("/tmp/datagate.db".into());
        assert_eq!(missing.error_code(), ErrorCode::InternalError);
        assert!(missing.to_string().contains("datagate init"));
    }
}
