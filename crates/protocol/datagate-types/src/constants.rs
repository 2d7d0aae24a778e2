//! Engine constants.
//!
//! Limits on identifiers and free-form fields, pagination bounds, and
//! default timing parameters shared across the Datagate crates.

use crate::Timestamp;

// =============================================================================
// Identifier Limits
// =============================================================================

/// Maximum number of hex digits in an address or transaction hash (after `0x`)
pub const MAX_HEX_ID_DIGITS: usize = 64;

/// Maximum dataset identifier length (characters)
pub const MAX_DATASET_ID_LENGTH: usize = 128;

/// Maximum request message length (characters)
pub const MAX_MESSAGE_LENGTH: usize = 1000;

// =============================================================================
// Pagination
// =============================================================================

/// Default page size for listing operations
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Maximum page size for listing operations
pub const MAX_PAGE_SIZE: u32 = 100;

// =============================================================================
// Timing (milliseconds)
// =============================================================================

/// One day in milliseconds
pub const DAY_MS: Timestamp = 24 * 60 * 60 * 1000;

/// Default lifetime of an on-chain access grant: 30 days
pub const DEFAULT_GRANT_DURATION_MS: Timestamp = 30 * DAY_MS;

/// Default bound on a single ledger call: 30 seconds
pub const DEFAULT_LEDGER_CALL_TIMEOUT_MS: u64 = 30_000;

/// Default interval between grant retry sweeps: 1 minute
pub const DEFAULT_GRANT_RETRY_INTERVAL_MS: u64 = 60_000;

/// Default number of grant obligations processed per sweep
pub const DEFAULT_GRANT_RETRY_BATCH: u32 = 50;

/// Delay before resubmitting a grant after its first failure: 1 minute
pub const DEFAULT_GRANT_BACKOFF_BASE_MS: u64 = 60_000;

/// Longest delay between grant resubmissions: 6 hours
pub const DEFAULT_GRANT_BACKOFF_MAX_MS: u64 = 6 * 60 * 60 * 1000;
