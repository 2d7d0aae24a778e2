//! Data structures for the Datagate access-request engine.
//!
//! This crate holds the shared data model: identifiers, the
//! [`AccessRequest`] escrow record and its status machine, read-only views
//! of ledger state, and the caller-facing [`ErrorCode`]s. It contains no
//! business logic beyond validation of individual values.
//!
//! # Module Organization
//!
//! - [`ids`] - Addresses, transaction hashes, dataset ids, request keys
//! - [`request`] - `AccessRequest` and `RequestStatus`
//! - [`ledger`] - Dataset, grant, and transaction views; `AccessDecision`
//! - [`error`] - Error codes and parse errors
//! - [`constants`] - Limits and timing defaults
//!
//! # Example
//!
//! ```
//! use datagate_types::{RequestKey, RequestStatus};
//!
//! let key = RequestKey::parse("0xA11CE", "0xB0B", "weather-2024").unwrap();
//! assert_eq!(key.owner.as_str(), "0xa11ce");
//! assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Approved));
//! assert!(!RequestStatus::Denied.can_transition_to(RequestStatus::Approved));
//! ```

pub mod constants;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod request;

pub use constants::*;
pub use error::{ErrorCategory, ErrorCode, TypesError};
pub use ids::{current_timestamp, Address, Amount, DatasetId, RequestKey, Timestamp, TxHash};
pub use ledger::{AccessDecision, AccessGrant, DatasetInfo, LedgerTransaction};
pub use request::{normalize_message, AccessRequest, RequestStatus};
