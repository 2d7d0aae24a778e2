//! Ledger access for Datagate.
//!
//! The ledger is the authoritative record of dataset listings, payment
//! transfers, and access grants. This crate defines the port the engine
//! consumes and the policies wrapped around it.
//!
//! # Architecture
//!
//! ```text
//! datagate-engine              datagate-ledger
//! ┌─────────────────┐         ┌──────────────────────────┐
//! │ confirm_payment │ ──────► │ BoundedLedger            │
//! │ check_access    │         │   timeout + retry +      │
//! │ create_request  │         │   caller deadline        │
//! └─────────────────┘         └────────────┬─────────────┘
//!                                          │
//!                                          ▼
//!                             ┌──────────────────────────┐
//!                             │ LedgerGateway (trait)    │
//!                             │   └─ chain client / mock │
//!                             └──────────────────────────┘
//! ```
//!
//! # Idempotent Submission
//!
//! Grant submissions are at-least-once. Each carries a [`GrantNonce`]
//! derived from the tuple and the payment transaction, so a resubmission
//! after a transient failure never records a second grant.

mod backoff;
mod bounded;
mod config;
mod error;
mod nonce;
mod traits;

pub use backoff::Backoff;
pub use bounded::{BoundedLedger, Deadline};
pub use config::{duration_ms, LedgerConfig, RetryConfig};
pub use error::{LedgerError, LedgerResult};
pub use nonce::{GrantNonce, GrantSubmission};
pub use traits::LedgerGateway;
