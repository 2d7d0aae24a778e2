//! Access-request engine for Datagate.
//!
//! This crate composes the escrow store and the ledger gateway into the
//! access-request lifecycle:
//!
//! ```text
//! pending --approve--> approved --confirm_payment(verified)--> paid   [terminal]
//! pending --deny-----> denied                                          [terminal]
//! ```
//!
//! # Module Organization
//!
//! - [`error`] - Engine error types
//! - [`config`] - Engine and grant retry configuration
//! - [`engine`] - The [`AccessRequestEngine`] struct
//! - [`requests`] - Create, approve, deny, get, list
//! - [`payment`] - Payment confirmation and grant submission
//! - [`access`] - Access queries
//! - [`grants`] - Grant retry worker
//! - [`verify`] - Payment verification rules
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use datagate_engine::{AccessRequestEngine, EngineConfig};
//! use datagate_ledger::Deadline;
//! use datagate_store::SqliteEscrowStore;
//! use datagate_types::{Address, RequestKey, TxHash};
//!
//! let store = Arc::new(SqliteEscrowStore::open("datagate.db")?);
//! let engine = AccessRequestEngine::new(store, gateway, EngineConfig::default());
//!
//! let key = RequestKey::parse("0xa11ce", "0xb0b", "weather-2024")?;
//! engine.create_request(&key, Some("research use"), Deadline::none()).await?;
//! engine.approve_request(&key.owner, &key).await?;
//! engine.confirm_payment(&key, &TxHash::parse("0xfeed")?, Deadline::none()).await?;
//!
//! assert!(engine.check_access(&key, Deadline::none()).await?.has_access);
//! ```
//!
//! # Concurrency
//!
//! Approve, deny and confirm serialize per tuple on an in-process lock and
//! write through versioned conditional updates, so a racing writer in
//! another process loses with `InvalidState` instead of overwriting.

pub mod access;
pub mod config;
pub mod engine;
pub mod error;
pub mod grants;
mod locks;
pub mod payment;
pub mod requests;
pub mod verify;

pub use config::{EngineConfig, GrantRetryConfig};
pub use engine::AccessRequestEngine;
pub use error::{EngineError, EngineResult};
pub use grants::{spawn_grant_retry_loop, GrantRetryReport};
pub use verify::{verify_payment, PaymentRejection};
