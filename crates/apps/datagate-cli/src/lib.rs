//! Operator command-line interface for Datagate.
//!
//! This crate provides the `datagate` binary for inspecting the escrow
//! store an engine deployment writes to. It never talks to a ledger; every
//! command is a read against the local SQLite database except `init`.
//!
//! # Quick Start
//!
//! ```bash
//! # Write a default config and create the database
//! datagate init
//!
//! # Requests addressed to an owner, newest first
//! datagate list --owner 0xa11ce --limit 20
//!
//! # The latest request for one tuple
//! datagate show 0xa11ce 0xb0b weather-2024
//!
//! # Grants owed but not yet recorded on the ledger
//! datagate grants pending
//! ```
//!
//! # Output Formats
//!
//! All commands support `--format`:
//!
//! - `human` (default): aligned text
//! - `json`: machine-readable JSON
//!
//! # Configuration
//!
//! Configuration is loaded from `config.toml` in the data directory.
//! Override with `--config`; `DATAGATE_DATA_DIR` overrides the data directory.

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, GrantsCommand, OutputFormatArg};
pub use config::CliConfig;
pub use context::StoreContext;
pub use error::{CliError, CliResult};
pub use output::{OutputFormat, Render};
