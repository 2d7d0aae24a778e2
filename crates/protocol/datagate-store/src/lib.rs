//! Escrow record storage for Datagate.
//!
//! This crate persists the off-chain half of access control:
//!
//! - **Access requests** (SQLite): one row per request instance, with the
//!   status machine enforced by conditional updates
//! - **Grant obligations** (SQLite): grants owed for paid requests, drained
//!   by the engine's retry worker
//!
//! # Storage Layout
//!
//! ```text
//! ~/.local/share/datagate/
//! ├── config.toml              # CLI configuration
//! └── datagate.db              # SQLite: access_requests, grant_obligations
//! ```
//!
//! # Example
//!
//! ```
//! use datagate_store::{EscrowStore, NewAccessRequest, SqliteEscrowStore};
//! use datagate_types::{RequestKey, RequestStatus};
//!
//! let store = SqliteEscrowStore::open_in_memory().unwrap();
//! let key = RequestKey::parse("0xa11ce", "0xb0b", "weather-2024").unwrap();
//!
//! let request = store
//!     .insert_request(&NewAccessRequest {
//!         key: key.clone(),
//!         message: None,
//!         price: 250,
//!         created_at: 1_700_000_000_000,
//!     })
//!     .unwrap();
//! assert_eq!(request.status, RequestStatus::Pending);
//! assert_eq!(store.latest_request(&key).unwrap().unwrap().id, request.id);
//! ```

pub mod error;
pub mod requests;
pub mod schema;
pub mod traits;
pub mod types;

pub use error::{Result, StoreError};
pub use requests::SqliteEscrowStore;
pub use schema::{initialize_schema, SCHEMA_VERSION};
pub use traits::EscrowStore;
pub use types::{
    GrantObligation, NewAccessRequest, NewGrantObligation, PageCursor, PageRequest, RequestPage,
};

use std::path::{Path, PathBuf};

/// File name of the escrow database inside the data directory.
pub const DATABASE_FILE: &str = "datagate.db";

/// Get the default data directory.
///
/// Priority:
/// 1. `DATAGATE_DATA_DIR` environment variable (if set)
/// 2. Platform-specific data directory
/// 3. Fallback to `$HOME/.datagate`
pub fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("DATAGATE_DATA_DIR") {
        return PathBuf::from(dir);
    }

    directories::ProjectDirs::from("io", "datagate", "datagate")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| {
            std::env::var("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(".datagate")
        })
}

/// Path of the escrow database inside `data_dir`.
pub fn database_path(data_dir: impl AsRef<Path>) -> PathBuf {
    data_dir.as_ref().join(DATABASE_FILE)
}
