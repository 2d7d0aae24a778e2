//! Escrow store access for commands.

use std::path::PathBuf;

use datagate_store::SqliteEscrowStore;
use tracing::debug;

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};

/// An opened escrow store plus where it lives.
pub struct StoreContext {
    /// The escrow store.
    pub store: SqliteEscrowStore,
    /// Path of the database file.
    pub database: PathBuf,
}

impl StoreContext {
    /// Open an existing database for inspection.
    ///
    /// Fails with [`CliError::NotInitialized`] rather than creating an empty
    /// database, so a mistyped data directory does not look like an empty
    /// deployment.
    pub fn open(config: &CliConfig) -> CliResult<Self> {
        let database = config.database_path();
        if !database.exists() {
            return Err(CliError::NotInitialized(database.display().to_string()));
        }
        debug!(path = %database.display(), "Opening escrow database");
        let store = SqliteEscrowStore::open(&database)?;
        Ok(Self { store, database })
    }

    /// Open the database, creating it and its schema if missing.
    pub fn for_init(config: &CliConfig) -> CliResult<Self> {
        let database = config.database_path();
        debug!(path = %database.display(), "Creating escrow database");
        let store = SqliteEscrowStore::open(&database)?;
        Ok(Self { store, database })
    }
}
