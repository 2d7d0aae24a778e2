//! SQL schema initialization.

use rusqlite::{Connection, OptionalExtension};

use crate::error::{Result, StoreError};

/// Schema version for migration tracking.
pub const SCHEMA_VERSION: u32 = 2;

/// Initialize the database schema.
///
/// Creates all tables and indexes if they don't exist, and migrates older
/// databases forward. Idempotent. Refuses to open a database written by a
/// newer schema.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    // WAL lets readers proceed while a writer holds the lock
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    let current_version: Option<u32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .optional()?;

    match current_version {
        None => {
            create_tables(conn)?;
            conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )?;
            tracing::debug!(version = SCHEMA_VERSION, "Created escrow schema");
        }
        Some(version) if version > SCHEMA_VERSION => {
            return Err(StoreError::schema(format!(
                "database schema version {} is newer than supported version {}",
                version, SCHEMA_VERSION
            )));
        }
        Some(version) if version < SCHEMA_VERSION => {
            migrate_schema(conn, version)?;
            conn.execute("UPDATE schema_version SET version = ?1", [SCHEMA_VERSION])?;
            tracing::info!(from = version, to = SCHEMA_VERSION, "Migrated escrow schema");
        }
        Some(_) => {}
    }

    Ok(())
}

/// Create all database tables.
fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS access_requests (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner TEXT NOT NULL,
            requester TEXT NOT NULL,
            dataset TEXT NOT NULL,
            status TEXT NOT NULL,
            message TEXT,
            price INTEGER NOT NULL,
            payment_tx TEXT UNIQUE,
            grant_tx TEXT,
            created_at INTEGER NOT NULL,
            approved_at INTEGER,
            paid_at INTEGER,
            version INTEGER NOT NULL DEFAULT 1
        )",
        [],
    )?;

    // At most one open request per tuple
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_requests_open
         ON access_requests(owner, requester, dataset)
         WHERE status IN ('pending', 'approved')",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_requests_tuple
         ON access_requests(owner, requester, dataset, created_at DESC, id DESC)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_requests_owner
         ON access_requests(owner, created_at DESC, id DESC)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_requests_requester
         ON access_requests(requester, created_at DESC, id DESC)",
        [],
    )?;

    // Outbox of grants owed for paid requests
    conn.execute(
        "CREATE TABLE IF NOT EXISTS grant_obligations (
            request_id INTEGER PRIMARY KEY REFERENCES access_requests(id),
            owner TEXT NOT NULL,
            requester TEXT NOT NULL,
            dataset TEXT NOT NULL,
            payment_tx TEXT NOT NULL,
            expires_at INTEGER NOT NULL,
            nonce TEXT NOT NULL UNIQUE,
            attempts INTEGER NOT NULL DEFAULT 0,
            last_error TEXT,
            created_at INTEGER NOT NULL,
            completed_at INTEGER,
            grant_tx TEXT,
            next_attempt_at INTEGER NOT NULL DEFAULT 0,
            failed_at INTEGER
        )",
        [],
    )?;

    create_grant_queue_index(conn)
}

/// Index over obligations still owed, in the order the retry worker takes them.
fn create_grant_queue_index(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_grants_due
         ON grant_obligations(next_attempt_at, created_at, request_id)
         WHERE completed_at IS NULL AND failed_at IS NULL",
        [],
    )?;
    Ok(())
}

/// Bring an older schema up to [`SCHEMA_VERSION`].
fn migrate_schema(conn: &Connection, from_version: u32) -> Result<()> {
    if from_version < 2 {
        // v2: scheduled resubmission and a terminal failed state for grants
        add_column(conn, "grant_obligations", "next_attempt_at INTEGER NOT NULL DEFAULT 0")?;
        add_column(conn, "grant_obligations", "failed_at INTEGER")?;
        conn.execute("DROP INDEX IF EXISTS idx_grants_pending", [])?;
        create_grant_queue_index(conn)?;
    }
    Ok(())
}

/// `ALTER TABLE ... ADD COLUMN`, tolerating a column that already exists.
fn add_column(conn: &Connection, table: &str, definition: &str) -> Result<()> {
    let sql = format!("ALTER TABLE {} ADD COLUMN {}", table, definition);
    match conn.execute(&sql, []) {
        Ok(_) => Ok(()),
        Err(e) if e.to_string().contains("duplicate column") => {
            tracing::debug!(table, definition, "Column already present");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
