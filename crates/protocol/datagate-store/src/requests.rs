//! SQLite-backed escrow records.
//!
//! Status changes are compare-and-swap updates keyed on `(id, version,
//! status)`. The paid transition and its grant obligation are written in
//! one SQLite transaction.

use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use datagate_types::{
    AccessRequest, Address, Amount, RequestKey, Timestamp, TxHash, TypesError,
};

use crate::error::{Result, StoreError};
use crate::schema::initialize_schema;
use crate::traits::EscrowStore;
use crate::types::{
    GrantObligation, NewAccessRequest, NewGrantObligation, PageCursor, PageRequest, RequestPage,
};

const REQUEST_COLUMNS: &str = "id, owner, requester, dataset, status, message, price, \
     payment_tx, grant_tx, created_at, approved_at, paid_at, version";

const OBLIGATION_COLUMNS: &str = "request_id, owner, requester, dataset, payment_tx, \
     expires_at, nonce, attempts, last_error, created_at, completed_at, grant_tx, \
     next_attempt_at, failed_at";

/// Obligations the retry worker still owes, in the order it takes them.
const OPEN_OBLIGATION: &str = "completed_at IS NULL AND failed_at IS NULL";
const RETRY_ORDER: &str = "next_attempt_at ASC, created_at ASC, request_id ASC";

/// How long a writer waits on another process's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-based escrow store.
#[derive(Clone)]
pub struct SqliteEscrowStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteEscrowStore {
    /// Create a store over an existing connection.
    ///
    /// The schema must already be initialized.
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Open (or create) the database at `path` and initialize the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        initialize_schema(&conn)?;
        tracing::debug!(path = %path.display(), "Opened escrow store");

        Ok(Self::new(Arc::new(Mutex::new(conn))))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self::new(Arc::new(Mutex::new(conn))))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::lock_poisoned("database connection lock poisoned"))
    }

    fn fetch(conn: &Connection, id: i64) -> Result<Option<AccessRequest>> {
        let sql = format!("SELECT {} FROM access_requests WHERE id = ?1", REQUEST_COLUMNS);
        Ok(conn
            .query_row(&sql, [id], deserialize_request)
            .optional()?)
    }

    fn fetch_obligation(conn: &Connection, request_id: i64) -> Result<Option<GrantObligation>> {
        let sql = format!(
            "SELECT {} FROM grant_obligations WHERE request_id = ?1",
            OBLIGATION_COLUMNS
        );
        Ok(conn
            .query_row(&sql, [request_id], deserialize_obligation)
            .optional()?)
    }

    /// Obligations matching `filter`. The limit binds to `?1`.
    fn query_obligations(
        &self,
        filter: &str,
        order: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<GrantObligation>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM grant_obligations WHERE {} ORDER BY {} LIMIT ?1",
            OBLIGATION_COLUMNS, filter, order
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params, deserialize_obligation)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Update an open obligation, distinguishing "already closed" from
    /// "no such obligation".
    fn update_open_obligation(
        &self,
        request_id: i64,
        assignments: &str,
        params: impl rusqlite::Params,
    ) -> Result<bool> {
        let conn = self.lock()?;
        let sql = format!(
            "UPDATE grant_obligations SET {} WHERE request_id = ?1 AND {}",
            assignments, OPEN_OBLIGATION
        );
        let changed = conn.execute(&sql, params)?;
        if changed == 0 && Self::fetch_obligation(&conn, request_id)?.is_none() {
            return Err(StoreError::RequestNotFound(request_id));
        }
        Ok(changed > 0)
    }

    /// Classify a conditional update that touched no rows.
    fn lost_update(conn: &Connection, id: i64) -> Result<StoreError> {
        let exists = conn
            .query_row("SELECT 1 FROM access_requests WHERE id = ?1", [id], |_| Ok(()))
            .optional()?
            .is_some();
        Ok(if exists {
            StoreError::VersionConflict(id)
        } else {
            StoreError::RequestNotFound(id)
        })
    }

    fn list_by(&self, column: &'static str, value: &str, page: &PageRequest) -> Result<RequestPage> {
        let limit = page.effective_limit() as usize;
        let (cursor_ts, cursor_id) = match page.cursor {
            Some(cursor) => (Some(cursor.created_at as i64), Some(cursor.id)),
            None => (None, None),
        };

        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM access_requests
             WHERE {} = ?1
               AND (?2 IS NULL OR created_at < ?2 OR (created_at = ?2 AND id < ?3))
             ORDER BY created_at DESC, id DESC
             LIMIT ?4",
            REQUEST_COLUMNS, column
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![value, cursor_ts, cursor_id, (limit + 1) as i64],
            deserialize_request,
        )?;
        let mut requests = rows.collect::<rusqlite::Result<Vec<_>>>()?;

        // One extra row tells us whether another page exists
        let next_cursor = if requests.len() > limit {
            requests.truncate(limit);
            requests.last().map(PageCursor::after)
        } else {
            None
        };

        Ok(RequestPage {
            requests,
            next_cursor,
        })
    }
}

impl EscrowStore for SqliteEscrowStore {
    fn insert_request(&self, request: &NewAccessRequest) -> Result<AccessRequest> {
        let conn = self.lock()?;

        let inserted = conn.execute(
            "INSERT INTO access_requests
                (owner, requester, dataset, status, message, price, created_at, version)
             VALUES (?1, ?2, ?3, 'pending', ?4, ?5, ?6, 1)",
            params![
                request.key.owner.as_str(),
                request.key.requester.as_str(),
                request.key.dataset.as_str(),
                request.message,
                request.price as i64,
                request.created_at as i64,
            ],
        );

        match inserted {
            Ok(_) => {}
            Err(e) if is_constraint_violation(&e) => {
                return Err(StoreError::OpenRequestExists(request.key.clone()));
            }
            Err(e) => return Err(e.into()),
        }

        let id = conn.last_insert_rowid();
        Self::fetch(&conn, id)?.ok_or(StoreError::RequestNotFound(id))
    }

    fn latest_request(&self, key: &RequestKey) -> Result<Option<AccessRequest>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM access_requests
             WHERE owner = ?1 AND requester = ?2 AND dataset = ?3
             ORDER BY id DESC
             LIMIT 1",
            REQUEST_COLUMNS
        );
        Ok(conn
            .query_row(
                &sql,
                params![
                    key.owner.as_str(),
                    key.requester.as_str(),
                    key.dataset.as_str()
                ],
                deserialize_request,
            )
            .optional()?)
    }

    fn get_request(&self, id: i64) -> Result<Option<AccessRequest>> {
        let conn = self.lock()?;
        Self::fetch(&conn, id)
    }

    fn find_by_payment_tx(&self, tx_hash: &TxHash) -> Result<Option<AccessRequest>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM access_requests WHERE payment_tx = ?1",
            REQUEST_COLUMNS
        );
        Ok(conn
            .query_row(&sql, [tx_hash.as_str()], deserialize_request)
            .optional()?)
    }

    fn mark_approved(
        &self,
        id: i64,
        expected_version: u64,
        approved_at: Timestamp,
    ) -> Result<AccessRequest> {
        let conn = self.lock()?;

        let changed = conn.execute(
            "UPDATE access_requests
             SET status = 'approved', approved_at = ?1, version = version + 1
             WHERE id = ?2 AND version = ?3 AND status = 'pending'",
            params![approved_at as i64, id, expected_version as i64],
        )?;
        if changed == 0 {
            return Err(Self::lost_update(&conn, id)?);
        }

        Self::fetch(&conn, id)?.ok_or(StoreError::RequestNotFound(id))
    }

    fn mark_denied(&self, id: i64, expected_version: u64) -> Result<AccessRequest> {
        let conn = self.lock()?;

        let changed = conn.execute(
            "UPDATE access_requests
             SET status = 'denied', version = version + 1
             WHERE id = ?1 AND version = ?2 AND status = 'pending'",
            params![id, expected_version as i64],
        )?;
        if changed == 0 {
            return Err(Self::lost_update(&conn, id)?);
        }

        Self::fetch(&conn, id)?.ok_or(StoreError::RequestNotFound(id))
    }

    fn mark_paid(
        &self,
        id: i64,
        expected_version: u64,
        payment_tx: &TxHash,
        paid_at: Timestamp,
        obligation: &NewGrantObligation,
    ) -> Result<AccessRequest> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let used_by: Option<i64> = tx
            .query_row(
                "SELECT id FROM access_requests WHERE payment_tx = ?1",
                [payment_tx.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(request_id) = used_by.filter(|other| *other != id) {
            return Err(StoreError::PaymentTxInUse {
                tx_hash: payment_tx.clone(),
                request_id,
            });
        }

        let changed = tx.execute(
            "UPDATE access_requests
             SET status = 'paid', payment_tx = ?1, paid_at = ?2, version = version + 1
             WHERE id = ?3 AND version = ?4 AND status = 'approved'",
            params![payment_tx.as_str(), paid_at as i64, id, expected_version as i64],
        )?;
        if changed == 0 {
            return Err(Self::lost_update(&tx, id)?);
        }

        let request = Self::fetch(&tx, id)?.ok_or(StoreError::RequestNotFound(id))?;

        tx.execute(
            "INSERT INTO grant_obligations
                (request_id, owner, requester, dataset, payment_tx, expires_at, nonce,
                 attempts, created_at, next_attempt_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?8)",
            params![
                id,
                request.owner.as_str(),
                request.requester.as_str(),
                request.dataset.as_str(),
                payment_tx.as_str(),
                obligation.expires_at as i64,
                obligation.nonce,
                obligation.created_at as i64,
            ],
        )?;

        tx.commit()?;
        Ok(request)
    }

    fn list_for_owner(&self, owner: &Address, page: &PageRequest) -> Result<RequestPage> {
        self.list_by("owner", owner.as_str(), page)
    }

    fn list_for_requester(
        &self,
        requester: &Address,
        page: &PageRequest,
    ) -> Result<RequestPage> {
        self.list_by("requester", requester.as_str(), page)
    }

    fn pending_grants(&self, limit: u32) -> Result<Vec<GrantObligation>> {
        self.query_obligations(OPEN_OBLIGATION, RETRY_ORDER, [limit as i64])
    }

    fn due_grants(&self, now: Timestamp, limit: u32) -> Result<Vec<GrantObligation>> {
        let filter = format!("{} AND next_attempt_at <= ?2", OPEN_OBLIGATION);
        self.query_obligations(&filter, RETRY_ORDER, params![limit as i64, now as i64])
    }

    fn failed_grants(&self, limit: u32) -> Result<Vec<GrantObligation>> {
        self.query_obligations(
            "failed_at IS NOT NULL AND completed_at IS NULL",
            "failed_at DESC, request_id DESC",
            [limit as i64],
        )
    }

    fn grant_obligation(&self, request_id: i64) -> Result<Option<GrantObligation>> {
        let conn = self.lock()?;
        Self::fetch_obligation(&conn, request_id)
    }

    fn complete_grant(
        &self,
        request_id: i64,
        grant_tx: &TxHash,
        completed_at: Timestamp,
    ) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let completed: Option<Option<i64>> = tx
            .query_row(
                "SELECT completed_at FROM grant_obligations WHERE request_id = ?1",
                [request_id],
                |row| row.get(0),
            )
            .optional()?;
        match completed {
            None => return Err(StoreError::RequestNotFound(request_id)),
            Some(Some(_)) => return Ok(()),
            Some(None) => {}
        }

        tx.execute(
            "UPDATE grant_obligations SET completed_at = ?1, grant_tx = ?2, failed_at = NULL
             WHERE request_id = ?3",
            params![completed_at as i64, grant_tx.as_str(), request_id],
        )?;
        tx.execute(
            "UPDATE access_requests SET grant_tx = ?1, version = version + 1
             WHERE id = ?2",
            params![grant_tx.as_str(), request_id],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn record_grant_failure(
        &self,
        request_id: i64,
        error: &str,
        next_attempt_at: Timestamp,
    ) -> Result<()> {
        self.update_open_obligation(
            request_id,
            "attempts = attempts + 1, last_error = ?2, next_attempt_at = ?3",
            params![request_id, error, next_attempt_at as i64],
        )?;
        Ok(())
    }

    fn fail_grant(&self, request_id: i64, error: &str, failed_at: Timestamp) -> Result<()> {
        if self.update_open_obligation(
            request_id,
            "attempts = attempts + 1, last_error = ?2, failed_at = ?3",
            params![request_id, error, failed_at as i64],
        )? {
            tracing::warn!(request_id, error, "Grant obligation failed permanently");
        }
        Ok(())
    }
}

impl std::fmt::Debug for SqliteEscrowStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteEscrowStore").finish_non_exhaustive()
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Read a validated text column.
fn parse_text<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = TypesError>,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_opt_text<T>(row: &Row, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr<Err = TypesError>,
{
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        s.parse()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn deserialize_request(row: &Row) -> rusqlite::Result<AccessRequest> {
    let price: i64 = row.get(6)?;
    let created_at: i64 = row.get(9)?;
    let approved_at: Option<i64> = row.get(10)?;
    let paid_at: Option<i64> = row.get(11)?;
    let version: i64 = row.get(12)?;

    Ok(AccessRequest {
        id: row.get(0)?,
        owner: parse_text(row, 1)?,
        requester: parse_text(row, 2)?,
        dataset: parse_text(row, 3)?,
        status: parse_text(row, 4)?,
        message: row.get(5)?,
        price: price as Amount,
        payment_tx: parse_opt_text(row, 7)?,
        grant_tx: parse_opt_text(row, 8)?,
        created_at: Some(created_at as Timestamp),
        approved_at: approved_at.map(|t| t as Timestamp),
        paid_at: paid_at.map(|t| t as Timestamp),
        version: version as u64,
    })
}

fn deserialize_obligation(row: &Row) -> rusqlite::Result<GrantObligation> {
    let expires_at: i64 = row.get(5)?;
    let attempts: i64 = row.get(7)?;
    let created_at: i64 = row.get(9)?;
    let completed_at: Option<i64> = row.get(10)?;
    let next_attempt_at: i64 = row.get(12)?;
    let failed_at: Option<i64> = row.get(13)?;

    Ok(GrantObligation {
        request_id: row.get(0)?,
        key: RequestKey::new(parse_text(row, 1)?, parse_text(row, 2)?, parse_text(row, 3)?),
        payment_tx: parse_text(row, 4)?,
        expires_at: expires_at as Timestamp,
        nonce: row.get(6)?,
        attempts: attempts as u32,
        last_error: row.get(8)?,
        created_at: created_at as Timestamp,
        completed_at: completed_at.map(|t| t as Timestamp),
        grant_tx: parse_opt_text(row, 11)?,
        next_attempt_at: next_attempt_at as Timestamp,
        failed_at: failed_at.map(|t| t as Timestamp),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use datagate_types::RequestStatus;

    fn setup_store() -> SqliteEscrowStore {
        SqliteEscrowStore::open_in_memory().unwrap()
    }

    fn key(dataset: &str) -> RequestKey {
        RequestKey::parse("0xa11ce", "0xb0b", dataset).unwrap()
    }

    fn new_request(key: RequestKey, created_at: Timestamp) -> NewAccessRequest {
        NewAccessRequest {
            key,
            message: Some("please".to_string()),
            price: 100,
            created_at,
        }
    }

    fn obligation(nonce: &str) -> NewGrantObligation {
        NewGrantObligation {
            expires_at: 9_000,
            nonce: nonce.to_string(),
            created_at: 2_000,
        }
    }

    #[test]
    fn test_insert_and_latest() {
        let store = setup_store();
        let created = store.insert_request(&new_request(key("d1"), 1_000)).unwrap();

        assert_eq!(created.status, RequestStatus::Pending);
        assert_eq!(created.version, 1);
        assert_eq!(created.created_at, Some(1_000));
        assert_eq!(created.message.as_deref(), Some("please"));

        let latest = store.latest_request(&key("d1")).unwrap().unwrap();
        assert_eq!(latest, created);
        assert!(store.latest_request(&key("d2")).unwrap().is_none());
    }

    #[test]
    fn test_open_request_rejected() {
        let store = setup_store();
        store.insert_request(&new_request(key("d1"), 1_000)).unwrap();

        let err = store
            .insert_request(&new_request(key("d1"), 1_001))
            .unwrap_err();
        assert!(matches!(err, StoreError::OpenRequestExists(_)));
    }

    #[test]
    fn test_approve_cas() {
        let store = setup_store();
        let created = store.insert_request(&new_request(key("d1"), 1_000)).unwrap();

        let approved = store.mark_approved(created.id, 1, 1_500).unwrap();
        assert_eq!(approved.status, RequestStatus::Approved);
        assert_eq!(approved.approved_at, Some(1_500));
        assert_eq!(approved.version, 2);

        // Stale version
        let err = store.mark_denied(created.id, 1).unwrap_err();
        assert!(err.is_conflict());

        // Right version, wrong prior status
        let err = store.mark_denied(created.id, 2).unwrap_err();
        assert!(err.is_conflict());

        let err = store.mark_denied(999, 1).unwrap_err();
        assert!(matches!(err, StoreError::RequestNotFound(999)));
    }

    #[test]
    fn test_mark_paid_writes_obligation() {
        let store = setup_store();
        let created = store.insert_request(&new_request(key("d1"), 1_000)).unwrap();
        let approved = store.mark_approved(created.id, 1, 1_500).unwrap();
        let tx = TxHash::parse("0xfeed").unwrap();

        let paid = store
            .mark_paid(approved.id, approved.version, &tx, 2_000, &obligation("n1"))
            .unwrap();
        assert_eq!(paid.status, RequestStatus::Paid);
        assert_eq!(paid.payment_tx, Some(tx.clone()));
        assert_eq!(paid.paid_at, Some(2_000));

        let pending = store.pending_grants(10).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].request_id, paid.id);
        assert_eq!(pending[0].key, key("d1"));
        assert_eq!(pending[0].nonce, "n1");
        assert_eq!(pending[0].attempts, 0);
        assert_eq!(pending[0].next_attempt_at, 2_000);
        assert!(pending[0].is_open());

        assert_eq!(store.find_by_payment_tx(&tx).unwrap().unwrap().id, paid.id);
    }

    #[test]
    fn test_mark_paid_conflict_leaves_no_obligation() {
        let store = setup_store();
        let created = store.insert_request(&new_request(key("d1"), 1_000)).unwrap();
        let tx = TxHash::parse("0xfeed").unwrap();

        // Still pending
        let err = store
            .mark_paid(created.id, created.version, &tx, 2_000, &obligation("n1"))
            .unwrap_err();
        assert!(err.is_conflict());
        assert!(store.pending_grants(10).unwrap().is_empty());
        assert!(store.find_by_payment_tx(&tx).unwrap().is_none());
    }

    #[test]
    fn test_payment_tx_single_use() {
        let store = setup_store();
        let tx = TxHash::parse("0xfeed").unwrap();

        let first = store.insert_request(&new_request(key("d1"), 1_000)).unwrap();
        let first = store.mark_approved(first.id, 1, 1_100).unwrap();
        store
            .mark_paid(first.id, first.version, &tx, 1_200, &obligation("n1"))
            .unwrap();

        let second = store.insert_request(&new_request(key("d2"), 1_300)).unwrap();
        let second = store.mark_approved(second.id, 1, 1_400).unwrap();
        let err = store
            .mark_paid(second.id, second.version, &tx, 1_500, &obligation("n2"))
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::PaymentTxInUse { request_id, .. } if request_id == first.id
        ));
        let second = store.get_request(second.id).unwrap().unwrap();
        assert_eq!(second.status, RequestStatus::Approved);
    }

    #[test]
    fn test_grant_completion() {
        let store = setup_store();
        let created = store.insert_request(&new_request(key("d1"), 1_000)).unwrap();
        let approved = store.mark_approved(created.id, 1, 1_100).unwrap();
        let tx = TxHash::parse("0xfeed").unwrap();
        store
            .mark_paid(approved.id, approved.version, &tx, 1_200, &obligation("n1"))
            .unwrap();

        store.record_grant_failure(created.id, "rpc down", 5_000).unwrap();
        let ob = store.grant_obligation(created.id).unwrap().unwrap();
        assert_eq!(ob.attempts, 1);
        assert_eq!(ob.last_error.as_deref(), Some("rpc down"));
        assert_eq!(ob.next_attempt_at, 5_000);

        let grant_tx = TxHash::parse("0x9a").unwrap();
        store.complete_grant(created.id, &grant_tx, 1_300).unwrap();
        // Idempotent
        store.complete_grant(created.id, &grant_tx, 1_400).unwrap();

        let ob = store.grant_obligation(created.id).unwrap().unwrap();
        assert!(ob.is_completed());
        assert_eq!(ob.completed_at, Some(1_300));
        assert!(store.pending_grants(10).unwrap().is_empty());

        let request = store.get_request(created.id).unwrap().unwrap();
        assert_eq!(request.grant_tx, Some(grant_tx));

        assert!(matches!(
            store.record_grant_failure(42, "x", 0),
            Err(StoreError::RequestNotFound(42))
        ));
    }

    #[test]
    fn test_recreate_after_terminal() {
        let store = setup_store();
        let first = store.insert_request(&new_request(key("d1"), 1_000)).unwrap();
        store.mark_denied(first.id, 1).unwrap();

        let second = store.insert_request(&new_request(key("d1"), 2_000)).unwrap();
        assert_ne!(first.id, second.id);

        let latest = store.latest_request(&key("d1")).unwrap().unwrap();
        assert_eq!(latest.id, second.id);
    }

    #[test]
    fn test_latest_tie_breaks_on_id() {
        let store = setup_store();
        let first = store.insert_request(&new_request(key("d1"), 1_000)).unwrap();
        store.mark_denied(first.id, 1).unwrap();
        let second = store.insert_request(&new_request(key("d1"), 1_000)).unwrap();

        let latest = store.latest_request(&key("d1")).unwrap().unwrap();
        assert_eq!(latest.id, second.id);
    }

    #[test]
    fn test_latest_follows_insertion_when_clock_steps_back() {
        let store = setup_store();
        let first = store.insert_request(&new_request(key("d1"), 2_000)).unwrap();
        store.mark_denied(first.id, 1).unwrap();

        // Wall clock stepped back between the two inserts
        let second = store.insert_request(&new_request(key("d1"), 1_000)).unwrap();

        let latest = store.latest_request(&key("d1")).unwrap().unwrap();
        assert_eq!(latest.id, second.id);
        assert_eq!(latest.status, RequestStatus::Pending);

        let approved = store
            .mark_approved(latest.id, latest.version, 1_100)
            .unwrap();
        assert_eq!(approved.status, RequestStatus::Approved);
    }

    /// Pay a fresh request for `dataset`, returning its id.
    fn paid(store: &SqliteEscrowStore, dataset: &str, tx: &str, created_at: Timestamp) -> i64 {
        let created = store
            .insert_request(&new_request(key(dataset), created_at))
            .unwrap();
        let approved = store.mark_approved(created.id, 1, created_at).unwrap();
        let ob = NewGrantObligation {
            expires_at: 9_000,
            nonce: format!("nonce-{}", dataset),
            created_at,
        };
        store
            .mark_paid(
                approved.id,
                approved.version,
                &TxHash::parse(tx).unwrap(),
                created_at,
                &ob,
            )
            .unwrap()
            .id
    }

    #[test]
    fn test_due_grants_respect_schedule() {
        let store = setup_store();
        let older = paid(&store, "d1", "0xa1", 1_000);
        let newer = paid(&store, "d2", "0xa2", 2_000);

        // Both due, oldest first
        let due: Vec<i64> = store
            .due_grants(2_000, 10)
            .unwrap()
            .iter()
            .map(|g| g.request_id)
            .collect();
        assert_eq!(due, vec![older, newer]);

        // Backing off the older one moves it behind the newer one
        store.record_grant_failure(older, "rpc down", 5_000).unwrap();
        let due = store.due_grants(2_000, 1).unwrap();
        assert_eq!(due[0].request_id, newer);
        assert_eq!(store.due_grants(2_000, 10).unwrap().len(), 1);
        assert_eq!(store.due_grants(5_000, 10).unwrap().len(), 2);

        let pending: Vec<i64> = store
            .pending_grants(10)
            .unwrap()
            .iter()
            .map(|g| g.request_id)
            .collect();
        assert_eq!(pending, vec![newer, older]);
    }

    #[test]
    fn test_failed_grant_leaves_queue() {
        let store = setup_store();
        let rejected = paid(&store, "d1", "0xa1", 1_000);
        let healthy = paid(&store, "d2", "0xa2", 2_000);

        store.fail_grant(rejected, "dataset delisted", 3_000).unwrap();
        // Later transient failures do not reopen it
        store.record_grant_failure(rejected, "rpc down", 0).unwrap();
        store.fail_grant(rejected, "again", 4_000).unwrap();

        let due = store.due_grants(10_000, 10).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].request_id, healthy);
        assert_eq!(store.pending_grants(10).unwrap().len(), 1);

        let failed = store.failed_grants(10).unwrap();
        assert_eq!(failed.len(), 1);
        let ob = &failed[0];
        assert_eq!(ob.request_id, rejected);
        assert!(ob.is_failed());
        assert!(!ob.is_open());
        assert_eq!(ob.failed_at, Some(3_000));
        assert_eq!(ob.attempts, 1);
        assert_eq!(ob.last_error.as_deref(), Some("dataset delisted"));

        assert!(matches!(
            store.fail_grant(42, "x", 0),
            Err(StoreError::RequestNotFound(42))
        ));
    }
}
