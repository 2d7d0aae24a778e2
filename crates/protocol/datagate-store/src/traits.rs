//! Trait definitions for storage components.
//!
//! The engine consumes escrow records only through [`EscrowStore`], so an
//! alternative backend only has to honor the conditional-update contract
//! documented on each method.

use datagate_types::{AccessRequest, Address, RequestKey, Timestamp, TxHash};

use crate::error::Result;
use crate::types::{GrantObligation, NewAccessRequest, NewGrantObligation, PageRequest, RequestPage};

// =============================================================================
// Escrow Records
// =============================================================================

/// Persistent record of access requests and the grants owed for them.
///
/// Writes that change a request's status are conditional: they name the
/// version the caller last read and fail with
/// [`StoreError::VersionConflict`](crate::StoreError::VersionConflict) if
/// the record moved on since, or if its status is not the required prior
/// status.
pub trait EscrowStore: Send + Sync {
    /// Insert a new `pending` request.
    ///
    /// Fails with `OpenRequestExists` if the tuple already has an open
    /// request.
    fn insert_request(&self, request: &NewAccessRequest) -> Result<AccessRequest>;

    /// The most recently inserted request for a tuple (highest `id`).
    ///
    /// Insertion order, not `created_at`, so a clock that steps backwards
    /// cannot hide a newer request behind an older one.
    fn latest_request(&self, key: &RequestKey) -> Result<Option<AccessRequest>>;

    /// Get a request by row id.
    fn get_request(&self, id: i64) -> Result<Option<AccessRequest>>;

    /// The request confirmed by a payment transaction, if any.
    fn find_by_payment_tx(&self, tx_hash: &TxHash) -> Result<Option<AccessRequest>>;

    /// `pending -> approved`, stamping `approved_at`.
    fn mark_approved(
        &self,
        id: i64,
        expected_version: u64,
        approved_at: Timestamp,
    ) -> Result<AccessRequest>;

    /// `pending -> denied`.
    fn mark_denied(&self, id: i64, expected_version: u64) -> Result<AccessRequest>;

    /// `approved -> paid`, storing the payment and recording the grant
    /// obligation in the same transaction.
    ///
    /// Fails with `PaymentTxInUse` if the transaction already confirmed a
    /// different request.
    fn mark_paid(
        &self,
        id: i64,
        expected_version: u64,
        payment_tx: &TxHash,
        paid_at: Timestamp,
        obligation: &NewGrantObligation,
    ) -> Result<AccessRequest>;

    /// Requests owned by `owner`, newest first.
    fn list_for_owner(&self, owner: &Address, page: &PageRequest) -> Result<RequestPage>;

    /// Requests made by `requester`, newest first.
    fn list_for_requester(&self, requester: &Address, page: &PageRequest)
        -> Result<RequestPage>;

    /// Obligations still owed (neither completed nor failed), in retry order:
    /// earliest `next_attempt_at`, then oldest.
    fn pending_grants(&self, limit: u32) -> Result<Vec<GrantObligation>>;

    /// The subset of [`pending_grants`](Self::pending_grants) whose
    /// `next_attempt_at` is at or before `now`.
    fn due_grants(&self, now: Timestamp, limit: u32) -> Result<Vec<GrantObligation>>;

    /// Obligations the ledger rejected outright, most recent first.
    fn failed_grants(&self, limit: u32) -> Result<Vec<GrantObligation>>;

    /// Get the grant obligation for a request.
    fn grant_obligation(&self, request_id: i64) -> Result<Option<GrantObligation>>;

    /// Mark an obligation complete and copy the grant tx onto the request.
    ///
    /// Completing an already-complete obligation is a no-op.
    fn complete_grant(
        &self,
        request_id: i64,
        grant_tx: &TxHash,
        completed_at: Timestamp,
    ) -> Result<()>;

    /// Record a transient submission failure and schedule the next attempt.
    ///
    /// No-op on completed or failed obligations.
    fn record_grant_failure(
        &self,
        request_id: i64,
        error: &str,
        next_attempt_at: Timestamp,
    ) -> Result<()>;

    /// Move an obligation to the terminal failed state after a definitive
    /// rejection. It leaves the retry queue and shows up in
    /// [`failed_grants`](Self::failed_grants).
    ///
    /// No-op on completed or already failed obligations.
    fn fail_grant(&self, request_id: i64, error: &str, failed_at: Timestamp) -> Result<()>;
}
