//! Payment confirmation.

use tracing::{debug, info, warn};

use datagate_ledger::{Deadline, GrantNonce, GrantSubmission};
use datagate_store::NewGrantObligation;
use datagate_types::{
    current_timestamp, AccessRequest, RequestKey, RequestStatus, Timestamp, TxHash,
};

use crate::engine::AccessRequestEngine;
use crate::error::{EngineError, EngineResult};
use crate::grants::GrantOutcome;
use crate::verify::verify_payment;

impl AccessRequestEngine {
    /// Confirm payment for the latest approved request of a tuple.
    ///
    /// Steps, all under the tuple lock:
    /// 1. Resolve the latest record; only a record that may become `paid`
    ///    proceeds (a `paid` record confirmed by the same transaction is
    ///    returned unchanged)
    /// 2. Reject a transaction that already confirmed another request
    /// 3. Fetch and verify the transaction on the ledger
    /// 4. Mark the record `paid` together with its grant obligation
    /// 5. Submit the grant; on a transient failure the obligation stays
    ///    queued for [`retry_pending_grants`](Self::retry_pending_grants), on
    ///    a definitive rejection it is closed as failed
    ///
    /// The deadline bounds the ledger reads. If it elapses before step 4 the
    /// record is untouched and the call fails with `Timeout`.
    pub async fn confirm_payment(
        &self,
        key: &RequestKey,
        tx_hash: &TxHash,
        deadline: Deadline,
    ) -> EngineResult<AccessRequest> {
        let _guard = self.locks.lock(key).await?;
        let record = self.latest_or_not_found(key)?;

        if record.status == RequestStatus::Paid && record.is_paid_with(tx_hash) {
            debug!(id = record.id, tx = %tx_hash, "Payment already confirmed");
            return Ok(record);
        }
        if !record.status.can_transition_to(RequestStatus::Paid) {
            return Err(EngineError::invalid_state(format!(
                "request {} is {}, cannot become paid",
                record.id, record.status
            )));
        }

        if let Some(other) = self.store.find_by_payment_tx(tx_hash)? {
            return Err(EngineError::payment_not_verified(format!(
                "transaction {} already confirmed request {}",
                tx_hash, other.id
            )));
        }

        let tx = self.ledger.get_transaction(tx_hash, deadline).await?;
        if let Err(rejection) = verify_payment(&record, tx.as_ref()) {
            warn!(id = record.id, tx = %tx_hash, reason = %rejection, "Payment rejected");
            return Err(EngineError::payment_not_verified(rejection.to_string()));
        }
        if deadline.is_expired() {
            return Err(EngineError::Timeout(
                "deadline elapsed before payment was recorded".to_string(),
            ));
        }

        let paid_at = current_timestamp();
        let expires_at = paid_at.saturating_add(self.config.grant_duration_ms());
        let nonce = GrantNonce::derive(key, tx_hash);

        let paid = self.store.mark_paid(
            record.id,
            record.version,
            tx_hash,
            paid_at,
            &NewGrantObligation {
                expires_at,
                nonce: nonce.as_str().to_string(),
                created_at: paid_at,
            },
        )?;

        info!(
            id = paid.id,
            owner = %key.owner,
            requester = %key.requester,
            dataset = %key.dataset,
            tx = %tx_hash,
            "Payment confirmed"
        );

        let submission = GrantSubmission::new(key, expires_at, nonce);
        let outcome = self.submit_grant(paid.id, &submission, 0, deadline).await;
        if outcome == GrantOutcome::Submitted {
            // Payment and grant are committed; a failed reload only costs the
            // caller the grant tx on the returned record.
            match self.store.get_request(paid.id) {
                Ok(Some(current)) => return Ok(current),
                Ok(None) => {}
                Err(e) => {
                    warn!(id = paid.id, error = %e, "Failed to reload request after grant")
                }
            }
        }
        Ok(paid)
    }

    /// Submit one grant and record the outcome on its obligation.
    ///
    /// Errors are logged and recorded, never returned. A definitive ledger
    /// rejection closes the obligation as failed; anything else schedules a
    /// resubmission after a backoff that grows with `prior_failures`.
    pub(crate) async fn submit_grant(
        &self,
        request_id: i64,
        submission: &GrantSubmission,
        prior_failures: u32,
        deadline: Deadline,
    ) -> GrantOutcome {
        let err = match self.ledger.submit_grant_access(submission, deadline).await {
            Ok(grant_tx) => {
                if let Err(e) = self
                    .store
                    .complete_grant(request_id, &grant_tx, current_timestamp())
                {
                    warn!(id = request_id, error = %e, "Failed to record completed grant");
                    return GrantOutcome::Deferred;
                }
                info!(
                    id = request_id,
                    grant_tx = %grant_tx,
                    expires_at = submission.expires_at,
                    "Access grant submitted"
                );
                return GrantOutcome::Submitted;
            }
            Err(e) => e,
        };

        let now = current_timestamp();
        if err.is_definitive() {
            warn!(
                id = request_id,
                nonce = %submission.nonce,
                error = %err,
                "Ledger rejected grant; obligation closed as failed"
            );
            if let Err(store_err) = self.store.fail_grant(request_id, &err.to_string(), now) {
                warn!(id = request_id, error = %store_err, "Failed to record grant rejection");
            }
            return GrantOutcome::Rejected;
        }

        let delay = self
            .config
            .grant_retry
            .backoff()
            .delay(prior_failures.saturating_add(1));
        let next_attempt_at =
            now.saturating_add(delay.as_millis().min(u128::from(u64::MAX)) as Timestamp);
        warn!(
            id = request_id,
            nonce = %submission.nonce,
            error = %err,
            next_attempt_at,
            "Grant submission failed; queued for retry"
        );
        if let Err(store_err) =
            self.store
                .record_grant_failure(request_id, &err.to_string(), next_attempt_at)
        {
            warn!(id = request_id, error = %store_err, "Failed to record grant failure");
        }
        GrantOutcome::Deferred
    }
}
