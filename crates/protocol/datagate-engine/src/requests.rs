//! Request lifecycle operations: create, approve, deny, read.

use tracing::{debug, info};

use datagate_ledger::Deadline;
use datagate_store::{NewAccessRequest, PageRequest, RequestPage};
use datagate_types::{
    current_timestamp, normalize_message, AccessRequest, Address, RequestKey, RequestStatus,
};

use crate::engine::AccessRequestEngine;
use crate::error::{EngineError, EngineResult};

/// Owner decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Approve,
    Deny,
}

impl Decision {
    fn target(self) -> RequestStatus {
        match self {
            Self::Approve => RequestStatus::Approved,
            Self::Deny => RequestStatus::Denied,
        }
    }
}

impl AccessRequestEngine {
    /// Create a `pending` request for a tuple.
    ///
    /// The dataset must be listed and active on the ledger; its current price
    /// is copied onto the record. Fails with `Conflict` while another request
    /// for the tuple is open.
    pub async fn create_request(
        &self,
        key: &RequestKey,
        message: Option<&str>,
        deadline: Deadline,
    ) -> EngineResult<AccessRequest> {
        if key.is_self_request() {
            return Err(EngineError::invalid_argument(
                "owner and requester must differ",
            ));
        }
        let message = normalize_message(message)?;

        // Cheap pre-check before the ledger round trip; the store's unique
        // index is what actually enforces this.
        if let Some(existing) = self.store.latest_request(key)? {
            if existing.is_open() {
                return Err(EngineError::conflict(format!(
                    "request {} for {} is still {}",
                    existing.id, key, existing.status
                )));
            }
        }

        let dataset = self
            .ledger
            .get_dataset(&key.owner, &key.dataset, deadline)
            .await?
            .filter(|info| info.active)
            .ok_or_else(|| {
                EngineError::not_found(format!(
                    "dataset {} of {} is not listed",
                    key.dataset, key.owner
                ))
            })?;

        let request = self.store.insert_request(&NewAccessRequest {
            key: key.clone(),
            message,
            price: dataset.price,
            created_at: current_timestamp(),
        })?;

        info!(
            id = request.id,
            owner = %key.owner,
            requester = %key.requester,
            dataset = %key.dataset,
            price = request.price,
            "Access request created"
        );
        Ok(request)
    }

    /// Approve the latest request for a tuple.
    ///
    /// Approving an already-approved request returns it unchanged.
    pub async fn approve_request(
        &self,
        caller: &Address,
        key: &RequestKey,
    ) -> EngineResult<AccessRequest> {
        self.decide(caller, key, Decision::Approve).await
    }

    /// Deny the latest request for a tuple.
    pub async fn deny_request(
        &self,
        caller: &Address,
        key: &RequestKey,
    ) -> EngineResult<AccessRequest> {
        self.decide(caller, key, Decision::Deny).await
    }

    async fn decide(
        &self,
        caller: &Address,
        key: &RequestKey,
        decision: Decision,
    ) -> EngineResult<AccessRequest> {
        let _guard = self.locks.lock(key).await?;
        let record = self.latest_or_not_found(key)?;

        if caller != &record.owner {
            return Err(EngineError::forbidden(format!(
                "{} does not own dataset {}",
                caller, record.dataset
            )));
        }

        let target = decision.target();
        if record.status == target && decision == Decision::Approve {
            debug!(id = record.id, "Request already approved");
            return Ok(record);
        }
        if !record.status.can_transition_to(target) {
            return Err(EngineError::invalid_state(format!(
                "request {} is {}, cannot become {}",
                record.id, record.status, target
            )));
        }

        let updated = match decision {
            Decision::Approve => {
                self.store
                    .mark_approved(record.id, record.version, current_timestamp())?
            }
            Decision::Deny => self.store.mark_denied(record.id, record.version)?,
        };

        info!(
            id = updated.id,
            owner = %key.owner,
            requester = %key.requester,
            dataset = %key.dataset,
            status = %updated.status,
            "Access request decided"
        );
        Ok(updated)
    }

    /// The latest request for a tuple.
    pub fn get_request(&self, key: &RequestKey) -> EngineResult<AccessRequest> {
        self.latest_or_not_found(key)
    }

    /// Requests for datasets owned by `owner`, newest first.
    pub fn list_for_owner(&self, owner: &Address, page: &PageRequest) -> EngineResult<RequestPage> {
        Ok(self.store.list_for_owner(owner, page)?)
    }

    /// Requests made by `requester`, newest first.
    pub fn list_for_requester(
        &self,
        requester: &Address,
        page: &PageRequest,
    ) -> EngineResult<RequestPage> {
        Ok(self.store.list_for_requester(requester, page)?)
    }
}
