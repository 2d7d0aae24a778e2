//! Access queries.
//!
//! The ledger decides access. The escrow record only explains why access
//! is missing ("payment pending", "denied", "no request").

use tracing::debug;

use datagate_ledger::Deadline;
use datagate_types::{current_timestamp, AccessDecision, RequestKey};

use crate::engine::AccessRequestEngine;
use crate::error::EngineResult;

impl AccessRequestEngine {
    /// Whether the requester currently holds an effective grant.
    ///
    /// `has_access` is true only when the ledger reports an active,
    /// unexpired grant, whatever the escrow record says.
    pub async fn check_access(
        &self,
        key: &RequestKey,
        deadline: Deadline,
    ) -> EngineResult<AccessDecision> {
        let grant = self
            .ledger
            .get_access_grant(&key.owner, &key.requester, &key.dataset, deadline)
            .await?;
        let escrow_status = self.store.latest_request(key)?.map(|r| r.status);

        let decision = match grant {
            Some(grant) if grant.is_effective(current_timestamp()) => {
                AccessDecision::granted(grant.expires_at, escrow_status)
            }
            _ => AccessDecision::denied(escrow_status),
        };

        debug!(
            owner = %key.owner,
            requester = %key.requester,
            dataset = %key.dataset,
            has_access = decision.has_access,
            "Access checked"
        );
        Ok(decision)
    }
}
