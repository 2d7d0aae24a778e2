//! Grant retry worker.
//!
//! Drains grant obligations left behind by failed submissions. Each
//! resubmission reuses the obligation's stored nonce, so a grant the ledger
//! already recorded is returned rather than duplicated. Only obligations
//! whose backoff has elapsed are taken; ones the ledger rejects outright are
//! closed as failed and never picked up again.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use datagate_ledger::{Deadline, GrantNonce, GrantSubmission};
use datagate_types::current_timestamp;

use crate::engine::AccessRequestEngine;
use crate::error::EngineResult;

/// Result of a single grant submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GrantOutcome {
    /// Accepted by the ledger and recorded
    Submitted,
    /// Still owed; scheduled for a later attempt
    Deferred,
    /// Definitively rejected; the obligation is closed as failed
    Rejected,
}

/// Outcome of one drain of the obligation queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRetryReport {
    /// Obligations picked up
    pub attempted: u32,
    /// Accepted by the ledger
    pub submitted: u32,
    /// Still pending, rescheduled with backoff
    pub failed: u32,
    /// Rejected by the ledger and moved to the failed state
    #[serde(default)]
    pub rejected: u32,
}

impl AccessRequestEngine {
    /// Resubmit grant obligations that are due, earliest scheduled first.
    ///
    /// At most `grant_retry.batch_size` obligations are attempted per call.
    pub async fn retry_pending_grants(&self) -> EngineResult<GrantRetryReport> {
        let pending = self
            .store
            .due_grants(current_timestamp(), self.config.grant_retry.batch_size)?;
        let mut report = GrantRetryReport::default();

        for obligation in pending {
            report.attempted += 1;
            let submission = GrantSubmission::new(
                &obligation.key,
                obligation.expires_at,
                GrantNonce::from_stored(obligation.nonce.clone()),
            );

            let outcome = self
                .submit_grant(
                    obligation.request_id,
                    &submission,
                    obligation.attempts,
                    Deadline::none(),
                )
                .await;
            match outcome {
                GrantOutcome::Submitted => report.submitted += 1,
                GrantOutcome::Deferred => report.failed += 1,
                GrantOutcome::Rejected => report.rejected += 1,
            }
        }

        Ok(report)
    }
}

/// Spawn a task that calls [`AccessRequestEngine::retry_pending_grants`]
/// every `grant_retry.interval` until `shutdown` turns true or its sender
/// is dropped.
pub fn spawn_grant_retry_loop(
    engine: Arc<AccessRequestEngine>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = engine
            .config()
            .grant_retry
            .interval
            .max(Duration::from_millis(1));
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(?period, "Grant retry loop started");

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    match engine.retry_pending_grants().await {
                        Ok(report) if report.attempted > 0 => {
                            info!(
                                attempted = report.attempted,
                                submitted = report.submitted,
                                failed = report.failed,
                                rejected = report.rejected,
                                "Grant retry pass finished"
                            );
                        }
                        Ok(_) => {}
                        Err(e) => warn!(error = %e, "Grant retry pass failed"),
                    }
                }
            }
        }

        info!("Grant retry loop stopped");
    })
}
