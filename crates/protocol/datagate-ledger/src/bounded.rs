//! Bounded, retrying access to a [`LedgerGateway`].
//!
//! Every attempt is capped by the configured per-call timeout or the
//! caller's [`Deadline`], whichever comes first. Transient failures are
//! retried with [`Backoff`], but never by sleeping past the deadline.
//! Abandoning an attempt drops the in-flight future, which cancels the
//! underlying request.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, warn};

use datagate_types::{AccessGrant, Address, DatasetId, DatasetInfo, LedgerTransaction, TxHash};

use crate::backoff::Backoff;
use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::nonce::GrantSubmission;
use crate::traits::LedgerGateway;

/// A caller-supplied point in time after which an operation is abandoned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// No deadline; only the per-call bound applies.
    pub fn none() -> Self {
        Self(None)
    }

    /// A deadline `duration` from now.
    pub fn after(duration: Duration) -> Self {
        Self(Some(Instant::now() + duration))
    }

    /// A deadline at a fixed instant.
    pub fn at(instant: Instant) -> Self {
        Self(Some(instant))
    }

    /// The deadline instant, if any.
    pub fn instant(&self) -> Option<Instant> {
        self.0
    }

    /// Whether the deadline has already passed.
    pub fn is_expired(&self) -> bool {
        self.0.is_some_and(|at| Instant::now() >= at)
    }
}

/// A ledger gateway wrapped with timeouts and retries.
#[derive(Clone)]
pub struct BoundedLedger {
    gateway: Arc<dyn LedgerGateway>,
    backoff: Backoff,
    max_attempts: u32,
    call_timeout: Duration,
}

impl BoundedLedger {
    /// Wrap a gateway using the given configuration.
    pub fn new(gateway: Arc<dyn LedgerGateway>, config: &LedgerConfig) -> Self {
        Self {
            gateway,
            backoff: Backoff::from_config(&config.retry),
            max_attempts: config.retry.max_attempts.max(1),
            call_timeout: config.call_timeout,
        }
    }

    /// The underlying gateway.
    pub fn gateway(&self) -> &Arc<dyn LedgerGateway> {
        &self.gateway
    }

    /// Look up a dataset listing.
    pub async fn get_dataset(
        &self,
        owner: &Address,
        dataset: &DatasetId,
        deadline: Deadline,
    ) -> LedgerResult<Option<DatasetInfo>> {
        let gateway = self.gateway.as_ref();
        self.call("get_dataset", deadline, move || {
            gateway.get_dataset(owner, dataset)
        })
        .await
    }

    /// Look up the on-chain grant for a tuple.
    pub async fn get_access_grant(
        &self,
        owner: &Address,
        requester: &Address,
        dataset: &DatasetId,
        deadline: Deadline,
    ) -> LedgerResult<Option<AccessGrant>> {
        let gateway = self.gateway.as_ref();
        self.call("get_access_grant", deadline, move || {
            gateway.get_access_grant(owner, requester, dataset)
        })
        .await
    }

    /// Look up a transaction by hash.
    pub async fn get_transaction(
        &self,
        tx_hash: &TxHash,
        deadline: Deadline,
    ) -> LedgerResult<Option<LedgerTransaction>> {
        let gateway = self.gateway.as_ref();
        self.call("get_transaction", deadline, move || {
            gateway.get_transaction(tx_hash)
        })
        .await
    }

    /// Submit a grant. Retries reuse the submission's nonce.
    pub async fn submit_grant_access(
        &self,
        submission: &GrantSubmission,
        deadline: Deadline,
    ) -> LedgerResult<TxHash> {
        let gateway = self.gateway.as_ref();
        self.call("submit_grant_access", deadline, move || {
            gateway.submit_grant_access(submission)
        })
        .await
    }

    async fn call<F, Fut, T>(&self, op: &'static str, deadline: Deadline, mut f: F) -> LedgerResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = LedgerResult<T>>,
    {
        let mut attempt = 0;
        loop {
            if deadline.is_expired() {
                return Err(LedgerError::DeadlineExceeded);
            }
            attempt += 1;

            let call_end = Instant::now() + self.call_timeout;
            let (end, capped_by_deadline) = match deadline.instant() {
                Some(at) if at < call_end => (at, true),
                _ => (call_end, false),
            };

            let err = match timeout_at(end, f()).await {
                Ok(Ok(value)) => {
                    if attempt > 1 {
                        debug!(op, attempt, "Ledger call succeeded after retry");
                    }
                    return Ok(value);
                }
                Ok(Err(e)) => e,
                Err(_) if capped_by_deadline => {
                    warn!(op, attempt, "Caller deadline elapsed during ledger call");
                    return Err(LedgerError::DeadlineExceeded);
                }
                Err(_) => LedgerError::timeout(format!("{} exceeded {:?}", op, self.call_timeout)),
            };

            if !err.is_retryable() || attempt >= self.max_attempts {
                return Err(err);
            }

            let delay = self.backoff.delay(attempt);
            if deadline
                .instant()
                .is_some_and(|at| Instant::now() + delay >= at)
            {
                debug!(op, attempt, ?delay, error = %err, "Backoff would outlast caller deadline");
                return Err(err);
            }

            warn!(
                op,
                attempt,
                max_attempts = self.max_attempts,
                ?delay,
                error = %err,
                "Retryable ledger error, backing off"
            );
            sleep(delay).await;
        }
    }
}

impl std::fmt::Debug for BoundedLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedLedger")
            .field("backoff", &self.backoff)
            .field("max_attempts", &self.max_attempts)
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}
