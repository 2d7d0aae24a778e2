//! Mock implementation of the `LedgerGateway` trait for testing.
//!
//! Holds datasets, transactions and grants in memory, deduplicates grant
//! submissions by nonce the way a real ledger contract would, and can be
//! told to fail, reject or stall.

use async_trait::async_trait;
use datagate_ledger::{GrantSubmission, LedgerError, LedgerGateway, LedgerResult};
use datagate_types::{
    AccessGrant, Address, Amount, DatasetId, DatasetInfo, LedgerTransaction, RequestKey,
    Timestamp, TxHash,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// Grant transaction hashes are numbered from here.
const GRANT_TX_BASE: u64 = 0x6a00_0000;

#[derive(Default)]
struct MockLedgerInner {
    /// Listings: (owner, dataset) -> info.
    datasets: HashMap<(Address, DatasetId), DatasetInfo>,
    /// Transactions by hash.
    transactions: HashMap<TxHash, LedgerTransaction>,
    /// Current grant per tuple.
    grants: HashMap<RequestKey, AccessGrant>,
    /// Nonce -> grant tx that recorded it.
    grants_by_nonce: HashMap<String, TxHash>,
    /// Every submission received, including duplicates and failures.
    submissions: Vec<GrantSubmission>,
    /// Submissions that created a new grant.
    recorded_grants: u32,
    /// Number of upcoming submissions to fail.
    failing_submissions: u32,
    /// Datasets whose grant submissions are rejected outright.
    rejected_datasets: HashSet<DatasetId>,
    /// When true, every read returns a network error.
    fail_reads: bool,
    /// When true, every read hangs until cancelled.
    hang_reads: bool,
    dataset_queries: u32,
    transaction_queries: u32,
    grant_queries: u32,
    tx_counter: u64,
}

/// A mock implementation of the `LedgerGateway` trait for testing.
///
/// Uses `Arc<RwLock<...>>` internally, so it is cheap to clone and all
/// clones share the same state.
#[derive(Clone, Default)]
pub struct MockLedger {
    inner: Arc<RwLock<MockLedgerInner>>,
}

impl MockLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// List an active dataset.
    pub fn with_dataset(self, owner: &Address, dataset: &DatasetId, price: Amount) -> Self {
        self.set_dataset(DatasetInfo {
            owner: owner.clone(),
            dataset: dataset.clone(),
            content_hash: format!("sha256:{}", dataset),
            metadata: String::new(),
            price,
            active: true,
        });
        self
    }

    /// Insert or replace a dataset listing.
    pub fn set_dataset(&self, info: DatasetInfo) {
        self.inner
            .write()
            .unwrap()
            .datasets
            .insert((info.owner.clone(), info.dataset.clone()), info);
    }

    /// Record a transaction.
    pub fn add_transaction(&self, tx: LedgerTransaction) {
        self.inner
            .write()
            .unwrap()
            .transactions
            .insert(tx.hash.clone(), tx);
    }

    /// Record a successful transfer and return its hash.
    pub fn add_transfer(
        &self,
        hash: &str,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> TxHash {
        let hash = TxHash::parse(hash).unwrap();
        self.add_transaction(LedgerTransaction {
            hash: hash.clone(),
            succeeded: true,
            from: from.clone(),
            to: to.clone(),
            amount,
            dataset_ref: None,
        });
        hash
    }

    /// Set the grant for a tuple directly.
    pub fn set_grant(&self, key: &RequestKey, active: bool, expires_at: Timestamp) {
        self.inner.write().unwrap().grants.insert(
            key.clone(),
            AccessGrant {
                owner: key.owner.clone(),
                requester: key.requester.clone(),
                dataset: key.dataset.clone(),
                active,
                expires_at,
            },
        );
    }

    /// Fail the next `count` grant submissions with `SubmissionFailed`.
    pub fn fail_next_submissions(&self, count: u32) {
        self.inner.write().unwrap().failing_submissions = count;
    }

    /// Reject every grant submission for `dataset` with `Rejected`.
    pub fn reject_grants_for(&self, dataset: &DatasetId) {
        self.inner
            .write()
            .unwrap()
            .rejected_datasets
            .insert(dataset.clone());
    }

    /// Make every read fail with a network error.
    pub fn set_fail_reads(&self, fail: bool) {
        self.inner.write().unwrap().fail_reads = fail;
    }

    /// Make every read hang until the caller gives up.
    pub fn set_hang_reads(&self, hang: bool) {
        self.inner.write().unwrap().hang_reads = hang;
    }

    // =========================================================================
    // Assertion Helpers
    // =========================================================================

    /// All grant submissions received, in order.
    pub fn submissions(&self) -> Vec<GrantSubmission> {
        self.inner.read().unwrap().submissions.clone()
    }

    /// Number of submissions that created a new grant.
    pub fn recorded_grant_count(&self) -> u32 {
        self.inner.read().unwrap().recorded_grants
    }

    /// The current grant for a tuple.
    pub fn grant(&self, key: &RequestKey) -> Option<AccessGrant> {
        self.inner.read().unwrap().grants.get(key).cloned()
    }

    /// Number of `get_transaction` calls.
    pub fn transaction_queries(&self) -> u32 {
        self.inner.read().unwrap().transaction_queries
    }

    /// Number of `get_dataset` calls.
    pub fn dataset_queries(&self) -> u32 {
        self.inner.read().unwrap().dataset_queries
    }

    /// Number of `get_access_grant` calls.
    pub fn grant_queries(&self) -> u32 {
        self.inner.read().unwrap().grant_queries
    }

    /// Common prelude for reads: fail or stall if configured to.
    async fn read_gate(&self) -> LedgerResult<()> {
        let (fail, hang) = {
            let inner = self.inner.read().unwrap();
            (inner.fail_reads, inner.hang_reads)
        };
        if hang {
            std::future::pending::<()>().await;
        }
        if fail {
            return Err(LedgerError::network("mock ledger unreachable"));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerGateway for MockLedger {
    async fn get_dataset(
        &self,
        owner: &Address,
        dataset: &DatasetId,
    ) -> LedgerResult<Option<DatasetInfo>> {
        self.inner.write().unwrap().dataset_queries += 1;
        self.read_gate().await?;
        Ok(self
            .inner
            .read()
            .unwrap()
            .datasets
            .get(&(owner.clone(), dataset.clone()))
            .cloned())
    }

    async fn get_access_grant(
        &self,
        owner: &Address,
        requester: &Address,
        dataset: &DatasetId,
    ) -> LedgerResult<Option<AccessGrant>> {
        self.inner.write().unwrap().grant_queries += 1;
        self.read_gate().await?;
        let key = RequestKey::new(owner.clone(), requester.clone(), dataset.clone());
        Ok(self.inner.read().unwrap().grants.get(&key).cloned())
    }

    async fn get_transaction(&self, tx_hash: &TxHash) -> LedgerResult<Option<LedgerTransaction>> {
        self.inner.write().unwrap().transaction_queries += 1;
        self.read_gate().await?;
        Ok(self
            .inner
            .read()
            .unwrap()
            .transactions
            .get(tx_hash)
            .cloned())
    }

    async fn submit_grant_access(&self, submission: &GrantSubmission) -> LedgerResult<TxHash> {
        let mut inner = self.inner.write().unwrap();
        inner.submissions.push(submission.clone());

        if inner.failing_submissions > 0 {
            inner.failing_submissions -= 1;
            return Err(LedgerError::submission_failed("mock ledger busy"));
        }

        if inner.rejected_datasets.contains(&submission.dataset) {
            return Err(LedgerError::rejected(format!(
                "dataset {} is not grantable",
                submission.dataset
            )));
        }

        if let Some(existing) = inner.grants_by_nonce.get(submission.nonce.as_str()) {
            return Ok(existing.clone());
        }

        inner.tx_counter += 1;
        let grant_tx = TxHash::parse(&format!("0x{:x}", GRANT_TX_BASE + inner.tx_counter))
            .map_err(|e| LedgerError::internal(e.to_string()))?;
        let key = submission.key();
        inner.grants.insert(
            key,
            AccessGrant {
                owner: submission.owner.clone(),
                requester: submission.requester.clone(),
                dataset: submission.dataset.clone(),
                active: true,
                expires_at: submission.expires_at,
            },
        );
        inner
            .grants_by_nonce
            .insert(submission.nonce.as_str().to_string(), grant_tx.clone());
        inner.recorded_grants += 1;
        Ok(grant_tx)
    }
}
