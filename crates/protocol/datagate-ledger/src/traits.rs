//! Ledger gateway trait definition.

use async_trait::async_trait;
use datagate_types::{AccessGrant, Address, DatasetId, DatasetInfo, LedgerTransaction, TxHash};

use crate::error::LedgerResult;
use crate::nonce::GrantSubmission;

/// Port to the public ledger.
///
/// Queries are idempotent. Submissions are at-least-once: callers may
/// resubmit the same [`GrantSubmission`] and implementations must use its
/// nonce to avoid recording a duplicate grant, returning the transaction
/// hash of the original instead.
///
/// Implementations:
/// - a network client for the production chain (outside this workspace)
/// - `MockLedger` in `datagate-test-utils` for tests
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Look up a dataset listing.
    ///
    /// Returns `None` if the owner has no dataset with this id.
    async fn get_dataset(
        &self,
        owner: &Address,
        dataset: &DatasetId,
    ) -> LedgerResult<Option<DatasetInfo>>;

    /// Look up the on-chain grant for a tuple.
    ///
    /// Returns `None` if no grant was ever recorded.
    async fn get_access_grant(
        &self,
        owner: &Address,
        requester: &Address,
        dataset: &DatasetId,
    ) -> LedgerResult<Option<AccessGrant>>;

    /// Look up a transaction by hash.
    ///
    /// Returns `None` if the ledger does not know the transaction.
    async fn get_transaction(&self, tx_hash: &TxHash) -> LedgerResult<Option<LedgerTransaction>>;

    /// Submit an access-grant transaction and return its hash.
    ///
    /// Fails with a retryable error on transient network or ledger
    /// faults, and with `Rejected` when the ledger refuses it outright.
    async fn submit_grant_access(&self, submission: &GrantSubmission) -> LedgerResult<TxHash>;
}
