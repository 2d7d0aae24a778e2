//! Read-only views of on-chain state.
//!
//! The engine never mutates these; they are what the ledger reports.

use serde::{Deserialize, Serialize};

use crate::ids::{Address, Amount, DatasetId, Timestamp, TxHash};
use crate::request::RequestStatus;

/// A dataset listing as recorded on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatasetInfo {
    /// Owner of the dataset
    pub owner: Address,
    /// Dataset identifier
    pub dataset: DatasetId,
    /// Hash of the stored content
    pub content_hash: String,
    /// Free-form metadata
    #[serde(default)]
    pub metadata: String,
    /// Access price in the ledger-native fractional unit
    pub price: Amount,
    /// Whether the listing is active
    pub active: bool,
}

/// An on-chain access grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AccessGrant {
    /// Dataset owner
    pub owner: Address,
    /// Grantee
    pub requester: Address,
    /// Dataset
    pub dataset: DatasetId,
    /// Whether the grant has not been revoked
    pub active: bool,
    /// Expiry (ms since epoch)
    pub expires_at: Timestamp,
}

impl AccessGrant {
    /// Active and not yet expired at `now`.
    pub fn is_effective(&self, now: Timestamp) -> bool {
        self.active && self.expires_at > now
    }
}

/// A transaction as reported by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LedgerTransaction {
    /// Transaction hash
    pub hash: TxHash,
    /// Whether execution succeeded
    pub succeeded: bool,
    /// Sender
    pub from: Address,
    /// Recipient
    pub to: Address,
    /// Amount transferred
    pub amount: Amount,
    /// Dataset reference attached to the transfer, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_ref: Option<DatasetId>,
}

/// Result of an access check combining ledger and escrow state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AccessDecision {
    /// True only when the ledger reports an effective grant
    pub has_access: bool,
    /// Grant expiry when access is granted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
    /// Status of the latest escrow record, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escrow_status: Option<RequestStatus>,
}

impl AccessDecision {
    /// Access backed by an on-chain grant.
    pub fn granted(expires_at: Timestamp, escrow_status: Option<RequestStatus>) -> Self {
        Self {
            has_access: true,
            expires_at: Some(expires_at),
            escrow_status,
        }
    }

    /// No effective grant; escrow status is informational only.
    pub fn denied(escrow_status: Option<RequestStatus>) -> Self {
        Self {
            has_access: false,
            expires_at: None,
            escrow_status,
        }
    }
}
