//! Access request types.
//!
//! An [`AccessRequest`] is the off-chain escrow record tracking negotiation
//! between a dataset owner and a requester. Its status only ever moves
//! forward along one of two paths:
//!
//! ```text
//! pending --approve--> approved --confirm payment--> paid   [terminal]
//! pending --deny-----> denied                               [terminal]
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_MESSAGE_LENGTH;
use crate::error::TypesError;
use crate::ids::{Address, Amount, DatasetId, RequestKey, Timestamp, TxHash};

/// Status of an access request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Waiting for the owner's decision
    Pending,
    /// Owner approved; waiting for payment
    Approved,
    /// Owner denied (terminal)
    Denied,
    /// Payment verified on the ledger (terminal)
    Paid,
}

impl RequestStatus {
    /// The lowercase name used in storage and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Denied => "denied",
            Self::Paid => "paid",
        }
    }

    /// Open requests block a new request for the same tuple.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }

    /// No transition leaves a terminal status.
    pub fn is_terminal(&self) -> bool {
        !self.is_open()
    }

    /// Whether `self -> next` is one of the defined forward steps.
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved)
                | (Self::Pending, Self::Denied)
                | (Self::Approved, Self::Paid)
        )
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "denied" => Ok(Self::Denied),
            "paid" => Ok(Self::Paid),
            other => Err(TypesError::UnknownStatus(other.to_string())),
        }
    }
}

/// Normalize an optional request message.
///
/// Empty or whitespace-only messages become `None`. Messages longer than
/// [`MAX_MESSAGE_LENGTH`] characters or containing control characters other
/// than newline and tab are rejected.
pub fn normalize_message(message: Option<&str>) -> Result<Option<String>, TypesError> {
    let Some(message) = message else {
        return Ok(None);
    };
    if message.trim().is_empty() {
        return Ok(None);
    }
    if message.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(TypesError::invalid(
            "message",
            format!("longer than {} characters", MAX_MESSAGE_LENGTH),
        ));
    }
    if message
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\t')
    {
        return Err(TypesError::invalid("message", "contains control characters"));
    }
    Ok(Some(message.to_string()))
}

/// The off-chain escrow record for one access request instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AccessRequest {
    /// Store-assigned identifier of this request instance
    pub id: i64,
    /// Dataset owner
    pub owner: Address,
    /// Party asking for access
    pub requester: Address,
    /// Dataset being requested
    pub dataset: DatasetId,
    /// Current status
    pub status: RequestStatus,
    /// Optional human message from the requester
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Price in the ledger-native fractional unit
    pub price: Amount,
    /// Verified payment transaction (set on approved -> paid)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_tx: Option<TxHash>,
    /// On-chain grant transaction, once the ledger accepted it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant_tx: Option<TxHash>,
    /// When the request was created
    pub created_at: Option<Timestamp>,
    /// When the owner approved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<Timestamp>,
    /// When payment was confirmed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<Timestamp>,
    /// Optimistic-concurrency version, bumped on every write
    pub version: u64,
}

impl AccessRequest {
    /// The (owner, requester, dataset) tuple of this request.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(
            self.owner.clone(),
            self.requester.clone(),
            self.dataset.clone(),
        )
    }

    /// Whether this request blocks a new one for the same tuple.
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Whether this request was confirmed with the given payment.
    pub fn is_paid_with(&self, tx_hash: &TxHash) -> bool {
        self.status == RequestStatus::Paid && self.payment_tx.as_ref() == Some(tx_hash)
    }
}
