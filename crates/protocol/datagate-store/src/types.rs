//! Types used by the storage layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use datagate_types::{
    AccessRequest, Amount, RequestKey, Timestamp, TxHash, TypesError, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};

/// A request about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccessRequest {
    /// The tuple
    pub key: RequestKey,
    /// Optional message (already normalized)
    pub message: Option<String>,
    /// Price copied from the dataset listing
    pub price: Amount,
    /// Creation time
    pub created_at: Timestamp,
}

/// A grant owed for a paid request, written alongside the paid transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGrantObligation {
    /// Grant expiry to submit
    pub expires_at: Timestamp,
    /// Deterministic submission nonce
    pub nonce: String,
    /// When the obligation was recorded
    pub created_at: Timestamp,
}

/// A stored grant obligation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GrantObligation {
    /// The paid request
    pub request_id: i64,
    /// The tuple to grant
    pub key: RequestKey,
    /// The payment that created the obligation
    pub payment_tx: TxHash,
    /// Grant expiry to submit
    pub expires_at: Timestamp,
    /// Deterministic submission nonce
    pub nonce: String,
    /// Failed submission attempts so far
    pub attempts: u32,
    /// Most recent submission error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// When the obligation was recorded
    pub created_at: Timestamp,
    /// When the ledger accepted the grant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    /// Grant transaction hash, once accepted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant_tx: Option<TxHash>,
    /// Earliest time the retry worker may resubmit
    #[serde(default)]
    pub next_attempt_at: Timestamp,
    /// When the ledger rejected the grant outright
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<Timestamp>,
}

impl GrantObligation {
    /// Whether the ledger has accepted the grant.
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Whether the ledger rejected the grant and retries have stopped.
    pub fn is_failed(&self) -> bool {
        self.failed_at.is_some()
    }

    /// Neither completed nor failed.
    pub fn is_open(&self) -> bool {
        !self.is_completed() && !self.is_failed()
    }
}

/// Position in a listing ordered by `(created_at DESC, id DESC)`.
///
/// Renders as `"<created_at>:<id>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageCursor {
    /// `created_at` of the last record on the previous page
    pub created_at: Timestamp,
    /// `id` of the last record on the previous page
    pub id: i64,
}

impl PageCursor {
    /// Cursor positioned after `request`.
    pub fn after(request: &AccessRequest) -> Self {
        Self {
            created_at: request.created_at.unwrap_or(0),
            id: request.id,
        }
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.created_at, self.id)
    }
}

impl FromStr for PageCursor {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (created_at, id) = s
            .split_once(':')
            .ok_or_else(|| TypesError::invalid("cursor", "expected <created_at>:<id>"))?;
        let created_at = created_at
            .parse()
            .map_err(|_| TypesError::invalid("cursor", "bad created_at"))?;
        let id = id
            .parse()
            .map_err(|_| TypesError::invalid("cursor", "bad id"))?;
        Ok(Self { created_at, id })
    }
}

impl Serialize for PageCursor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PageCursor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Pagination parameters for listing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Resume after this position (None = first page)
    pub cursor: Option<PageCursor>,
    /// Maximum records to return
    pub limit: u32,
}

impl PageRequest {
    /// First page with the given limit.
    pub fn first(limit: u32) -> Self {
        Self {
            cursor: None,
            limit,
        }
    }

    /// Continue from a cursor.
    pub fn after(cursor: PageCursor, limit: u32) -> Self {
        Self {
            cursor: Some(cursor),
            limit,
        }
    }

    /// The limit clamped to `[1, MAX_PAGE_SIZE]`.
    pub fn effective_limit(&self) -> u32 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

/// One page of access requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPage {
    /// Records, newest first
    pub requests: Vec<AccessRequest>,
    /// Cursor for the next page; None on the last page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<PageCursor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_string_form() {
        let cursor = PageCursor {
            created_at: 1700000000000,
            id: 42,
        };
        assert_eq!(cursor.to_string(), "1700000000000:42");
        assert_eq!("1700000000000:42".parse::<PageCursor>().unwrap(), cursor);
        assert!("42".parse::<PageCursor>().is_err());
        assert!("x:1".parse::<PageCursor>().is_err());
    }

    #[test]
    fn test_cursor_serde() {
        let cursor = PageCursor { created_at: 5, id: 6 };
        let json = serde_json::to_string(&cursor).unwrap();
        assert_eq!(json, "\"5:6\"");
        let back: PageCursor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cursor);
    }

    #[test]
    fn test_effective_limit() {
        assert_eq!(PageRequest::first(0).effective_limit(), 1);
        assert_eq!(PageRequest::first(10_000).effective_limit(), MAX_PAGE_SIZE);
        assert_eq!(PageRequest::default().effective_limit(), DEFAULT_PAGE_SIZE);
    }
}
