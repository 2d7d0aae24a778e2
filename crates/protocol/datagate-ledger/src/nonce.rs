//! Deterministic submission nonces for grant transactions.
//!
//! A grant may be submitted more than once (retries after transient
//! failures, a crash between persisting payment and hearing back from the
//! ledger). Every submission for the same paid request carries the same
//! nonce, so the ledger can recognise a repeat and return the original
//! grant instead of recording a second one.
//!
//! ```text
//! GrantNonce = H(0x47 || lp(owner) || lp(requester) || lp(dataset) || lp(payment_tx) || lp("paid"))
//! lp(x) = len(x) as u32be || x
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use datagate_types::{Address, DatasetId, RequestKey, RequestStatus, Timestamp, TxHash};

/// Domain separator for grant nonces.
const DOMAIN_GRANT: u8 = 0x47;

/// A hex-encoded SHA-256 submission nonce.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrantNonce(String);

impl GrantNonce {
    /// Derive the nonce for granting access after `payment_tx` paid for `key`.
    pub fn derive(key: &RequestKey, payment_tx: &TxHash) -> Self {
        let mut hasher = Sha256::new();
        hasher.update([DOMAIN_GRANT]);
        for part in [
            key.owner.as_str(),
            key.requester.as_str(),
            key.dataset.as_str(),
            payment_tx.as_str(),
            RequestStatus::Paid.as_str(),
        ] {
            hasher.update((part.len() as u32).to_be_bytes());
            hasher.update(part.as_bytes());
        }
        let digest: [u8; 32] = hasher.finalize().into();
        Self(hex::encode(digest))
    }

    /// Wrap a previously derived nonce (e.g. loaded from storage).
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GrantNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A request to record an access grant on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantSubmission {
    /// Dataset owner (grantor)
    pub owner: Address,
    /// Grantee
    pub requester: Address,
    /// Dataset
    pub dataset: DatasetId,
    /// Grant expiry (ms since epoch)
    pub expires_at: Timestamp,
    /// Idempotency nonce
    pub nonce: GrantNonce,
}

impl GrantSubmission {
    /// Build a submission for a paid request.
    pub fn new(key: &RequestKey, expires_at: Timestamp, nonce: GrantNonce) -> Self {
        Self {
            owner: key.owner.clone(),
            requester: key.requester.clone(),
            dataset: key.dataset.clone(),
            expires_at,
            nonce,
        }
    }

    /// The tuple this grant is for.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(
            self.owner.clone(),
            self.requester.clone(),
            self.dataset.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(dataset: &str) -> RequestKey {
        RequestKey::parse("0xa", "0xb", dataset).unwrap()
    }

    #[test]
    fn test_nonce_deterministic() {
        let tx = TxHash::parse("0xabc").unwrap();
        assert_eq!(GrantNonce::derive(&key("d"), &tx), GrantNonce::derive(&key("d"), &tx));
        assert_eq!(GrantNonce::derive(&key("d"), &tx).as_str().len(), 64);
    }

    #[test]
    fn test_nonce_depends_on_every_part() {
        let tx = TxHash::parse("0xabc").unwrap();
        let other_tx = TxHash::parse("0xabd").unwrap();
        let base = GrantNonce::derive(&key("d"), &tx);
        assert_ne!(base, GrantNonce::derive(&key("e"), &tx));
        assert_ne!(base, GrantNonce::derive(&key("d"), &other_tx));
        let swapped = RequestKey::parse("0xb", "0xa", "d").unwrap();
        assert_ne!(base, GrantNonce::derive(&swapped, &tx));
    }
}
