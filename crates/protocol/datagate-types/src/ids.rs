//! Identifier types.
//!
//! Addresses and transaction hashes are `0x`-prefixed hex strings, stored
//! lowercased so that equality and database lookups are case-insensitive.
//! Dataset identifiers are opaque short strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_DATASET_ID_LENGTH, MAX_HEX_ID_DIGITS};
use crate::error::TypesError;

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// Amount in the ledger-native fractional unit.
pub type Amount = u64;

/// Get the current timestamp in milliseconds.
pub fn current_timestamp() -> Timestamp {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as Timestamp)
        .unwrap_or(0)
}

fn parse_hex_id(kind: &'static str, input: &str) -> Result<String, TypesError> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| TypesError::invalid(kind, format!("missing 0x prefix: {:?}", input)))?;

    if digits.is_empty() {
        return Err(TypesError::invalid(kind, "no hex digits after 0x"));
    }
    if digits.len() > MAX_HEX_ID_DIGITS {
        return Err(TypesError::invalid(
            kind,
            format!("{} hex digits exceeds {}", digits.len(), MAX_HEX_ID_DIGITS),
        ));
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(TypesError::invalid(kind, format!("not hex: {:?}", input)));
    }

    Ok(format!("0x{}", digits.to_ascii_lowercase()))
}

/// A ledger account address (e.g. `0x1a2b`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse and normalize an address.
    pub fn parse(input: &str) -> Result<Self, TypesError> {
        parse_hex_id("address", input).map(Self)
    }

    /// The normalized string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A ledger transaction hash (e.g. `0xabc`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxHash(String);

impl TxHash {
    /// Parse and normalize a transaction hash.
    pub fn parse(input: &str) -> Result<Self, TypesError> {
        parse_hex_id("transaction hash", input).map(Self)
    }

    /// The normalized string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier of a dataset listed on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatasetId(String);

impl DatasetId {
    /// Validate a dataset identifier.
    pub fn parse(input: &str) -> Result<Self, TypesError> {
        if input.is_empty() {
            return Err(TypesError::invalid("dataset id", "empty"));
        }
        if input.chars().count() > MAX_DATASET_ID_LENGTH {
            return Err(TypesError::invalid(
                "dataset id",
                format!("longer than {} characters", MAX_DATASET_ID_LENGTH),
            ));
        }
        if input.chars().any(char::is_control) {
            return Err(TypesError::invalid("dataset id", "contains control characters"));
        }
        Ok(Self(input.to_string()))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! string_id_impls {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $ty {
            type Err = TypesError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = TypesError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id_impls!(Address);
string_id_impls!(TxHash);
string_id_impls!(DatasetId);

/// The natural key of an access request lineage: (owner, requester, dataset).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RequestKey {
    /// Dataset owner
    pub owner: Address,
    /// Party asking for access
    pub requester: Address,
    /// Dataset being requested
    pub dataset: DatasetId,
}

impl RequestKey {
    /// Create a new request key.
    pub fn new(owner: Address, requester: Address, dataset: DatasetId) -> Self {
        Self {
            owner,
            requester,
            dataset,
        }
    }

    /// Parse all three components from strings.
    pub fn parse(owner: &str, requester: &str, dataset: &str) -> Result<Self, TypesError> {
        Ok(Self::new(
            Address::parse(owner)?,
            Address::parse(requester)?,
            DatasetId::parse(dataset)?,
        ))
    }

    /// Whether the owner and requester are the same account.
    pub fn is_self_request(&self) -> bool {
        self.owner == self.requester
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.owner, self.requester, self.dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_normalized() {
        let a = Address::parse("0xABCdef").unwrap();
        assert_eq!(a.as_str(), "0xabcdef");
        assert_eq!(a, Address::parse("0xabcdef").unwrap());
    }

    #[test]
    fn test_address_rejects_malformed() {
        assert!(Address::parse("abc").is_err());
        assert!(Address::parse("0x").is_err());
        assert!(Address::parse("0xzz").is_err());
        assert!(Address::parse(&format!("0x{}", "a".repeat(65))).is_err());
        assert!(Address::parse(&format!("0x{}", "a".repeat(64))).is_ok());
    }

    #[test]
    fn test_tx_hash_short_form_accepted() {
        let tx = TxHash::parse("0xabc").unwrap();
        assert_eq!(tx.to_string(), "0xabc");
    }

    #[test]
    fn test_dataset_id_rules() {
        assert!(DatasetId::parse("weather-2024").is_ok());
        assert!(DatasetId::parse("").is_err());
        assert!(DatasetId::parse("bad\u{0007}id").is_err());
        assert!(DatasetId::parse(&"d".repeat(MAX_DATASET_ID_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_serde_validates() {
        let ok: Address = serde_json::from_str("\"0xAA\"").unwrap();
        assert_eq!(ok.as_str(), "0xaa");
        let bad: Result<Address, _> = serde_json::from_str("\"nope\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_request_key_self_request() {
        let key = RequestKey::parse("0x1", "0x1", "d").unwrap();
        assert!(key.is_self_request());
        let key = RequestKey::parse("0x1", "0x2", "d").unwrap();
        assert!(!key.is_self_request());
        assert_eq!(key.to_string(), "0x1/0x2/d");
    }
}
