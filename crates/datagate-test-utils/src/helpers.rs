//! Helper functions for creating test fixtures.
//!
//! Provides well-known addresses, request keys, and engines wired to an
//! in-memory escrow store and a [`MockLedger`].

use std::sync::Arc;
use std::time::Duration;

use datagate_engine::{AccessRequestEngine, EngineConfig, GrantRetryConfig};
use datagate_ledger::{LedgerConfig, RetryConfig};
use datagate_store::SqliteEscrowStore;
use datagate_types::{Address, Amount, DatasetId, RequestKey, TxHash};

use crate::MockLedger;

/// Owner address used across tests.
pub const OWNER: &str = "0xa11ce";
/// Requester address used across tests.
pub const REQUESTER: &str = "0xb0b";
/// A third party.
pub const STRANGER: &str = "0xc4a5e";
/// Default dataset id.
pub const DATASET: &str = "weather-2024";
/// Default dataset price.
pub const PRICE: Amount = 1_000;

/// Parse an address, panicking on bad input.
pub fn address(s: &str) -> Address {
    Address::parse(s).unwrap()
}

/// The default tuple: `OWNER / REQUESTER / DATASET`.
pub fn test_key() -> RequestKey {
    RequestKey::parse(OWNER, REQUESTER, DATASET).unwrap()
}

/// A tuple for another dataset of the same owner and requester.
pub fn key_for(dataset: &str) -> RequestKey {
    RequestKey::parse(OWNER, REQUESTER, dataset).unwrap()
}

/// Engine configuration with short timeouts and near-zero backoff.
///
/// Failed grants are due again immediately, so a test can drain the queue
/// without waiting.
pub fn fast_config() -> EngineConfig {
    EngineConfig::default()
        .with_ledger(
            LedgerConfig::default()
                .with_call_timeout(Duration::from_millis(200))
                .with_retry(RetryConfig {
                    max_attempts: 2,
                    base_delay: Duration::from_millis(1),
                    max_delay: Duration::from_millis(5),
                }),
        )
        .with_grant_retry(GrantRetryConfig::default().with_backoff(Duration::ZERO, Duration::ZERO))
}

/// A ledger listing `DATASET` of `OWNER` at `PRICE`.
pub fn listed_ledger() -> MockLedger {
    MockLedger::new().with_dataset(
        &address(OWNER),
        &DatasetId::parse(DATASET).unwrap(),
        PRICE,
    )
}

/// An engine over an in-memory store and the given ledger.
pub fn test_engine(ledger: &MockLedger) -> AccessRequestEngine {
    test_engine_with_config(ledger, fast_config())
}

/// An engine over an in-memory store, the given ledger and configuration.
pub fn test_engine_with_config(ledger: &MockLedger, config: EngineConfig) -> AccessRequestEngine {
    let store = SqliteEscrowStore::open_in_memory().unwrap();
    AccessRequestEngine::new(Arc::new(store), Arc::new(ledger.clone()), config)
}

/// Record a transfer paying for `key` in full.
pub fn pay_for(ledger: &MockLedger, key: &RequestKey, hash: &str) -> TxHash {
    ledger.add_transfer(hash, &key.requester, &key.owner, PRICE)
}
