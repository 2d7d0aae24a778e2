//! The `AccessRequestEngine` struct.
//!
//! Operations are implemented across the sibling modules:
//! [`requests`](crate::requests), [`payment`](crate::payment),
//! [`access`](crate::access) and [`grants`](crate::grants).

use std::sync::Arc;

use datagate_ledger::{BoundedLedger, LedgerGateway};
use datagate_store::EscrowStore;
use datagate_types::{AccessRequest, RequestKey};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::locks::KeyLocks;

/// Reconciles escrow records with the ledger.
///
/// The engine is `Send + Sync` and meant to be shared through an `Arc` by
/// concurrent request handlers. It holds no mutable state of its own beyond
/// the per-tuple lock table; everything durable lives in the
/// [`EscrowStore`], and everything authoritative for access lives on the
/// ledger behind the [`LedgerGateway`].
pub struct AccessRequestEngine {
    pub(crate) store: Arc<dyn EscrowStore>,
    pub(crate) ledger: BoundedLedger,
    pub(crate) config: EngineConfig,
    pub(crate) locks: KeyLocks,
}

impl AccessRequestEngine {
    /// Create an engine over a store and a ledger gateway.
    pub fn new(
        store: Arc<dyn EscrowStore>,
        gateway: Arc<dyn LedgerGateway>,
        config: EngineConfig,
    ) -> Self {
        let ledger = BoundedLedger::new(gateway, &config.ledger);
        Self {
            store,
            ledger,
            config,
            locks: KeyLocks::default(),
        }
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The escrow store.
    pub fn store(&self) -> &Arc<dyn EscrowStore> {
        &self.store
    }

    /// The latest record for a tuple, or `NotFound`.
    pub(crate) fn latest_or_not_found(&self, key: &RequestKey) -> EngineResult<AccessRequest> {
        self.store
            .latest_request(key)?
            .ok_or_else(|| EngineError::not_found(format!("no access request for {}", key)))
    }
}

impl std::fmt::Debug for AccessRequestEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessRequestEngine")
            .field("ledger", &self.ledger)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
