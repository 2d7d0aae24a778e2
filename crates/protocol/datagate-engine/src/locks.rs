//! Per-tuple async locks.
//!
//! Approve, deny and confirm hold the tuple's lock across their
//! read-verify-write sequence. Entries are dropped from the table once no
//! task holds or waits on them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use datagate_types::RequestKey;

use crate::error::{EngineError, EngineResult};

type Slot = Arc<AsyncMutex<()>>;

/// Table of async mutexes keyed by request tuple.
#[derive(Debug, Default)]
pub(crate) struct KeyLocks {
    slots: Mutex<HashMap<RequestKey, Slot>>,
}

impl KeyLocks {
    /// Wait for exclusive access to `key`.
    pub(crate) async fn lock(&self, key: &RequestKey) -> EngineResult<KeyGuard<'_>> {
        let slot = {
            let mut slots = self
                .slots
                .lock()
                .map_err(|_| EngineError::internal("lock table poisoned"))?;
            Arc::clone(slots.entry(key.clone()).or_default())
        };

        let guard = slot.lock_owned().await;
        Ok(KeyGuard {
            locks: self,
            key: key.clone(),
            _guard: guard,
        })
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.lock().map(|s| s.len()).unwrap_or(0)
    }
}

/// Exclusive access to one tuple; released on drop.
pub(crate) struct KeyGuard<'a> {
    locks: &'a KeyLocks,
    key: RequestKey,
    _guard: OwnedMutexGuard<()>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        // Waiters clone the slot under the table lock, so a count of two
        // (table + this guard) means nobody else wants it.
        if let Ok(mut slots) = self.locks.slots.lock() {
            if slots
                .get(&self.key)
                .is_some_and(|slot| Arc::strong_count(slot) <= 2)
            {
                slots.remove(&self.key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn key(dataset: &str) -> RequestKey {
        RequestKey::parse("0x1", "0x2", dataset).unwrap()
    }

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = Arc::new(KeyLocks::default());
        let inside = Arc::new(AtomicU32::new(0));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let locks = Arc::clone(&locks);
            let inside = Arc::clone(&inside);
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock(&key("d")).await.unwrap();
                assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                tokio::time::sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyLocks::default();
        let _a = locks.lock(&key("a")).await.unwrap();
        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock(&key("b"))).await;
        assert!(b.is_ok());
    }
}
