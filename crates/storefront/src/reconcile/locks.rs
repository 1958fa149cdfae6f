//! Per-product async locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use just_mart_core::ProductId;
use tokio::sync::{OwnedMutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Locks for one identity generation.
///
/// Keyed mutations hold the collection lock shared plus their product's lock;
/// whole-list operations hold the collection lock exclusively.
#[derive(Debug, Default)]
pub(crate) struct SessionLocks {
    collection: RwLock<()>,
    keys: KeyedLocks,
}

impl SessionLocks {
    pub(crate) async fn lock_key(&self, key: &ProductId) -> KeyGuard<'_> {
        let collection = self.collection.read().await;
        let key = self.keys.lock(key).await;
        KeyGuard {
            _key: key,
            _collection: collection,
        }
    }

    pub(crate) async fn lock_all(&self) -> RwLockWriteGuard<'_, ()> {
        self.collection.write().await
    }
}

/// Held for the whole of a keyed mutation.
pub(crate) struct KeyGuard<'a> {
    // Field order matters: the key lock is released before the collection lock
    _key: KeyLock<'a>,
    _collection: RwLockReadGuard<'a, ()>,
}

/// One async mutex per product, created on demand and dropped when idle.
#[derive(Debug, Default)]
pub(crate) struct KeyedLocks {
    slots: Mutex<HashMap<ProductId, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyedLocks {
    pub(crate) async fn lock(&self, key: &ProductId) -> KeyLock<'_> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            // Slots left behind by cancelled waiters
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            Arc::clone(slots.entry(key.clone()).or_default())
        };
        let guard = slot.lock_owned().await;
        KeyLock {
            locks: self,
            key: key.clone(),
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

pub(crate) struct KeyLock<'a> {
    locks: &'a KeyedLocks,
    key: ProductId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyLock<'_> {
    fn drop(&mut self) {
        let mut slots = self
            .locks
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        drop(self.guard.take());
        // Waiters hold a clone of the slot, so a count of one means idle
        if slots
            .get(&self.key)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            slots.remove(&self.key);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn id(s: &str) -> ProductId {
        ProductId::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = Arc::new(KeyedLocks::default());
        let first = locks.lock(&id("p1")).await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock(&id("p1")).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(first);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyedLocks::default();
        let _a = locks.lock(&id("p1")).await;
        let _b = tokio::time::timeout(Duration::from_millis(100), locks.lock(&id("p2")))
            .await
            .unwrap();
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_idle_slots_are_removed() {
        let locks = KeyedLocks::default();
        {
            let _guard = locks.lock(&id("p1")).await;
            assert_eq!(locks.len(), 1);
        }
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_waiter_slot_is_pruned() {
        let locks = KeyedLocks::default();
        let holder = locks.lock(&id("p1")).await;

        let waiter_id = id("p1");
        let mut waiter = Box::pin(locks.lock(&waiter_id));
        assert!(
            tokio::time::timeout(Duration::from_millis(10), &mut waiter)
                .await
                .is_err()
        );
        drop(holder);
        drop(waiter);
        assert_eq!(locks.len(), 1);

        let _other = locks.lock(&id("p2")).await;
        assert_eq!(locks.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_excludes_keyed_mutations() {
        let session = Arc::new(SessionLocks::default());
        let all = session.lock_all().await;

        let keyed = {
            let session = Arc::clone(&session);
            tokio::spawn(async move {
                let _guard = session.lock_key(&id("p1")).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!keyed.is_finished());

        drop(all);
        keyed.await.unwrap();
    }
}
