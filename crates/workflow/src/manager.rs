//! Session ownership, keyed by driver identity.
//!
//! Events for one driver must be processed strictly sequentially: the
//! draft and the commit are not designed to tolerate interleaving. The
//! manager hands out one async slot per identity; the engine holds the
//! slot's lock for the duration of one inbound event. Sessions for
//! different drivers proceed independently.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::session::Session;

/// A per-identity slot: `None` when no walk is in progress.
pub type SessionSlot = Arc<Mutex<Option<Session>>>;

/// Thread-safe owner of all live sessions.
///
/// Passed as a dependency; there is no ambient global session map.
#[derive(Debug, Default)]
pub struct SessionManager {
    slots: RwLock<HashMap<String, SessionSlot>>,
}

impl SessionManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the slot for an identity.
    ///
    /// The caller locks the returned slot before reading or mutating
    /// the session, and keeps it locked until the event is fully
    /// processed.
    pub async fn slot(&self, identity: &str) -> SessionSlot {
        if let Some(slot) = self.slots.read().await.get(identity) {
            return slot.clone();
        }

        let mut slots = self.slots.write().await;
        slots
            .entry(identity.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    /// Lock an identity's current slot.
    ///
    /// A slot fetched from the map can be torn down by `remove` while
    /// this task waits for its lock; a write into it would then be
    /// invisible to every later event. After locking, the slot is
    /// checked to still be the map's live entry; a stale one is
    /// discarded and the acquisition retried.
    pub async fn acquire(&self, identity: &str) -> OwnedMutexGuard<Option<Session>> {
        loop {
            let slot = self.slot(identity).await;
            let guard = slot.clone().lock_owned().await;

            let live = self
                .slots
                .read()
                .await
                .get(identity)
                .map_or(false, |current| Arc::ptr_eq(current, &slot));
            if live {
                return guard;
            }
        }
    }

    /// Drop an identity's slot after its session reached a terminal
    /// state.
    ///
    /// The caller must still hold the slot's lock: tasks already
    /// waiting on the removed slot then fail `acquire`'s liveness
    /// check and move to a fresh one instead of writing into an
    /// orphan.
    pub async fn remove(&self, identity: &str) {
        self.slots.write().await.remove(identity);
    }

    /// Number of identities with a live slot.
    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    /// Whether no slots exist.
    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::ChecklistItem;

    fn item(id: i64) -> ChecklistItem {
        ChecklistItem {
            id,
            truck_id: 1,
            description: "Tires".to_string(),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_slot_is_stable_per_identity() {
        let manager = SessionManager::new();

        let a = manager.slot("d1").await;
        let b = manager.slot("d1").await;
        assert!(Arc::ptr_eq(&a, &b));

        let other = manager.slot("d2").await;
        assert!(!Arc::ptr_eq(&a, &other));
        assert_eq!(manager.len().await, 2);
    }

    #[tokio::test]
    async fn test_acquire_skips_slot_removed_while_waiting() {
        let manager = Arc::new(SessionManager::new());

        // Hold the lock on d1's slot, with a second task queued up
        // behind it wanting to start a session.
        let mut guard = manager.acquire("d1").await;

        let writer = {
            let manager = manager.clone();
            tokio::spawn(async move {
                let mut guard = manager.acquire("d1").await;
                *guard = Session::new("d1", 1, vec![item(10)]);
            })
        };

        // Tear the slot down while the writer is still waiting, then
        // release it.
        manager.remove("d1").await;
        *guard = None;
        drop(guard);

        writer.await.unwrap();

        // The writer's session landed in the live slot, not in the
        // removed one.
        let guard = manager.acquire("d1").await;
        assert!(guard.is_some());
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let manager = SessionManager::new();

        let slot = manager.slot("d1").await;
        {
            let mut guard = slot.lock().await;
            *guard = Session::new("d1", 1, vec![item(10)]);
            assert!(guard.is_some());
        }

        manager.remove("d1").await;
        assert!(manager.is_empty().await);

        // A fresh slot starts empty.
        let slot = manager.slot("d1").await;
        assert!(slot.lock().await.is_none());
    }
}
