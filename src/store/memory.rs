//! In-process store; each [`MemoryStore::connect`] handle behaves like a
//! separate tab over the same storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use super::{ChangeFeed, ExternalChanges, PersistentStore, StoreError};

#[derive(Clone, Debug)]
pub struct MemoryStore {
    shared: Arc<Shared>,
    origin: Uuid,
}

#[derive(Debug)]
struct Shared {
    entries: RwLock<HashMap<String, String>>,
    feed: ChangeFeed,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared { entries: RwLock::new(HashMap::new()), feed: ChangeFeed::new() }),
            origin: Uuid::now_v7(),
        }
    }

    /// Another handle on the same entries with its own identity.
    pub fn connect(&self) -> Self {
        Self { shared: Arc::clone(&self.shared), origin: Uuid::now_v7() }
    }
}

impl Default for MemoryStore {
    fn default() -> Self { Self::new() }
}

impl PersistentStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.shared.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.shared.entries.write().map_err(|_| StoreError::Poisoned)?.insert(key.to_string(), value.to_string());
        self.shared.feed.announce(key, self.origin);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let removed = self.shared.entries.write().map_err(|_| StoreError::Poisoned)?.remove(key);
        if removed.is_some() {
            self.shared.feed.announce(key, self.origin);
        }
        Ok(())
    }

    fn subscribe(&self) -> ExternalChanges { self.shared.feed.subscribe(self.origin) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::keys;

    #[test]
    fn test_handles_share_entries() {
        let tab_a = MemoryStore::new();
        let tab_b = tab_a.connect();
        tab_a.set(keys::CART, "[]").unwrap();
        assert_eq!(tab_b.get(keys::CART).unwrap().as_deref(), Some("[]"));
        tab_b.remove(keys::CART).unwrap();
        assert!(tab_a.get(keys::CART).unwrap().is_none());
    }

    #[test]
    fn test_writer_is_not_notified() {
        let tab_a = MemoryStore::new();
        let tab_b = tab_a.connect();
        let mut a_changes = tab_a.subscribe();
        let mut b_changes = tab_b.subscribe();

        tab_a.set(keys::FAVORITES, "[\"1\"]").unwrap();

        assert!(a_changes.drain().is_empty());
        let seen = b_changes.drain();
        assert!(seen.touches(keys::FAVORITES));
        assert!(!seen.touches(keys::CART));
    }

    #[tokio::test]
    async fn test_next_waits_for_foreign_write() {
        let tab_a = MemoryStore::new();
        let tab_b = tab_a.connect();
        let mut b_changes = tab_b.subscribe();
        let writer = tokio::spawn(async move { tab_a.set(keys::CART, "[]").unwrap(); });
        let seen = b_changes.next().await.unwrap();
        assert!(seen.touches(keys::CART));
        writer.await.unwrap();
    }
}
