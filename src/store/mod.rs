//! Durable string-keyed state store.
//!
//! Every stateful component persists through [`PersistentStore`], which is
//! passed in explicitly rather than reached as an ambient global. Values are
//! JSON strings. Writes from one handle are announced to every other handle
//! sharing the same backing data, which is how two tabs of the storefront
//! learn that the other one changed the cart.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Persisted keys.
pub mod keys {
    pub const CART: &str = "cart";
    pub const FAVORITES: &str = "favorites";
    pub const VIEWED_PRODUCTS: &str = "viewedProducts";
    pub const CHECKOUT_DRAFT: &str = "checkoutDraft";
    pub const PAYMENT_METHOD: &str = "paymentMethod";
    pub const ORDER_HISTORY: &str = "orderHistory";
}

const CHANGE_FEED_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

/// A write announced on the change feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreChange {
    pub key: String,
    pub origin: Uuid,
}

pub trait PersistentStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Feed of writes made through *other* handles.
    fn subscribe(&self) -> ExternalChanges;
}

pub fn load_json<T: DeserializeOwned>(store: &dyn PersistentStore, key: &str) -> Result<Option<T>, StoreError> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub fn save_json<T: Serialize + ?Sized>(store: &dyn PersistentStore, key: &str, value: &T) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

/// Broadcast side shared by every handle on the same backing data.
#[derive(Clone, Debug)]
pub(crate) struct ChangeFeed {
    tx: broadcast::Sender<StoreChange>,
}

impl ChangeFeed {
    pub(crate) fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self { tx }
    }

    pub(crate) fn announce(&self, key: &str, origin: Uuid) {
        // no subscribers is fine
        let _ = self.tx.send(StoreChange { key: key.to_string(), origin });
    }

    pub(crate) fn subscribe(&self, origin: Uuid) -> ExternalChanges {
        ExternalChanges { rx: self.tx.subscribe(), origin }
    }
}

/// Receiver half of the change feed, filtered to foreign writes.
#[derive(Debug)]
pub struct ExternalChanges {
    rx: broadcast::Receiver<StoreChange>,
    origin: Uuid,
}

impl ExternalChanges {
    /// Collects every pending foreign change without waiting.
    pub fn drain(&mut self) -> ChangeSet {
        let mut set = ChangeSet::default();
        loop {
            match self.rx.try_recv() {
                Ok(change) if change.origin != self.origin => { set.keys.insert(change.key); }
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Lagged(_)) => set.overflowed = true,
                Err(broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed) => break,
            }
        }
        set
    }

    /// Waits for the next foreign change. `None` once every handle is gone.
    pub async fn next(&mut self) -> Option<ChangeSet> {
        loop {
            match self.rx.recv().await {
                Ok(change) if change.origin != self.origin => {
                    let mut set = self.drain();
                    set.keys.insert(change.key);
                    return Some(set);
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    let mut set = self.drain();
                    set.overflowed = true;
                    return Some(set);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Keys touched by foreign writes. After an overflow every key counts as
/// touched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub keys: BTreeSet<String>,
    pub overflowed: bool,
}

impl ChangeSet {
    pub fn touches(&self, key: &str) -> bool { self.overflowed || self.keys.contains(key) }
    pub fn is_empty(&self) -> bool { !self.overflowed && self.keys.is_empty() }
}
