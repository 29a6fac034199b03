//! JSON-file store used by the binary. The whole key space lives in one
//! file which is rewritten through a temp file on every change.
//!
//! Change notifications only reach handles created with
//! [`FileStore::connect`] inside the same process. Separately opened stores,
//! including other processes, read each other's writes but are never
//! notified of them; the last write of a key wins.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use super::{ChangeFeed, ExternalChanges, PersistentStore, StoreError};

#[derive(Clone, Debug)]
pub struct FileStore {
    shared: Arc<Shared>,
    origin: Uuid,
}

#[derive(Debug)]
struct Shared {
    path: PathBuf,
    write_lock: Mutex<()>,
    feed: ChangeFeed,
}

impl FileStore {
    /// Opens (or lazily creates) the store file, creating parent directories.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            shared: Arc::new(Shared { path, write_lock: Mutex::new(()), feed: ChangeFeed::new() }),
            origin: Uuid::now_v7(),
        })
    }

    pub fn connect(&self) -> Self {
        Self { shared: Arc::clone(&self.shared), origin: Uuid::now_v7() }
    }

    pub fn path(&self) -> &Path { &self.shared.path }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match fs::read_to_string(&self.shared.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let tmp = self.shared.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_string_pretty(entries)?)?;
        fs::rename(&tmp, &self.shared.path)?;
        Ok(())
    }

    fn modify(&self, key: &str, f: impl FnOnce(&mut BTreeMap<String, String>) -> bool) -> Result<(), StoreError> {
        let changed = {
            let _guard = self.shared.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
            let mut entries = self.read_all()?;
            let changed = f(&mut entries);
            if changed {
                self.write_all(&entries)?;
            }
            changed
        };
        if changed {
            self.shared.feed.announce(key, self.origin);
        }
        Ok(())
    }
}

impl PersistentStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.modify(key, |entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.modify(key, |entries| entries.remove(key).is_some())
    }

    fn subscribe(&self) -> ExternalChanges { self.shared.feed.subscribe(self.origin) }
}
