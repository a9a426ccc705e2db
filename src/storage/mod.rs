//! Local key-value storage.
//!
//! Everything transctl persists between invocations (the last used model,
//! the translation history, saved corrections) lives under a handful of
//! string keys in a single [`KeyValueStore`]. Values are JSON text; the
//! typed stores in [`preferences`] and [`corrections`] own the encoding.
//!
//! Two backends exist:
//! - [`FileStore`] — one JSON object on disk (`~/.transctl/storage.json` by
//!   default). Reads of a missing or corrupt file yield an empty map.
//! - [`MemoryStore`] — process-local map for tests and the dashboard.

pub mod corrections;
pub mod preferences;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};

use crate::config::schema::StorageConfig;

pub use corrections::{
    CorrectionRecord, CorrectionRelay, CorrectionStore, NewCorrection, RelayHandle,
    RemoteCorrection,
};
pub use preferences::{HistoryEntry, NewHistoryEntry, PreferenceStore};

// ---------------------------------------------------------------------------
// Store interface
// ---------------------------------------------------------------------------

/// A small string-to-string repository.
///
/// Writes are read-modify-write without cross-process locking; the last
/// writer wins.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// All keys currently present, in sorted order.
    fn keys(&self) -> Vec<String>;
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// A [`KeyValueStore`] persisted as one pretty-printed JSON object.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes writers inside this process.
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Open the store named by `[storage] path`, expanding `~/`.
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(crate::config::expand_tilde(&config.path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> BTreeMap<String, String> {
        load_map(&self.path).unwrap_or_default()
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(map).context("failed to serialize store")?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

fn load_map(path: &Path) -> Option<BTreeMap<String, String>> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(map) => Some(map),
        Err(e) => {
            log::warn!("store {} is unreadable, starting empty: {e}", path.display());
            None
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_map().remove(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| anyhow::anyhow!("store lock poisoned"))?;
        let mut map = self.read_map();
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| anyhow::anyhow!("store lock poisoned"))?;
        let mut map = self.read_map();
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.read_map().into_keys().collect()
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// A [`KeyValueStore`] that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.map.lock().map_err(|_| anyhow::anyhow!("store lock poisoned"))?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut map = self.map.lock().map_err(|_| anyhow::anyhow!("store lock poisoned"))?;
        map.remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.map
            .lock()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("lastModelId"), None);
        store.set("lastModelId", "hausa_english_translator").unwrap();
        assert_eq!(
            store.get("lastModelId").as_deref(),
            Some("hausa_english_translator")
        );
        store.remove("lastModelId").unwrap();
        assert_eq!(store.get("lastModelId"), None);
        store.remove("lastModelId").unwrap();
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let store = FileStore::new(&path);
        store.set("b", "2").unwrap();
        store.set("a", "1").unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("a").as_deref(), Some("1"));
        assert_eq!(reopened.keys(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn file_store_treats_corrupt_file_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "{not json").unwrap();

        let store = FileStore::new(&path);
        assert!(store.keys().is_empty());
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").as_deref(), Some("v"));
    }
}
