//! FILENAME: core/persistence/src/store.rs
//! PURPOSE: Key-value storage port for user-scoped settings such as presets.
//! CONTEXT: Values are opaque strings (callers serialize JSON themselves).
//! `MemoryStore` backs tests and ephemeral sessions; `JsonFileStore` keeps
//! the whole map in one JSON document and rewrites it on every change.

use crate::PersistenceError;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
    fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;
    /// Keys starting with `prefix`, in ascending order.
    fn list_keys(&self, prefix: &str) -> Result<Vec<String>, PersistenceError>;
}

fn keys_with_prefix(map: &BTreeMap<String, String>, prefix: &str) -> Vec<String> {
    map.keys().filter(|k| k.starts_with(prefix)).cloned().collect()
}

// ============================================================================
// MEMORY
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.entries.remove(key);
        Ok(())
    }

    fn list_keys(&self, prefix: &str) -> Result<Vec<String>, PersistenceError> {
        Ok(keys_with_prefix(&self.entries, prefix))
    }
}

// ============================================================================
// JSON FILE
// ============================================================================

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Opens (or lazily creates) the store at `path`. A missing file is empty.
    pub fn open(path: &Path) -> Result<Self, PersistenceError> {
        let entries = if path.exists() {
            let text = fs::read_to_string(path)?;
            if text.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&text)?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self { path: path.to_path_buf(), entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.get(key).cloned())
    }

    /// A failed write leaves the map as it was, matching the file.
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let previous = self.entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush() {
            match previous {
                Some(old) => self.entries.insert(key.to_string(), old),
                None => self.entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        if let Some(old) = self.entries.remove(key) {
            if let Err(e) = self.flush() {
                self.entries.insert(key.to_string(), old);
                return Err(e);
            }
        }
        Ok(())
    }

    fn list_keys(&self, prefix: &str) -> Result<Vec<String>, PersistenceError> {
        Ok(keys_with_prefix(&self.entries, prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_prefix_listing() {
        let mut store = MemoryStore::new();
        store.set("presets:orders:a", "1").unwrap();
        store.set("presets:orders:b", "2").unwrap();
        store.set("presets:users:a", "3").unwrap();
        assert_eq!(
            store.list_keys("presets:orders:").unwrap(),
            vec!["presets:orders:a", "presets:orders:b"]
        );
        store.remove("presets:orders:a").unwrap();
        assert_eq!(store.get("presets:orders:a").unwrap(), None);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_json_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        {
            let mut store = JsonFileStore::open(&path).unwrap();
            assert_eq!(store.get("k").unwrap(), None);
            store.set("k", "{\"x\":1}").unwrap();
            store.set("gone", "1").unwrap();
            store.remove("gone").unwrap();
        }
        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("{\"x\":1}"));
        assert_eq!(store.list_keys("").unwrap(), vec!["k"]);
    }

    #[test]
    fn test_failed_write_rolls_back_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut store = JsonFileStore::open(&path).unwrap();
        store.set("kept", "1").unwrap();

        // A directory in place of the file makes every flush fail.
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        assert!(store.set("new", "2").is_err());
        assert_eq!(store.get("new").unwrap(), None);
        assert!(store.set("kept", "3").is_err());
        assert_eq!(store.get("kept").unwrap().as_deref(), Some("1"));
        assert!(store.remove("kept").is_err());
        assert_eq!(store.list_keys("").unwrap(), vec!["kept"]);
    }

    #[test]
    fn test_json_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(JsonFileStore::open(&path), Err(PersistenceError::Json(_))));
    }
}
