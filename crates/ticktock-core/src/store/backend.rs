//! Key-value persistence backends.
//!
//! The store keeps exactly two entries: the ticket collection as a JSON array
//! under [`TICKETS_KEY`], and the RFC 3339 "last saved" instant under
//! [`LAST_SAVED_KEY`].
//!
//! # File layout
//!
//! ```text
//! <data dir>/
//!   tickets          # JSON array of ticket records
//!   lastSavedTime    # RFC 3339 timestamp
//!   lock             # advisory lock held for a whole command
//! ```
//!
//! Each `set` writes a sibling temp file and renames it over the target, so a
//! reader sees either the old or the new value, never a torn one.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::StoreError;
use crate::lock::StoreLock;

pub const TICKETS_KEY: &str = "tickets";
pub const LAST_SAVED_KEY: &str = "lastSavedTime";
/// Raw copy of a ticket collection that did not fully parse.
pub const CORRUPT_KEY: &str = "tickets.corrupt";

/// Minimal get/set/remove storage, atomic per key.
pub trait KeyValueStore {
    /// Read a value; `Ok(None)` when the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory backend for tests and dry runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, bypassing the ticket store.
    #[must_use]
    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    #[must_use]
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One file per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a file store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Write`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Write {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Take the exclusive lock that serializes whole commands on this store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Lock`] on timeout or I/O failure.
    pub fn lock(&self, timeout: Duration) -> Result<StoreLock, StoreError> {
        Ok(StoreLock::acquire(&self.dir.join("lock"), timeout)?)
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let target = self.key_path(key);
        let tmp = self.dir.join(format!(".{key}.tmp"));
        let write = || -> io::Result<()> {
            fs::write(&tmp, value)?;
            fs::rename(&tmp, &target)
        };
        write().map_err(|source| StoreError::Write {
            key: key.to_string(),
            source,
        })
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Write {
                key: key.to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_store_get_set_remove() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.raw("k"), None);
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::open(dir.path().join("data")).unwrap();
        store.set(TICKETS_KEY, "[]").unwrap();

        let reopened = FileStore::open(dir.path().join("data")).unwrap();
        assert_eq!(reopened.get(TICKETS_KEY).unwrap().as_deref(), Some("[]"));
        assert_eq!(reopened.get(LAST_SAVED_KEY).unwrap(), None);
    }

    #[test]
    fn file_store_set_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        store.set(TICKETS_KEY, "[1]").unwrap();
        store.set(TICKETS_KEY, "[2]").unwrap();
        assert_eq!(store.get(TICKETS_KEY).unwrap().as_deref(), Some("[2]"));
        assert!(!dir.path().join(".tickets.tmp").exists());
    }

    #[test]
    fn file_store_remove_missing_is_ok() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        store.remove(LAST_SAVED_KEY).unwrap();
    }

    #[test]
    fn file_store_lock_blocks_second_holder() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        let _held = store.lock(Duration::from_millis(50)).unwrap();
        assert!(matches!(
            store.lock(Duration::from_millis(20)),
            Err(StoreError::Lock(_))
        ));
    }
}
