//! Key/value storage backends behind the session store.
//!
//! The store only ever needs string entries, mirroring browser-style local
//! storage. Two backends are provided: [`MemoryStorage`] for tests and
//! short-lived processes, and [`JsonFileStorage`] which persists the map as
//! a JSON object so a session survives restarts.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::error::StorageError;

/// A flat string map with whole-map replacement.
///
/// Implementations must make [`replace_all`](KeyValueStorage::replace_all)
/// and [`clear`](KeyValueStorage::clear) all-or-nothing: a concurrent
/// [`snapshot`](KeyValueStorage::snapshot) sees either the old map or the
/// new one, never a mix.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Consistent copy of every entry.
    fn snapshot(&self) -> BTreeMap<String, String>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Set `key` only while `guard_key` still holds `expected`, checked and
    /// written under one lock. Returns whether the write happened.
    fn set_if(
        &self,
        key: &str,
        value: &str,
        guard_key: &str,
        expected: &str,
    ) -> Result<bool, StorageError>;

    /// Replace the whole map at once.
    fn replace_all(&self, entries: BTreeMap<String, String>) -> Result<(), StorageError>;

    fn clear(&self) -> Result<(), StorageError> {
        self.replace_all(BTreeMap::new())
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Process-local storage. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.read().clone()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn set_if(
        &self,
        key: &str,
        value: &str,
        guard_key: &str,
        expected: &str,
    ) -> Result<bool, StorageError> {
        let mut entries = self.entries.write();
        if entries.get(guard_key).map(String::as_str) != Some(expected) {
            return Ok(false);
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(true)
    }

    fn replace_all(&self, entries: BTreeMap<String, String>) -> Result<(), StorageError> {
        *self.entries.write() = entries;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JSON file
// ---------------------------------------------------------------------------

/// Storage persisted to a single JSON object on disk.
///
/// The file is loaded once at open and rewritten on every mutation through a
/// temporary sibling file and a rename, so a crash mid-write leaves the
/// previous contents intact. The in-memory copy is only updated after the
/// write succeeds.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl JsonFileStorage {
    /// Open (or lazily create) the storage file at `path`.
    ///
    /// A missing file starts empty. A file that is not a JSON string map is
    /// treated as empty and overwritten on the next mutation.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Discarding unreadable session file");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "Opened session file");

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(entries)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut tmp_name = self.path.as_os_str().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(&json)?;
        file.sync_all()?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Apply `mutate` to a copy of the map, persist it, then publish it.
    fn update<F>(&self, mutate: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        self.update_if(|map| {
            mutate(map);
            true
        })
        .map(|_| ())
    }

    /// Like [`update`](Self::update), but `mutate` may decline by returning
    /// false, in which case nothing is written.
    fn update_if<F>(&self, mutate: F) -> Result<bool, StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let mut guard = self.entries.write();
        let mut next = guard.clone();
        if !mutate(&mut next) {
            return Ok(false);
        }
        self.persist(&next)?;
        *guard = next;
        Ok(true)
    }
}

impl KeyValueStorage for JsonFileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.read().clone()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|map| {
            map.remove(key);
        })
    }

    fn set_if(
        &self,
        key: &str,
        value: &str,
        guard_key: &str,
        expected: &str,
    ) -> Result<bool, StorageError> {
        self.update_if(|map| {
            if map.get(guard_key).map(String::as_str) != Some(expected) {
                return false;
            }
            map.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn replace_all(&self, entries: BTreeMap<String, String>) -> Result<(), StorageError> {
        self.update(|map| *map = entries)
    }
}
