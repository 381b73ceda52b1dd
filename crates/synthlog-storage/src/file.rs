//! File-backed key-value store

use crate::atomic_writer::replace_file;
use crate::memory::Entries;
use crate::traits::{KeyValueStore, Quota, StorageError, StorageResult};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// Key-value store persisted as a single JSON object
///
/// The whole map is loaded on open and written back atomically after every
/// `set` and `remove`, so each individual call is durable once it returns.
/// A write whose persist fails is rolled back in memory before the error is
/// returned.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<Entries>,
    quota: Quota,
}

impl FileStore {
    /// Open the store at `path`, starting empty if the file does not exist
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        Self::open_with_quota(path, Quota::unlimited())
    }

    /// Open with a byte quota
    ///
    /// Existing contents are loaded even if they already exceed the quota;
    /// only new writes are checked.
    pub fn open_with_quota<P: AsRef<Path>>(path: P, quota: Quota) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        let values = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str::<HashMap<String, String>>(&content).map_err(|e| {
                    StorageError::InvalidData(format!(
                        "Failed to load store {}: {}",
                        path.display(),
                        e
                    ))
                })?
            }
        } else {
            HashMap::new()
        };

        tracing::debug!(path = %path.display(), keys = values.len(), "Opened file store");

        Ok(Self {
            path,
            entries: RwLock::new(Entries::from_map(values)),
            quota,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes currently accounted against the quota
    pub fn used_bytes(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .used
    }

    fn persist(&self, entries: &Entries) -> StorageResult<()> {
        // Sorted so the file diffs cleanly between writes
        let ordered: BTreeMap<&String, &String> = entries.values.iter().collect();
        let content = serde_json::to_string_pretty(&ordered).map_err(|e| {
            StorageError::Serialization(format!("Failed to serialize store: {}", e))
        })?;
        replace_file(&self.path, content.as_bytes())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.values.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> StorageResult<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let previous = entries.insert(&self.quota, key, value)?;

        if let Err(e) = self.persist(&entries) {
            tracing::error!(path = %self.path.display(), key, error = %e, "Failed to persist store, rolling back write");
            match previous {
                Some(old) => {
                    entries.remove(key);
                    entries.insert(&Quota::unlimited(), key, old)?;
                }
                None => {
                    entries.remove(key);
                }
            }
            return Err(e);
        }

        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let Some(previous) = entries.remove(key) else {
            return Ok(());
        };

        if let Err(e) = self.persist(&entries) {
            tracing::error!(path = %self.path.display(), key, error = %e, "Failed to persist store, restoring key");
            entries.insert(&Quota::unlimited(), key, previous)?;
            return Err(e);
        }

        Ok(())
    }

    fn list_keys(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.values.keys().cloned().collect()
    }
}
