//! In-memory key-value store with an optional byte quota

use crate::traits::{KeyValueStore, Quota, StorageResult};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Default)]
pub(crate) struct Entries {
    pub(crate) values: HashMap<String, String>,
    pub(crate) used: usize,
}

impl Entries {
    pub(crate) fn from_map(values: HashMap<String, String>) -> Self {
        let used = values.iter().map(|(k, v)| k.len() + v.len()).sum();
        Self { values, used }
    }

    /// Insert after checking the quota; returns the value that was replaced
    pub(crate) fn insert(
        &mut self,
        quota: &Quota,
        key: &str,
        value: String,
    ) -> StorageResult<Option<String>> {
        let previous = self.values.get(key).map(String::as_str);
        self.used = quota.check(self.used, key, previous, &value)?;
        Ok(self.values.insert(key.to_string(), value))
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<String> {
        let removed = self.values.remove(key);
        if let Some(value) = &removed {
            self.used = self.used.saturating_sub(key.len() + value.len());
        }
        removed
    }
}

/// In-memory key-value store
///
/// Nothing survives the process. Useful as the default backing for tests and
/// for embedding the session log in a short-lived tool.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<Entries>,
    quota: Quota,
}

impl MemoryStore {
    /// Create an empty store without a quota
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that rejects writes past `quota`
    pub fn with_quota(quota: Quota) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            quota,
        }
    }

    /// Bytes currently accounted against the quota
    pub fn used_bytes(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .used
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.values.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> StorageResult<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(&self.quota, key, value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }

    fn list_keys(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.values.keys().cloned().collect()
    }
}
