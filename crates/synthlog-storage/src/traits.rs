//! Storage trait definitions

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Capacity exceeded writing '{key}': {required} bytes required, {limit} bytes allowed")]
    CapacityExceeded {
        key: String,
        required: usize,
        limit: usize,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl StorageError {
    /// True when the store refused a write because its quota is exhausted
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self, StorageError::CapacityExceeded { .. })
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Whole-value key-value store
///
/// Every call is synchronous and atomic for the single key it touches. There is
/// no cross-key transaction: callers that write several keys must tolerate a
/// failure between two writes.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Option<String>;

    /// Replace the value stored under `key`
    ///
    /// Fails with [`StorageError::CapacityExceeded`] when the write would push
    /// the store past its quota.
    fn set(&self, key: &str, value: String) -> StorageResult<()>;

    /// Remove `key`; removing an absent key is not an error
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// List every key currently in the store, in no particular order
    fn list_keys(&self) -> Vec<String>;

    /// Check if a key exists
    fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }

    fn list_keys(&self) -> Vec<String> {
        (**self).list_keys()
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }

    fn list_keys(&self) -> Vec<String> {
        (**self).list_keys()
    }
}

/// Byte quota shared by the store implementations
///
/// Usage is measured as the sum of key and value lengths, the same accounting a
/// browser applies to its local storage area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Quota {
    limit: Option<usize>,
}

impl Quota {
    /// No limit on stored bytes
    pub fn unlimited() -> Self {
        Self { limit: None }
    }

    /// Limit the store to `bytes` total
    pub fn bytes(bytes: usize) -> Self {
        Self { limit: Some(bytes) }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Check whether replacing `previous` with `value` under `key` fits
    ///
    /// `used` is the current usage including `previous`.
    pub fn check(
        &self,
        used: usize,
        key: &str,
        previous: Option<&str>,
        value: &str,
    ) -> StorageResult<usize> {
        let freed = previous.map(|v| key.len() + v.len()).unwrap_or(0);
        let required = used.saturating_sub(freed) + key.len() + value.len();

        match self.limit {
            Some(limit) if required > limit => Err(StorageError::CapacityExceeded {
                key: key.to_string(),
                required,
                limit,
            }),
            _ => Ok(required),
        }
    }
}
