//! Session discovery
//!
//! The store has no namespaces, so sessions are found by scanning for index
//! keys. The scan sits behind [`SessionDirectory`] so another key encoding
//! can replace it without touching callers.

use crate::keys::KeyLayout;
use crate::log::ChunkedLog;
use std::collections::BTreeSet;
use synthlog_storage::KeyValueStore;

pub trait SessionDirectory {
    /// Every session uid that currently has an index
    fn list_sessions(&self) -> BTreeSet<String>;
}

/// Directory that scans every key for the index-key pattern
pub struct PrefixScanDirectory<S> {
    store: S,
    keys: KeyLayout,
}

impl<S: KeyValueStore> PrefixScanDirectory<S> {
    pub fn new(store: S, keys: KeyLayout) -> Self {
        Self { store, keys }
    }
}

impl<S: KeyValueStore> SessionDirectory for PrefixScanDirectory<S> {
    fn list_sessions(&self) -> BTreeSet<String> {
        self.store
            .list_keys()
            .iter()
            .filter_map(|key| self.keys.session_from_index_key(key))
            .map(str::to_string)
            .collect()
    }
}

impl<S: KeyValueStore> ChunkedLog<S> {
    /// Directory over the same store and key layout as this log
    pub fn directory(&self) -> PrefixScanDirectory<&S> {
        PrefixScanDirectory::new(self.store(), self.keys().clone())
    }
}

impl<S: KeyValueStore> SessionDirectory for ChunkedLog<S> {
    fn list_sessions(&self) -> BTreeSet<String> {
        self.directory().list_sessions()
    }
}
