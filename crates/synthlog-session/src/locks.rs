//! Per-session write serialization for in-process sharing
//!
//! [`ChunkedLog`] does an unguarded read-modify-write of two keys on every
//! append, so two threads appending to the same session can overwrite each
//! other's record. [`SerializedLog`] funnels all writes for one session
//! through a mutex while leaving different sessions independent. It does
//! nothing for separate processes sharing a store.

use crate::directory::SessionDirectory;
use crate::error::SessionLogResult;
use crate::log::{AppendReceipt, ChunkedLog, ExportReport};
use crate::record::LogRecord;
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};
use synthlog_storage::KeyValueStore;

/// One mutex per session uid
///
/// An entry exists only while some thread holds or waits on it, so the map
/// stays as small as the number of sessions being written concurrently.
#[derive(Debug, Default)]
pub struct SessionLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `session_uid`
    pub fn with_session<T>(&self, session_uid: &str, f: impl FnOnce() -> T) -> T {
        let lock = self
            .locks
            .entry(session_uid.to_string())
            .or_default()
            .clone();

        // The dashmap shard guard is gone by now; only the session mutex is held
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        drop(lock);

        // Cloning happens under the shard lock, so a count of one means no
        // other caller holds or is waiting on this mutex
        self.locks
            .remove_if(session_uid, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    /// Number of sessions currently locked or waited on
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// A [`ChunkedLog`] whose writes are serialized per session
pub struct SerializedLog<S> {
    log: ChunkedLog<S>,
    locks: SessionLocks,
}

impl<S: KeyValueStore> SerializedLog<S> {
    pub fn new(log: ChunkedLog<S>) -> Self {
        Self {
            log,
            locks: SessionLocks::new(),
        }
    }

    /// The wrapped log, for reads
    pub fn inner(&self) -> &ChunkedLog<S> {
        &self.log
    }

    pub fn append(&self, session_uid: &str, record: LogRecord) -> SessionLogResult<AppendReceipt> {
        self.locks
            .with_session(session_uid, || self.log.append(session_uid, record))
    }

    pub fn update_log(&self, session_uid: &str, record: LogRecord) -> SessionLogResult<bool> {
        self.locks
            .with_session(session_uid, || self.log.update_log(session_uid, record))
    }

    pub fn clear_session(&self, session_uid: &str) -> SessionLogResult<()> {
        self.locks
            .with_session(session_uid, || self.log.clear_session(session_uid))
    }

    pub fn total_count(&self, session_uid: &str) -> u64 {
        self.log.total_count(session_uid)
    }

    pub fn get_logs(&self, session_uid: &str, page: u64, page_size: u64) -> Vec<LogRecord> {
        self.log.get_logs(session_uid, page, page_size)
    }

    pub fn get_all_logs(&self, session_uid: &str) -> Vec<LogRecord> {
        self.log.get_all_logs(session_uid)
    }

    /// Full export taken under the session lock, so no append lands midway
    pub fn export_session(&self, session_uid: &str) -> SessionLogResult<ExportReport> {
        self.locks
            .with_session(session_uid, || self.log.export_session(session_uid))
    }
}

impl<S: KeyValueStore> SessionDirectory for SerializedLog<S> {
    fn list_sessions(&self) -> BTreeSet<String> {
        self.log.list_sessions()
    }
}
