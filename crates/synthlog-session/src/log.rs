//! Chunked append log
//!
//! Each session is stored as one index key plus a run of chunk keys. Chunks
//! `0..last_chunk_id` are always full; only the last chunk accepts appends.
//! The logical position of a record is `chunk_id * capacity + offset`, oldest
//! first.
//!
//! Appends are a read-modify-write of two keys with no transaction around
//! them, so a single writer per session is assumed. Wrap the log in
//! [`SerializedLog`](crate::SerializedLog) when several threads share it.

use crate::codec::{self, DecodeError, SessionIndex};
use crate::config::LogConfig;
use crate::error::{AppendPhase, SessionLogError, SessionLogResult};
use crate::keys::KeyLayout;
use crate::record::LogRecord;
use synthlog_storage::KeyValueStore;

/// Result of reading a single chunk key
#[derive(Debug)]
pub(crate) enum ChunkRead {
    Missing,
    Corrupt(DecodeError),
    Loaded(Vec<LogRecord>),
}

/// Where an appended record landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendReceipt {
    pub chunk_id: u64,
    pub offset: usize,
    pub total_count: u64,
}

/// Why a chunk was left out of an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Missing,
    Undecodable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedChunk {
    pub chunk_id: u64,
    pub reason: SkipReason,
}

/// Full export of a session, oldest record first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportReport {
    pub records: Vec<LogRecord>,
    pub chunks_read: u64,
    pub skipped: Vec<SkippedChunk>,
}

impl ExportReport {
    /// True when every chunk the index points at was read
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub total_count: u64,
    pub last_chunk_id: u64,
    pub chunk_count: u64,
    /// The index predates `lastChunkId` and the value above was derived
    pub legacy_index: bool,
}

pub struct ChunkedLog<S> {
    store: S,
    config: LogConfig,
    keys: KeyLayout,
}

impl<S: KeyValueStore> ChunkedLog<S> {
    /// Create a log with the default layout (50 records per chunk)
    pub fn new(store: S) -> Self {
        let config = LogConfig::default();
        let keys = KeyLayout::new(config.key_prefix.clone());
        Self {
            store,
            config,
            keys,
        }
    }

    /// Create a log with a custom layout
    pub fn with_config(store: S, config: LogConfig) -> SessionLogResult<Self> {
        config.validate().map_err(SessionLogError::Config)?;
        let keys = KeyLayout::new(config.key_prefix.clone());
        Ok(Self {
            store,
            config,
            keys,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    pub fn keys(&self) -> &KeyLayout {
        &self.keys
    }

    pub(crate) fn chunk_capacity(&self) -> u64 {
        self.config.chunk_capacity as u64
    }

    /// Read and decode the index; `Ok(None)` when the session does not exist
    pub(crate) fn read_index(&self, session_uid: &str) -> SessionLogResult<Option<SessionIndex>> {
        let Some(raw) = self.store.get(&self.keys.index_key(session_uid)) else {
            return Ok(None);
        };

        codec::decode_index(&raw)
            .map(Some)
            .map_err(|source| SessionLogError::CorruptIndex {
                session_uid: session_uid.to_string(),
                source,
            })
    }

    /// Index read for paths that treat a corrupt index as an absent session
    fn read_index_or_warn(&self, session_uid: &str) -> Option<SessionIndex> {
        match self.read_index(session_uid) {
            Ok(index) => index,
            Err(e) => {
                tracing::warn!(session_uid = %session_uid, error = %e, "Treating session with unreadable index as inaccessible");
                None
            }
        }
    }

    pub(crate) fn read_chunk(&self, session_uid: &str, chunk_id: u64) -> ChunkRead {
        match self.store.get(&self.keys.chunk_key(session_uid, chunk_id)) {
            None => ChunkRead::Missing,
            Some(raw) => match codec::decode_chunk(&raw) {
                Ok(records) => ChunkRead::Loaded(records),
                Err(e) => ChunkRead::Corrupt(e),
            },
        }
    }

    fn encode_records(records: &[LogRecord]) -> SessionLogResult<String> {
        codec::encode_chunk(records).map_err(SessionLogError::Encode)
    }

    /// Append one record to the end of a session, creating it if needed
    ///
    /// The chunk is written before the index. If the index write fails the
    /// error carries [`AppendPhase::IndexWrite`]: the record is stored but not
    /// counted. When that failed append had opened a new chunk, the index
    /// still points at the full one, so rollover first looks for a chunk past
    /// it and keeps writing into that instead of overwriting it.
    pub fn append(&self, session_uid: &str, record: LogRecord) -> SessionLogResult<AppendReceipt> {
        let capacity = self.chunk_capacity();
        let index = self.read_index(session_uid)?.unwrap_or_default();
        let mut last_chunk_id = index.resolved_last_chunk_id(capacity);

        let mut chunk = match self.read_chunk(session_uid, last_chunk_id) {
            ChunkRead::Loaded(records) => records,
            ChunkRead::Missing => Vec::new(),
            ChunkRead::Corrupt(source) => {
                return Err(SessionLogError::CorruptChunk {
                    session_uid: session_uid.to_string(),
                    chunk_id: last_chunk_id,
                    source,
                });
            }
        };

        while chunk.len() as u64 >= capacity {
            last_chunk_id += 1;
            chunk = match self.read_chunk(session_uid, last_chunk_id) {
                ChunkRead::Missing => Vec::new(),
                ChunkRead::Loaded(records) => {
                    tracing::warn!(
                        session_uid = %session_uid,
                        chunk_id = last_chunk_id,
                        items = records.len(),
                        "Continuing into chunk left behind by a failed index write"
                    );
                    records
                }
                ChunkRead::Corrupt(source) => {
                    return Err(SessionLogError::CorruptChunk {
                        session_uid: session_uid.to_string(),
                        chunk_id: last_chunk_id,
                        source,
                    });
                }
            };
        }
        chunk.push(record);
        let offset = chunk.len() - 1;

        tracing::debug!(
            session_uid = %session_uid,
            chunk_id = last_chunk_id,
            items = chunk.len(),
            "Writing chunk"
        );

        let encoded = Self::encode_records(&chunk)?;
        self.store
            .set(&self.keys.chunk_key(session_uid, last_chunk_id), encoded)
            .map_err(|source| {
                tracing::error!(session_uid = %session_uid, chunk_id = last_chunk_id, error = %source, "Chunk write failed");
                SessionLogError::AppendFailed {
                    session_uid: session_uid.to_string(),
                    chunk_id: last_chunk_id,
                    phase: AppendPhase::ChunkWrite,
                    source,
                }
            })?;

        let updated = SessionIndex::new(index.total_count + 1, last_chunk_id);
        let encoded = codec::encode_index(&updated).map_err(SessionLogError::Encode)?;
        self.store
            .set(&self.keys.index_key(session_uid), encoded)
            .map_err(|source| {
                tracing::error!(
                    session_uid = %session_uid,
                    chunk_id = last_chunk_id,
                    error = %source,
                    "Index write failed after chunk write; record stored but not counted"
                );
                SessionLogError::AppendFailed {
                    session_uid: session_uid.to_string(),
                    chunk_id: last_chunk_id,
                    phase: AppendPhase::IndexWrite,
                    source,
                }
            })?;

        tracing::debug!(
            session_uid = %session_uid,
            total_count = updated.total_count,
            last_chunk_id,
            "Index updated"
        );

        Ok(AppendReceipt {
            chunk_id: last_chunk_id,
            offset,
            total_count: updated.total_count,
        })
    }

    /// Number of records appended to the session; 0 when it does not exist
    pub fn total_count(&self, session_uid: &str) -> u64 {
        self.read_index_or_warn(session_uid)
            .map(|index| index.total_count)
            .unwrap_or(0)
    }

    /// Replace the record whose id matches `record.id`, keeping its position
    ///
    /// Chunks are searched newest first. Only the first match is replaced and
    /// only its chunk is rewritten. Returns `Ok(false)` when the session or the
    /// id is unknown; unreadable chunks are skipped.
    pub fn update_log(&self, session_uid: &str, record: LogRecord) -> SessionLogResult<bool> {
        let Some(index) = self.read_index_or_warn(session_uid) else {
            return Ok(false);
        };
        let last_chunk_id = index.resolved_last_chunk_id(self.chunk_capacity());

        for chunk_id in (0..=last_chunk_id).rev() {
            let mut chunk = match self.read_chunk(session_uid, chunk_id) {
                ChunkRead::Loaded(records) => records,
                ChunkRead::Missing => continue,
                ChunkRead::Corrupt(e) => {
                    tracing::warn!(session_uid = %session_uid, chunk_id, error = %e, "Skipping unreadable chunk during update");
                    continue;
                }
            };

            let Some(position) = chunk.iter().position(|r| r.id == record.id) else {
                continue;
            };

            tracing::debug!(session_uid = %session_uid, chunk_id, record_id = %record.id, "Updating record in place");
            chunk[position] = record;
            let encoded = Self::encode_records(&chunk)?;
            self.store
                .set(&self.keys.chunk_key(session_uid, chunk_id), encoded)?;
            return Ok(true);
        }

        Ok(false)
    }

    /// Read every chunk of a session, reporting the ones that could not be read
    ///
    /// Fails only when the index itself is corrupt.
    pub fn export_session(&self, session_uid: &str) -> SessionLogResult<ExportReport> {
        let Some(index) = self.read_index(session_uid)? else {
            return Ok(ExportReport::default());
        };

        let last_chunk_id = index.resolved_last_chunk_id(self.chunk_capacity());
        if index.is_legacy() {
            tracing::debug!(
                session_uid = %session_uid,
                total_count = index.total_count,
                last_chunk_id,
                "Derived last chunk id from legacy index"
            );
        }

        let mut report = ExportReport::default();
        for chunk_id in 0..=last_chunk_id {
            match self.read_chunk(session_uid, chunk_id) {
                ChunkRead::Loaded(records) => {
                    report.chunks_read += 1;
                    report.records.extend(records);
                }
                ChunkRead::Missing => {
                    tracing::warn!(session_uid = %session_uid, chunk_id, "Chunk missing during export");
                    report.skipped.push(SkippedChunk {
                        chunk_id,
                        reason: SkipReason::Missing,
                    });
                }
                ChunkRead::Corrupt(e) => {
                    tracing::warn!(session_uid = %session_uid, chunk_id, error = %e, "Skipping unreadable chunk during export");
                    report.skipped.push(SkippedChunk {
                        chunk_id,
                        reason: SkipReason::Undecodable(e.to_string()),
                    });
                }
            }
        }

        tracing::debug!(
            session_uid = %session_uid,
            records = report.records.len(),
            skipped = report.skipped.len(),
            "Export finished"
        );

        Ok(report)
    }

    /// Every readable record of a session in append order
    pub fn get_all_logs(&self, session_uid: &str) -> Vec<LogRecord> {
        match self.export_session(session_uid) {
            Ok(report) => report.records,
            Err(e) => {
                tracing::warn!(session_uid = %session_uid, error = %e, "Export failed");
                Vec::new()
            }
        }
    }

    /// Remove a session's chunks and index; a no-op for unknown sessions
    ///
    /// A session whose index cannot be decoded is cleared by scanning for its
    /// chunk keys instead, which is the way out of a corrupt index.
    pub fn clear_session(&self, session_uid: &str) -> SessionLogResult<()> {
        let chunk_ids: Vec<u64> = match self.read_index(session_uid) {
            Ok(None) => return Ok(()),
            Ok(Some(index)) => (0..=index.resolved_last_chunk_id(self.chunk_capacity())).collect(),
            Err(e) => {
                tracing::warn!(session_uid = %session_uid, error = %e, "Clearing session with corrupt index by key scan");
                self.store
                    .list_keys()
                    .iter()
                    .filter_map(|key| self.keys.chunk_id_from_key(session_uid, key))
                    .collect()
            }
        };

        for chunk_id in &chunk_ids {
            self.store
                .remove(&self.keys.chunk_key(session_uid, *chunk_id))?;
        }

        // Chunks past the indexed range are left by failed index writes
        let mut removed = chunk_ids.len();
        if let Some(last) = chunk_ids.iter().max() {
            let mut chunk_id = last + 1;
            loop {
                let key = self.keys.chunk_key(session_uid, chunk_id);
                if !self.store.contains_key(&key) {
                    break;
                }
                self.store.remove(&key)?;
                removed += 1;
                chunk_id += 1;
            }
        }
        self.store.remove(&self.keys.index_key(session_uid))?;

        tracing::debug!(session_uid = %session_uid, chunks = removed, "Session cleared");
        Ok(())
    }

    /// Layout summary for one session; `Ok(None)` when it does not exist
    pub fn session_stats(&self, session_uid: &str) -> SessionLogResult<Option<SessionStats>> {
        Ok(self.read_index(session_uid)?.map(|index| {
            let last_chunk_id = index.resolved_last_chunk_id(self.chunk_capacity());
            SessionStats {
                total_count: index.total_count,
                last_chunk_id,
                chunk_count: if index.total_count == 0 { 0 } else { last_chunk_id + 1 },
                legacy_index: index.is_legacy(),
            }
        }))
    }
}
