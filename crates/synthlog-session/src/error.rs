//! Error types for the session log

use crate::codec::DecodeError;
use std::fmt;
use synthlog_storage::StorageError;
use thiserror::Error;

/// Which of the two append writes failed
///
/// An append writes the chunk first and the index second. A failure in
/// [`AppendPhase::IndexWrite`] leaves the record durable in its chunk but not
/// counted by the index; the next successful append to the same session
/// reloads that chunk and carries on from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendPhase {
    ChunkWrite,
    IndexWrite,
}

impl fmt::Display for AppendPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppendPhase::ChunkWrite => f.write_str("chunk write"),
            AppendPhase::IndexWrite => f.write_str("index write"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionLogError {
    #[error("Append to session '{session_uid}' failed during {phase} of chunk {chunk_id}: {source}")]
    AppendFailed {
        session_uid: String,
        chunk_id: u64,
        phase: AppendPhase,
        #[source]
        source: StorageError,
    },

    #[error("Session '{session_uid}' has a corrupt index: {source}")]
    CorruptIndex {
        session_uid: String,
        #[source]
        source: DecodeError,
    },

    #[error("Session '{session_uid}' has a corrupt chunk {chunk_id}: {source}")]
    CorruptChunk {
        session_uid: String,
        chunk_id: u64,
        #[source]
        source: DecodeError,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Encoding error: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SessionLogError {
    /// True when the underlying store ran out of space
    pub fn is_capacity_exceeded(&self) -> bool {
        match self {
            SessionLogError::AppendFailed { source, .. } | SessionLogError::Storage(source) => {
                source.is_capacity_exceeded()
            }
            _ => false,
        }
    }

    /// The append phase that failed, if this is an append failure
    pub fn append_phase(&self) -> Option<AppendPhase> {
        match self {
            SessionLogError::AppendFailed { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

pub type SessionLogResult<T> = Result<T, SessionLogError>;
