//! Chunk and index encoding
//!
//! Chunks are stored as JSON arrays of records and indexes as small JSON
//! objects. Decoding never panics; malformed values come back as a
//! [`DecodeError`] so each caller can decide whether to skip or abort.

use crate::record::LogRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// What was being decoded when a [`DecodeError`] occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Chunk,
    Index,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Chunk => f.write_str("chunk"),
            ValueKind::Index => f.write_str("index"),
        }
    }
}

#[derive(Debug, Error)]
#[error("failed to decode {kind}: {source}")]
pub struct DecodeError {
    pub kind: ValueKind,
    #[source]
    pub source: serde_json::Error,
}

/// Per-session metadata stored under the index key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIndex {
    /// Records ever successfully appended
    pub total_count: u64,

    /// Chunk currently accepting appends
    ///
    /// Absent in indexes written before the field existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_chunk_id: Option<u64>,
}

impl SessionIndex {
    pub fn new(total_count: u64, last_chunk_id: u64) -> Self {
        Self {
            total_count,
            last_chunk_id: Some(last_chunk_id),
        }
    }

    /// True when `last_chunk_id` has to be derived from the count
    pub fn is_legacy(&self) -> bool {
        self.last_chunk_id.is_none()
    }

    /// The stored `last_chunk_id`, or the one implied by `total_count`
    pub fn resolved_last_chunk_id(&self, chunk_capacity: u64) -> u64 {
        match self.last_chunk_id {
            Some(id) => id,
            None if self.total_count > 0 => (self.total_count - 1) / chunk_capacity.max(1),
            None => 0,
        }
    }
}

pub fn encode_chunk(records: &[LogRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string(records)
}

pub fn decode_chunk(value: &str) -> Result<Vec<LogRecord>, DecodeError> {
    serde_json::from_str(value).map_err(|source| DecodeError {
        kind: ValueKind::Chunk,
        source,
    })
}

pub fn encode_index(index: &SessionIndex) -> Result<String, serde_json::Error> {
    serde_json::to_string(index)
}

pub fn decode_index(value: &str) -> Result<SessionIndex, DecodeError> {
    serde_json::from_str(value).map_err(|source| DecodeError {
        kind: ValueKind::Index,
        source,
    })
}
