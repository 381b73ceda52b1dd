//! Key naming for session indexes and chunks
//!
//! ```text
//! <prefix><session_uid>_index          -> {"totalCount": n, "lastChunkId": n}
//! <prefix><session_uid>_chunk_<id>     -> [record, ...]
//! ```
//!
//! With the default prefix this matches data written by earlier releases.

pub const DEFAULT_KEY_PREFIX: &str = "synth_logs_";

const INDEX_SUFFIX: &str = "_index";
const CHUNK_INFIX: &str = "_chunk_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLayout {
    prefix: String,
}

impl Default for KeyLayout {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}

impl KeyLayout {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn index_key(&self, session_uid: &str) -> String {
        format!("{}{}{}", self.prefix, session_uid, INDEX_SUFFIX)
    }

    pub fn chunk_key(&self, session_uid: &str, chunk_id: u64) -> String {
        format!("{}{}{}{}", self.prefix, session_uid, CHUNK_INFIX, chunk_id)
    }

    /// Extract the session uid from an index key
    pub fn session_from_index_key<'a>(&self, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(self.prefix.as_str())?
            .strip_suffix(INDEX_SUFFIX)
    }

    /// Extract the chunk id from a chunk key belonging to `session_uid`
    ///
    /// Only an all-digit suffix counts, so the index key of a session whose uid
    /// happens to start with `<session_uid>_chunk_` is never mistaken for one
    /// of this session's chunks.
    pub fn chunk_id_from_key(&self, session_uid: &str, key: &str) -> Option<u64> {
        let suffix = key
            .strip_prefix(self.prefix.as_str())?
            .strip_prefix(session_uid)?
            .strip_prefix(CHUNK_INFIX)?;

        if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        suffix.parse().ok()
    }
}
