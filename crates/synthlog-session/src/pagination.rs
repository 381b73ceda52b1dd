//! Newest-first paged reads
//!
//! Records are stored oldest first, so page `p` of size `k` covers the
//! logical range `[end - k, end)` with `end = total - (p - 1) * k`, walked
//! backwards.

use crate::log::{ChunkRead, ChunkedLog};
use crate::record::LogRecord;
use std::ops::Range;
use synthlog_storage::KeyValueStore;

/// Logical oldest-first positions covered by one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Inclusive lower bound
    pub start: u64,
    /// Exclusive upper bound
    pub end: u64,
}

impl PageWindow {
    /// Window for 1-indexed `page`; `None` when the page holds no records
    pub fn new(total: u64, page: u64, page_size: u64) -> Option<Self> {
        if page == 0 || page_size == 0 {
            return None;
        }

        let skipped = (page - 1).checked_mul(page_size)?;
        let end = total.checked_sub(skipped)?;
        if end == 0 {
            return None;
        }

        Some(Self {
            start: end.saturating_sub(page_size),
            end,
        })
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<u64> {
        self.start..self.end
    }

    /// Positions in the order they are returned
    pub fn newest_first(&self) -> impl Iterator<Item = u64> {
        self.range().rev()
    }
}

impl<S: KeyValueStore> ChunkedLog<S> {
    /// One page of a session, newest record first
    ///
    /// Pages are 1-indexed. A page past the end, page 0, or a zero page size
    /// yields an empty page. Chunks or offsets that have gone missing are
    /// skipped, so a page may come back short while the store is being
    /// cleared underneath it.
    pub fn get_logs(&self, session_uid: &str, page: u64, page_size: u64) -> Vec<LogRecord> {
        let total = self.total_count(session_uid);
        let Some(window) = PageWindow::new(total, page, page_size) else {
            return Vec::new();
        };

        let capacity = self.chunk_capacity();
        let mut results = Vec::with_capacity(window.len() as usize);
        // The walk is monotonic, so each chunk is loaded once
        let mut current: Option<(u64, Option<Vec<LogRecord>>)> = None;

        for position in window.newest_first() {
            let chunk_id = position / capacity;
            let offset = (position % capacity) as usize;

            if current.as_ref().map(|(id, _)| *id) != Some(chunk_id) {
                let records = match self.read_chunk(session_uid, chunk_id) {
                    ChunkRead::Loaded(records) => Some(records),
                    ChunkRead::Missing => None,
                    ChunkRead::Corrupt(e) => {
                        tracing::debug!(session_uid = %session_uid, chunk_id, error = %e, "Skipping unreadable chunk in page");
                        None
                    }
                };
                current = Some((chunk_id, records));
            }

            if let Some((_, Some(records))) = &current
                && let Some(record) = records.get(offset)
            {
                results.push(record.clone());
            }
        }

        results
    }
}
