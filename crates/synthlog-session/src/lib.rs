//! SynthLog Session Log
//!
//! Per-session append-only logs stored in a whole-value key-value store:
//! - Chunked append with a small per-session index
//! - Newest-first pagination over the oldest-first chunk layout
//! - Point updates by record id
//! - Best-effort full export with a report of unreadable chunks
//! - Session discovery by key scan

pub mod codec;
pub mod config;
pub mod directory;
pub mod error;
pub mod keys;
pub mod locks;
pub mod log;
pub mod pagination;
pub mod record;

pub use codec::{DecodeError, SessionIndex, ValueKind};
pub use config::{LogConfig, DEFAULT_CHUNK_CAPACITY};
pub use directory::{PrefixScanDirectory, SessionDirectory};
pub use error::{AppendPhase, SessionLogError, SessionLogResult};
pub use keys::{KeyLayout, DEFAULT_KEY_PREFIX};
pub use locks::{SerializedLog, SessionLocks};
pub use log::{AppendReceipt, ChunkedLog, ExportReport, SessionStats, SkipReason, SkippedChunk};
pub use pagination::PageWindow;
pub use record::{LogRecord, RecordId};
