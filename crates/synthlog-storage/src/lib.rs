//! SynthLog Storage Abstraction
//!
//! This crate provides the whole-value key-value stores the session log is
//! written to:
//! - `KeyValueStore` trait (synchronous get/set/remove/list)
//! - In-memory store with an optional byte quota
//! - File-backed store with atomic whole-file persistence
//! - Typed configuration loading from JSON, YAML or TOML

mod atomic_writer;
pub mod config;
pub mod file;
pub mod memory;
pub mod traits;

pub use config::{ConfigFile, ConfigFormat, ConfigValidator};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use traits::{KeyValueStore, Quota, StorageError, StorageResult};
