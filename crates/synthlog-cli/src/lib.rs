//! Command-line access to chunked session logs stored in a file

pub mod commands;
pub mod config;

pub use commands::ExportFormat;
pub use config::{CliConfig, LoggingConfig, StoreSettings};
