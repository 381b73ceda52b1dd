//! Session log layout configuration

use crate::keys::DEFAULT_KEY_PREFIX;
use serde::{Deserialize, Serialize};

/// Records per chunk unless configured otherwise
pub const DEFAULT_CHUNK_CAPACITY: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Maximum number of records stored under one chunk key
    #[serde(default = "default_chunk_capacity")]
    pub chunk_capacity: usize,

    /// Prefix shared by every index and chunk key
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            chunk_capacity: default_chunk_capacity(),
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_chunk_capacity() -> usize {
    DEFAULT_CHUNK_CAPACITY
}

fn default_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_string()
}

impl LogConfig {
    /// Config with a custom chunk capacity and the default key prefix
    pub fn with_chunk_capacity(chunk_capacity: usize) -> Self {
        Self {
            chunk_capacity,
            ..Self::default()
        }
    }

    /// Validate the layout configuration
    ///
    /// The capacity must stay fixed for the lifetime of the stored data: page
    /// arithmetic assumes every chunk but the last holds exactly this many
    /// records.
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_capacity == 0 {
            return Err("chunk_capacity must be at least 1".to_string());
        }

        if self.key_prefix.is_empty() {
            return Err("key_prefix cannot be empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LogConfig::default();
        assert_eq!(config.chunk_capacity, 50);
        assert_eq!(config.key_prefix, "synth_logs_");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: LogConfig = serde_json::from_str(r#"{"chunk_capacity": 2}"#).unwrap();
        assert_eq!(config.chunk_capacity, 2);
        assert_eq!(config.key_prefix, "synth_logs_");

        let config: LogConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LogConfig::default());
    }

    #[test]
    fn test_validation() {
        assert!(LogConfig::with_chunk_capacity(0).validate().is_err());

        let config = LogConfig {
            chunk_capacity: 10,
            key_prefix: String::new(),
        };
        assert!(config.validate().is_err());
    }
}
