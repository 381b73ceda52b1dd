//! CLI configuration
//!
//! Values come from an optional config file (JSON, YAML or TOML), then
//! `SYNTHLOG_*` environment variables, then command-line flags.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use synthlog_session::LogConfig;
use synthlog_storage::{ConfigFile, Quota, StorageResult};
use tracing::Level;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub store: StoreSettings,

    /// Chunk layout; must match whatever wrote the store
    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Store file, `~` is expanded
    #[serde(default = "default_store_path")]
    pub path: String,

    /// Byte quota across all keys and values
    #[serde(default)]
    pub capacity_bytes: Option<usize>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            capacity_bytes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_store_path() -> String {
    "~/.synthlog/store.json".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl CliConfig {
    /// Load configuration from a file, format chosen by extension
    pub fn from_file(path: impl AsRef<Path>) -> StorageResult<Self> {
        ConfigFile::new(path).load_validated::<Self, _>(&Self::validate)
    }

    /// Override settings from environment variables
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("SYNTHLOG_STORE") {
            self.store.path = val;
        }

        if let Ok(val) = std::env::var("SYNTHLOG_CHUNK_CAPACITY") {
            match val.parse::<usize>() {
                Ok(capacity) => self.log.chunk_capacity = capacity,
                Err(_) => eprintln!(
                    "Warning: Invalid SYNTHLOG_CHUNK_CAPACITY '{}', keeping {}",
                    val, self.log.chunk_capacity
                ),
            }
        }

        if let Ok(val) = std::env::var("SYNTHLOG_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.log.validate()?;

        if self.store.path.trim().is_empty() {
            return Err("store.path cannot be empty".to_string());
        }

        if self.store.capacity_bytes == Some(0) {
            return Err("store.capacity_bytes must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Store path with `~` expanded
    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.store.path).as_ref())
    }

    pub fn quota(&self) -> Quota {
        match self.store.capacity_bytes {
            Some(limit) => Quota::bytes(limit),
            None => Quota::unlimited(),
        }
    }

    /// Configured log level; unknown names fall back to `warn`
    pub fn log_level(&self) -> Level {
        match self.logging.level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" | "warning" => Level::WARN,
            "error" => Level::ERROR,
            _ => {
                eprintln!(
                    "Warning: Unknown log level '{}', using warn",
                    self.logging.level
                );
                Level::WARN
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn clear_env() {
        unsafe {
            std::env::remove_var("SYNTHLOG_STORE");
            std::env::remove_var("SYNTHLOG_CHUNK_CAPACITY");
            std::env::remove_var("SYNTHLOG_LOG_LEVEL");
        }
    }

    #[test]
    fn test_defaults() {
        let config = CliConfig::default();
        assert_eq!(config.store.path, "~/.synthlog/store.json");
        assert_eq!(config.store.capacity_bytes, None);
        assert_eq!(config.log, LogConfig::default());
        assert_eq!(config.log_level(), Level::WARN);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml_with_partial_sections() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("synthlog.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "store:\n  path: /tmp/logs.json\n  capacity_bytes: 5242880").unwrap();
        writeln!(file, "log:\n  chunk_capacity: 20").unwrap();

        let config = CliConfig::from_file(&path).unwrap();
        assert_eq!(config.store.path, "/tmp/logs.json");
        assert_eq!(config.quota().limit(), Some(5_242_880));
        assert_eq!(config.log.chunk_capacity, 20);
        assert_eq!(config.log.key_prefix, "synth_logs_");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("synthlog.toml");
        std::fs::write(
            &path,
            "[store]\npath = \"store.json\"\n\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();

        let config = CliConfig::from_file(&path).unwrap();
        assert_eq!(config.store_path(), PathBuf::from("store.json"));
        assert_eq!(config.log_level(), Level::DEBUG);
    }

    #[test]
    fn test_from_file_rejects_invalid_layout() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("synthlog.json");
        std::fs::write(&path, r#"{"log": {"chunk_capacity": 0}}"#).unwrap();

        let err = CliConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("chunk_capacity"));
    }

    #[test]
    fn test_validate_rejects_zero_quota() {
        let mut config = CliConfig::default();
        config.store.capacity_bytes = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_store_path_expands_tilde() {
        let config = CliConfig::default();
        assert!(config.store_path().ends_with(".synthlog/store.json"));

        let mut absolute = CliConfig::default();
        absolute.store.path = "/srv/store.json".to_string();
        assert_eq!(absolute.store_path(), PathBuf::from("/srv/store.json"));
    }

    #[test]
    #[serial_test::serial]
    fn test_merge_env_overrides() {
        clear_env();
        unsafe {
            std::env::set_var("SYNTHLOG_STORE", "/var/lib/synthlog.json");
            std::env::set_var("SYNTHLOG_CHUNK_CAPACITY", "10");
            std::env::set_var("SYNTHLOG_LOG_LEVEL", "trace");
        }

        let mut config = CliConfig::default();
        config.merge_env();
        clear_env();

        assert_eq!(config.store.path, "/var/lib/synthlog.json");
        assert_eq!(config.log.chunk_capacity, 10);
        assert_eq!(config.log_level(), Level::TRACE);
    }

    #[test]
    #[serial_test::serial]
    fn test_merge_env_ignores_bad_capacity() {
        clear_env();
        unsafe {
            std::env::set_var("SYNTHLOG_CHUNK_CAPACITY", "lots");
        }

        let mut config = CliConfig::default();
        config.merge_env();
        clear_env();

        assert_eq!(config.log.chunk_capacity, 50);
        assert_eq!(config.store.path, default_store_path());
    }
}
