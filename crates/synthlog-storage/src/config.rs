//! File-based configuration loading

use crate::atomic_writer::replace_file;
use crate::traits::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Trait for validating configuration values
pub trait ConfigValidator<T> {
    /// Validate a configuration value
    fn validate(&self, config: &T) -> Result<(), String>;
}

impl<T, F> ConfigValidator<T> for F
where
    F: Fn(&T) -> Result<(), String>,
{
    fn validate(&self, config: &T) -> Result<(), String> {
        self(config)
    }
}

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// TOML format
    Toml,
}

impl ConfigFormat {
    /// Detect config format from file extension
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            Some("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

/// A configuration file whose format follows its extension
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
    format: ConfigFormat,
}

impl ConfigFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let format = ConfigFormat::detect(&path);
        Self { path, format }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> ConfigFormat {
        self.format
    }

    /// Load and parse the file
    pub fn load<T>(&self) -> StorageResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let content = self.read_file()?;
        self.parse(&content)
    }

    /// Load, then reject values the validator refuses
    pub fn load_validated<T, V>(&self, validator: &V) -> StorageResult<T>
    where
        T: for<'de> Deserialize<'de>,
        V: ConfigValidator<T>,
    {
        let config: T = self.load()?;
        validator
            .validate(&config)
            .map_err(|e| StorageError::Config(format!("Validation failed: {}", e)))?;
        Ok(config)
    }

    /// Serialize and write the file atomically
    pub fn save<T>(&self, config: &T) -> StorageResult<()>
    where
        T: Serialize,
    {
        let content = self.serialize(config)?;
        replace_file(&self.path, content.as_bytes())
    }

    fn read_file(&self) -> StorageResult<String> {
        std::fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(self.path.display().to_string())
            } else {
                StorageError::Io(e)
            }
        })
    }

    fn parse<T>(&self, content: &str) -> StorageResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        match self.format {
            ConfigFormat::Json => serde_json::from_str(content)
                .map_err(|e| StorageError::Config(format!("JSON parse error: {}", e))),
            ConfigFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| StorageError::Config(format!("YAML parse error: {}", e))),
            ConfigFormat::Toml => toml::from_str(content)
                .map_err(|e| StorageError::Config(format!("TOML parse error: {}", e))),
        }
    }

    fn serialize<T>(&self, value: &T) -> StorageResult<String>
    where
        T: Serialize,
    {
        match self.format {
            ConfigFormat::Json => serde_json::to_string_pretty(value)
                .map_err(|e| StorageError::Serialization(format!("JSON serialize error: {}", e))),
            ConfigFormat::Yaml => serde_yaml::to_string(value)
                .map_err(|e| StorageError::Serialization(format!("YAML serialize error: {}", e))),
            ConfigFormat::Toml => toml::to_string_pretty(value)
                .map_err(|e| StorageError::Serialization(format!("TOML serialize error: {}", e))),
        }
    }
}
