//! State map configuration
//!
//! Loaded from a JSON file. Every field has a default, so `{}` is a valid
//! configuration for an in-memory map; `data_dir` is only required to open
//! a durable map.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::observability::{LogTarget, Logger, Severity};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Read { .. } => "TXSTATE_CONFIG_READ_FAILED",
            Self::Parse(_) => "TXSTATE_CONFIG_PARSE_FAILED",
            Self::Invalid(_) => "TXSTATE_CONFIG_INVALID",
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateConfig {
    /// Directory holding the durable store (required for durable maps)
    #[serde(default)]
    pub data_dir: Option<String>,

    /// fsync after every batch append (default: true)
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,

    /// Type tag written into every stored envelope (default: "value")
    #[serde(default = "default_value_tag")]
    pub value_tag: String,

    /// Minimum log severity: trace, info, warn, error, fatal (default: "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log destination: stdout, stderr, none (default: "stderr")
    #[serde(default = "default_log_target")]
    pub log_target: String,

    /// Partition label carried by every log line (default: random UUID)
    #[serde(default)]
    pub partition: Option<String>,
}

fn default_sync_writes() -> bool {
    true
}
fn default_value_tag() -> String {
    "value".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_target() -> String {
    "stderr".to_string()
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            sync_writes: default_sync_writes(),
            value_tag: default_value_tag(),
            log_level: default_log_level(),
            log_target: default_log_target(),
            partition: None,
        }
    }
}

impl StateConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration JSON
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: StateConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the data directory
    pub fn with_data_dir(mut self, data_dir: impl Into<String>) -> Self {
        self.data_dir = Some(data_dir.into());
        self
    }

    /// Set the partition label
    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = Some(partition.into());
        self
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.value_tag.trim().is_empty() {
            return Err(ConfigError::Invalid("value_tag must not be empty".into()));
        }
        if let Some(dir) = &self.data_dir {
            if dir.trim().is_empty() {
                return Err(ConfigError::Invalid("data_dir must not be empty".into()));
            }
        }
        self.severity()?;
        self.target()?;
        Ok(())
    }

    /// Data directory as a path, if configured
    pub fn data_path(&self) -> Option<&Path> {
        self.data_dir.as_deref().map(Path::new)
    }

    fn severity(&self) -> ConfigResult<Severity> {
        self.log_level.parse().map_err(ConfigError::Invalid)
    }

    fn target(&self) -> ConfigResult<LogTarget> {
        self.log_target.parse().map_err(ConfigError::Invalid)
    }

    /// Build the logger described by this configuration
    pub fn logger(&self) -> ConfigResult<Logger> {
        Ok(Logger::new(self.severity()?, self.target()?))
    }

    /// Configured partition label, or a fresh UUID
    pub fn partition_label(&self) -> String {
        self.partition
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = StateConfig::from_json("{}").unwrap();
        assert_eq!(config, StateConfig::default());
        assert!(config.sync_writes);
        assert_eq!(config.value_tag, "value");
        assert!(config.data_path().is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("txstate.json");
        fs::write(
            &path,
            r#"{"data_dir": "/var/lib/txstate", "sync_writes": false, "value_tag": "counter",
                "log_level": "warn", "log_target": "none", "partition": "p-3"}"#,
        )
        .unwrap();

        let config = StateConfig::load(&path).unwrap();
        assert_eq!(config.data_path(), Some(Path::new("/var/lib/txstate")));
        assert!(!config.sync_writes);
        assert_eq!(config.value_tag, "counter");
        assert_eq!(config.partition_label(), "p-3");
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let err = StateConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.code(), "TXSTATE_CONFIG_READ_FAILED");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            StateConfig::from_json(r#"{"log_level": "chatty"}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            StateConfig::from_json(r#"{"log_target": "syslog"}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            StateConfig::from_json(r#"{"value_tag": " "}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            StateConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_partition_defaults_to_uuid() {
        let label = StateConfig::default().partition_label();
        assert!(Uuid::parse_str(&label).is_ok());
    }
}
