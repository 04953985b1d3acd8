//! Configuration for the Synheart Barometer.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Main configuration for the barometer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Explicit data directory; takes precedence over the candidates
    pub data_dir: Option<PathBuf>,

    /// Directory the candidates are resolved against
    pub base_dir: PathBuf,

    /// Data directory names tried in order
    pub data_dir_candidates: Vec<String>,

    /// Address the HTTP server binds to
    pub bind_address: String,

    /// Port for the HTTP server
    pub port: u16,

    /// Preview size when a request does not give one
    pub default_sample_size: usize,

    /// Window size for history when a request does not give one
    pub default_window_size: usize,

    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            base_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            data_dir_candidates: vec!["S2".to_string(), "S3".to_string()],
            bind_address: "127.0.0.1".to_string(),
            port: 5000,
            default_sample_size: crate::core::DEFAULT_SAMPLE_SIZE,
            default_window_size: crate::core::DEFAULT_WINDOW_SIZE,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to a specific file.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Update one setting from its text form.
    ///
    /// `data_dir` is cleared by an empty value or `auto`;
    /// `data_dir_candidates` takes a comma-separated list.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        let value = value.trim();

        match key {
            "data_dir" => {
                self.data_dir = match value {
                    "" | "auto" => None,
                    dir => Some(PathBuf::from(dir)),
                }
            }
            "base_dir" if !value.is_empty() => self.base_dir = PathBuf::from(value),
            "data_dir_candidates" => {
                self.data_dir_candidates = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect();
            }
            "bind_address" if !value.is_empty() => self.bind_address = value.to_string(),
            "port" => self.port = value.parse().map_err(|_| invalid())?,
            "default_sample_size" => self.default_sample_size = value.parse().map_err(|_| invalid())?,
            "default_window_size" => self.default_window_size = value.parse().map_err(|_| invalid())?,
            "log_level" if !value.is_empty() => self.log_level = value.to_string(),
            "base_dir" | "bind_address" | "log_level" => return Err(invalid()),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("synheart-barometer")
            .join("config.json")
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown setting: {0}")]
    UnknownKey(String),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}
