//! Configuration types for apib-recorder

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{ApibError, Result};

/// Default maximum request body size
pub const DEFAULT_MAX_BODY_SIZE: usize = 16 * 1024 * 1024; // 16 MB

/// Recorder configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory blueprint files are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Maximum request body size accepted by the hyper adapter
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_body_size() -> usize {
    DEFAULT_MAX_BODY_SIZE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_body_size: default_max_body_size(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ApibError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ApibError::ConfigError(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(ApibError::ConfigError(
                "output_dir cannot be empty".to_string(),
            ));
        }

        if !self.output_dir.is_dir() {
            return Err(ApibError::ConfigError(format!(
                "Output directory does not exist: {}",
                self.output_dir.display()
            )));
        }

        if self.max_body_size == 0 {
            return Err(ApibError::ConfigError(
                "max_body_size must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
