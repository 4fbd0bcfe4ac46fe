//! Configuration for the idexfan post-processor
//!
//! Supports JSON and TOML files. The default location is
//! `<config dir>/idexfan/config.toml`.
//!
//! Configuration is organized into sections:
//! - Fan settings (channels that are never rebound)
//! - Output settings (processed-file marker, progress reporting)

use idexfan_core::{DEFAULT_EXCLUDED_FAN_INDEXES, DEFAULT_MARKER, DEFAULT_PROGRESS_STEP_PERCENT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult, SettingsResult};

/// Fan settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanSettings {
    /// Fan indexes whose commands are never rebound to the active tool
    pub excluded_indexes: BTreeSet<u32>,
}

impl Default for FanSettings {
    fn default() -> Self {
        Self {
            excluded_indexes: DEFAULT_EXCLUDED_FAN_INDEXES.iter().copied().collect(),
        }
    }
}

/// Output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Comment line written at the top of processed files
    pub marker: String,
    /// Log progress each time this percentage of the input is consumed
    pub progress_step_percent: u8,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            progress_step_percent: DEFAULT_PROGRESS_STEP_PERCENT,
        }
    }
}

/// Complete post-processor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Fan settings
    pub fan: FanSettings,
    /// Output settings
    pub output: OutputSettings,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location
    pub fn default_path() -> ConfigResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("idexfan").join("config.toml"))
            .ok_or_else(|| ConfigError::UnsupportedPlatform(std::env::consts::OS.to_string()))
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = Format::from_path(path)?;
        let content = std::fs::read_to_string(path)?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;
        let format = Format::from_path(path)?;

        let content = match format {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let marker = &self.output.marker;
        if marker.is_empty() {
            return Err(invalid("output.marker", "must not be empty"));
        }
        // must be a comment so firmware ignores it
        if !marker.starts_with(';') {
            return Err(invalid("output.marker", "must start with ';'"));
        }
        if marker.contains(['\n', '\r']) {
            return Err(invalid("output.marker", "must be a single line"));
        }

        if !(1..=100).contains(&self.output.progress_step_percent) {
            return Err(invalid(
                "output.progress_step_percent",
                "must be between 1 and 100",
            ));
        }

        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidSetting {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

enum Format {
    Json,
    Toml,
}

impl Format {
    fn from_path(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}
