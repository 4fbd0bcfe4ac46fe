//! idexfan Settings Crate
//!
//! Handles post-processor configuration: excluded fan channels, the
//! processed-file marker and progress reporting.

pub mod config;
pub mod error;

pub use config::{Config, FanSettings, OutputSettings};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
