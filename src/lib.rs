//! # idexfan
//!
//! A G-code post-processor for independent dual-extruder (IDEX) printers.
//! Slicers often emit `M106` fan commands without saying which toolhead they
//! are for; idexfan tracks the active tool and binds every fan command to it.
//!
//! ## Architecture
//!
//! 1. **idexfan-core** - Error types and shared defaults
//! 2. **idexfan-gcode** - Line processors, pipeline and file driver
//! 3. **idexfan-settings** - Configuration files
//! 4. **idexfan** - Command-line binary that wires the crates together

pub use idexfan_core::{Error, FileError, Result, RewriteError};

pub use idexfan_gcode::{
    rewrite_file, FanRewriter, GcodeLine, LineProcessor, ProcessorHandle, ProcessorPipeline,
    RewriteSession, RewriterState, SessionSummary, ToolTracker,
};

pub use idexfan_settings::{Config, FanSettings, OutputSettings, SettingsError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output on stdout, or on stderr when `stdout_reserved` is set so
///   machine-readable output on stdout stays clean
/// - RUST_LOG environment variable support (defaults to `info`)
pub fn init_logging(stdout_reserved: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::fmt::writer::BoxMakeWriter;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let writer = if stdout_reserved {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };

    let fmt_layer = fmt::layer()
        .with_writer(writer)
        .with_target(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Build the standard pipeline for `config`
pub fn pipeline_for(config: &Config) -> ProcessorPipeline {
    ProcessorPipeline::idex_fan(config.fan.excluded_indexes.iter().copied())
}
