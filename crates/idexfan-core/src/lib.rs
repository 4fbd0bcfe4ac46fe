//! # idexfan Core
//!
//! Error taxonomy and shared constants used by the rewriting engine,
//! the settings layer and the command-line driver.

pub mod constants;
pub mod error;

pub use constants::{DEFAULT_EXCLUDED_FAN_INDEXES, DEFAULT_MARKER, DEFAULT_PROGRESS_STEP_PERCENT};
pub use error::{Error, FileError, Result, RewriteError};
