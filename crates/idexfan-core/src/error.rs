//! Error handling for idexfan
//!
//! Provides the error types for every layer of the post-processor:
//! - Rewrite errors (inconsistent G-code input seen by the engine)
//! - File errors (reading the source, writing the destination)
//!
//! All error types use `thiserror` for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

/// Rewrite error type
///
/// Raised by the line rewriting engine when the input stream cannot be
/// transformed without guessing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewriteError {
    /// A fan command that must be bound to a tool appeared before any tool select
    #[error("Fan command at line {line_number} has no active tool to bind to: {line}")]
    UnboundFanCommand {
        /// The 1-based line number of the offending command.
        line_number: u64,
        /// The offending line, without its line terminator.
        line: String,
    },
}

impl RewriteError {
    /// Line number the error refers to
    pub fn line_number(&self) -> u64 {
        match self {
            Self::UnboundFanCommand { line_number, .. } => *line_number,
        }
    }
}

/// File error type
///
/// Represents failures of the file driver, always naming the path involved.
#[derive(Error, Debug)]
pub enum FileError {
    /// The source file could not be opened or read
    #[error("Failed to read {path}: {source}")]
    SourceUnreadable {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The destination could not be written or replaced
    #[error("Failed to write {path}: {source}")]
    DestinationUnwritable {
        /// The file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Main error type for idexfan
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Rewrite error
    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    /// File error
    #[error(transparent)]
    File(#[from] FileError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this is a rewrite error
    pub fn is_rewrite_error(&self) -> bool {
        matches!(self, Error::Rewrite(_))
    }

    /// Check if this is an I/O level error
    pub fn is_io_error(&self) -> bool {
        matches!(self, Error::File(_) | Error::Io(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
