/*!
 * Error types for the hbrip application.
 *
 * This module contains custom error types for the different stages of a rip,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while interpreting scan output
#[derive(Error, Debug)]
pub enum ScanError {
    /// No title header was recognized in the scan output.
    ///
    /// This is advisory: the caller decides whether an empty source is actionable.
    #[error("Scan output for {path:?} contains no titles ({lines} lines read)")]
    MalformedScanOutput {
        /// The scanned source
        path: PathBuf,
        /// Number of lines that were read
        lines: usize,
    },

    /// The engine could not produce scan output
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Errors raised when talking to the transcoding engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine process could not be started
    #[error("Failed to execute {binary}: {source}")]
    Spawn {
        /// Binary that was invoked
        binary: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The engine was started but produced nothing usable
    #[error("Engine produced no output for {0:?}")]
    EmptyOutput(PathBuf),
}

/// Errors that can occur while assembling an encode job
#[derive(Error, Debug, PartialEq, Eq)]
pub enum JobError {
    /// The output extension is not one of mp4, m4v or mkv
    #[error("Unsupported output container: {0:?} (expected .mp4, .m4v or .mkv)")]
    UnsupportedContainer(String),

    /// The configured x264 preset is not in the preset table
    #[error("Unknown x264 preset: {0}")]
    UnknownX264Preset(String),
}

/// Errors that can occur around a single title encode
#[derive(Error, Debug)]
pub enum EncodeError {
    /// The output file (or a sibling with the same stem) already exists
    #[error("Output already exists: {0:?}")]
    OutputAlreadyExists(PathBuf),

    /// The engine left an output that is too small to be a real encode
    #[error("Output {path:?} is only {size} bytes (minimum {minimum})")]
    UndersizedOutput {
        /// Output file that was removed
        path: PathBuf,
        /// Observed size in bytes
        size: u64,
        /// Threshold in bytes
        minimum: u64,
    },

    /// Error from the engine
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Filesystem error around the encode
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from scan interpretation
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    /// Error from job assembly
    #[error("Job error: {0}")]
    Job(#[from] JobError),

    /// Error from an encode
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
