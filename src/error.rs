// src/error.rs

//! Error types shared by the pantry library

use thiserror::Error;

/// Errors raised by the recipe index, configuration loading, and the build harness
#[derive(Error, Debug)]
pub enum Error {
    /// I/O failure with context
    #[error("I/O error: {0}")]
    IoError(String),

    /// Raw I/O error without extra context
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed input (YAML, JSON, references, versions)
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Invalid or inconsistent harness configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A version range that should have been resolved before building
    #[error("Version range in {0} must have been resolved before building")]
    UnresolvedRange(String),

    /// Something that must exist could not be found
    #[error("Not found: {0}")]
    NotFound(String),

    /// An external command exited unsuccessfully
    #[error("Command `{command}` failed with exit code {code:?}")]
    CommandFailed { command: String, code: Option<i32> },

    /// An external program could not be started
    #[error("Failed to run {program}: {reason}")]
    SpawnFailed { program: String, reason: String },

    /// Build or search manifest did not have the expected shape
    #[error("Manifest error: {0}")]
    ManifestError(String),

    /// Windows shell environment is unusable for building
    #[error("Environment error: {0}")]
    EnvironmentError(String),
}

/// Result type for pantry operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::ParseError(format!("invalid YAML: {}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ParseError(format!("invalid JSON: {}", err))
    }
}
