//! Error types for configuration loading.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration error type with rich diagnostics.
#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    /// Configuration file present but not valid JSON.
    #[error("invalid JSON in {path}: {message}")]
    #[diagnostic(code(config::invalid_json), help("check JSON syntax near the reported position"))]
    InvalidJson {
        path: PathBuf,
        message: String,
    },

    /// A numeric field was outside its accepted range.
    #[error("value for '{field}' out of range: {value} (must be {min}..{max})")]
    #[diagnostic(code(config::out_of_range))]
    OutOfRange {
        field: String,
        value: String,
        min: String,
        max: String,
    },

    /// The application root does not exist or is not a directory.
    #[error("application root {path} does not exist or is not a directory")]
    #[diagnostic(code(config::invalid_root), help("pass the path to the application's root directory"))]
    InvalidRoot { path: PathBuf },

    /// An environment variable held a value that failed to parse.
    #[error("invalid environment variable {var}: {message}")]
    #[diagnostic(code(config::env_error))]
    EnvError { var: String, message: String },

    /// IO error reading a configuration file.
    #[error("IO error at {path}: {message}")]
    #[diagnostic(code(config::io_error))]
    Io { path: PathBuf, message: String },
}

impl ConfigError {
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io { path: path.into(), message: err.to_string() }
    }

    #[must_use]
    pub fn json(path: impl Into<PathBuf>, err: &sonic_rs::Error) -> Self {
        Self::InvalidJson { path: path.into(), message: err.to_string() }
    }

    #[must_use]
    pub fn out_of_range<T: std::fmt::Display>(field: impl Into<String>, value: T, min: T, max: T) -> Self {
        Self::OutOfRange {
            field: field.into(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }
}

impl From<ConfigError> for libretto_core::Error {
    fn from(err: ConfigError) -> Self {
        Self::InvalidManifest {
            path: PathBuf::new(),
            message: err.to_string(),
        }
    }
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
