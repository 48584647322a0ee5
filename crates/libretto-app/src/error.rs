//! Errors raised while scanning an application's root and its installed
//! modules.

use std::path::PathBuf;
use thiserror::Error;

/// Stable short error code, following the `libretto-core` numbering scheme
/// (`E02xx` reserved for the application view).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    E0201,
    E0202,
    E0203,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::E0201 => "E0201",
            Self::E0202 => "E0202",
            Self::E0203 => "E0203",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors from scanning or re-initializing application state.
#[derive(Error, Debug)]
pub enum AppError {
    /// The root manifest (`package.json`) is missing or invalid.
    #[error("[{}] invalid application manifest at {path}: {source}", ErrorCode::E0201)]
    InvalidManifest {
        path: PathBuf,
        #[source]
        source: libretto_core::Error,
    },

    /// Two installed module directories resolved to the same package name.
    #[error("[{}] duplicate installed package `{name}`: found at both {first} and {second}", ErrorCode::E0202)]
    DuplicateInstalled {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// IO error scanning the root or `modules/` directory.
    #[error("[{}] io error at {path}: {source}", ErrorCode::E0203)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidManifest { .. } => ErrorCode::E0201,
            Self::DuplicateInstalled { .. } => ErrorCode::E0202,
            Self::Io { .. } => ErrorCode::E0203,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
