//! Error types shared by the data-model layer: manifests, versions,
//! constraints and journals.
//!
//! Each variant carries a stable short code (e.g. `E0401`) so the message can
//! be searched for independently of its prose, following the numbering
//! scheme used across the other `libretto-*` crates (`E01xx` package, `E04xx`
//! manifest, `E05xx` io).

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Stable error code for a [`Error`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid package name format.
    E0104,
    /// Invalid version string.
    E0405,
    /// Invalid version constraint format.
    E0404,
    /// Invalid manifest (missing/invalid `package.json`).
    E0401,
    /// Invalid JSON syntax.
    E0403,
    /// Malformed journal.
    E0406,
    /// IO error.
    E0501,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::E0104 => "E0104",
            Self::E0405 => "E0405",
            Self::E0404 => "E0404",
            Self::E0401 => "E0401",
            Self::E0403 => "E0403",
            Self::E0406 => "E0406",
            Self::E0501 => "E0501",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors produced by the core data-model: version/constraint parsing,
/// manifest (de)serialization and journal (de)serialization.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid package name.
    #[error("[{}] invalid package name: {name}", ErrorCode::E0104)]
    InvalidPackageName {
        /// The offending name.
        name: String,
    },

    /// Invalid version string (not `head` and not a parseable numeric triple).
    #[error("[{}] invalid version: {raw}", ErrorCode::E0405)]
    InvalidVersion {
        /// The raw string that failed to parse.
        raw: String,
    },

    /// Invalid constraint grammar (`op ws? version`, or `*`).
    #[error("[{}] invalid constraint: {raw}", ErrorCode::E0404)]
    InvalidConstraint {
        /// The raw string that failed to parse.
        raw: String,
    },

    /// `package.json` missing a required field or otherwise malformed.
    #[error("[{}] invalid manifest at {path}: {message}", ErrorCode::E0401)]
    InvalidManifest {
        /// Path to the manifest.
        path: PathBuf,
        /// What was wrong with it.
        message: String,
    },

    /// Journal present but does not parse, or does not end in the sealing
    /// `journal.json` entry.
    #[error("[{}] malformed journal at {path}: {message}", ErrorCode::E0406)]
    MalformedJournal {
        /// Path to the journal file.
        path: PathBuf,
        /// What was wrong with it.
        message: String,
    },

    /// JSON syntax error.
    #[error("[{}] json error: {0}", ErrorCode::E0403)]
    Json(#[from] sonic_rs::Error),

    /// Filesystem IO error.
    #[error("[{}] io error at {path}: {source}", ErrorCode::E0501)]
    Io {
        /// Path the IO was attempted against.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Get the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidPackageName { .. } => ErrorCode::E0104,
            Self::InvalidVersion { .. } => ErrorCode::E0405,
            Self::InvalidConstraint { .. } => ErrorCode::E0404,
            Self::InvalidManifest { .. } => ErrorCode::E0401,
            Self::MalformedJournal { .. } => ErrorCode::E0406,
            Self::Json(_) => ErrorCode::E0403,
            Self::Io { .. } => ErrorCode::E0501,
        }
    }

    /// Wrap an [`std::io::Error`] with the path it occurred at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias for core results.
pub type Result<T> = std::result::Result<T, Error>;
