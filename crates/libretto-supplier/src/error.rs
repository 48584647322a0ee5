//! Errors raised by a [`crate::Supplier`] implementation.

use libretto_core::Constraint;
use std::path::PathBuf;
use thiserror::Error;

/// Stable short error code (`E06xx` reserved for supplier concerns).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    E0601,
    E0602,
    E0603,
    E0604,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::E0601 => "E0601",
            Self::E0602 => "E0602",
            Self::E0603 => "E0603",
            Self::E0604 => "E0604",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors a [`crate::Supplier`] call can fail with.
#[derive(Error, Debug)]
pub enum SupplierError {
    /// No version satisfying `constraint` was offered for `name`.
    #[error("[{}] no version of `{name}` satisfies `{constraint}`", ErrorCode::E0601)]
    NotFound { name: String, constraint: Constraint },

    /// A transport-level failure talking to a registry.
    #[error("[{}] network error fetching `{name}`: {message}", ErrorCode::E0602)]
    NetworkError { name: String, message: String },

    /// A local filesystem error reading a repository tree.
    #[error("[{}] io error at {path}: {source}", ErrorCode::E0603)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A manifest returned by the supplier failed to parse.
    #[error("[{}] invalid manifest from supplier for `{name}`: {source}", ErrorCode::E0604)]
    InvalidManifest {
        name: String,
        #[source]
        source: libretto_core::Error,
    },
}

impl SupplierError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::E0601,
            Self::NetworkError { .. } => ErrorCode::E0602,
            Self::Io { .. } => ErrorCode::E0603,
            Self::InvalidManifest { .. } => ErrorCode::E0604,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, SupplierError>;
