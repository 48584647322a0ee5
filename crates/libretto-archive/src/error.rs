//! Errors raised while opening or expanding an archive.

use std::path::PathBuf;
use thiserror::Error;

/// Stable short error code (`E07xx` reserved for archive concerns).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    E0701,
    E0702,
    E0703,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::E0701 => "E0701",
            Self::E0702 => "E0702",
            Self::E0703 => "E0703",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors an [`crate::ArchiveDriver`] can fail with.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The archive's extension is not one any driver recognizes.
    #[error("[{}] unrecognized archive format: {path}", ErrorCode::E0701)]
    UnknownFormat { path: PathBuf },

    /// The archive could not be decoded (corrupt, truncated, wrong format).
    #[error("[{}] failed to decode archive {path}: {message}", ErrorCode::E0702)]
    Invalid { path: PathBuf, message: String },

    /// IO error reading the archive or writing an expanded member.
    #[error("[{}] io error at {path}: {source}", ErrorCode::E0703)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ArchiveError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownFormat { .. } => ErrorCode::E0701,
            Self::Invalid { .. } => ErrorCode::E0702,
            Self::Io { .. } => ErrorCode::E0703,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
