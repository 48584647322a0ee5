//! Errors raised while installing or uninstalling a single package.

use std::path::PathBuf;
use thiserror::Error;

/// Stable short error code (`E09xx` install, `E10xx` uninstall).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    E0901,
    E0902,
    E0903,
    E0904,
    E0905,
    E1001,
    E1002,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::E0901 => "E0901",
            Self::E0902 => "E0902",
            Self::E0903 => "E0903",
            Self::E0904 => "E0904",
            Self::E0905 => "E0905",
            Self::E1001 => "E1001",
            Self::E1002 => "E1002",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors raised while installing a package.
#[derive(Error, Debug)]
pub enum InstallError {
    /// `<root>/modules/<name>` already exists.
    #[error("[{}] `{name}` is already installed at {path}", ErrorCode::E0901)]
    AlreadyInstalled { name: String, path: PathBuf },

    /// `<root>/temp/downloads/<name>.archive` already exists.
    #[error("[{}] temp download path already occupied: {path}", ErrorCode::E0902)]
    TempOccupied { path: PathBuf },

    /// The supplier failed to resolve a manifest or deliver the archive.
    #[error("[{}] supplier error installing `{name}`: {source}", ErrorCode::E0903)]
    Supplier {
        name: String,
        #[source]
        source: libretto_supplier::SupplierError,
    },

    /// The archive could not be opened or a member could not be expanded.
    #[error("[{}] archive error installing `{name}`: {source}", ErrorCode::E0903)]
    Archive {
        name: String,
        #[source]
        source: libretto_archive::ArchiveError,
    },

    /// A step 4/5 failure after materialization had already begun. The
    /// package directory is left partially populated with an unsealed
    /// journal on disk; the core performs no auto-rollback (§4.3). A
    /// subsequent [`crate::uninstall`] call can consume that partial
    /// journal to clean up.
    #[error(
        "[{}] install of `{name}` interrupted after {entries_written} journal entries: {source}",
        ErrorCode::E0904
    )]
    Interrupted {
        name: String,
        entries_written: usize,
        #[source]
        source: Box<InstallError>,
    },

    /// An archive member's path escapes the package directory (an absolute
    /// path or a `..` component) — rejected before any bytes are written.
    #[error("[{}] archive member path `{path}` for `{name}` escapes the package directory", ErrorCode::E0905)]
    UnsafeMemberPath { name: String, path: String },

    /// IO error reading or writing under the package/temp directories.
    #[error("[{}] io error at {path}: {source}", ErrorCode::E0901)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Journal serialization/deserialization error.
    #[error("[{}] journal error: {0}", ErrorCode::E0901)]
    Journal(#[from] libretto_core::Error),
}

impl InstallError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

/// Errors raised while uninstalling a package.
#[derive(Error, Debug)]
pub enum UninstallError {
    /// `<root>/modules/<name>/journal.json` does not exist. Manual cleanup
    /// required; the core cannot know what to delete.
    #[error("[{}] no journal for `{name}` at {path}: manual cleanup required", ErrorCode::E1001)]
    NoJournal { name: String, path: PathBuf },

    /// The package directory (or one of its journaled subdirectories) is
    /// not empty after every journaled file has been removed and every
    /// journaled directory checked. Manual intervention required so
    /// user-introduced content is never silently destroyed.
    #[error("[{}] `{name}` left non-empty after uninstall: {path} still contains unjournaled content", ErrorCode::E1002)]
    AlienContents { name: String, path: PathBuf },

    /// Journal failed to parse.
    #[error("[{}] malformed journal for `{name}`: {source}", ErrorCode::E1001)]
    MalformedJournal {
        name: String,
        #[source]
        source: libretto_core::Error,
    },

    /// IO error removing a journaled file or directory.
    #[error("[{}] io error at {path}: {source}", ErrorCode::E1001)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl UninstallError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

pub type InstallResult<T> = std::result::Result<T, InstallError>;
pub type UninstallResult<T> = std::result::Result<T, UninstallError>;
