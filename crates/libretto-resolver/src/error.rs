//! Errors raised while building or querying a dependency graph.

use thiserror::Error;

/// Stable short error code (`E08xx` reserved for resolver concerns).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    E0801,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::E0801 => "E0801",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors raised by graph construction.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// A supplier returned a descriptor under a different name than the one
    /// it was queried for — a supplier contract violation, not a normal
    /// resolution outcome.
    #[error("[{}] supplier returned `{returned}` when asked for `{requested}`", ErrorCode::E0801)]
    NameMismatch { requested: String, returned: String },
}

pub type Result<T> = std::result::Result<T, ResolveError>;
