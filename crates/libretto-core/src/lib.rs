//! Core data model shared by the resolver, planner and installer:
//! - Version and constraint algebra
//! - Package descriptors (manifests)
//! - Journals (per-install ledgers of filesystem effects)
//! - The error taxonomy all other `libretto-*` crates compose into their own

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
mod journal;
mod package;
mod version;

pub use error::{Error, ErrorCode, Result};
pub use journal::{Journal, JournalEntry, JournalEntryKind, JOURNAL_FILE_NAME};
pub use package::{Dependency, PackageDescriptor};
pub use version::{Constraint, NumericVersion, Version};
