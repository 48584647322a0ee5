//! Scans an application's root directory and its installed `modules/`,
//! re-materializing state from disk on every call, and emits the `deps.txt`
//! include-path file consumed downstream by the application's build step.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod deps_file;
mod error;
mod state;

pub use error::{AppError, ErrorCode, Result};
pub use state::ApplicationState;
