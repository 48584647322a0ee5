//! Application configuration: root directory, supplier network parameters,
//! and retry/backoff policy, layered from defaults, an optional
//! `libretto.json`, and environment variables.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
mod loader;
mod types;

pub use error::{ConfigError, Result};
pub use loader::{load, ConfigLoader, ConfigSource};
pub use types::{AppConfig, RetryConfig, SupplierConfig};
