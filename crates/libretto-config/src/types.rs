//! Configuration value types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Network parameters for a registry-backed supplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplierConfig {
    /// Base URL of the package registry, e.g. `https://packages.example.org`.
    pub base_url: String,
    /// Request timeout, in seconds.
    pub timeout_secs: u64,
    /// When set, a local directory tree to read manifests and archives from
    /// instead of the registry (a `FilesystemSupplier` repo root) — used for
    /// local mirrors and for integration tests that would otherwise need a
    /// live registry.
    pub filesystem_repo: Option<PathBuf>,
}

impl Default for SupplierConfig {
    fn default() -> Self {
        Self {
            base_url: "https://packages.example.org".to_string(),
            timeout_secs: 30,
            filesystem_repo: None,
        }
    }
}

impl SupplierConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Retry/backoff parameters applied around supplier calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first) per supplier call.
    pub max_attempts: u32,
    /// Initial backoff delay, in milliseconds; doubles on each retry.
    pub initial_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 200,
        }
    }
}

/// Resolved application configuration: where the application lives, and how
/// to reach and retry the package supplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application root directory.
    pub root: PathBuf,
    pub supplier: SupplierConfig,
    pub retry: RetryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            supplier: SupplierConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}
