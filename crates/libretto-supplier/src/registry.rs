//! An HTTP-backed [`crate::Supplier`] talking to a package registry.
//!
//! The registry API itself is outside this system's scope (§6): this client
//! only needs two endpoints, `GET /{name}.json` (a list of manifests) and
//! `GET /{name}/{version}/archive` (the archive bytes), matching the
//! teacher's `libretto-downloader` HTTP client shape but collapsed to a
//! blocking call so it satisfies the [`crate::Supplier`] trait directly.

use crate::error::{Result, SupplierError};
use crate::Supplier;
use backon::{BlockingRetryable, ExponentialBuilder};
use libretto_core::{Constraint, PackageDescriptor};
use serde::Deserialize;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry/backoff parameters applied around every request this client makes.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub max_attempts: usize,
    pub initial_backoff: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://packages.example.org".to_string(),
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
        }
    }
}

/// A [`Supplier`] backed by a blocking HTTP client against a package
/// registry. Matches the teacher's pattern of isolating the async-capable
/// HTTP stack (`reqwest`) behind a synchronous facade, here collapsed all
/// the way to the blocking client rather than a hand-rolled runtime, since
/// the core never needs concurrency from its supplier (§5).
pub struct RegistrySupplier {
    client: reqwest::blocking::Client,
    config: RegistryConfig,
}

impl std::fmt::Debug for RegistrySupplier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrySupplier")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct ManifestListResponse {
    versions: Vec<ManifestWire>,
}

#[derive(Debug, Deserialize)]
struct ManifestWire {
    name: String,
    version: String,
    #[serde(default)]
    dependencies: std::collections::BTreeMap<String, String>,
}

impl RegistrySupplier {
    pub fn new(config: RegistryConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .gzip(true)
            .build()
            .map_err(|e| SupplierError::NetworkError {
                name: String::new(),
                message: format!("failed to build http client: {e}"),
            })?;
        Ok(Self { client, config })
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.config.initial_backoff)
            .with_max_times(self.config.max_attempts.saturating_sub(1))
            .with_jitter()
    }

    fn fetch_versions(&self, name: &str) -> Result<Vec<PackageDescriptor>> {
        let url = format!("{}/{name}.json", self.config.base_url.trim_end_matches('/'));
        let name_owned = name.to_string();

        let response = (|| self.client.get(&url).send())
            .retry(self.backoff())
            .when(|e: &reqwest::Error| !e.is_status() || e.status().is_some_and(|s| s.is_server_error()))
            .notify(|e, dur| warn!(error = %e, delay = ?dur, "registry request failed, retrying"))
            .call()
            .map_err(|e| SupplierError::NetworkError { name: name_owned.clone(), message: e.to_string() })?;

        if !response.status().is_success() {
            return Err(SupplierError::NotFound {
                name: name_owned,
                constraint: Constraint::any(),
            });
        }

        let body: ManifestListResponse = response
            .json()
            .map_err(|e| SupplierError::NetworkError { name: name.to_string(), message: e.to_string() })?;

        body.versions
            .into_iter()
            .map(|wire| {
                let version = wire.version.parse().map_err(|_| SupplierError::InvalidManifest {
                    name: wire.name.clone(),
                    source: libretto_core::Error::InvalidVersion { raw: wire.version.clone() },
                })?;
                let mut descriptor = PackageDescriptor::new(wire.name.clone(), version);
                for (dep_name, raw_constraint) in wire.dependencies {
                    let constraint = Constraint::parse(&raw_constraint).map_err(|source| {
                        SupplierError::InvalidManifest { name: wire.name.clone(), source }
                    })?;
                    descriptor.dependencies.insert(dep_name, constraint);
                }
                Ok(descriptor)
            })
            .collect()
    }
}

impl Supplier for RegistrySupplier {
    fn manifest(&self, name: &str, constraint: &Constraint) -> Result<PackageDescriptor> {
        let versions = self.fetch_versions(name)?;
        let best = versions.into_iter().filter(|d| constraint.matches(&d.version)).max_by(|a, b| a.version.cmp(&b.version));

        best.ok_or_else(|| SupplierError::NotFound {
            name: name.to_string(),
            constraint: constraint.clone(),
        })
    }

    fn store(&self, destination_path: &Path, name: &str, constraint: &Constraint) -> Result<()> {
        let descriptor = self.manifest(name, constraint)?;
        let url = format!(
            "{}/{name}/{}/archive",
            self.config.base_url.trim_end_matches('/'),
            descriptor.version
        );

        let name_owned = name.to_string();
        let response = (|| self.client.get(&url).send())
            .retry(self.backoff())
            .when(|e: &reqwest::Error| !e.is_status() || e.status().is_some_and(|s| s.is_server_error()))
            .notify(|e, dur| warn!(error = %e, delay = ?dur, "archive download failed, retrying"))
            .call()
            .map_err(|e| SupplierError::NetworkError { name: name_owned.clone(), message: e.to_string() })?;

        if !response.status().is_success() {
            return Err(SupplierError::NetworkError {
                name: name_owned,
                message: format!("unexpected status {}", response.status()),
            });
        }

        let bytes = response
            .bytes()
            .map_err(|e| SupplierError::NetworkError { name: name.to_string(), message: e.to_string() })?;

        if let Some(parent) = destination_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SupplierError::io(parent, e))?;
        }
        let temp = destination_path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp).map_err(|e| SupplierError::io(&temp, e))?;
        file.write_all(&bytes).map_err(|e| SupplierError::io(&temp, e))?;
        file.sync_all().map_err(|e| SupplierError::io(&temp, e))?;
        drop(file);
        std::fs::rename(&temp, destination_path)
            .map_err(|e| SupplierError::io(destination_path, e))?;

        debug!(name, version = %descriptor.version, "stored archive from registry");
        Ok(())
    }
}
