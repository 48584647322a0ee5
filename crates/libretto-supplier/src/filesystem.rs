//! A [`crate::Supplier`] backed by a local directory tree, used for mirrors
//! and for integration tests that would otherwise need a live registry.
//!
//! Expected layout: `<repo>/<name>/<version>/package.json` alongside one
//! archive file (any extension recognized by `libretto-archive`) in the same
//! directory.

use crate::error::{Result, SupplierError};
use crate::Supplier;
use libretto_core::{Constraint, PackageDescriptor, Version};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A [`Supplier`] that reads manifests and archives from a local directory
/// tree rather than a network registry.
#[derive(Debug, Clone)]
pub struct FilesystemSupplier {
    repo_root: PathBuf,
}

impl FilesystemSupplier {
    #[must_use]
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self { repo_root: repo_root.into() }
    }

    fn package_dir(&self, name: &str) -> PathBuf {
        self.repo_root.join(name)
    }

    /// Every version directory available for `name`, parsed and sorted
    /// ascending. Unreadable or unparsable entries are skipped.
    fn available_versions(&self, name: &str) -> Vec<(Version, PathBuf)> {
        let dir = self.package_dir(name);
        let Ok(entries) = std::fs::read_dir(&dir) else {
            return Vec::new();
        };

        let mut versions: Vec<(Version, PathBuf)> = entries
            .filter_map(std::result::Result::ok)
            .filter(|e| e.path().is_dir())
            .filter_map(|e| {
                let version: Version = e.file_name().to_str()?.parse().ok()?;
                Some((version, e.path()))
            })
            .collect();
        versions.sort_by(|a, b| a.0.cmp(&b.0));
        versions
    }

    fn find_archive(&self, version_dir: &Path) -> Option<PathBuf> {
        std::fs::read_dir(version_dir)
            .ok()?
            .filter_map(std::result::Result::ok)
            .map(|e| e.path())
            .find(|p| p.is_file() && libretto_archive::ArchiveType::from_path(p).is_some())
    }
}

impl Supplier for FilesystemSupplier {
    fn manifest(&self, name: &str, constraint: &Constraint) -> Result<PackageDescriptor> {
        let candidates = self.available_versions(name);
        let best = candidates
            .into_iter()
            .rev()
            .find(|(version, _)| constraint.matches(version));

        let Some((version, dir)) = best else {
            return Err(SupplierError::NotFound {
                name: name.to_string(),
                constraint: constraint.clone(),
            });
        };

        let manifest_path = dir.join("package.json");
        debug!(name, %version, path = %manifest_path.display(), "loaded manifest from filesystem repo");
        PackageDescriptor::load(&manifest_path)
            .map(|d| d.with_source_root(dir))
            .map_err(|source| SupplierError::InvalidManifest { name: name.to_string(), source })
    }

    fn store(&self, destination_path: &Path, name: &str, constraint: &Constraint) -> Result<()> {
        let candidates = self.available_versions(name);
        let best = candidates
            .into_iter()
            .rev()
            .find(|(version, _)| constraint.matches(version));

        let Some((version, dir)) = best else {
            return Err(SupplierError::NotFound {
                name: name.to_string(),
                constraint: constraint.clone(),
            });
        };

        let archive = self.find_archive(&dir).ok_or_else(|| SupplierError::NotFound {
            name: name.to_string(),
            constraint: constraint.clone(),
        })?;

        if let Some(parent) = destination_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SupplierError::io(parent, e))?;
        }

        let temp = destination_path.with_extension("tmp");
        std::fs::copy(&archive, &temp).map_err(|e| SupplierError::io(&archive, e))?;
        std::fs::rename(&temp, destination_path)
            .map_err(|e| SupplierError::io(destination_path, e))?;

        debug!(name, %version, archive = %archive.display(), "stored archive from filesystem repo");
        Ok(())
    }
}
