//! The application's view of itself: its own manifest plus every installed
//! module, re-materialized from disk on every `reinit()`.

use crate::error::{AppError, Result};
use libretto_core::PackageDescriptor;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const MANIFEST_FILE_NAME: &str = "package.json";
const MODULES_DIR_NAME: &str = "modules";

/// In-memory, re-scannable view of an application root: its own manifest
/// plus every currently installed module's manifest.
#[derive(Debug, Clone)]
pub struct ApplicationState {
    root: PathBuf,
    main: Option<PackageDescriptor>,
    installed: BTreeMap<String, PackageDescriptor>,
}

impl ApplicationState {
    /// Build an empty, unscanned state rooted at `root`. Call [`Self::reinit`]
    /// to populate it.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            main: None,
            installed: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn main(&self) -> Option<&PackageDescriptor> {
        self.main.as_ref()
    }

    #[must_use]
    pub fn installed(&self) -> &BTreeMap<String, PackageDescriptor> {
        &self.installed
    }

    #[must_use]
    pub fn modules_dir(&self) -> PathBuf {
        self.root.join(MODULES_DIR_NAME)
    }

    /// Drop in-memory state and re-scan the root directory and
    /// `<root>/modules/*` from disk.
    ///
    /// Unreadable module manifests are logged and skipped (never fatal); the
    /// root manifest is required and its absence/invalidity is fatal. Two
    /// modules resolving to the same name is fatal (`DuplicateInstalled`).
    ///
    /// On success, also (re-)writes `<root>/deps.txt` (§6's two-line
    /// include-path file) so it always reflects the freshly-scanned state.
    pub fn reinit(&mut self) -> Result<()> {
        let manifest_path = self.root.join(MANIFEST_FILE_NAME);
        let main = PackageDescriptor::load(&manifest_path)
            .map_err(|source| AppError::InvalidManifest { path: manifest_path, source })?;

        let mut installed = BTreeMap::new();
        let mut first_seen_at: BTreeMap<String, PathBuf> = BTreeMap::new();
        let modules_dir = self.modules_dir();

        if modules_dir.is_dir() {
            let entries = std::fs::read_dir(&modules_dir).map_err(|e| AppError::io(&modules_dir, e))?;
            for entry in entries {
                let entry = entry.map_err(|e| AppError::io(&modules_dir, e))?;
                let path = entry.path();
                if !path.is_dir() {
                    continue;
                }

                let manifest_path = path.join(MANIFEST_FILE_NAME);
                let descriptor = match PackageDescriptor::load(&manifest_path) {
                    Ok(d) => d.with_source_root(path.clone()),
                    Err(err) => {
                        warn!(path = %manifest_path.display(), error = %err, "skipping unreadable module manifest");
                        continue;
                    }
                };

                if let Some(previous_path) = first_seen_at.get(&descriptor.name) {
                    return Err(AppError::DuplicateInstalled {
                        name: descriptor.name.clone(),
                        first: previous_path.clone(),
                        second: path,
                    });
                }

                first_seen_at.insert(descriptor.name.clone(), path);
                installed.insert(descriptor.name.clone(), descriptor);
            }
        }

        debug!(installed = installed.len(), "application state re-initialized");
        self.main = Some(main);
        self.installed = installed;

        crate::deps_file::write(self)?;

        Ok(())
    }

    /// Source include paths, relative to `root`: each installed module's
    /// `modules/<name>/source` (iff it exists and is a directory), followed
    /// by the application's own `source`.
    #[must_use]
    pub fn source_include_paths(&self) -> Vec<String> {
        self.include_paths("source")
    }

    /// Views include paths, relative to `root`: each installed module's
    /// `modules/<name>/views` (iff it exists and is a directory), followed
    /// by the application's own `views`.
    #[must_use]
    pub fn views_include_paths(&self) -> Vec<String> {
        self.include_paths("views")
    }

    fn include_paths(&self, leaf: &str) -> Vec<String> {
        let mut paths = Vec::new();
        for name in self.installed.keys() {
            let relative = format!("{MODULES_DIR_NAME}/{name}/{leaf}");
            if self.root.join(&relative).is_dir() {
                paths.push(relative);
            }
        }
        if self.root.join(leaf).is_dir() {
            paths.push(leaf.to_string());
        }
        paths
    }
}
