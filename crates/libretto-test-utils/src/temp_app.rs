//! Builds a temporary application root (`package.json` plus an optional
//! `modules/` tree) for integration tests spanning `libretto-app`,
//! `libretto-resolver`, `libretto-planner` and `libretto-installer`.

use anyhow::{Context, Result};
use libretto_core::{Journal, JournalEntry};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary application directory, cleaned up on drop.
#[derive(Debug)]
pub struct TempApplication {
    dir: TempDir,
}

impl TempApplication {
    #[must_use]
    pub fn builder() -> TempApplicationBuilder {
        TempApplicationBuilder::default()
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write an already-installed module under `modules/<name>`, complete
    /// with a sealed journal, so resolver/planner tests can exercise the
    /// "already installed" branch without a real install.
    pub fn install_module(&self, name: &str, manifest_json: &str) -> Result<PathBuf> {
        let module_dir = self.root().join("modules").join(name);
        std::fs::create_dir_all(&module_dir).context("creating module dir")?;
        std::fs::write(module_dir.join("package.json"), manifest_json).context("writing module manifest")?;

        let mut journal = Journal::new();
        journal.push(JournalEntry::file("package.json"));
        journal.seal();
        journal.save(&module_dir).context("saving module journal")?;

        Ok(module_dir)
    }
}

/// Builder for [`TempApplication`].
#[derive(Debug, Default)]
pub struct TempApplicationBuilder {
    manifest_json: Option<String>,
}

impl TempApplicationBuilder {
    #[must_use]
    pub fn with_manifest(mut self, manifest_json: impl Into<String>) -> Self {
        self.manifest_json = Some(manifest_json.into());
        self
    }

    pub fn build(self) -> Result<TempApplication> {
        let dir = tempfile::tempdir().context("creating temp dir")?;
        let manifest = self.manifest_json.unwrap_or_else(|| crate::fixtures::empty_manifest("app"));
        std::fs::write(dir.path().join("package.json"), manifest).context("writing root manifest")?;
        Ok(TempApplication { dir })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_root_manifest() {
        let app = TempApplication::builder()
            .with_manifest(crate::fixtures::manifest_with_dependency("app", "libA", ">=1.0.0"))
            .build()
            .unwrap();

        assert!(app.root().join("package.json").exists());
    }

    #[test]
    fn installs_module_with_sealed_journal() {
        let app = TempApplication::builder().build().unwrap();
        let module_dir = app.install_module("libA", &crate::fixtures::leaf_manifest("libA", "1.0.0")).unwrap();

        assert!(module_dir.join("journal.json").exists());
        let journal = Journal::load(&module_dir).unwrap();
        assert!(journal.is_sealed());
    }
}
