//! Configuration loader with environment/file merging.

use crate::error::{ConfigError, Result};
use crate::types::AppConfig;
use std::path::{Path, PathBuf};

/// Configuration source, in increasing precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigSource {
    /// Built-in defaults.
    Defaults = 0,
    /// `<root>/libretto.json`, if present.
    ProjectFile = 1,
    /// `LIBRETTO_*` environment variables.
    Environment = 2,
}

impl ConfigSource {
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Defaults => "built-in defaults",
            Self::ProjectFile => "project configuration file",
            Self::Environment => "environment variables",
        }
    }
}

/// Loads [`AppConfig`] by layering defaults, an optional on-disk file, and
/// environment variables, in that order.
#[derive(Debug)]
pub struct ConfigLoader {
    project_dir: PathBuf,
}

impl ConfigLoader {
    #[must_use]
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self { project_dir: project_dir.into() }
    }

    #[must_use]
    pub fn project_file_path(&self) -> PathBuf {
        self.project_dir.join("libretto.json")
    }

    /// Load and merge configuration from all sources.
    pub fn load(&self) -> Result<AppConfig> {
        let mut config = AppConfig { root: self.project_dir.clone(), ..AppConfig::default() };

        config = self.apply_project_file(config)?;
        config = self.apply_environment(config)?;

        if !config.root.is_dir() {
            return Err(ConfigError::InvalidRoot { path: config.root });
        }

        Ok(config)
    }

    fn apply_project_file(&self, mut config: AppConfig) -> Result<AppConfig> {
        let path = self.project_file_path();
        if !path.exists() {
            return Ok(config);
        }

        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::io(&path, e))?;
        let overrides: PartialAppConfig =
            sonic_rs::from_str(&text).map_err(|e| ConfigError::json(&path, &e))?;
        overrides.merge_into(&mut config);

        if config.retry.max_attempts == 0 {
            return Err(ConfigError::out_of_range("retry.max_attempts", 0u32, 1, u32::MAX));
        }

        Ok(config)
    }

    fn apply_environment(&self, mut config: AppConfig) -> Result<AppConfig> {
        if let Ok(base_url) = std::env::var("LIBRETTO_SUPPLIER_BASE_URL") {
            config.supplier.base_url = base_url;
        }
        if let Ok(raw) = std::env::var("LIBRETTO_SUPPLIER_TIMEOUT_SECS") {
            config.supplier.timeout_secs = raw.parse().map_err(|_| ConfigError::EnvError {
                var: "LIBRETTO_SUPPLIER_TIMEOUT_SECS".to_string(),
                message: format!("expected an integer, got `{raw}`"),
            })?;
        }
        if let Ok(repo) = std::env::var("LIBRETTO_SUPPLIER_FILESYSTEM_REPO") {
            config.supplier.filesystem_repo = Some(PathBuf::from(repo));
        }
        if let Ok(raw) = std::env::var("LIBRETTO_RETRY_MAX_ATTEMPTS") {
            let max_attempts: u32 = raw.parse().map_err(|_| ConfigError::EnvError {
                var: "LIBRETTO_RETRY_MAX_ATTEMPTS".to_string(),
                message: format!("expected an integer, got `{raw}`"),
            })?;
            if max_attempts == 0 {
                return Err(ConfigError::out_of_range("retry.max_attempts", max_attempts, 1, u32::MAX));
            }
            config.retry.max_attempts = max_attempts;
        }
        Ok(config)
    }
}

/// The subset of [`AppConfig`] a `libretto.json` file is allowed to
/// override; every field optional so an absent file or a partial file both
/// fall back to defaults.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct PartialAppConfig {
    supplier_base_url: Option<String>,
    supplier_timeout_secs: Option<u64>,
    supplier_filesystem_repo: Option<PathBuf>,
    retry_max_attempts: Option<u32>,
    retry_initial_backoff_ms: Option<u64>,
}

impl PartialAppConfig {
    fn merge_into(self, config: &mut AppConfig) {
        if let Some(base_url) = self.supplier_base_url {
            config.supplier.base_url = base_url;
        }
        if let Some(timeout_secs) = self.supplier_timeout_secs {
            config.supplier.timeout_secs = timeout_secs;
        }
        if let Some(filesystem_repo) = self.supplier_filesystem_repo {
            config.supplier.filesystem_repo = Some(filesystem_repo);
        }
        if let Some(max_attempts) = self.retry_max_attempts {
            config.retry.max_attempts = max_attempts;
        }
        if let Some(initial_backoff_ms) = self.retry_initial_backoff_ms {
            config.retry.initial_backoff_ms = initial_backoff_ms;
        }
    }
}

/// Convenience: load configuration for the application rooted at `root`.
pub fn load(root: &Path) -> Result<AppConfig> {
    ConfigLoader::new(root).load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn defaults_when_no_file_present() {
        let dir = tempdir().unwrap();
        let config = ConfigLoader::new(dir.path()).load().unwrap();
        assert_eq!(config.supplier.base_url, "https://packages.example.org");
    }

    #[test]
    fn project_file_overrides_defaults() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("libretto.json"),
            r#"{"supplier_base_url":"https://mirror.internal"}"#,
        )
        .unwrap();
        let config = ConfigLoader::new(dir.path()).load().unwrap();
        assert_eq!(config.supplier.base_url, "https://mirror.internal");
    }

    #[test]
    fn missing_root_is_an_error() {
        let loader = ConfigLoader::new("/does/not/exist/anywhere");
        assert!(matches!(loader.load(), Err(ConfigError::InvalidRoot { .. })));
    }
}
