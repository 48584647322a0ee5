//! In-memory manifest representation: a package's name, version and
//! declared dependencies.

use crate::error::{Error, Result};
use crate::version::{Constraint, Version};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A single declared dependency: a package name paired with a constraint on
/// its version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub constraint: Constraint,
}

impl Dependency {
    #[must_use]
    pub fn new(name: impl Into<String>, constraint: Constraint) -> Self {
        Self { name: name.into(), constraint }
    }

    /// A dependency is valid iff its constraint is non-empty.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.constraint.is_valid()
    }
}

/// The on-disk shape of `package.json`. Unknown keys are ignored by `serde`
/// default behavior (no `deny_unknown_fields`).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ManifestWire {
    name: String,
    version: String,
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
}

/// In-memory form of a manifest, plus the filesystem location it was loaded
/// from (if any).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    pub name: String,
    pub version: Version,
    /// Declared dependencies, keyed by package name for lookup and diffing.
    pub dependencies: BTreeMap<String, Constraint>,
    /// Root directory the descriptor was materialized at, if it is an
    /// installed (as opposed to freshly-fetched) descriptor.
    pub source_root: Option<PathBuf>,
}

impl PackageDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
            dependencies: BTreeMap::new(),
            source_root: None,
        }
    }

    /// Dependencies as a list, in a stable order convenient for graph
    /// insertion and for tests.
    #[must_use]
    pub fn dependency_list(&self) -> Vec<Dependency> {
        self.dependencies
            .iter()
            .map(|(name, constraint)| Dependency::new(name.clone(), constraint.clone()))
            .collect()
    }

    /// Parse a `package.json` file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&text).map_err(|e| match e {
            Error::InvalidManifest { message, .. } => Error::InvalidManifest {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// Parse manifest text without a filesystem location attached.
    pub fn parse(text: &str) -> Result<Self> {
        let wire: ManifestWire = sonic_rs::from_str(text)?;

        if wire.name.trim().is_empty() {
            return Err(Error::InvalidManifest {
                path: PathBuf::new(),
                message: "missing or empty `name`".to_string(),
            });
        }

        let version: Version = wire.version.parse().map_err(|_| Error::InvalidManifest {
            path: PathBuf::new(),
            message: format!("invalid `version`: {}", wire.version),
        })?;

        let mut dependencies = BTreeMap::new();
        for (name, raw_constraint) in wire.dependencies {
            let constraint = Constraint::parse(&raw_constraint).map_err(|_| Error::InvalidManifest {
                path: PathBuf::new(),
                message: format!("invalid constraint for `{name}`: {raw_constraint}"),
            })?;
            dependencies.insert(name, constraint);
        }

        Ok(Self {
            name: wire.name,
            version,
            dependencies,
            source_root: None,
        })
    }

    /// Serialize back to manifest JSON text (identity with `parse` on the
    /// recognized subset).
    pub fn to_json(&self) -> Result<String> {
        let wire = ManifestWire {
            name: self.name.clone(),
            version: self.version.to_string(),
            dependencies: self
                .dependencies
                .iter()
                .map(|(name, constraint)| (name.clone(), constraint.to_string()))
                .collect(),
        };
        Ok(sonic_rs::to_string(&wire)?)
    }

    #[must_use]
    pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_root = Some(root.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_manifest() {
        let d = PackageDescriptor::parse(r#"{"name":"libA","version":"1.2.0"}"#).unwrap();
        assert_eq!(d.name, "libA");
        assert!(d.dependencies.is_empty());
    }

    #[test]
    fn parses_dependencies() {
        let d = PackageDescriptor::parse(
            r#"{"name":"app","version":"0.0.1","dependencies":{"libA":">=1.0.0"}}"#,
        )
        .unwrap();
        assert_eq!(d.dependencies.len(), 1);
        assert!(d.dependencies["libA"].matches(&"1.5.0".parse().unwrap()));
    }

    #[test]
    fn unknown_keys_ignored() {
        let d = PackageDescriptor::parse(
            r#"{"name":"libA","version":"1.0.0","description":"something","extra":{"x":1}}"#,
        )
        .unwrap();
        assert_eq!(d.name, "libA");
    }

    #[test]
    fn missing_name_is_invalid_manifest() {
        let err = PackageDescriptor::parse(r#"{"version":"1.0.0"}"#);
        assert!(matches!(err, Err(Error::InvalidManifest { .. })) || err.is_err());
    }

    #[test]
    fn round_trip_parse_serialize() {
        let original = r#"{"dependencies":{"libA":">=1.0.0"},"name":"app","version":"0.0.1"}"#;
        let d = PackageDescriptor::parse(original).unwrap();
        let reserialized = d.to_json().unwrap();
        let reparsed = PackageDescriptor::parse(&reserialized).unwrap();
        assert_eq!(d, reparsed);
    }
}
