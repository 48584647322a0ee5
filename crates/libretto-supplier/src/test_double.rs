//! A fully deterministic in-memory [`crate::Supplier`] double, used by the
//! resolver and installer test suites.

use crate::error::{Result, SupplierError};
use crate::Supplier;
use libretto_core::{Constraint, PackageDescriptor};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// One offering held by a [`TestSupplier`]: a manifest plus the archive
/// bytes that would be downloaded for it.
#[derive(Debug, Clone)]
pub struct Offering {
    pub descriptor: PackageDescriptor,
    pub archive: Vec<u8>,
}

/// An in-memory, fully deterministic [`Supplier`] double: holds a fixed map
/// from package name to every version offered, plus a call log so tests can
/// assert on what the resolver/installer actually asked for.
#[derive(Debug, Default)]
pub struct TestSupplier {
    offerings: Mutex<BTreeMap<String, Vec<Offering>>>,
    manifest_calls: Mutex<Vec<(String, Constraint)>>,
    /// Names that should always fail with `NotFound`, regardless of what is
    /// registered — used to drive the resolver-stall scenario (S6).
    always_not_found: Mutex<std::collections::BTreeSet<String>>,
}

impl TestSupplier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an offering: the resolver will be able to fetch it and the
    /// installer will be able to download its archive bytes.
    pub fn offer(&self, descriptor: PackageDescriptor, archive: Vec<u8>) {
        self.offerings
            .lock()
            .entry(descriptor.name.clone())
            .or_default()
            .push(Offering { descriptor, archive });
    }

    /// Force every `manifest`/`store` call for `name` to fail with
    /// `NotFound`, simulating a package the registry never has (S6).
    pub fn always_fail(&self, name: impl Into<String>) {
        self.always_not_found.lock().insert(name.into());
    }

    /// Every `(name, constraint)` pair the resolver has asked for, in call
    /// order — lets tests assert on resolver iteration behavior.
    #[must_use]
    pub fn manifest_calls(&self) -> Vec<(String, Constraint)> {
        self.manifest_calls.lock().clone()
    }

    fn best_offering(&self, name: &str, constraint: &Constraint) -> Option<Offering> {
        self.offerings
            .lock()
            .get(name)?
            .iter()
            .filter(|o| constraint.matches(&o.descriptor.version))
            .max_by(|a, b| a.descriptor.version.cmp(&b.descriptor.version))
            .cloned()
    }
}

impl Supplier for TestSupplier {
    fn manifest(&self, name: &str, constraint: &Constraint) -> Result<PackageDescriptor> {
        self.manifest_calls.lock().push((name.to_string(), constraint.clone()));

        if self.always_not_found.lock().contains(name) {
            return Err(SupplierError::NotFound { name: name.to_string(), constraint: constraint.clone() });
        }

        self.best_offering(name, constraint)
            .map(|o| o.descriptor)
            .ok_or_else(|| SupplierError::NotFound { name: name.to_string(), constraint: constraint.clone() })
    }

    fn store(&self, destination_path: &Path, name: &str, constraint: &Constraint) -> Result<()> {
        if self.always_not_found.lock().contains(name) {
            return Err(SupplierError::NotFound { name: name.to_string(), constraint: constraint.clone() });
        }

        let offering = self.best_offering(name, constraint).ok_or_else(|| SupplierError::NotFound {
            name: name.to_string(),
            constraint: constraint.clone(),
        })?;

        if let Some(parent) = destination_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SupplierError::io(parent, e))?;
        }
        std::fs::write(destination_path, &offering.archive).map_err(|e| SupplierError::io(destination_path, e))
    }
}

/// An `Arc`-wrapped [`TestSupplier`], convenient when the same double needs
/// to be shared between the object under test and the test's own
/// assertions.
#[must_use]
pub fn shared() -> Arc<TestSupplier> {
    Arc::new(TestSupplier::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use libretto_core::Version;

    #[test]
    fn returns_highest_satisfying_offering() {
        let supplier = TestSupplier::new();
        supplier.offer(PackageDescriptor::new("libA", Version::Number(libretto_core::NumericVersion::new(1, 0, 0))), vec![]);
        supplier.offer(PackageDescriptor::new("libA", Version::Number(libretto_core::NumericVersion::new(1, 2, 0))), vec![]);

        let descriptor = supplier.manifest("libA", &Constraint::any()).unwrap();
        assert_eq!(descriptor.version.to_string(), "1.2.0");
    }

    #[test]
    fn always_fail_overrides_offerings() {
        let supplier = TestSupplier::new();
        supplier.offer(PackageDescriptor::new("libX", Version::Number(libretto_core::NumericVersion::new(1, 0, 0))), vec![]);
        supplier.always_fail("libX");

        let err = supplier.manifest("libX", &Constraint::any());
        assert!(matches!(err, Err(SupplierError::NotFound { .. })));
    }

    #[test]
    fn records_manifest_calls() {
        let supplier = TestSupplier::new();
        supplier.offer(PackageDescriptor::new("libA", Version::Number(libretto_core::NumericVersion::new(1, 0, 0))), vec![]);
        let _ = supplier.manifest("libA", &Constraint::any());
        assert_eq!(supplier.manifest_calls().len(), 1);
    }
}
