//! The package supplier interface: a polymorphic source of manifests and
//! archive bytes for a (name, constraint) query.
//!
//! This crate defines the [`Supplier`] trait the resolver and installer
//! consume, plus three implementations: [`RegistrySupplier`] (HTTP-backed),
//! [`FilesystemSupplier`] (a local directory tree, for mirrors and
//! integration tests), and [`TestSupplier`] (a fully deterministic in-memory
//! double).
//!
//! Every implementation is synchronous/blocking at the trait boundary, per
//! the core's single-threaded concurrency model: `RegistrySupplier` owns a
//! `reqwest::blocking::Client` rather than exposing any async surface.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
mod filesystem;
mod registry;
mod test_double;

pub use error::{ErrorCode, Result, SupplierError};
pub use filesystem::FilesystemSupplier;
pub use registry::RegistrySupplier;
pub use test_double::TestSupplier;

use libretto_core::{Constraint, PackageDescriptor};
use std::path::Path;

/// A source of package manifests and archive bytes.
///
/// Implementations are expected to present a blocking call here even if
/// their internals are asynchronous (§5 of the core's concurrency model):
/// the resolver and installer never see a future or a callback.
pub trait Supplier {
    /// Return the best manifest satisfying `constraint` for `name`.
    fn manifest(&self, name: &str, constraint: &Constraint) -> Result<PackageDescriptor>;

    /// Write the archive bytes for the version selected by `manifest` to
    /// `destination_path`. The write must be atomic from the caller's
    /// perspective: either the full archive is present at
    /// `destination_path` on return, or an error is returned and nothing is
    /// left behind.
    fn store(&self, destination_path: &Path, name: &str, constraint: &Constraint) -> Result<()>;
}
