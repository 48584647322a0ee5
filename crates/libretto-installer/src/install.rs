//! The installer: download, verify, unpack and journal a single package
//! (§4.3).

use crate::error::{InstallError, InstallResult};
use crate::prefix::find_prefix;
use libretto_core::{Constraint, Journal, JournalEntry};
use libretto_supplier::Supplier;
use std::path::Path;
use tracing::{debug, info, warn};

const MODULES_DIR_NAME: &str = "modules";
const TEMP_DOWNLOADS_DIR_NAME: &str = "temp/downloads";

/// Deletes the file at `path` on drop, regardless of whether the install
/// this guard covers succeeded or failed (§4.3 step 1: "the temp file is
/// deleted on all exit paths").
struct TempFileGuard<'a>(&'a Path);

impl Drop for TempFileGuard<'_> {
    fn drop(&mut self) {
        if self.0.exists() {
            if let Err(err) = std::fs::remove_file(self.0) {
                warn!(path = %self.0.display(), error = %err, "failed to clean up temp download");
            }
        }
    }
}

/// Install `name` satisfying `constraint` under `root`, fetching the
/// archive from `supplier`.
///
/// # Errors
/// - [`InstallError::AlreadyInstalled`] if `<root>/modules/<name>` exists.
/// - [`InstallError::TempOccupied`] if the temp download path exists.
/// - [`InstallError::Supplier`] / [`InstallError::Archive`] for fetch or
///   decode failures before materialization begins.
/// - [`InstallError::Interrupted`] if materialization (steps 4-5) fails
///   partway; the package directory is left partially populated with an
///   unsealed journal that [`crate::uninstall`] can consume.
pub fn install(name: &str, constraint: &Constraint, root: &Path, supplier: &dyn Supplier) -> InstallResult<Journal> {
    let module_dir = root.join(MODULES_DIR_NAME).join(name);
    if module_dir.exists() {
        return Err(InstallError::AlreadyInstalled { name: name.to_string(), path: module_dir });
    }

    let temp_path = root.join(TEMP_DOWNLOADS_DIR_NAME).join(format!("{name}.archive"));
    if temp_path.exists() {
        return Err(InstallError::TempOccupied { path: temp_path });
    }
    if let Some(parent) = temp_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| InstallError::io(parent, e))?;
    }

    let _temp_guard = TempFileGuard(&temp_path);

    info!(name, %constraint, "downloading package archive");
    supplier
        .store(&temp_path, name, constraint)
        .map_err(|source| InstallError::Supplier { name: name.to_string(), source })?;

    let mut driver = libretto_archive::open_detected(&temp_path)
        .map_err(|source| InstallError::Archive { name: name.to_string(), source })?;

    let members = driver.members().to_vec();
    let prefix = find_prefix(&members);
    debug!(name, prefix = %prefix, members = members.len(), "materializing package");

    std::fs::create_dir_all(&module_dir).map_err(|e| InstallError::io(&module_dir, e))?;

    let mut journal = Journal::new();
    let mut entries_written = 0usize;

    let result = (|| -> InstallResult<()> {
        for member in &members {
            let Some(remainder) = strip_prefix(&member.path, &prefix) else {
                continue;
            };
            if remainder.is_empty() {
                continue;
            }
            if !is_contained(remainder) {
                return Err(InstallError::UnsafeMemberPath {
                    name: name.to_string(),
                    path: member.path.clone(),
                });
            }

            if member.is_file() {
                ensure_parent_directories(&module_dir, remainder, &mut journal)?;

                let dest = module_dir.join(remainder);
                let bytes = driver
                    .expand(member)
                    .map_err(|source| InstallError::Archive { name: name.to_string(), source })?;
                std::fs::write(&dest, &bytes).map_err(|e| InstallError::io(&dest, e))?;
                journal.push(JournalEntry::file(remainder));
            } else {
                ensure_directory(&module_dir, remainder, &mut journal)?;
            }

            entries_written = journal.entries().len();
            journal.save(&module_dir)?;
        }
        Ok(())
    })();

    if let Err(source) = result {
        warn!(name, entries_written, "install interrupted during materialization");
        return Err(InstallError::Interrupted {
            name: name.to_string(),
            entries_written,
            source: Box::new(source),
        });
    }

    journal.seal();
    journal.save(&module_dir)?;
    info!(name, entries = journal.entries().len(), "install complete, journal sealed");

    Ok(journal)
}

/// Strip `prefix` from `path`, returning `None` if `path` does not begin
/// with it (members outside the prefix are skipped per §4.3 step 4).
fn strip_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(path.trim_end_matches('/'));
    }
    let rest = path.strip_prefix(prefix)?;
    let rest = rest.strip_prefix('/').unwrap_or(rest);
    Some(rest.trim_end_matches('/'))
}

/// Reject paths that would escape `module_dir` once joined: an absolute
/// path, or any `..`/empty component (zip-slip).
fn is_contained(remainder: &str) -> bool {
    !remainder.starts_with('/') && remainder.split('/').all(|segment| !segment.is_empty() && segment != "..")
}

/// Ensure every parent directory segment of `remainder` exists and is
/// journaled, shallowest first, without journaling the same directory
/// twice in one install.
fn ensure_parent_directories(module_dir: &Path, remainder: &str, journal: &mut Journal) -> InstallResult<()> {
    let Some(parent) = remainder.rfind('/').map(|idx| &remainder[..idx]) else {
        return Ok(());
    };

    let mut built = String::new();
    for segment in parent.split('/') {
        if !built.is_empty() {
            built.push('/');
        }
        built.push_str(segment);
        ensure_directory(module_dir, &built, journal)?;
    }
    Ok(())
}

fn ensure_directory(module_dir: &Path, relative: &str, journal: &mut Journal) -> InstallResult<()> {
    let full = module_dir.join(relative);
    std::fs::create_dir_all(&full).map_err(|e| InstallError::io(&full, e))?;
    if !journal.has_directory(relative) {
        journal.push(JournalEntry::directory(relative));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use libretto_core::{NumericVersion, PackageDescriptor, Version};
    use libretto_supplier::TestSupplier;
    use std::io::Write as _;
    use tempfile::tempdir;

    fn make_zip(prefixed: bool) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let cursor = std::io::Cursor::new(&mut buf);
            let mut zip = zip::ZipWriter::new(cursor);
            let options = zip::write::SimpleFileOptions::default();
            let p = |s: &str| if prefixed { format!("libA-1.0.0/{s}") } else { s.to_string() };

            zip.add_directory(p("source/"), options).unwrap();
            zip.start_file(p("package.json"), options).unwrap();
            zip.write_all(br#"{"name":"libA","version":"1.0.0"}"#).unwrap();
            zip.start_file(p("source/index.js"), options).unwrap();
            zip.write_all(b"console.log(1);").unwrap();
            zip.finish().unwrap();
        }
        buf
    }

    fn supplier_with(name: &str, archive: Vec<u8>) -> TestSupplier {
        let supplier = TestSupplier::new();
        supplier.offer(
            PackageDescriptor::new(name, Version::Number(NumericVersion::new(1, 0, 0))),
            archive,
        );
        supplier
    }

    #[test]
    fn fresh_install_materializes_and_seals_journal() {
        let root = tempdir().unwrap();
        let supplier = supplier_with("libA", make_zip(true));

        let journal = install("libA", &Constraint::any(), root.path(), &supplier).unwrap();
        assert!(journal.is_sealed());

        let pkg_dir = root.path().join("modules/libA");
        assert!(pkg_dir.join("package.json").exists());
        assert!(pkg_dir.join("source/index.js").exists());
        assert!(pkg_dir.join("journal.json").exists());
        assert!(!root.path().join("temp/downloads/libA.archive").exists());
    }

    #[test]
    fn install_without_wrapper_folder_still_materializes() {
        let root = tempdir().unwrap();
        let supplier = supplier_with("libA", make_zip(false));

        install("libA", &Constraint::any(), root.path(), &supplier).unwrap();
        assert!(root.path().join("modules/libA/package.json").exists());
    }

    #[test]
    fn second_install_of_same_name_fails() {
        let root = tempdir().unwrap();
        let supplier = supplier_with("libA", make_zip(true));
        install("libA", &Constraint::any(), root.path(), &supplier).unwrap();

        let err = install("libA", &Constraint::any(), root.path(), &supplier);
        assert!(matches!(err, Err(InstallError::AlreadyInstalled { .. })));
    }

    #[test]
    fn occupied_temp_path_fails_before_download() {
        let root = tempdir().unwrap();
        let temp_dir = root.path().join("temp/downloads");
        std::fs::create_dir_all(&temp_dir).unwrap();
        std::fs::write(temp_dir.join("libA.archive"), b"stale").unwrap();

        let supplier = supplier_with("libA", make_zip(true));
        let err = install("libA", &Constraint::any(), root.path(), &supplier);
        assert!(matches!(err, Err(InstallError::TempOccupied { .. })));
    }

    #[test]
    fn temp_file_is_removed_even_on_not_found_failure() {
        let root = tempdir().unwrap();
        let supplier = TestSupplier::new();
        supplier.always_fail("missing");

        let err = install("missing", &Constraint::any(), root.path(), &supplier);
        assert!(matches!(err, Err(InstallError::Supplier { .. })));
        assert!(!root.path().join("temp/downloads/missing.archive").exists());
    }
}
