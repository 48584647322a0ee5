//! The uninstaller: consume a package's journal to remove exactly what its
//! install created (§4.4). The journal, not the filesystem, is authoritative.

use crate::error::{UninstallError, UninstallResult};
use libretto_core::{Journal, JournalEntryKind};
use std::path::Path;
use tracing::{info, warn};

const MODULES_DIR_NAME: &str = "modules";

/// Uninstall `name` from `root`, driven entirely by its on-disk journal.
///
/// Steps (§4.4):
/// 1. Load `<root>/modules/<name>/journal.json`, tolerating an unsealed
///    (partial/interrupted) journal.
/// 2. Delete every `RegularFile` entry; a file already missing is logged
///    and skipped rather than treated as fatal (another process or the
///    user may already have removed it).
/// 3. Remove every `Directory` entry, deepest first, only if empty; a
///    non-empty journaled directory means something not tracked by the
///    journal was placed there, and is reported as [`UninstallError::AlienContents`].
/// 4. Remove the package directory itself if it is now empty; otherwise
///    the same [`UninstallError::AlienContents`].
///
/// # Errors
/// - [`UninstallError::NoJournal`] if the package was never installed, or
///   its journal is missing.
/// - [`UninstallError::MalformedJournal`] if the journal cannot be parsed.
/// - [`UninstallError::AlienContents`] if content outside the journal's
///   record is found during removal.
pub fn uninstall(name: &str, root: &Path) -> UninstallResult<()> {
    let module_dir = root.join(MODULES_DIR_NAME).join(name);

    if !module_dir.join(libretto_core::JOURNAL_FILE_NAME).exists() {
        return Err(UninstallError::NoJournal { name: name.to_string(), path: module_dir });
    }

    let journal = Journal::load_allow_unsealed(&module_dir)
        .map_err(|source| UninstallError::MalformedJournal { name: name.to_string(), source })?;

    if !journal.is_sealed() {
        warn!(name, "uninstalling from an unsealed (interrupted) journal");
    }

    for entry in journal.entries() {
        if entry.kind != JournalEntryKind::RegularFile {
            continue;
        }
        let path = module_dir.join(&entry.path);
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(name, path = %entry.path, "journaled file already missing, skipping");
            }
            Err(err) => return Err(UninstallError::io(path, err)),
        }
    }

    let mut directories: Vec<&str> = journal
        .entries()
        .iter()
        .filter(|e| e.kind == JournalEntryKind::Directory)
        .map(|e| e.path.as_str())
        .collect();
    directories.sort_by_key(|p| std::cmp::Reverse(p.matches('/').count()));

    for relative in directories {
        let path = module_dir.join(relative);
        if !path.exists() {
            continue;
        }
        remove_if_empty(&path).map_err(|_| UninstallError::AlienContents {
            name: name.to_string(),
            path: path.clone(),
        })?;
    }

    remove_if_empty(&module_dir).map_err(|_| UninstallError::AlienContents {
        name: name.to_string(),
        path: module_dir.clone(),
    })?;

    info!(name, "uninstall complete");
    Ok(())
}

/// Remove `path` if and only if it is an empty directory. Returns an opaque
/// error (the caller maps it to the domain-specific variant it needs) if the
/// directory is non-empty or cannot be removed.
fn remove_if_empty(path: &Path) -> std::io::Result<()> {
    let mut entries = std::fs::read_dir(path)?;
    if entries.next().is_some() {
        return Err(std::io::Error::new(std::io::ErrorKind::Other, "directory not empty"));
    }
    std::fs::remove_dir(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use libretto_core::JournalEntry;
    use tempfile::tempdir;

    fn seeded_package(root: &Path, name: &str, seal: bool) -> std::path::PathBuf {
        let module_dir = root.join("modules").join(name);
        std::fs::create_dir_all(module_dir.join("source")).unwrap();
        std::fs::write(module_dir.join("package.json"), b"{}").unwrap();
        std::fs::write(module_dir.join("source/index.js"), b"x").unwrap();

        let mut journal = Journal::new();
        journal.push(JournalEntry::file("package.json"));
        journal.push(JournalEntry::directory("source"));
        journal.push(JournalEntry::file("source/index.js"));
        if seal {
            journal.seal();
        }
        journal.save(&module_dir).unwrap();
        module_dir
    }

    #[test]
    fn uninstall_removes_sealed_package_entirely() {
        let root = tempdir().unwrap();
        let module_dir = seeded_package(root.path(), "libA", true);

        uninstall("libA", root.path()).unwrap();
        assert!(!module_dir.exists());
    }

    #[test]
    fn uninstall_consumes_unsealed_partial_journal() {
        let root = tempdir().unwrap();
        let module_dir = seeded_package(root.path(), "libA", false);

        uninstall("libA", root.path()).unwrap();
        assert!(!module_dir.exists());
    }

    #[test]
    fn uninstall_without_journal_fails() {
        let root = tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("modules/libA")).unwrap();

        let err = uninstall("libA", root.path());
        assert!(matches!(err, Err(UninstallError::NoJournal { .. })));
    }

    #[test]
    fn uninstall_missing_file_is_tolerated() {
        let root = tempdir().unwrap();
        let module_dir = seeded_package(root.path(), "libA", true);
        std::fs::remove_file(module_dir.join("source/index.js")).unwrap();

        uninstall("libA", root.path()).unwrap();
        assert!(!module_dir.exists());
    }

    #[test]
    fn uninstall_reports_alien_contents_in_journaled_directory() {
        let root = tempdir().unwrap();
        let module_dir = seeded_package(root.path(), "libA", true);
        std::fs::write(module_dir.join("source/extra.txt"), b"not mine").unwrap();

        let err = uninstall("libA", root.path());
        assert!(matches!(err, Err(UninstallError::AlienContents { .. })));
        assert!(module_dir.join("source/extra.txt").exists());
    }
}
