//! The append-only per-package ledger of filesystem effects created by an
//! install. The journal, not the filesystem, is authoritative about what an
//! install created — this is what makes uninstall deterministic.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The kind of filesystem object a [`JournalEntry`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalEntryKind {
    RegularFile,
    Directory,
}

/// One filesystem effect: a file or directory created relative to the
/// installed package root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    #[serde(rename = "type")]
    pub kind: JournalEntryKind,
    /// Forward-slash, relative to the package directory.
    pub path: String,
}

impl JournalEntry {
    #[must_use]
    pub fn file(path: impl Into<String>) -> Self {
        Self { kind: JournalEntryKind::RegularFile, path: path.into() }
    }

    #[must_use]
    pub fn directory(path: impl Into<String>) -> Self {
        Self { kind: JournalEntryKind::Directory, path: path.into() }
    }
}

/// The filename the journal is always serialized to, relative to the
/// package directory it describes.
pub const JOURNAL_FILE_NAME: &str = "journal.json";

/// An ordered sequence of [`JournalEntry`] records. A well-formed journal's
/// last entry is always `{RegularFile, "journal.json"}` — its own seal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: JournalEntry) {
        self.entries.push(entry);
    }

    /// Does `path` already have a `Directory` entry? Used to keep directory
    /// creation idempotent during materialization.
    #[must_use]
    pub fn has_directory(&self, path: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.kind == JournalEntryKind::Directory && e.path == path)
    }

    #[must_use]
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Append the journal's own sealing entry. Must be called exactly once,
    /// as the final step of a successful install.
    pub fn seal(&mut self) {
        self.entries.push(JournalEntry::file(JOURNAL_FILE_NAME));
    }

    /// Is this journal properly sealed (last entry is the self-referential
    /// `journal.json` file entry)?
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        matches!(
            self.entries.last(),
            Some(JournalEntry { kind: JournalEntryKind::RegularFile, path }) if path == JOURNAL_FILE_NAME
        )
    }

    /// Load a journal from `<package_dir>/journal.json`, requiring it to be
    /// properly sealed. This is the load path for a *complete* install.
    pub fn load(package_dir: &Path) -> Result<Self> {
        let journal = Self::load_allow_unsealed(package_dir)?;
        if !journal.is_sealed() {
            return Err(Error::MalformedJournal {
                path: package_dir.join(JOURNAL_FILE_NAME),
                message: "journal is not sealed with a trailing journal.json entry".to_string(),
            });
        }
        Ok(journal)
    }

    /// Load a journal without requiring it to be sealed.
    ///
    /// An install interrupted mid-materialization leaves an unsealed but
    /// otherwise valid journal on disk (the installer writes it
    /// progressively); this is the load path the uninstaller uses so such
    /// a partial journal can still drive cleanup.
    pub fn load_allow_unsealed(package_dir: &Path) -> Result<Self> {
        let path = package_dir.join(JOURNAL_FILE_NAME);
        let text = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        sonic_rs::from_str(&text).map_err(|e| Error::MalformedJournal {
            path,
            message: e.to_string(),
        })
    }

    /// Serialize and write the journal to `<package_dir>/journal.json`.
    /// Writes are flushed and synced before returning, so a successful
    /// return means the journal is durable — required before an installer
    /// may report success.
    pub fn save(&self, package_dir: &Path) -> Result<()> {
        use std::io::Write;

        let path = package_dir.join(JOURNAL_FILE_NAME);
        let text = sonic_rs::to_string_pretty(self)?;
        let mut file = std::fs::File::create(&path).map_err(|e| Error::io(&path, e))?;
        file.write_all(text.as_bytes()).map_err(|e| Error::io(&path, e))?;
        file.sync_all().map_err(|e| Error::io(&path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn unsealed_journal_is_detected() {
        let mut j = Journal::new();
        j.push(JournalEntry::file("index.js"));
        assert!(!j.is_sealed());
    }

    #[test]
    fn sealed_journal_is_detected() {
        let mut j = Journal::new();
        j.push(JournalEntry::file("index.js"));
        j.seal();
        assert!(j.is_sealed());
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempdir().unwrap();
        let mut j = Journal::new();
        j.push(JournalEntry::directory("source"));
        j.push(JournalEntry::file("source/index.js"));
        j.seal();

        j.save(dir.path()).unwrap();
        let loaded = Journal::load(dir.path()).unwrap();
        assert_eq!(loaded.entries(), j.entries());
    }

    #[test]
    fn load_allow_unsealed_accepts_partial_journal() {
        let dir = tempdir().unwrap();
        let mut j = Journal::new();
        j.push(JournalEntry::directory("source"));
        j.push(JournalEntry::file("source/index.js"));
        j.save(dir.path()).unwrap();

        let loaded = Journal::load_allow_unsealed(dir.path()).unwrap();
        assert_eq!(loaded.entries().len(), 2);
        assert!(!loaded.is_sealed());
    }

    #[test]
    fn load_rejects_unsealed_journal() {
        let dir = tempdir().unwrap();
        let mut j = Journal::new();
        j.push(JournalEntry::file("index.js"));
        j.save(dir.path()).unwrap();

        let err = Journal::load(dir.path());
        assert!(matches!(err, Err(Error::MalformedJournal { .. })));
    }

    #[test]
    fn has_directory_is_idempotency_check() {
        let mut j = Journal::new();
        assert!(!j.has_directory("source"));
        j.push(JournalEntry::directory("source"));
        assert!(j.has_directory("source"));
    }
}
