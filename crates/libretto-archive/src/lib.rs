//! Archive decoding for Libretto.
//!
//! Exposes the [`ArchiveDriver`] trait the installer consumes: a directory of
//! `members()` plus a per-member `expand()` that returns the member's bytes.
//! Two drivers are provided, [`ZipDriver`] and [`TarDriver`] (the latter
//! covering plain, gzip, bzip2 and xz compressed tarballs) — both dispatched
//! from [`open`] by file-extension sniffing via [`ArchiveType`].

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;

pub use error::{ArchiveError, ErrorCode, Result};

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use xz2::read::XzDecoder;

/// Archive formats this crate can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveType {
    Zip,
    Tar,
    TarGz,
    TarBz2,
    TarXz,
}

impl ArchiveType {
    /// Detect archive type from a path's extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        Self::from_filename(name)
    }

    /// Detect archive type from a filename.
    #[must_use]
    #[allow(clippy::case_sensitive_file_extension_comparisons)] // string is already lowercased
    pub fn from_filename(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.ends_with(".zip") {
            Some(Self::Zip)
        } else if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if lower.ends_with(".tar.bz2") || lower.ends_with(".tbz2") || lower.ends_with(".tbz") {
            Some(Self::TarBz2)
        } else if lower.ends_with(".tar.xz") || lower.ends_with(".txz") {
            Some(Self::TarXz)
        } else if lower.ends_with(".tar") {
            Some(Self::Tar)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::TarBz2 => "tar.bz2",
            Self::TarXz => "tar.xz",
        }
    }

    /// Detect archive type from a leading slice of its bytes (magic
    /// numbers), for archives stored under a name that carries no
    /// informative extension — e.g. a supplier's `<name>.archive` download
    /// path (§6 on-disk layout). `tar`'s `ustar` magic sits at byte offset
    /// 257, so `header` must cover at least that far to detect plain tar.
    #[must_use]
    pub fn sniff(header: &[u8]) -> Option<Self> {
        if header.starts_with(&[0x50, 0x4b, 0x03, 0x04]) || header.starts_with(&[0x50, 0x4b, 0x05, 0x06]) {
            Some(Self::Zip)
        } else if header.starts_with(&[0x1f, 0x8b]) {
            Some(Self::TarGz)
        } else if header.starts_with(b"BZh") {
            Some(Self::TarBz2)
        } else if header.starts_with(&[0xfd, b'7', b'z', b'X', b'Z', 0x00]) {
            Some(Self::TarXz)
        } else if header.len() >= 262 && &header[257..262] == b"ustar" {
            Some(Self::Tar)
        } else {
            None
        }
    }
}

/// The kind of filesystem object an [`ArchiveMember`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    File,
    Dir,
}

/// One entry in an archive: its forward-slash-normalized path and whether it
/// is a file or a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
    pub path: String,
    pub kind: MemberKind,
}

impl ArchiveMember {
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind == MemberKind::File
    }
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

/// The interface the installer consumes to materialize a package from an
/// archive: a directory of members, and a per-member byte expander.
pub trait ArchiveDriver {
    /// Every member in the archive, in archive enumeration order.
    fn members(&self) -> &[ArchiveMember];

    /// Expand one member's bytes. `member` must be one returned by
    /// [`Self::members`] on the same driver instance.
    ///
    /// # Errors
    /// Returns [`ArchiveError::Invalid`] if the member cannot be located or
    /// decoded (for example, calling this on a directory member).
    fn expand(&mut self, member: &ArchiveMember) -> Result<Vec<u8>>;
}

/// Open `path`, sniffing its archive format from the extension, and return a
/// driver ready to enumerate its members.
///
/// # Errors
/// Returns [`ArchiveError::UnknownFormat`] if the extension is not
/// recognized, or [`ArchiveError::Invalid`]/[`ArchiveError::Io`] if the
/// archive cannot be opened or decoded.
pub fn open(path: &Path) -> Result<Box<dyn ArchiveDriver>> {
    let archive_type = ArchiveType::from_path(path).ok_or_else(|| ArchiveError::UnknownFormat {
        path: path.to_path_buf(),
    })?;

    tracing::debug!(archive = %path.display(), ?archive_type, "opening archive");

    open_as(path, archive_type)
}

/// Open `path` whose name carries no recognizable extension (e.g. a
/// supplier's `<name>.archive` download), detecting its format from a
/// magic-number sniff of the file's header bytes instead.
///
/// # Errors
/// Returns [`ArchiveError::UnknownFormat`] if neither the extension nor the
/// header is recognized.
pub fn open_detected(path: &Path) -> Result<Box<dyn ArchiveDriver>> {
    if let Some(archive_type) = ArchiveType::from_path(path) {
        return open_as(path, archive_type);
    }

    let mut header = [0u8; 262];
    let mut file = File::open(path).map_err(|e| ArchiveError::io(path, e))?;
    let read = file.read(&mut header).map_err(|e| ArchiveError::io(path, e))?;

    let archive_type = ArchiveType::sniff(&header[..read]).ok_or_else(|| ArchiveError::UnknownFormat {
        path: path.to_path_buf(),
    })?;
    tracing::debug!(archive = %path.display(), ?archive_type, "detected archive format from header");
    open_as(path, archive_type)
}

fn open_as(path: &Path, archive_type: ArchiveType) -> Result<Box<dyn ArchiveDriver>> {
    match archive_type {
        ArchiveType::Zip => Ok(Box::new(ZipDriver::open(path)?)),
        ArchiveType::Tar | ArchiveType::TarGz | ArchiveType::TarBz2 | ArchiveType::TarXz => {
            Ok(Box::new(TarDriver::open(path, archive_type)?))
        }
    }
}

/// An [`ArchiveDriver`] over a ZIP file, using the `zip` crate's random-access
/// by-name reads so member bytes are only decompressed on demand.
pub struct ZipDriver {
    archive: zip::ZipArchive<File>,
    members: Vec<ArchiveMember>,
}

impl std::fmt::Debug for ZipDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipDriver").field("members", &self.members.len()).finish()
    }
}

impl ZipDriver {
    /// Open a ZIP archive and enumerate its members.
    ///
    /// # Errors
    /// Returns [`ArchiveError::Invalid`] if the file is not a valid ZIP.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| ArchiveError::io(path, e))?;
        let mut archive = zip::ZipArchive::new(file)
            .map_err(|e| ArchiveError::Invalid { path: path.to_path_buf(), message: e.to_string() })?;

        let mut members = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let entry = archive
                .by_index(i)
                .map_err(|e| ArchiveError::Invalid { path: path.to_path_buf(), message: e.to_string() })?;
            let kind = if entry.is_dir() { MemberKind::Dir } else { MemberKind::File };
            members.push(ArchiveMember { path: normalize(entry.name()), kind });
        }

        Ok(Self { archive, members })
    }
}

impl ArchiveDriver for ZipDriver {
    fn members(&self) -> &[ArchiveMember] {
        &self.members
    }

    fn expand(&mut self, member: &ArchiveMember) -> Result<Vec<u8>> {
        let mut entry = self.archive.by_name(&member.path).map_err(|e| ArchiveError::Invalid {
            path: PathBuf::from(&member.path),
            message: e.to_string(),
        })?;
        let mut buf = Vec::new();
        entry
            .read_to_end(&mut buf)
            .map_err(|e| ArchiveError::io(PathBuf::from(&member.path), e))?;
        Ok(buf)
    }
}

/// An [`ArchiveDriver`] over tar-family archives (plain, gzip, bzip2, xz).
///
/// Tar readers are sequential, so member bytes are decoded eagerly at
/// `open()` time and held in memory; `expand()` then just looks them up.
/// This is a simplification relative to the teacher's streaming
/// `libretto-downloader::extract` pipeline, acceptable here because
/// installed package archives are small relative to available memory.
pub struct TarDriver {
    members: Vec<ArchiveMember>,
    bytes_by_path: HashMap<String, Vec<u8>>,
}

impl std::fmt::Debug for TarDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TarDriver").field("members", &self.members.len()).finish()
    }
}

impl TarDriver {
    /// Open a tar-family archive and eagerly decode every file member.
    ///
    /// # Errors
    /// Returns [`ArchiveError::Invalid`] if the archive is corrupt, or
    /// [`ArchiveError::Io`] on a read failure.
    pub fn open(path: &Path, archive_type: ArchiveType) -> Result<Self> {
        let file = File::open(path).map_err(|e| ArchiveError::io(path, e))?;
        let reader: Box<dyn Read> = match archive_type {
            ArchiveType::TarGz => Box::new(GzDecoder::new(file)),
            ArchiveType::TarBz2 => Box::new(BzDecoder::new(file)),
            ArchiveType::TarXz => Box::new(XzDecoder::new(file)),
            ArchiveType::Tar => Box::new(file),
            ArchiveType::Zip => unreachable!("dispatched to ZipDriver"),
        };

        let mut archive = tar::Archive::new(reader);
        let mut members = Vec::new();
        let mut bytes_by_path = HashMap::new();

        let entries = archive
            .entries()
            .map_err(|e| ArchiveError::Invalid { path: path.to_path_buf(), message: e.to_string() })?;

        for entry in entries {
            let mut entry =
                entry.map_err(|e| ArchiveError::Invalid { path: path.to_path_buf(), message: e.to_string() })?;
            let entry_path = entry
                .path()
                .map_err(|e| ArchiveError::Invalid { path: path.to_path_buf(), message: e.to_string() })?
                .to_string_lossy()
                .into_owned();
            let normalized = normalize(&entry_path);

            if entry.header().entry_type().is_dir() {
                members.push(ArchiveMember { path: normalized, kind: MemberKind::Dir });
                continue;
            }
            if !entry.header().entry_type().is_file() {
                continue;
            }

            let mut buf = Vec::new();
            entry
                .read_to_end(&mut buf)
                .map_err(|e| ArchiveError::io(&normalized, e))?;
            bytes_by_path.insert(normalized.clone(), buf);
            members.push(ArchiveMember { path: normalized, kind: MemberKind::File });
        }

        Ok(Self { members, bytes_by_path })
    }
}

impl ArchiveDriver for TarDriver {
    fn members(&self) -> &[ArchiveMember] {
        &self.members
    }

    fn expand(&mut self, member: &ArchiveMember) -> Result<Vec<u8>> {
        self.bytes_by_path.get(&member.path).cloned().ok_or_else(|| ArchiveError::Invalid {
            path: PathBuf::from(&member.path),
            message: "member has no bytes (directory entries cannot be expanded)".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn archive_type_detection() {
        assert_eq!(ArchiveType::from_filename("package.zip"), Some(ArchiveType::Zip));
        assert_eq!(ArchiveType::from_filename("package.tar.gz"), Some(ArchiveType::TarGz));
        assert_eq!(ArchiveType::from_filename("package.tgz"), Some(ArchiveType::TarGz));
        assert_eq!(ArchiveType::from_filename("package.tar"), Some(ArchiveType::Tar));
        assert_eq!(ArchiveType::from_filename("package.tar.bz2"), Some(ArchiveType::TarBz2));
        assert_eq!(ArchiveType::from_filename("package.tar.xz"), Some(ArchiveType::TarXz));
        assert_eq!(ArchiveType::from_filename("package.unknown"), None);
    }

    fn write_zip(dir: &Path) -> PathBuf {
        let path = dir.join("pkg.zip");
        let file = File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        zip.add_directory("libA-1.0.0/", options).unwrap();
        zip.start_file("libA-1.0.0/package.json", options).unwrap();
        zip.write_all(br#"{"name":"libA","version":"1.0.0"}"#).unwrap();
        zip.start_file("libA-1.0.0/source/index.js", options).unwrap();
        zip.write_all(b"console.log(1);").unwrap();
        zip.finish().unwrap();
        path
    }

    #[test]
    fn zip_driver_lists_and_expands_members() {
        let dir = tempdir().unwrap();
        let path = write_zip(dir.path());
        let mut driver = ZipDriver::open(&path).unwrap();

        let members = driver.members().to_vec();
        assert!(members.iter().any(|m| m.path == "libA-1.0.0/package.json" && m.is_file()));
        assert!(members.iter().any(|m| m.path == "libA-1.0.0/" && m.kind == MemberKind::Dir));

        let manifest_member = members.iter().find(|m| m.path == "libA-1.0.0/package.json").unwrap().clone();
        let bytes = driver.expand(&manifest_member).unwrap();
        assert_eq!(bytes, br#"{"name":"libA","version":"1.0.0"}"#);
    }

    fn write_tar(dir: &Path) -> PathBuf {
        let path = dir.join("pkg.tar");
        let file = File::create(&path).unwrap();
        let mut builder = tar::Builder::new(file);
        let manifest = br#"{"name":"libA","version":"1.0.0"}"#;
        let mut header = tar::Header::new_gnu();
        header.set_size(manifest.len() as u64);
        header.set_cksum();
        builder.append_data(&mut header, "libA-1.0.0/package.json", &manifest[..]).unwrap();
        builder.finish().unwrap();
        path
    }

    #[test]
    fn tar_driver_lists_and_expands_members() {
        let dir = tempdir().unwrap();
        let path = write_tar(dir.path());
        let mut driver = TarDriver::open(&path, ArchiveType::Tar).unwrap();

        let members = driver.members().to_vec();
        let manifest_member = members.iter().find(|m| m.path == "libA-1.0.0/package.json").unwrap().clone();
        let bytes = driver.expand(&manifest_member).unwrap();
        assert_eq!(bytes, br#"{"name":"libA","version":"1.0.0"}"#);
    }

    #[test]
    fn open_dispatches_by_extension() {
        let dir = tempdir().unwrap();
        let path = write_zip(dir.path());
        let driver = open(&path).unwrap();
        assert!(!driver.members().is_empty());
    }

    #[test]
    fn open_detected_sniffs_zip_from_extensionless_name() {
        let dir = tempdir().unwrap();
        let tagged = write_zip(dir.path());
        let untagged = dir.path().join("libA.archive");
        std::fs::rename(&tagged, &untagged).unwrap();

        let driver = open_detected(&untagged).unwrap();
        assert!(!driver.members().is_empty());
    }

    #[test]
    fn open_rejects_unknown_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pkg.unknownext");
        std::fs::write(&path, b"nope").unwrap();
        let err = open(&path);
        assert!(matches!(err, Err(ArchiveError::UnknownFormat { .. })));
    }
}
