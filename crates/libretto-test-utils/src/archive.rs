//! Builds an in-memory ZIP archive for a fake package download, matching
//! the shape `libretto-installer` expects: a single top-level wrapper
//! directory holding `package.json` plus source files.

use std::io::Write;

/// Build a ZIP archive wrapping `files` under `<name>-<version>/`.
///
/// # Panics
/// Panics if the in-memory ZIP writer fails, which only happens on an
/// allocation failure.
#[must_use]
pub fn wrapped_zip(name: &str, version: &str, files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let cursor = std::io::Cursor::new(&mut buf);
        let mut zip = zip::ZipWriter::new(cursor);
        let options = zip::write::SimpleFileOptions::default();
        let prefix = format!("{name}-{version}");

        for (path, content) in files {
            zip.start_file(format!("{prefix}/{path}"), options).expect("zip entry");
            zip.write_all(content).expect("zip write");
        }
        zip.finish().expect("zip finish");
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_a_readable_zip() {
        let bytes = wrapped_zip("libA", "1.0.0", &[("package.json", br#"{"name":"libA","version":"1.0.0"}"#)]);
        let reader = std::io::Cursor::new(bytes);
        let mut archive = zip::ZipArchive::new(reader).unwrap();
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.by_index(0).unwrap().name(), "libA-1.0.0/package.json");
    }
}
