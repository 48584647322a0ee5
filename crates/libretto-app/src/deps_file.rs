//! Emission of `<root>/deps.txt`: the two-line include-path file consumed by
//! the application's build step.

use crate::error::{AppError, Result};
use crate::state::ApplicationState;

const DEPS_FILE_NAME: &str = "deps.txt";

/// Render the `deps.txt` contents for `state`: line 1 is a `;`-joined list
/// of `-I<path>` source include entries, line 2 the same for views with
/// `-J`. An empty include list yields an empty line.
#[must_use]
pub fn render(state: &ApplicationState) -> String {
    let source_line = state
        .source_include_paths()
        .iter()
        .map(|p| format!("-I{p}"))
        .collect::<Vec<_>>()
        .join(";");
    let views_line = state
        .views_include_paths()
        .iter()
        .map(|p| format!("-J{p}"))
        .collect::<Vec<_>>()
        .join(";");
    format!("{source_line}\n{views_line}\n")
}

/// Write `deps.txt` at the application root. Called immediately after a
/// successful [`ApplicationState::reinit`].
pub fn write(state: &ApplicationState) -> Result<()> {
    let path = state.root().join(DEPS_FILE_NAME);
    std::fs::write(&path, render(state)).map_err(|e| AppError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_manifest(dir: &std::path::Path, name: &str, version: &str) {
        fs::write(
            dir.join("package.json"),
            format!(r#"{{"name":"{name}","version":"{version}"}}"#),
        )
        .unwrap();
    }

    #[test]
    fn empty_application_yields_empty_lines() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), "app", "0.0.1");
        let mut state = ApplicationState::new(dir.path());
        state.reinit().unwrap();
        assert_eq!(render(&state), "\n\n");
    }

    #[test]
    fn includes_app_and_module_paths() {
        let dir = tempdir().unwrap();
        write_manifest(dir.path(), "app", "0.0.1");
        fs::create_dir_all(dir.path().join("source")).unwrap();

        let module_dir = dir.path().join("modules/libA");
        fs::create_dir_all(module_dir.join("source")).unwrap();
        write_manifest(&module_dir, "libA", "1.0.0");

        let mut state = ApplicationState::new(dir.path());
        state.reinit().unwrap();

        let rendered = render(&state);
        let mut lines = rendered.lines();
        assert_eq!(lines.next().unwrap(), "-Imodules/libA/source;-Isource");
        assert_eq!(lines.next().unwrap(), "");
    }
}
