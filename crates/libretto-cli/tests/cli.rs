//! End-to-end tests driving the compiled `libretto` binary.

use assert_cmd::Command;
use libretto_test_utils::{archive::wrapped_zip, fixtures, TempApplication};
use predicates::str::contains;
use std::fs;

#[test]
fn help_lists_all_three_subcommands() {
    Command::cargo_bin("libretto")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("install"))
        .stdout(contains("update"))
        .stdout(contains("remove"));
}

#[test]
fn install_with_no_dependencies_is_a_no_op() {
    let app = TempApplication::builder().build().unwrap();

    Command::cargo_bin("libretto")
        .unwrap()
        .args(["--working-dir", app.root().to_str().unwrap(), "install"])
        .assert()
        .success();
}

#[test]
fn remove_without_a_prior_install_fails() {
    let app = TempApplication::builder().build().unwrap();

    Command::cargo_bin("libretto")
        .unwrap()
        .args(["--working-dir", app.root().to_str().unwrap(), "remove", "libA"])
        .assert()
        .failure()
        .stderr(contains("libA"));
}

/// Writes `<repo>/<name>/<version>/package.json` plus a wrapped ZIP archive,
/// the layout `FilesystemSupplier` expects.
fn write_repo_package(repo_root: &std::path::Path, name: &str, version: &str) {
    let dir = repo_root.join(name).join(version);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("package.json"), fixtures::leaf_manifest(name, version)).unwrap();
    let archive = wrapped_zip(
        name,
        version,
        &[
            ("package.json", fixtures::leaf_manifest(name, version).as_bytes()),
            ("source/index.js", b"console.log(1);"),
        ],
    );
    fs::write(dir.join("archive.zip"), archive).unwrap();
}

#[test]
fn install_fetches_a_missing_dependency_from_a_filesystem_repo() {
    let repo = tempfile::tempdir().unwrap();
    write_repo_package(repo.path(), "libA", "1.0.0");

    let app = TempApplication::builder()
        .with_manifest(fixtures::manifest_with_dependency("app", "libA", ">=1.0.0"))
        .build()
        .unwrap();

    Command::cargo_bin("libretto")
        .unwrap()
        .env("LIBRETTO_SUPPLIER_FILESYSTEM_REPO", repo.path())
        .args(["--working-dir", app.root().to_str().unwrap(), "install"])
        .assert()
        .success()
        .stdout(contains("libA"));

    let module_dir = app.root().join("modules/libA");
    assert!(module_dir.join("package.json").exists());
    assert!(module_dir.join("source/index.js").exists());
    assert!(module_dir.join("journal.json").exists());
    assert!(app.root().join("deps.txt").exists());
}

#[test]
fn update_replaces_a_stale_dependency_via_a_filesystem_repo() {
    let repo = tempfile::tempdir().unwrap();
    write_repo_package(repo.path(), "libA", "2.0.0");

    let app = TempApplication::builder()
        .with_manifest(fixtures::manifest_with_dependency("app", "libA", ">=2.0.0"))
        .build()
        .unwrap();
    app.install_module("libA", &fixtures::leaf_manifest("libA", "1.0.0")).unwrap();

    Command::cargo_bin("libretto")
        .unwrap()
        .env("LIBRETTO_SUPPLIER_FILESYSTEM_REPO", repo.path())
        .args(["--working-dir", app.root().to_str().unwrap(), "update"])
        .assert()
        .success();

    let module_dir = app.root().join("modules/libA");
    let manifest = fs::read_to_string(module_dir.join("package.json")).unwrap();
    assert!(manifest.contains("2.0.0"));
}
