use std::path::Path;

use super::driver::{STDIN_NAME, backport, check_source_path, display_name, read_stdin};
use super::reporter::Reporter;
use unpy::PythonVersion;

#[test]
fn accepts_stub_and_module_files() {
    let dir = tempfile::tempdir().expect("temp dir");
    for name in ["a.pyi", "b.py"] {
        let path = dir.path().join(name);
        std::fs::write(&path, "x: int\n").expect("write stub");
        check_source_path(&path).expect("stub path should be accepted");
    }
}

#[test]
fn rejects_other_extensions() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "x: int\n").expect("write file");
    let err = check_source_path(&path).unwrap_err();
    assert!(err.to_string().contains("expected a .pyi or .py file"), "{err}");
}

#[test]
fn rejects_missing_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = check_source_path(&dir.path().join("missing.pyi")).unwrap_err();
    assert!(err.to_string().contains("no such file"), "{err}");
}

#[test]
fn refuses_interactive_stdin() {
    let err = read_stdin(true).unwrap_err();
    assert!(err.to_string().contains("interactive terminal"), "{err}");
}

#[test]
fn names_stdin() {
    assert_eq!(display_name(Path::new("-")), STDIN_NAME);
    assert_eq!(display_name(Path::new("pkg/mod.pyi")), "pkg/mod.pyi");
}

#[test]
fn backports_source() {
    let reporter = Reporter::new(false);
    let out = backport(&reporter, "a.pyi", "type Id = int\n", PythonVersion::Py311)
        .expect("backport should succeed");
    assert_eq!(out, "from typing import TypeAlias\n\nId: TypeAlias = int\n");
}

#[test]
fn reports_stub_errors_with_location() {
    let reporter = Reporter::new(false);
    let err = backport(&reporter, "a.pyi", "x: int\npass\n", PythonVersion::Py310).unwrap_err();
    assert_eq!(
        err.to_string(),
        "a.pyi:2:1: policy violation: 'pass' statements are useless in stubs"
    );
}
