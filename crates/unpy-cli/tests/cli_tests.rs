//! Black-box tests of the `unpy` binary.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

const GENERIC_STUB: &str = "def spam[T](x: T) -> T: ...\n";
const GENERIC_STUB_311: &str =
    "from typing import TypeVar\n\nT = TypeVar(\"T\")\ndef spam(x: T) -> T: ...\n";

/// Run the binary with `args`, feeding `stdin` through a pipe.
fn unpy<I, S>(args: I, stdin: &str) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let mut child = Command::new(env!("CARGO_BIN_EXE_unpy"))
        .args(args)
        .env_remove("UNPY_LOG")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn unpy");
    if let Some(mut pipe) = child.stdin.take() {
        // The binary may exit before reading stdin.
        let _ = pipe.write_all(stdin.as_bytes());
    }
    child.wait_with_output().expect("failed to wait for unpy")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write_stub(dir: &TempDir, name: &str, source: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, source).expect("write stub");
    path
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

#[test]
fn prints_backported_stub_to_stdout() {
    let dir = tempfile::tempdir().expect("temp dir");
    let stub = write_stub(&dir, "spam.pyi", GENERIC_STUB);

    let output = unpy([path_arg(&stub), "--target", "3.11"], "");
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), GENERIC_STUB_311);
    assert_eq!(stderr(&output), "");
}

#[test]
fn leaves_native_syntax_alone() {
    let dir = tempfile::tempdir().expect("temp dir");
    let stub = write_stub(&dir, "spam.pyi", GENERIC_STUB);

    let output = unpy([path_arg(&stub), "-t", "3.12"], "");
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), GENERIC_STUB);
}

#[test]
fn writes_output_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let stub = write_stub(&dir, "spam.pyi", GENERIC_STUB);
    let target = dir.path().join("out.pyi");

    let output = unpy([path_arg(&stub), path_arg(&target)], "");
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "");
    assert_eq!(
        std::fs::read_to_string(&target).expect("read output"),
        GENERIC_STUB_311
    );
}

#[test]
fn reads_stdin() {
    let output = unpy(["-", "--target", "3.11"], GENERIC_STUB);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), GENERIC_STUB_311);
}

#[test]
fn prints_diff() {
    let dir = tempfile::tempdir().expect("temp dir");
    let stub = write_stub(&dir, "spam.pyi", GENERIC_STUB);

    let output = unpy([path_arg(&stub), "--diff"], "");
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let diff = stdout(&output);
    let lines: Vec<&str> = diff.lines().collect();
    for expected in [
        "-def spam[T](x: T) -> T: ...",
        "+from typing import TypeVar",
        "+T = TypeVar(\"T\")",
        "+def spam(x: T) -> T: ...",
    ] {
        assert!(lines.contains(&expected), "missing {expected:?} in:\n{diff}");
    }
}

#[test]
fn diff_is_empty_without_changes() {
    let dir = tempfile::tempdir().expect("temp dir");
    let stub = write_stub(&dir, "plain.pyi", "answer: int\n");

    let output = unpy([path_arg(&stub), "--diff"], "");
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "");
}

#[test]
fn reports_stub_error_with_location() {
    let dir = tempfile::tempdir().expect("temp dir");
    let stub = write_stub(&dir, "bad.pyi", "import sys\nx: \"int\"\n");

    let output = unpy([path_arg(&stub)], "");
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "");
    assert!(
        stderr(&output).contains(
            "bad.pyi:2:4: policy violation: quoted annotations should not be included in stubs"
        ),
        "stderr: {}",
        stderr(&output)
    );
}

#[test]
fn rejects_non_stub_extension() {
    let dir = tempfile::tempdir().expect("temp dir");
    let stub = write_stub(&dir, "spam.txt", GENERIC_STUB);

    let output = unpy([path_arg(&stub)], "");
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("expected a .pyi or .py file"));
}

#[test]
fn rejects_unknown_target() {
    let output = unpy(["-", "--target", "3.9"], GENERIC_STUB);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("3.9"), "stderr: {}", stderr(&output));
}

#[test]
fn output_is_not_written_on_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let stub = write_stub(&dir, "bad.pyi", "pass\n");
    let target = dir.path().join("out.pyi");

    let output = unpy([path_arg(&stub), path_arg(&target)], "");
    assert_eq!(output.status.code(), Some(1));
    assert!(!target.exists());
}

#[test]
fn prints_version() {
    let output = unpy(["--version"], "");
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("unpy "), "{}", stdout(&output));
}
