//! Rejected input: every error carries a kind, a message and the offending span.

use unpy::{PythonVersion, Span, StubError, StubErrorKind, transform_source};

fn reject(source: &str, target: PythonVersion) -> StubError {
    match transform_source(source, target) {
        Ok(out) => panic!("expected {source:?} to be rejected at {target}, got {out:?}"),
        Err(err) => err,
    }
}

fn spanned<'s>(source: &'s str, span: Span) -> &'s str {
    &source[span.start as usize..span.end as usize]
}

#[test]
fn test_syntax_error() {
    let source = "def f(:\n";
    let err = reject(source, PythonVersion::Py310);
    assert_eq!(err.kind(), StubErrorKind::Syntax);
    assert!(err.to_string().starts_with("syntax error: "), "{err}");
    assert!(err.span().start as usize <= source.len());
}

#[test]
fn test_conflicting_type_parameters() {
    let source = "\
def f[T: int](x: T) -> T: ...
def g[T: str](x: T) -> T: ...
";
    let err = reject(source, PythonVersion::Py310);
    assert_eq!(err.kind(), StubErrorKind::Conflict);
    assert_eq!(err.message(), "conflicting definitions of type parameter 'T'");
    assert_eq!(spanned(source, err.span()), "T: str");
}

#[test]
fn test_type_parameters_with_explicit_generic_base() {
    let source = "from typing import Generic\n\nclass C[T](Generic[T]): ...\n";
    for target in [PythonVersion::Py310, PythonVersion::Py312] {
        let err = reject(source, target);
        assert_eq!(err.kind(), StubErrorKind::Conflict);
        assert_eq!(
            err.message(),
            "'C': type parameters cannot be combined with a Generic base"
        );
    }
}

#[test]
fn test_denylisted_base_before_removal() {
    let source = "from pathlib import Path\n\nclass P(Path): ...\n";
    let err = reject(source, PythonVersion::Py311);
    assert_eq!(err.kind(), StubErrorKind::UnsupportedConstruct);
    assert_eq!(
        err.message(),
        "'P': subclassing 'pathlib.Path' requires Python >= 3.12"
    );
    assert_eq!(transform_source(source, PythonVersion::Py312).unwrap(), source);
}

#[test]
fn test_executable_code_is_a_policy_violation() {
    for source in ["pass\n", "del x\n", "for i in x: ...\n", "x: int = a and b\n"] {
        let err = reject(source, PythonVersion::Py313);
        assert_eq!(err.kind(), StubErrorKind::PolicyViolation, "{source:?}: {err}");
    }
}

#[test]
fn test_future_import_is_a_policy_violation() {
    let err = reject("from __future__ import annotations\n", PythonVersion::Py310);
    assert_eq!(err.kind(), StubErrorKind::PolicyViolation);
}

#[test]
fn test_quoted_annotation_is_a_policy_violation() {
    let source = "x: \"int\"\n";
    let err = reject(source, PythonVersion::Py310);
    assert_eq!(err.kind(), StubErrorKind::PolicyViolation);
    assert_eq!(spanned(source, err.span()), "\"int\"");
}

#[test]
fn test_nested_import_is_unsupported() {
    let err = reject("class C:\n    import os\n", PythonVersion::Py310);
    assert_eq!(err.kind(), StubErrorKind::UnsupportedConstruct);
    assert_eq!(err.message(), "only top-level import statements are supported");
}

#[test]
fn test_error_display_includes_kind() {
    let err = reject("from asyncio import TaskGroup\n", PythonVersion::Py310);
    assert_eq!(
        err.to_string(),
        "unsupported construct: 'asyncio.TaskGroup' requires Python >= 3.11"
    );
}
