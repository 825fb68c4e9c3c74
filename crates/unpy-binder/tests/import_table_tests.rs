use super::*;
use unpy_common::{Span, StubErrorKind};

fn span() -> Span {
    Span::new(0, 1)
}

fn table(imports: &[(&str, Option<&str>, Option<&str>)]) -> ImportTable {
    let mut table = ImportTable::new();
    for &(name, module, alias) in imports {
        match module {
            Some(module) => table.register_import(name, Some(module), alias, span()),
            None => table.register_module_import(name, alias, span()),
        }
        .unwrap();
    }
    table
}

#[test]
fn test_resolve_direct_and_aliased() {
    let table = table(&[
        ("Any", Some("typing"), None),
        ("override", Some("typing_extensions"), Some("_override")),
    ]);
    assert_eq!(table.resolve("typing", "Any").as_deref(), Some("Any"));
    assert_eq!(
        table.resolve("typing_extensions", "override").as_deref(),
        Some("_override")
    );
    assert_eq!(table.resolve("typing", "Self"), None);
}

#[test]
fn test_resolve_wildcard() {
    let table = table(&[("*", Some("typing"), None)]);
    assert_eq!(table.alias_of("typing.*"), Some("*"));
    assert_eq!(table.resolve("typing", "Protocol").as_deref(), Some("Protocol"));
    assert!(!table.is_import_alias("*"));
}

#[test]
fn test_resolve_through_module_import() {
    let table = table(&[("collections", None, Some("col")), ("typing", None, None)]);
    assert_eq!(
        table.resolve("collections.abc", "Set").as_deref(),
        Some("col.abc.Set")
    );
    assert_eq!(table.resolve("typing", "Any").as_deref(), Some("typing.Any"));
    assert_eq!(table.resolve("os", "PathLike"), None);
}

#[test]
fn test_dotted_module_import_binds_parents() {
    let table = table(&[("collections.abc", None, None)]);
    assert_eq!(table.alias_of("collections"), Some("collections"));
    assert_eq!(table.alias_of("collections.abc"), Some("collections.abc"));
    assert_eq!(
        table.resolve("collections.abc", "Buffer").as_deref(),
        Some("collections.abc.Buffer")
    );
}

#[test]
fn test_resolve_builtins() {
    let mut table = ImportTable::new();
    assert_eq!(table.resolve("builtins", "object").as_deref(), Some("object"));

    table.set_global_names(["object".to_string()]);
    assert!(table.is_global_name("object"));
    assert_eq!(
        table.resolve("builtins", "object").as_deref(),
        Some("__builtins__.object")
    );
    assert_eq!(table.resolve("builtins", "int").as_deref(), Some("int"));

    table
        .register_import("builtins", None, Some("_b"), span())
        .unwrap();
    assert_eq!(table.resolve("builtins", "object").as_deref(), Some("_b.object"));
}

#[test]
fn test_resolve_reveal_type_without_import() {
    let table = ImportTable::new();
    assert_eq!(
        table.resolve("typing", "reveal_type").as_deref(),
        Some("reveal_type")
    );
    assert_eq!(
        table.resolve("typing_extensions", "reveal_locals").as_deref(),
        Some("reveal_locals")
    );
}

#[test]
fn test_imported_from_typing_as() {
    let table = table(&[("TypeAlias", Some("typing_extensions"), None)]);
    assert_eq!(
        table.imported_from_typing_as("TypeAlias").as_deref(),
        Some("TypeAlias")
    );
    assert_eq!(table.imported_from_typing_as("Generic"), None);
}

#[test]
fn test_future_import_is_rejected() {
    let mut table = ImportTable::new();
    let err = table
        .register_import("annotations", Some("__future__"), None, span())
        .unwrap_err();
    assert_eq!(err.kind(), StubErrorKind::PolicyViolation);
    assert_eq!(err.message(), "__future__ imports are useless in stubs");

    let err = table
        .register_module_import("__future__", None, span())
        .unwrap_err();
    assert_eq!(err.kind(), StubErrorKind::PolicyViolation);
}

#[test]
fn test_conflicting_alias_is_rejected() {
    let mut table = ImportTable::new();
    table
        .register_import("Any", Some("typing"), None, span())
        .unwrap();
    table
        .register_import("Any", Some("typing"), None, span())
        .unwrap();
    let err = table
        .register_import("Any", Some("typing"), Some("_Any"), span())
        .unwrap_err();
    assert_eq!(err.kind(), StubErrorKind::UnsupportedConstruct);
    assert_eq!(err.message(), "'typing.Any' cannot be imported as another name");
}

#[test]
fn test_relative_imports() {
    let mut table = ImportTable::new();
    let fq = table.register_import("x", Some("."), None, span()).unwrap();
    assert_eq!(fq, ".x");
    let fq = table
        .register_import("y", Some("..pkg"), None, span())
        .unwrap();
    assert_eq!(fq, "..pkg.y");
    assert_eq!(table.fq_name_of_alias("y"), Some("..pkg.y"));
}

#[test]
fn test_access_paths() {
    let table = table(&[
        ("collections", None, None),
        ("Any", Some("typing"), Some("_Any")),
    ]);
    assert_eq!(
        table.resolve_access_expression("_Any"),
        Some(AccessPath {
            import_fq_name: "typing.Any".to_string(),
            member_path: None,
        })
    );
    let path = table
        .resolve_access_expression("collections.abc.Buffer")
        .unwrap();
    assert_eq!(path.import_fq_name, "collections");
    assert_eq!(path.member_path.as_deref(), Some("abc.Buffer"));
    assert_eq!(path.fq_name(), "collections.abc.Buffer");
    assert_eq!(table.resolve_access_expression("os.path"), None);
}

#[test]
fn test_fq_name_of() {
    let mut table = table(&[("Any", Some("typing"), Some("_Any"))]);
    table.set_global_names(["_Any".to_string(), "Spam".to_string()]);
    assert_eq!(table.fq_name_of("_Any"), "typing.Any");
    assert_eq!(table.fq_name_of("int"), "builtins.int");
    assert_eq!(table.fq_name_of("__builtins__.object"), "builtins.object");
    assert_eq!(table.fq_name_of("Spam"), "Spam");
    assert_eq!(table.fq_name_of("Spam.Eggs"), "Spam.Eggs");
}

#[test]
fn test_registration_invalidates_memo() {
    let mut table = table(&[("typing", None, None)]);
    assert_eq!(table.resolve("typing", "Any").as_deref(), Some("typing.Any"));
    assert_eq!(table.resolve_access_expression("Any"), None);

    table
        .register_import("Any", Some("typing"), None, span())
        .unwrap();
    assert_eq!(table.resolve("typing", "Any").as_deref(), Some("Any"));
    assert_eq!(
        table.resolve_access_expression("Any").map(|p| p.fq_name()),
        Some("typing.Any".to_string())
    );
    assert_eq!(table.len(), 2);
    assert!(!table.is_empty());
    assert_eq!(
        table.bindings().collect::<Vec<_>>(),
        vec![("typing", "typing"), ("typing.Any", "Any")]
    );
}
