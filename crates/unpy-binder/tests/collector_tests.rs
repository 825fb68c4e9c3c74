use super::*;
use unpy_common::{PythonVersion, Span, StubError, StubErrorKind};
use unpy_parser::{NodeArena, NodeIndex, ParserState};

fn parse(source: &str) -> (NodeArena, NodeIndex) {
    let mut parser = ParserState::new("test.pyi", source);
    let module = parser.parse_module();
    assert!(
        parser.get_diagnostics().is_empty(),
        "unexpected diagnostics for {source:?}: {:?}",
        parser.get_diagnostics()
    );
    (parser.into_arena(), module)
}

fn statements(arena: &NodeArena, module: NodeIndex) -> Vec<NodeIndex> {
    arena
        .get_module(arena.get(module).unwrap())
        .unwrap()
        .statements
        .nodes
        .clone()
}

fn collect(source: &str, target: PythonVersion) -> Collected {
    let (arena, module) = parse(source);
    CollectorState::new(&arena, target, &StdlibBackports)
        .run(module)
        .unwrap_or_else(|err| panic!("collecting {source:?} failed: {err}"))
}

fn collect_err(source: &str, target: PythonVersion) -> StubError {
    let (arena, module) = parse(source);
    match CollectorState::new(&arena, target, &StdlibBackports).run(module) {
        Ok(_) => panic!("expected an error for {source:?}"),
        Err(err) => err,
    }
}

fn assert_error(source: &str, target: PythonVersion, kind: StubErrorKind, message: &str) {
    let err = collect_err(source, target);
    assert_eq!(err.kind(), kind, "{source:?}: {err}");
    assert_eq!(err.message(), message, "{source:?}");
}

fn type_var(name: &str, bound: TypeVarBound, variance: Variance, default: Option<&str>) -> TypeParameter {
    TypeParameter::TypeVar {
        name: name.to_string(),
        bound,
        variance,
        default: default.map(TypeExpr::synthesized),
    }
}

// =============================================================================
// Lowering decisions
// =============================================================================

#[test]
fn test_generic_function_is_lowered_before_312() {
    let source = "def spam[T](x: T) -> T: ...\n";
    let (arena, module) = parse(source);
    let collected = CollectorState::new(&arena, PythonVersion::Py310, &StdlibBackports)
        .run(module)
        .unwrap();
    let stmt = statements(&arena, module)[0];

    assert_eq!(
        collected.type_param("T"),
        Some(&type_var("T", TypeVarBound::Unbounded, Variance::Invariant, None))
    );
    assert_eq!(collected.hoisted.get(&stmt), Some(&vec!["T".to_string()]));
    assert!(collected.is_lowered(stmt));
    let decl = &collected.lowered[&stmt];
    assert_eq!(decl.kind, DeclKind::Function);
    assert_eq!(decl.qualname, "spam");
    assert_eq!(decl.root, stmt);
    assert_eq!(
        collected.support.needed.iter().copied().collect::<Vec<_>>(),
        vec![("typing", "TypeVar")]
    );
}

#[test]
fn test_generic_function_is_kept_at_312() {
    for target in [PythonVersion::Py312, PythonVersion::Py313, PythonVersion::Py314] {
        let collected = collect("def spam[T](x: T) -> T: ...\n", target);
        assert!(collected.type_params.is_empty(), "{target}");
        assert!(collected.lowered.is_empty(), "{target}");
        assert!(collected.support.needed.is_empty(), "{target}");
    }
}

#[test]
fn test_defaults_are_lowered_at_312_only() {
    let source = "def f[T = int](x: T) -> T: ...\n";
    let collected = collect(source, PythonVersion::Py312);
    assert_eq!(
        collected.type_param("T"),
        Some(&type_var("T", TypeVarBound::Unbounded, Variance::Invariant, Some("int")))
    );
    assert!(collected.support.contains(("typing_extensions", "TypeVar")));

    let collected = collect(source, PythonVersion::Py313);
    assert!(collected.type_params.is_empty());
}

#[test]
fn test_class_variance_from_suffix() {
    let collected = collect("class C[T_contra, T, T_co]: ...\n", PythonVersion::Py311);
    let variances: Vec<_> = collected
        .type_params
        .values()
        .map(|param| match param {
            TypeParameter::TypeVar { variance, .. } => *variance,
            other => panic!("unexpected parameter {other:?}"),
        })
        .collect();
    assert_eq!(
        variances,
        vec![Variance::Contravariant, Variance::Inferred, Variance::Covariant]
    );
    assert_eq!(
        collected.support.needed.iter().copied().collect::<Vec<_>>(),
        vec![
            ("typing", "TypeVar"),
            ("typing_extensions", "TypeVar"),
            ("typing", "Generic"),
        ]
    );
}

#[test]
fn test_in_and_out_names_keep_inferred_variance() {
    let collected = collect("class C[Plug_in, Log_out]: ...\n", PythonVersion::Py311);
    for param in collected.type_params.values() {
        match param {
            TypeParameter::TypeVar { variance, .. } => assert_eq!(*variance, Variance::Inferred),
            other => panic!("unexpected parameter {other:?}"),
        }
    }
}

#[test]
fn test_type_parameters_serialize_in_order() {
    let collected = collect("class C[T_contra, T, T_co]: ...\n", PythonVersion::Py311);
    let json = serde_json::to_value(&collected.type_params).expect("serializable");
    let names: Vec<&str> = json
        .as_object()
        .expect("a JSON object")
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(names, ["T_contra", "T", "T_co"]);
}

#[test]
fn test_nested_declarations_hoist_to_root() {
    let source = "\
class C:
    def m[T](self, x: T) -> T: ...
";
    let (arena, module) = parse(source);
    let collected = CollectorState::new(&arena, PythonVersion::Py310, &StdlibBackports)
        .run(module)
        .unwrap();
    let class_stmt = statements(&arena, module)[0];
    assert_eq!(collected.hoisted.get(&class_stmt), Some(&vec!["T".to_string()]));
    let decl = collected.lowered.values().next().unwrap();
    assert_eq!(decl.qualname, "C.m");
    assert_eq!(decl.root, class_stmt);
    assert_eq!(
        collected.type_param("T"),
        Some(&type_var("T", TypeVarBound::Unbounded, Variance::Invariant, None))
    );
}

// =============================================================================
// Type parameter registry
// =============================================================================

#[test]
fn test_identical_parameters_are_deduplicated() {
    let source = "\
def f[T](x: T) -> T: ...
def g[T](x: T) -> T: ...
";
    let (arena, module) = parse(source);
    let collected = CollectorState::new(&arena, PythonVersion::Py310, &StdlibBackports)
        .run(module)
        .unwrap();
    let stmts = statements(&arena, module);
    assert_eq!(collected.type_params.len(), 1);
    assert_eq!(collected.hoisted.len(), 1);
    assert!(collected.hoisted.contains_key(&stmts[0]));
    assert_eq!(collected.lowered.len(), 2);
    assert_eq!(collected.lowered[&stmts[1]].params, vec!["T".to_string()]);
}

#[test]
fn test_different_parameters_conflict() {
    let source = "\
def f[T: int](x: T) -> T: ...
def g[T: str](x: T) -> T: ...
";
    let err = collect_err(source, PythonVersion::Py310);
    assert_eq!(err.kind(), StubErrorKind::Conflict);
    assert_eq!(err.message(), "conflicting definitions of type parameter 'T'");
    assert_eq!(&source[err.span().start as usize..err.span().end as usize], "T: str");

    // A class parameter infers its variance, a function parameter does not.
    let source = "\
class C[T]: ...
def f[T](x: T) -> T: ...
";
    assert_error(
        source,
        PythonVersion::Py310,
        StubErrorKind::Conflict,
        "conflicting definitions of type parameter 'T'",
    );
}

#[test]
fn test_canonical_bounds_are_deduplicated() {
    let source = "\
def f[T: tuple[int, str]](x: T) -> T: ...
def g[T: tuple[int,str]](x: T) -> T: ...
";
    let collected = collect(source, PythonVersion::Py311);
    assert_eq!(
        collected.type_param("T"),
        Some(&type_var(
            "T",
            TypeVarBound::Bound(TypeExpr::synthesized("tuple[int,str]")),
            Variance::Invariant,
            None,
        ))
    );
}

#[test]
fn test_constraints_and_bounds() {
    let collected = collect(
        "def f[Z: (int, float, complex)](z: Z) -> Z: ...\n",
        PythonVersion::Py310,
    );
    assert_eq!(
        collected.type_param("Z"),
        Some(&type_var(
            "Z",
            TypeVarBound::Constraints(vec![
                TypeExpr::synthesized("int"),
                TypeExpr::synthesized("float"),
                TypeExpr::synthesized("complex"),
            ]),
            Variance::Invariant,
            None,
        ))
    );

    let collected = collect("def f[Z: object](z: Z) -> Z: ...\n", PythonVersion::Py310);
    assert_eq!(
        collected.type_param("Z"),
        Some(&type_var("Z", TypeVarBound::Unbounded, Variance::Invariant, None))
    );
}

#[test]
fn test_constraints_with_suffix_conflict() {
    assert_error(
        "class C[T_co: (int, str)]: ...\n",
        PythonVersion::Py310,
        StubErrorKind::Conflict,
        "type constraints require invariance",
    );
    let collected = collect("class C[T: (int, str)]: ...\n", PythonVersion::Py310);
    assert!(matches!(
        collected.type_param("T"),
        Some(TypeParameter::TypeVar {
            variance: Variance::Invariant,
            ..
        })
    ));
}

#[test]
fn test_any_defaults_and_constraints() {
    let source = "\
from typing import Any
def f[T = Any](x: T) -> T: ...
";
    let collected = collect(source, PythonVersion::Py312);
    assert_eq!(
        collected.type_param("T"),
        Some(&type_var("T", TypeVarBound::Unbounded, Variance::Invariant, Some("object")))
    );

    let source = "\
from typing import Any
def f[T: int = Any](x: T) -> T: ...
";
    let collected = collect(source, PythonVersion::Py312);
    assert_eq!(
        collected.type_param("T"),
        Some(&type_var(
            "T",
            TypeVarBound::Bound(TypeExpr::synthesized("int")),
            Variance::Invariant,
            Some("int"),
        ))
    );

    let source = "\
from typing import Any
def f[T: (int, Any)](x: T) -> T: ...
";
    let collected = collect(source, PythonVersion::Py310);
    assert_eq!(
        collected.type_param("T"),
        Some(&type_var(
            "T",
            TypeVarBound::Constraints(vec![
                TypeExpr::synthesized("int"),
                TypeExpr::synthesized("object"),
            ]),
            Variance::Invariant,
            None,
        ))
    );
}

#[test]
fn test_variadic_and_param_spec_parameters() {
    let source = "class C[*Ts = *tuple[int, ...], **P = [str]]: ...\n";
    let collected = collect(source, PythonVersion::Py312);
    assert_eq!(
        collected.type_param("Ts"),
        Some(&TypeParameter::TypeVarTuple {
            name: "Ts".to_string(),
            default: Some(TypeExpr::synthesized("tuple[int,...]")),
            default_star: true,
        })
    );
    assert_eq!(
        collected.type_param("P"),
        Some(&TypeParameter::ParamSpec {
            name: "P".to_string(),
            default: Some(TypeExpr::synthesized("[str]")),
        })
    );
    for symbol in [
        ("typing_extensions", "TypeVarTuple"),
        ("typing_extensions", "Unpack"),
        ("typing_extensions", "ParamSpec"),
        ("typing", "Generic"),
    ] {
        assert!(collected.support.contains(symbol), "{symbol:?}");
    }
}

#[test]
fn test_variadic_unpacks_are_recorded() {
    let source = "def f[*Ts](*args: *Ts) -> tuple[*Ts]: ...\n";
    let collected = collect(source, PythonVersion::Py310);
    assert_eq!(collected.unpacks.len(), 2);

    let collected = collect("def f(*args: *Ts) -> None: ...\n", PythonVersion::Py310);
    assert!(collected.unpacks.is_empty());
}

// =============================================================================
// Class bases
// =============================================================================

#[test]
fn test_generic_base_conflicts() {
    let source = "\
from typing import Generic
class C[T](Generic[T]): ...
";
    assert_error(
        source,
        PythonVersion::Py312,
        StubErrorKind::Conflict,
        "'C': type parameters cannot be combined with a Generic base",
    );

    let source = "\
from typing import Protocol
class C[T](Protocol[T]): ...
";
    assert_error(
        source,
        PythonVersion::Py310,
        StubErrorKind::Conflict,
        "'C': type parameters cannot be combined with a subscripted Protocol base",
    );
}

#[test]
fn test_protocol_base_is_recorded() {
    let source = "\
from typing import Protocol
class P[T](Protocol):
    def get(self) -> T: ...
";
    let (arena, module) = parse(source);
    let collected = CollectorState::new(&arena, PythonVersion::Py310, &StdlibBackports)
        .run(module)
        .unwrap();
    let class_stmt = statements(&arena, module)[1];
    let bases = &collected.class_bases[&class_stmt];
    assert_eq!(bases.protocol, Some(0));
    assert_eq!(bases.bases[0].fq_name, "typing.Protocol");
    assert!(!collected.support.contains(("typing", "Generic")));
}

#[test]
fn test_base_resolution() {
    let source = "\
import typing as t
from typing import cast
class A(t.Mapping[str, int], cast(type[int], int), metaclass=Meta): ...
";
    let (arena, module) = parse(source);
    let collected = CollectorState::new(&arena, PythonVersion::Py310, &StdlibBackports)
        .run(module)
        .unwrap();
    let class_stmt = statements(&arena, module)[2];
    let bases = &collected.class_bases[&class_stmt];
    let summary: Vec<_> = bases
        .bases
        .iter()
        .map(|base| (base.dotted.as_str(), base.fq_name.as_str(), base.subscripted))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("t.Mapping", "typing.Mapping", true),
            ("int", "builtins.int", false),
        ]
    );
    assert_eq!(bases.protocol, None);
}

#[test]
fn test_denylisted_bases() {
    let source = "\
from pathlib import Path
class P(Path): ...
";
    assert_error(
        source,
        PythonVersion::Py311,
        StubErrorKind::UnsupportedConstruct,
        "'P': subclassing 'pathlib.Path' requires Python >= 3.12",
    );
    collect(source, PythonVersion::Py312);

    assert_error(
        "class O(object): ...\n",
        PythonVersion::Py314,
        StubErrorKind::UnsupportedConstruct,
        "'O': subclassing 'builtins.object' is not allowed in stubs",
    );
}

#[test]
fn test_malformed_bases() {
    assert_error(
        "class C(*bases): ...\n",
        PythonVersion::Py310,
        StubErrorKind::UnsupportedConstruct,
        "'C': starred base classes",
    );
    assert_error(
        "class C(make_base()): ...\n",
        PythonVersion::Py310,
        StubErrorKind::UnsupportedConstruct,
        "'C': unsupported class argument expression",
    );
}

// =============================================================================
// Stub policy
// =============================================================================

#[test]
fn test_quoted_annotations() {
    let plain = "quoted annotations should not be included in stubs";
    for source in [
        "def f(x: \"int\") -> None: ...\n",
        "def f(x: int) -> \"int\": ...\n",
        "x: \"int\"\n",
    ] {
        assert_error(source, PythonVersion::Py310, StubErrorKind::PolicyViolation, plain);
    }

    let cases = [
        ("def f[T: \"int\"](x: T) -> T: ...\n", "T"),
        ("def f[T = \"int\"](x: T) -> T: ...\n", "T"),
        ("type A = \"int\"\n", "type A"),
        (
            "from typing import TypeAlias\nA: TypeAlias = \"int\"\n",
            "A",
        ),
        (
            "from typing import TypeVar\nT = TypeVar(\"T\", bound=\"int\")\n",
            "T = TypeVar(...)",
        ),
        (
            "import typing\nT = typing.TypeVar(\"T\", \"int\", str)\n",
            "T = typing.TypeVar(...)",
        ),
    ];
    for (source, context) in cases {
        assert_error(
            source,
            PythonVersion::Py310,
            StubErrorKind::PolicyViolation,
            &format!("{plain} (in '{context}')"),
        );
    }
}

#[test]
fn test_module_level_hooks() {
    let source = "def __getattr__(name: str) -> object: ...\n";
    let err = collect_err(source, PythonVersion::Py310);
    assert_eq!(err.kind(), StubErrorKind::PolicyViolation);
    assert_eq!(err.message(), "module-level __getattr__() cannot be used in a stub");
    assert_eq!(err.span(), Span::new(4, 15));

    assert_error(
        "def __dir__() -> list[str]: ...\n",
        PythonVersion::Py310,
        StubErrorKind::PolicyViolation,
        "module-level __dir__() cannot be used in a stub",
    );

    collect(
        "class C:\n    def __getattr__(self, name: str) -> int: ...\n",
        PythonVersion::Py310,
    );
}

#[test]
fn test_executable_statements() {
    let cases = [
        ("del x\n", "'del' statements are useless in stubs"),
        ("pass\n", "'pass' statements are useless in stubs"),
        ("class C:\n    pass\n", "'pass' statements are useless in stubs"),
        ("while True:\n    x: int\n", "'while' statements are useless in stubs"),
        ("for i in x: ...\n", "'for' statements are useless in stubs"),
    ];
    for (source, message) in cases {
        assert_error(source, PythonVersion::Py310, StubErrorKind::PolicyViolation, message);
    }
}

#[test]
fn test_executable_expressions() {
    let cases = [
        ("x: int = a and b\n", "boolean operations are useless in stubs"),
        ("x: str = f\"{y}\"\n", "f-strings are useless in stubs"),
        ("x = lambda: 1\n", "'lambda' is an invalid expression"),
    ];
    for (source, message) in cases {
        assert_error(source, PythonVersion::Py310, StubErrorKind::PolicyViolation, message);
    }
}

#[test]
fn test_allowed_module_contents() {
    let source = "\
\"\"\"Module docstring.\"\"\"
import sys
__all__ = [\"f\"]
if sys.version_info >= (3, 11):
    from typing import Self
else:
    from typing_extensions import Self
def f() -> None:
    \"\"\"Function docstring.\"\"\"
x: int = ...
y = not x
";
    let collected = collect(source, PythonVersion::Py310);
    assert_eq!(collected.from_imports.len(), 2);
    assert!(collected.type_params.is_empty());
}

// =============================================================================
// Imports and references
// =============================================================================

#[test]
fn test_nested_imports_are_rejected() {
    assert_error(
        "class C:\n    import os\n",
        PythonVersion::Py310,
        StubErrorKind::UnsupportedConstruct,
        "only top-level import statements are supported",
    );
    assert_error(
        "def f() -> None:\n    from os import path\n",
        PythonVersion::Py310,
        StubErrorKind::UnsupportedConstruct,
        "only top-level import statements are supported",
    );
}

#[test]
fn test_wildcard_imports() {
    for module in ["typing", "typing_extensions", "re", "collections.abc"] {
        assert_error(
            &format!("from {module} import *\n"),
            PythonVersion::Py310,
            StubErrorKind::UnsupportedConstruct,
            &format!("wildcard imports from '{module}' are not supported"),
        );
    }
    let collected = collect("from os import *\n", PythonVersion::Py310);
    assert_eq!(collected.imports.alias_of("os.*"), Some("*"));
}

#[test]
fn test_future_import_is_rejected() {
    assert_error(
        "from __future__ import annotations\n",
        PythonVersion::Py310,
        StubErrorKind::PolicyViolation,
        "__future__ imports are useless in stubs",
    );
}

#[test]
fn test_denylisted_names() {
    assert_error(
        "from asyncio import TaskGroup\n",
        PythonVersion::Py310,
        StubErrorKind::UnsupportedConstruct,
        "'asyncio.TaskGroup' requires Python >= 3.11",
    );
    collect("from asyncio import TaskGroup\n", PythonVersion::Py311);

    assert_error(
        "import asyncio\nx: asyncio.TaskGroup\n",
        PythonVersion::Py310,
        StubErrorKind::UnsupportedConstruct,
        "'asyncio.TaskGroup' requires Python >= 3.11",
    );
    assert_error(
        "x: ExceptionGroup[ValueError]\n",
        PythonVersion::Py310,
        StubErrorKind::UnsupportedConstruct,
        "'builtins.ExceptionGroup' requires Python >= 3.11",
    );
    assert_error(
        "from functools import cache\n",
        PythonVersion::Py314,
        StubErrorKind::UnsupportedConstruct,
        "'functools.cache' is not allowed in stubs",
    );
}

#[test]
fn test_import_alias_assignments() {
    assert_error(
        "from typing import Any\nA = Any\n",
        PythonVersion::Py310,
        StubErrorKind::UnsupportedConstruct,
        "multiple import aliases for 'typing.Any'",
    );
    assert_error(
        "from typing import Any\nAny = int\n",
        PythonVersion::Py310,
        StubErrorKind::UnsupportedConstruct,
        "imported name 'Any' cannot be assigned to",
    );
    assert_error(
        "from typing import Any\nfrom typing import Any as _Any\n",
        PythonVersion::Py310,
        StubErrorKind::UnsupportedConstruct,
        "'typing.Any' cannot be imported as another name",
    );
}

#[test]
fn test_references_are_recorded() {
    let source = "\
import collections.abc
from typing import List
x: List[collections.abc.Buffer]
";
    let collected = collect(source, PythonVersion::Py310);
    let dotted: Vec<_> = collected
        .references
        .iter()
        .map(|reference| reference.dotted.as_str())
        .collect();
    assert_eq!(dotted, vec!["List", "collections.abc.Buffer"]);
    let chain = &collected.references[1];
    assert_eq!(chain.prefixes.len(), 3);
    assert_eq!(chain.prefixes.last(), Some(&chain.node));
    assert_eq!(collected.from_imports.len(), 1);
}

// =============================================================================
// Type aliases and support symbols
// =============================================================================

#[test]
fn test_type_alias_support() {
    let collected = collect("type A = int\n", PythonVersion::Py311);
    assert_eq!(
        collected.support.needed.iter().copied().collect::<Vec<_>>(),
        vec![("typing", "TypeAlias")]
    );
    assert_eq!(collected.lowered.values().next().unwrap().kind, DeclKind::TypeAlias);

    let collected = collect("type A = int\n", PythonVersion::Py312);
    assert!(collected.lowered.is_empty());

    let collected = collect("type P[K, V] = dict[K, V]\n", PythonVersion::Py311);
    assert!(collected.support.contains(("typing_extensions", "TypeAliasType")));
    assert!(collected.support.contains(("typing", "TypeVar")));

    let collected = collect("type P[K, V = int] = dict[K, V]\n", PythonVersion::Py312);
    assert!(collected.support.contains(("typing", "TypeAliasType")));
    assert!(collected.support.contains(("typing_extensions", "TypeVar")));
}

#[test]
fn test_nested_type_alias_is_rejected() {
    assert_error(
        "class C:\n    type A = int\n",
        PythonVersion::Py310,
        StubErrorKind::UnsupportedConstruct,
        "only top-level type aliases are supported",
    );
}

#[test]
fn test_satisfied_support() {
    let source = "\
from typing import TypeVar
def f[T](x: T) -> T: ...
";
    let collected = collect(source, PythonVersion::Py310);
    assert!(collected.support.needed.is_empty());
    assert_eq!(
        collected.support.satisfied.get(&("typing", "TypeVar")).map(String::as_str),
        Some("TypeVar")
    );

    let source = "\
import typing
class C[T]: ...
";
    let collected = collect(source, PythonVersion::Py312);
    assert!(collected.support.needed.is_empty());

    let collected = collect(source, PythonVersion::Py311);
    assert_eq!(
        collected.support.satisfied.get(&("typing", "Generic")).map(String::as_str),
        Some("typing.Generic")
    );
    assert_eq!(
        collected.support.needed.iter().copied().collect::<Vec<_>>(),
        vec![("typing_extensions", "TypeVar")]
    );
}

#[test]
fn test_typing_extensions_satisfies_typing_support() {
    let source = "\
from typing_extensions import TypeVar
def f[T](x: T) -> T: ...
";
    let collected = collect(source, PythonVersion::Py310);
    assert!(collected.support.needed.is_empty());
    assert_eq!(
        collected.support.satisfied.get(&("typing", "TypeVar")).map(String::as_str),
        Some("TypeVar")
    );
}
