use super::*;
use unpy_common::PythonVersion;
use unpy_parser::{NodeArena, ParserState};

/// Renders every expression as its canonical text.
struct CanonicalRenderer;

impl ExprRenderer for CanonicalRenderer {
    fn render_expr(&self, _node: unpy_parser::NodeIndex) -> String {
        unreachable!("synthesized expressions never reach the renderer")
    }
}

fn expr(text: &str) -> TypeExpr {
    TypeExpr::synthesized(text)
}

fn type_var(name: &str, bound: TypeVarBound, variance: Variance, default: Option<&str>) -> TypeParameter {
    TypeParameter::TypeVar {
        name: name.to_string(),
        bound,
        variance,
        default: default.map(expr),
    }
}

fn type_var_tuple(name: &str, default: Option<&str>, default_star: bool) -> TypeParameter {
    TypeParameter::TypeVarTuple {
        name: name.to_string(),
        default: default.map(expr),
        default_star,
    }
}

fn param_spec(name: &str, default: Option<&str>) -> TypeParameter {
    TypeParameter::ParamSpec {
        name: name.to_string(),
        default: default.map(expr),
    }
}

fn support(param: &TypeParameter, target: PythonVersion) -> Vec<SupportSymbol> {
    param.required_support(target).into_vec()
}

#[test]
fn test_type_var_support() {
    let plain = type_var("T", TypeVarBound::Unbounded, Variance::Invariant, None);
    for target in PythonVersion::ALL {
        assert_eq!(support(&plain, target), vec![("typing", "TypeVar")]);
    }

    let inferred = type_var("T", TypeVarBound::Unbounded, Variance::Inferred, None);
    assert_eq!(
        support(&inferred, PythonVersion::Py311),
        vec![("typing_extensions", "TypeVar")]
    );
    assert_eq!(
        support(&inferred, PythonVersion::Py312),
        vec![("typing", "TypeVar")]
    );

    let with_default = type_var("T", TypeVarBound::Unbounded, Variance::Invariant, Some("int"));
    assert_eq!(
        support(&with_default, PythonVersion::Py312),
        vec![("typing_extensions", "TypeVar")]
    );
    assert_eq!(
        support(&with_default, PythonVersion::Py313),
        vec![("typing", "TypeVar")]
    );
}

#[test]
fn test_type_var_tuple_support() {
    let plain = type_var_tuple("Ts", None, false);
    assert_eq!(
        support(&plain, PythonVersion::Py310),
        vec![("typing_extensions", "TypeVarTuple"), ("typing_extensions", "Unpack")]
    );
    assert_eq!(
        support(&plain, PythonVersion::Py311),
        vec![("typing", "TypeVarTuple")]
    );

    let starred = type_var_tuple("Ts", Some("tuple[int, ...]"), true);
    assert_eq!(
        support(&starred, PythonVersion::Py312),
        vec![("typing_extensions", "TypeVarTuple"), ("typing_extensions", "Unpack")]
    );
    assert_eq!(
        support(&starred, PythonVersion::Py313),
        vec![("typing", "TypeVarTuple"), ("typing", "Unpack")]
    );

    let unstarred = type_var_tuple("Ts", Some("Unpack[tuple[int]]"), false);
    assert_eq!(
        support(&unstarred, PythonVersion::Py312),
        vec![("typing_extensions", "TypeVarTuple")]
    );
}

#[test]
fn test_param_spec_support() {
    assert_eq!(
        support(&param_spec("P", None), PythonVersion::Py310),
        vec![("typing", "ParamSpec")]
    );
    assert_eq!(
        support(&param_spec("P", Some("[int, str]")), PythonVersion::Py312),
        vec![("typing_extensions", "ParamSpec")]
    );
    assert_eq!(
        support(&param_spec("P", Some("[int, str]")), PythonVersion::Py313),
        vec![("typing", "ParamSpec")]
    );
}

#[test]
fn test_render_type_var_declarations() {
    let renderer = CanonicalRenderer;
    let constrained = type_var(
        "Z",
        TypeVarBound::Constraints(vec![expr("int"), expr("float"), expr("complex")]),
        Variance::Invariant,
        None,
    );
    assert_eq!(
        constrained.render_declaration("TypeVar", "Unpack", &renderer),
        "Z = TypeVar(\"Z\", int, float, complex)"
    );

    let bounded = type_var("Z", TypeVarBound::Bound(expr("complex")), Variance::Invariant, None);
    assert_eq!(
        bounded.render_declaration("TypeVar", "Unpack", &renderer),
        "Z = TypeVar(\"Z\", bound=complex)"
    );

    let inferred = type_var("T", TypeVarBound::Unbounded, Variance::Inferred, None);
    assert_eq!(
        inferred.render_declaration("TypeVar", "Unpack", &renderer),
        "T = TypeVar(\"T\", infer_variance=True)"
    );

    let covariant = type_var(
        "T_co",
        TypeVarBound::Bound(expr("str")),
        Variance::Covariant,
        Some("str"),
    );
    assert_eq!(
        covariant.render_declaration("TypeVar", "Unpack", &renderer),
        "T_co = TypeVar(\"T_co\", covariant=True, bound=str, default=str)"
    );
}

#[test]
fn test_render_variadic_and_param_spec_declarations() {
    let renderer = CanonicalRenderer;
    let starred = type_var_tuple("Ts", Some("tuple[int, ...]"), true);
    assert_eq!(
        starred.render_declaration("TypeVarTuple", "Unpack", &renderer),
        "Ts = TypeVarTuple(\"Ts\", default=Unpack[tuple[int, ...]])"
    );
    assert_eq!(
        starred.render_declaration("_te.TypeVarTuple", "_te.Unpack", &renderer),
        "Ts = _te.TypeVarTuple(\"Ts\", default=_te.Unpack[tuple[int, ...]])"
    );

    let plain = type_var_tuple("Ts", None, false);
    assert_eq!(
        plain.render_declaration("TypeVarTuple", "Unpack", &renderer),
        "Ts = TypeVarTuple(\"Ts\")"
    );

    let spec = param_spec("P", Some("[int, str]"));
    assert_eq!(
        spec.render_declaration("ParamSpec", "Unpack", &renderer),
        "P = ParamSpec(\"P\", default=[int, str])"
    );
}

#[test]
fn test_render_subscript_element() {
    let ts = type_var_tuple("Ts", None, false);
    assert_eq!(ts.render_subscript_element(PythonVersion::Py310, "Unpack"), "Unpack[Ts]");
    assert_eq!(ts.render_subscript_element(PythonVersion::Py311, "Unpack"), "*Ts");

    let t = type_var("T", TypeVarBound::Unbounded, Variance::Invariant, None);
    assert_eq!(t.render_subscript_element(PythonVersion::Py310, "Unpack"), "T");
    assert_eq!(param_spec("P", None).render_subscript_element(PythonVersion::Py310, "Unpack"), "P");
}

#[test]
fn test_variance_from_suffix() {
    assert_eq!(Variance::from_suffix("T_co"), Some(Variance::Covariant));
    assert_eq!(Variance::from_suffix("T_contra"), Some(Variance::Contravariant));
    assert_eq!(Variance::from_suffix("T"), None);
    assert_eq!(Variance::from_suffix("Tco"), None);
}

#[test]
fn test_variance_ignores_in_and_out_suffixes() {
    assert_eq!(Variance::from_suffix("Plug_in"), None);
    assert_eq!(Variance::from_suffix("Log_out"), None);
}

#[test]
fn test_accessors() {
    let ts = type_var_tuple("Ts", Some("tuple[()]"), false);
    assert_eq!(ts.name(), "Ts");
    assert!(ts.is_variadic());
    assert!(ts.has_default());
    assert_eq!(ts.constructor_name(), "TypeVarTuple");

    let t = type_var("T", TypeVarBound::Unbounded, Variance::Inferred, None);
    assert!(!t.is_variadic());
    assert!(!t.has_default());
    assert_eq!(t.constructor_name(), "TypeVar");
}

#[test]
fn test_expression_equality_is_canonical() {
    let mut parser = ParserState::new("test.pyi", "x = tuple[int, str]\n");
    let module = parser.parse_module();
    let arena: NodeArena = parser.into_arena();
    let statement = arena
        .get_module(arena.get(module).unwrap())
        .unwrap()
        .statements
        .nodes[0];
    let value = arena
        .get_assignment(arena.get(statement).unwrap())
        .unwrap()
        .value;

    let parsed = TypeExpr::from_node(&arena, value);
    assert!(!parsed.is_synthesized());
    assert_eq!(parsed, expr("tuple[int,str]"));
    assert_eq!(parsed.render(&arena), "tuple[int, str]");

    let a = type_var("T", TypeVarBound::Bound(parsed), Variance::Invariant, None);
    let b = type_var("T", TypeVarBound::Bound(expr("tuple[int,str]")), Variance::Invariant, None);
    assert_eq!(a, b);
    let c = type_var("T", TypeVarBound::Bound(expr("tuple[int,str]")), Variance::Covariant, None);
    assert_ne!(a, c);
}
