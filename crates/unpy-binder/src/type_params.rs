//! Type parameter model.
//!
//! A `TypeParameter` is built by the collector for every parameter of a
//! lowered generic declaration and is immutable afterwards. Equality and
//! hashing are structural: expressions compare by their canonical text, so
//! `tuple[int,str]` and `tuple[int, str]` are the same bound.

use crate::{MODULE_TYPING, MODULE_TYPING_EXTENSIONS};
use serde::Serialize;
use smallvec::SmallVec;
use std::hash::{Hash, Hasher};
use unpy_common::{PythonVersion, Version};
use unpy_parser::{NodeArena, NodeIndex};

pub const NAME_TYPE_VAR: &str = "TypeVar";
pub const NAME_TYPE_VAR_TUPLE: &str = "TypeVarTuple";
pub const NAME_PARAM_SPEC: &str = "ParamSpec";
pub const NAME_UNPACK: &str = "Unpack";

/// A `(module, symbol)` pair the lowered code needs to import.
pub type SupportSymbol = (&'static str, &'static str);

/// Renders an expression node, including any edits recorded inside it.
pub trait ExprRenderer {
    fn render_expr(&self, node: NodeIndex) -> String;
}

/// Plain source text, no edits.
impl ExprRenderer for NodeArena {
    fn render_expr(&self, node: NodeIndex) -> String {
        self.node_text(node).to_string()
    }
}

/// An expression taken from the source, or synthesized by the collector.
#[derive(Clone, Debug, Serialize)]
pub struct TypeExpr {
    /// `NodeIndex::NONE` for synthesized expressions.
    #[serde(skip)]
    pub node: NodeIndex,
    /// Canonical text, used for equality.
    pub text: String,
}

impl TypeExpr {
    pub fn from_node(arena: &NodeArena, node: NodeIndex) -> TypeExpr {
        TypeExpr {
            node,
            text: arena.canonical_text(node),
        }
    }

    pub fn synthesized(text: impl Into<String>) -> TypeExpr {
        TypeExpr {
            node: NodeIndex::NONE,
            text: text.into(),
        }
    }

    pub fn is_synthesized(&self) -> bool {
        self.node.is_none()
    }

    pub fn render(&self, renderer: &dyn ExprRenderer) -> String {
        if self.is_synthesized() {
            self.text.clone()
        } else {
            renderer.render_expr(self.node)
        }
    }
}

impl PartialEq for TypeExpr {
    fn eq(&self, other: &TypeExpr) -> bool {
        self.text == other.text
    }
}

impl Eq for TypeExpr {}

impl Hash for TypeExpr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Variance {
    Invariant,
    Covariant,
    Contravariant,
    Inferred,
}

impl Variance {
    /// Variance implied by the `_co` / `_contra` naming convention.
    pub fn from_suffix(name: &str) -> Option<Variance> {
        if name.ends_with("_co") {
            Some(Variance::Covariant)
        } else if name.ends_with("_contra") {
            Some(Variance::Contravariant)
        } else {
            None
        }
    }

    fn keyword(self) -> Option<&'static str> {
        match self {
            Variance::Invariant => None,
            Variance::Covariant => Some("covariant"),
            Variance::Contravariant => Some("contravariant"),
            Variance::Inferred => Some("infer_variance"),
        }
    }
}

/// Upper bound or value restriction of a `TypeVar`. The two are exclusive.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeVarBound {
    Unbounded,
    Bound(TypeExpr),
    Constraints(Vec<TypeExpr>),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind")]
pub enum TypeParameter {
    TypeVar {
        name: String,
        bound: TypeVarBound,
        variance: Variance,
        default: Option<TypeExpr>,
    },
    TypeVarTuple {
        name: String,
        /// Without the leading `*` when `default_star` is set.
        default: Option<TypeExpr>,
        default_star: bool,
    },
    ParamSpec {
        name: String,
        default: Option<TypeExpr>,
    },
}

fn support_module(use_backport: bool) -> &'static str {
    if use_backport {
        MODULE_TYPING_EXTENSIONS
    } else {
        MODULE_TYPING
    }
}

impl TypeParameter {
    pub fn name(&self) -> &str {
        match self {
            TypeParameter::TypeVar { name, .. }
            | TypeParameter::TypeVarTuple { name, .. }
            | TypeParameter::ParamSpec { name, .. } => name,
        }
    }

    pub fn default(&self) -> Option<&TypeExpr> {
        match self {
            TypeParameter::TypeVar { default, .. }
            | TypeParameter::TypeVarTuple { default, .. }
            | TypeParameter::ParamSpec { default, .. } => default.as_ref(),
        }
    }

    pub fn has_default(&self) -> bool {
        self.default().is_some()
    }

    pub fn is_variadic(&self) -> bool {
        matches!(self, TypeParameter::TypeVarTuple { .. })
    }

    /// Name of the constructor symbol (`TypeVar`, `TypeVarTuple`, `ParamSpec`).
    pub fn constructor_name(&self) -> &'static str {
        match self {
            TypeParameter::TypeVar { .. } => NAME_TYPE_VAR,
            TypeParameter::TypeVarTuple { .. } => NAME_TYPE_VAR_TUPLE,
            TypeParameter::ParamSpec { .. } => NAME_PARAM_SPEC,
        }
    }

    /// Symbols an explicit declaration of this parameter needs at `target`.
    pub fn required_support(&self, target: PythonVersion) -> SmallVec<[SupportSymbol; 2]> {
        let before = |minor: u8| !target.supports(Version::new(3, minor));
        let mut symbols = SmallVec::new();
        match self {
            TypeParameter::TypeVar {
                variance, default, ..
            } => {
                let backport = (before(13) && default.is_some())
                    || (before(12) && *variance == Variance::Inferred);
                symbols.push((support_module(backport), NAME_TYPE_VAR));
            }
            TypeParameter::TypeVarTuple {
                default,
                default_star,
                ..
            } => {
                if before(11) || *default_star {
                    let module = support_module(before(13));
                    symbols.push((module, NAME_TYPE_VAR_TUPLE));
                    symbols.push((module, NAME_UNPACK));
                } else {
                    let module = support_module(before(13) && default.is_some());
                    symbols.push((module, NAME_TYPE_VAR_TUPLE));
                }
            }
            TypeParameter::ParamSpec { default, .. } => {
                let module = support_module(before(13) && default.is_some());
                symbols.push((module, NAME_PARAM_SPEC));
            }
        }
        symbols
    }

    /// `Name = Constructor("Name", ...)`, without indentation or newline.
    ///
    /// `constructor` and `unpack` are the names under which the constructor and
    /// `Unpack` are reachable in the output module.
    pub fn render_declaration(
        &self,
        constructor: &str,
        unpack: &str,
        renderer: &dyn ExprRenderer,
    ) -> String {
        let name = self.name();
        let mut args = vec![format!("\"{name}\"")];
        match self {
            TypeParameter::TypeVar {
                bound,
                variance,
                default,
                ..
            } => {
                if let TypeVarBound::Constraints(constraints) = bound {
                    args.extend(constraints.iter().map(|c| c.render(renderer)));
                }
                if let Some(keyword) = variance.keyword() {
                    args.push(format!("{keyword}=True"));
                }
                if let TypeVarBound::Bound(bound) = bound {
                    args.push(format!("bound={}", bound.render(renderer)));
                }
                if let Some(default) = default {
                    args.push(format!("default={}", default.render(renderer)));
                }
            }
            TypeParameter::TypeVarTuple {
                default,
                default_star,
                ..
            } => {
                if let Some(default) = default {
                    let value = default.render(renderer);
                    if *default_star {
                        args.push(format!("default={unpack}[{value}]"));
                    } else {
                        args.push(format!("default={value}"));
                    }
                }
            }
            TypeParameter::ParamSpec { default, .. } => {
                if let Some(default) = default {
                    args.push(format!("default={}", default.render(renderer)));
                }
            }
        }
        format!("{name} = {constructor}({})", args.join(", "))
    }

    /// How the parameter is written inside `Generic[...]` or `Protocol[...]`.
    pub fn render_subscript_element(&self, target: PythonVersion, unpack: &str) -> String {
        match self {
            TypeParameter::TypeVarTuple { name, .. } => {
                if target.supports(Version::new(3, 11)) {
                    format!("*{name}")
                } else {
                    format!("{unpack}[{name}]")
                }
            }
            _ => self.name().to_string(),
        }
    }
}
