//! Generic declarations, type parameters and class bases.

use super::{BaseRef, ClassBases, CollectorState, DeclKind, LoweredDecl};
use crate::type_params::{TypeExpr, TypeParameter, TypeVarBound, Variance};
use crate::{MODULE_BUILTINS, MODULE_TYPING, MODULE_TYPING_EXTENSIONS};
use rustc_hash::FxHashSet;
use tracing::{debug, trace};
use unpy_common::{StubError, Version};
use unpy_parser::parser::node::{Node, ParameterKind, TypeParameterKind};
use unpy_parser::{NodeIndex, node_flags, syntax_kind_ext};

const NAME_GENERIC: &str = "Generic";
const NAME_PROTOCOL: &str = "Protocol";
const NAME_TYPE_ALIAS: &str = "TypeAlias";
const NAME_TYPE_ALIAS_TYPE: &str = "TypeAliasType";

fn is_typing_symbol(fq_name: &str, symbol: &str) -> bool {
    fq_name
        .rsplit_once('.')
        .is_some_and(|(module, name)| {
            name == symbol && (module == MODULE_TYPING || module == MODULE_TYPING_EXTENSIONS)
        })
}

impl<'a> CollectorState<'a> {
    /// Whether a declaration with these parameters is rewritten at the target.
    fn should_lower(&self, params: &[NodeIndex]) -> bool {
        if !self.target.supports(Version::new(3, 12)) {
            return true;
        }
        if self.target.supports(Version::new(3, 13)) {
            return false;
        }
        params.iter().any(|&param| {
            self.node(param)
                .and_then(|node| self.arena.get_type_parameter(node))
                .is_some_and(|data| data.default.is_some())
        })
    }

    fn type_parameter_nodes(&self, list: NodeIndex) -> Vec<NodeIndex> {
        self.node(list)
            .and_then(|node| self.arena.get_type_parameter_list(node))
            .map(|data| data.parameters.nodes.clone())
            .unwrap_or_default()
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    pub(crate) fn visit_class(&mut self, idx: NodeIndex, node: &'a Node) -> Result<(), StubError> {
        let Some(data) = self.arena.get_class(node) else {
            return Ok(());
        };
        let name = self.arena.node_text(data.name).to_string();
        self.scope_stack.push(name);
        let qualname = self.qualname();

        for decorator in data.decorators.iter() {
            self.visit_decorator(decorator)?;
        }

        let bases = self.collect_class_bases(&qualname, data.arguments)?;
        let param_nodes = self.type_parameter_nodes(data.type_parameters);
        if !param_nodes.is_empty() {
            self.check_generic_bases(&qualname, &bases, data.type_parameters)?;
        }

        let lowered = !param_nodes.is_empty() && self.should_lower(&param_nodes);
        let params =
            self.register_type_params(idx, DeclKind::Class, &qualname, &param_nodes, lowered)?;
        if lowered && bases.protocol.is_none() {
            self.support.insert((MODULE_TYPING, NAME_GENERIC));
        }
        self.class_bases.insert(idx, bases);

        self.push_variadic_scope(&params);
        self.visit_block(data.body)?;
        self.variadic_scopes.pop();
        self.scope_stack.pop();
        Ok(())
    }

    pub(crate) fn visit_function(
        &mut self,
        idx: NodeIndex,
        node: &'a Node,
    ) -> Result<(), StubError> {
        let Some(data) = self.arena.get_function(node) else {
            return Ok(());
        };
        let name = self.arena.node_text(data.name).to_string();
        if self.scope_stack.is_empty() && matches!(name.as_str(), "__getattr__" | "__dir__") {
            return Err(StubError::policy(
                format!("module-level {name}() cannot be used in a stub"),
                self.span_of(data.name),
            ));
        }
        self.scope_stack.push(name);
        let qualname = self.qualname();

        for decorator in data.decorators.iter() {
            self.visit_decorator(decorator)?;
        }

        let param_nodes = self.type_parameter_nodes(data.type_parameters);
        let lowered = !param_nodes.is_empty() && self.should_lower(&param_nodes);
        let params =
            self.register_type_params(idx, DeclKind::Function, &qualname, &param_nodes, lowered)?;

        self.push_variadic_scope(&params);
        self.visit_parameters(data.parameters)?;
        if data.returns.is_some() {
            self.check_annotation(data.returns, None)?;
            self.visit_expression(data.returns)?;
        }
        self.visit_block(data.body)?;
        self.variadic_scopes.pop();
        self.scope_stack.pop();
        Ok(())
    }

    fn visit_parameters(&mut self, list: NodeIndex) -> Result<(), StubError> {
        let Some(data) = self
            .node(list)
            .and_then(|node| self.arena.get_parameter_list(node))
        else {
            return Ok(());
        };
        for param in data.parameters.iter() {
            let Some(param) = self.node(param).and_then(|n| self.arena.get_parameter(n)) else {
                continue;
            };
            if matches!(
                param.kind,
                ParameterKind::KeywordOnlyMarker | ParameterKind::PositionalOnlyMarker
            ) {
                continue;
            }
            if param.annotation.is_some() {
                self.check_annotation(param.annotation, None)?;
                self.visit_expression(param.annotation)?;
            }
            if param.default.is_some() {
                self.visit_expression(param.default)?;
            }
        }
        Ok(())
    }

    fn visit_decorator(&mut self, decorator: NodeIndex) -> Result<(), StubError> {
        if let Some(data) = self.node(decorator).and_then(|n| self.arena.get_decorator(n)) {
            self.visit_expression(data.expression)?;
        }
        Ok(())
    }

    pub(crate) fn visit_type_alias(
        &mut self,
        idx: NodeIndex,
        node: &'a Node,
    ) -> Result<(), StubError> {
        if !self.scope_stack.is_empty() {
            return Err(StubError::unsupported(
                "only top-level type aliases are supported",
                self.span_of(idx),
            ));
        }
        let Some(data) = self.arena.get_type_alias(node) else {
            return Ok(());
        };
        let name = self.arena.node_text(data.name).to_string();
        self.check_annotation(data.value, Some(&format!("type {name}")))?;

        let param_nodes = self.type_parameter_nodes(data.type_parameters);
        let lowered = self.should_lower(&param_nodes);
        let params =
            self.register_type_params(idx, DeclKind::TypeAlias, &name, &param_nodes, lowered)?;
        if lowered {
            if params.len() < 2 {
                self.support.insert((MODULE_TYPING, NAME_TYPE_ALIAS));
            } else if self.target.supports(Version::new(3, 12)) {
                self.support.insert((MODULE_TYPING, NAME_TYPE_ALIAS_TYPE));
            } else {
                self.support
                    .insert((MODULE_TYPING_EXTENSIONS, NAME_TYPE_ALIAS_TYPE));
            }
        }

        self.push_variadic_scope(&params);
        self.visit_expression(data.value)?;
        self.variadic_scopes.pop();
        Ok(())
    }

    fn push_variadic_scope(&mut self, params: &[String]) {
        let variadic: FxHashSet<String> = params
            .iter()
            .filter(|name| {
                self.type_params
                    .get(name.as_str())
                    .is_some_and(TypeParameter::is_variadic)
            })
            .cloned()
            .collect();
        self.variadic_scopes.push(variadic);
    }

    // =========================================================================
    // Type parameters
    // =========================================================================

    /// Build and register the parameters of one declaration.
    ///
    /// Returns the names of the lowered parameters, empty when the declaration
    /// is kept as written.
    fn register_type_params(
        &mut self,
        decl: NodeIndex,
        kind: DeclKind,
        qualname: &str,
        param_nodes: &[NodeIndex],
        lowered: bool,
    ) -> Result<Vec<String>, StubError> {
        let mut names = Vec::with_capacity(param_nodes.len());
        for &param_idx in param_nodes {
            let param = self.build_type_param(param_idx, kind == DeclKind::Class)?;
            if !lowered {
                continue;
            }
            let name = param.name().to_string();
            match self.type_params.get(&name) {
                Some(existing) if *existing == param => {
                    trace!(name = %name, "deduplicated type parameter");
                }
                Some(_) => {
                    return Err(StubError::conflict(
                        format!("conflicting definitions of type parameter '{name}'"),
                        self.span_of(param_idx),
                    ));
                }
                None => {
                    for symbol in param.required_support(self.target) {
                        self.support.insert(symbol);
                    }
                    self.hoisted
                        .entry(self.root)
                        .or_default()
                        .push(name.clone());
                    self.type_params.insert(name.clone(), param);
                }
            }
            names.push(name);
        }

        if lowered {
            debug!(qualname, ?kind, params = ?names, "lowering declaration");
            self.lowered.insert(
                decl,
                LoweredDecl {
                    kind,
                    qualname: qualname.to_string(),
                    params: names.clone(),
                    root: self.root,
                },
            );
        }
        Ok(names)
    }

    fn is_name_like(&self, idx: NodeIndex) -> bool {
        self.arena.is_kind(idx, syntax_kind_ext::NAME)
            || self.arena.is_kind(idx, syntax_kind_ext::ATTRIBUTE)
    }

    /// Whether `idx` is a reference to `alias` (`Any`, `t.Any`, ...).
    fn refers_to(&self, idx: NodeIndex, alias: Option<&str>) -> bool {
        match alias {
            Some(alias) => {
                self.is_name_like(idx) && self.arena.dotted_name(idx).as_deref() == Some(alias)
            }
            None => false,
        }
    }

    fn build_type_param(
        &mut self,
        idx: NodeIndex,
        infer_variance: bool,
    ) -> Result<TypeParameter, StubError> {
        let arena = self.arena;
        let Some(data) = self.node(idx).and_then(|n| arena.get_type_parameter(n)) else {
            return Err(StubError::syntax(
                "malformed type parameter",
                self.span_of(idx),
            ));
        };
        let name = arena.node_text(data.name).to_string();

        let name_any = self.imports.imported_from_typing_as("Any");
        let name_object = self
            .imports
            .resolve(MODULE_BUILTINS, "object")
            .unwrap_or_else(|| "object".to_string());

        // Policy checks and references inside bounds and defaults.
        for expr in [data.bound, data.default] {
            if expr.is_some() {
                self.visit_expression(expr)?;
            }
        }

        let mut default_star = false;
        let mut default_node = data.default;
        if arena.is_kind(default_node, syntax_kind_ext::STARRED) {
            default_star = true;
            default_node = arena
                .get(default_node)
                .and_then(|n| arena.get_starred(n))
                .map_or(NodeIndex::NONE, |s| s.expression);
        }
        if default_node.is_some() {
            self.check_annotation(default_node, Some(&name))?;
        }

        let default_any = self.refers_to(default_node, name_any.as_deref());
        let mut default = if default_any {
            Some(TypeExpr::synthesized(name_object.clone()))
        } else {
            default_node
                .to_option()
                .map(|node| TypeExpr::from_node(arena, node))
        };

        match data.kind {
            TypeParameterKind::TypeVarTuple => {
                return Ok(TypeParameter::TypeVarTuple {
                    name,
                    default,
                    default_star,
                });
            }
            TypeParameterKind::ParamSpec => {
                return Ok(TypeParameter::ParamSpec { name, default });
            }
            TypeParameterKind::TypeVar => {}
        }

        let bound_node = data.bound;
        let is_constraint_tuple = arena
            .get(bound_node)
            .is_some_and(|n| n.kind == syntax_kind_ext::TUPLE && n.has_flag(node_flags::PARENTHESIZED));

        let bound = if bound_node.is_none() {
            TypeVarBound::Unbounded
        } else if self.refers_to(bound_node, Some(&name_object))
            || self.refers_to(bound_node, name_any.as_deref())
        {
            TypeVarBound::Unbounded
        } else if is_constraint_tuple {
            let elements = arena
                .get(bound_node)
                .and_then(|n| arena.get_sequence(n))
                .map(|s| s.elements.nodes.clone())
                .unwrap_or_default();
            let mut constraints = Vec::with_capacity(elements.len());
            for element in elements {
                if arena.is_kind(element, syntax_kind_ext::STARRED) {
                    return Err(StubError::unsupported(
                        "starred type constraints",
                        self.span_of(element),
                    ));
                }
                self.check_annotation(element, Some(&name))?;
                if self.refers_to(element, name_any.as_deref()) {
                    constraints.push(TypeExpr::synthesized(name_object.clone()));
                } else {
                    constraints.push(TypeExpr::from_node(arena, element));
                }
            }
            TypeVarBound::Constraints(constraints)
        } else {
            self.check_annotation(bound_node, Some(&name))?;
            TypeVarBound::Bound(TypeExpr::from_node(arena, bound_node))
        };

        if default_any && let TypeVarBound::Bound(bound) = &bound {
            default = Some(bound.clone());
        }

        let suffix = Variance::from_suffix(&name);
        let variance = if !infer_variance {
            Variance::Invariant
        } else if matches!(bound, TypeVarBound::Constraints(_)) {
            if suffix.is_some() {
                return Err(StubError::conflict(
                    "type constraints require invariance",
                    self.span_of(idx),
                ));
            }
            Variance::Invariant
        } else {
            suffix.unwrap_or(Variance::Inferred)
        };

        Ok(TypeParameter::TypeVar {
            name,
            bound,
            variance,
            default,
        })
    }

    // =========================================================================
    // Class bases
    // =========================================================================

    fn collect_class_bases(
        &mut self,
        qualname: &str,
        arguments: NodeIndex,
    ) -> Result<ClassBases, StubError> {
        let arena = self.arena;
        let mut bases = ClassBases::default();
        let Some(args) = arena.get(arguments).and_then(|n| arena.get_argument_list(n)) else {
            return Ok(bases);
        };

        for arg in args.arguments.iter() {
            let Some(arg_node) = arena.get(arg) else {
                continue;
            };
            match arg_node.kind {
                k if k == syntax_kind_ext::KEYWORD_ARGUMENT
                    || k == syntax_kind_ext::DOUBLE_STARRED =>
                {
                    self.visit_expression(arg)?;
                    continue;
                }
                k if k == syntax_kind_ext::STARRED => {
                    return Err(StubError::unsupported(
                        format!("'{qualname}': starred base classes"),
                        self.span_of(arg),
                    ));
                }
                _ => {}
            }

            self.visit_expression(arg)?;

            let mut base = self.unwrap_cast(arg);
            let subscripted = arena.is_kind(base, syntax_kind_ext::SUBSCRIPT);
            if subscripted {
                base = arena
                    .get(base)
                    .and_then(|n| arena.get_subscript(n))
                    .map_or(NodeIndex::NONE, |s| s.expression);
            }
            let Some(dotted) = arena.dotted_name(base) else {
                return Err(StubError::unsupported(
                    format!("'{qualname}': unsupported class argument expression"),
                    self.span_of(arg),
                ));
            };

            let fq_name = self.imports.fq_name_of(&dotted);
            if let Some(version) = self.backports.unsupported_base(&fq_name)
                && !self.target.supports(version)
            {
                let message = if version == Version::NEVER {
                    format!("'{qualname}': subclassing '{fq_name}' is not allowed in stubs")
                } else {
                    format!("'{qualname}': subclassing '{fq_name}' requires Python >= {version}")
                };
                return Err(StubError::unsupported(message, self.span_of(arg)));
            }

            if !subscripted && is_typing_symbol(&fq_name, NAME_PROTOCOL) {
                bases.protocol = Some(bases.bases.len());
            }
            bases.bases.push(BaseRef {
                node: arg,
                dotted,
                fq_name,
                subscripted,
            });
        }
        Ok(bases)
    }

    /// `cast(T, X)` as a base is `X`.
    fn unwrap_cast(&self, mut base: NodeIndex) -> NodeIndex {
        let arena = self.arena;
        while let Some(call) = arena.get(base).and_then(|n| arena.get_call(n)) {
            let is_cast = arena
                .dotted_name(call.expression)
                .is_some_and(|callee| is_typing_symbol(&self.imports.fq_name_of(&callee), "cast"));
            let args = arena
                .get(call.arguments)
                .and_then(|n| arena.get_argument_list(n));
            match args {
                Some(args) if is_cast && args.arguments.len() == 2 => {
                    base = args.arguments.nodes[1];
                }
                _ => break,
            }
        }
        base
    }

    fn check_generic_bases(
        &self,
        qualname: &str,
        bases: &ClassBases,
        type_parameters: NodeIndex,
    ) -> Result<(), StubError> {
        for base in &bases.bases {
            if is_typing_symbol(&base.fq_name, NAME_GENERIC) {
                return Err(StubError::conflict(
                    format!("'{qualname}': type parameters cannot be combined with a Generic base"),
                    self.span_of(type_parameters),
                ));
            }
            if base.subscripted && is_typing_symbol(&base.fq_name, NAME_PROTOCOL) {
                return Err(StubError::conflict(
                    format!(
                        "'{qualname}': type parameters cannot be combined with a subscripted Protocol base"
                    ),
                    self.span_of(type_parameters),
                ));
            }
        }
        Ok(())
    }
}
