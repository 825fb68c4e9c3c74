//! Lowering Pass - rewrite directives for a collected stub
//!
//! The lowering pass runs after the collector has finished and turns its
//! `Collected` summary into `TransformDirective`s. It never looks at a node the
//! collector did not record, and it never mutates the tree.
//!
//! # Steps
//!
//! 1. Relocation: references to symbols that do not exist at the target are
//!    renamed (`List` becomes `list`, `override` comes from
//!    `typing_extensions`), and their `from` imports are dropped.
//! 2. Support imports: every symbol the lowered code needs is requested from
//!    the `ImportPlan`, which decides the spelling to use.
//! 3. Variadic unpacks: below 3.11, `*Ts` becomes `Unpack[Ts]`.
//! 4. Declarations: PEP 695 parameter lists are stripped. Classes gain a
//!    `Generic[...]` base (or a subscripted `Protocol`), type aliases become
//!    `TypeAlias` annotations or `TypeAliasType` calls.
//! 5. Hoisting: explicit `TypeVar`/`TypeVarTuple`/`ParamSpec` declarations are
//!    rendered in the order their parameters were introduced.
//! 6. Imports: existing `from` imports are rewritten in place, and modules
//!    without one get a new statement.
//! 7. Placement: the hoisted declarations go in as one group after the leading
//!    imports and `__all__`, and after any new import statement.
//!
//! ```python
//! def first[T](xs: list[T]) -> T: ...
//! ```
//!
//! lowers, at 3.11, to
//!
//! ```python
//! from typing import TypeVar
//!
//! T = TypeVar("T")
//! def first(xs: list[T]) -> T: ...
//! ```

#[path = "lowering_pass_helpers.rs"]
mod lowering_pass_helpers;

use lowering_pass_helpers::Anchor;

use crate::import_plan::ImportPlan;
use crate::printer::Printer;
use crate::transform_context::{TransformContext, TransformDirective};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{Level, debug, debug_span, trace};
use unpy_binder::stdlib::{BackportTable, Relocation};
use unpy_binder::type_params::{NAME_UNPACK, SupportSymbol};
use unpy_binder::{
    Collected, DeclKind, LoweredDecl, MODULE_BUILTINS, MODULE_TYPING, MODULE_TYPING_EXTENSIONS,
};
use unpy_common::{PythonVersion, Version};
use unpy_parser::parser::node::ImportFromData;
use unpy_parser::{NodeArena, NodeIndex, syntax_kind_ext};

const NAME_GENERIC: &str = "Generic";
const NAME_TYPE_ALIAS: &str = "TypeAlias";
const NAME_TYPE_ALIAS_TYPE: &str = "TypeAliasType";

pub struct LoweringPass<'a> {
    arena: &'a NodeArena,
    collected: &'a Collected,
    backports: &'a dyn BackportTable,
    target: PythonVersion,
    plan: ImportPlan<'a>,
    transforms: TransformContext,
    /// Output spelling of each support symbol.
    support_names: FxHashMap<SupportSymbol, String>,
    /// Top-level statements of the module.
    statements: Vec<NodeIndex>,
    /// Rendered hoisted declarations, in introduction order.
    declarations: Vec<String>,
    /// Where new import statements were placed.
    new_imports: Option<Anchor>,
}

impl<'a> LoweringPass<'a> {
    pub fn new(
        arena: &'a NodeArena,
        collected: &'a Collected,
        backports: &'a dyn BackportTable,
    ) -> LoweringPass<'a> {
        let statements = arena
            .get(collected.module)
            .and_then(|node| arena.get_module(node))
            .map(|data| data.statements.nodes.clone())
            .unwrap_or_default();
        LoweringPass {
            arena,
            collected,
            backports,
            target: collected.target,
            plan: ImportPlan::new(&collected.imports),
            transforms: TransformContext::new(),
            support_names: FxHashMap::default(),
            statements,
            declarations: Vec::new(),
            new_imports: None,
        }
    }

    /// Run every step and return the directives for the printer.
    pub fn run(mut self) -> TransformContext {
        let _span = debug_span!("lower", target = %self.target).entered();

        self.relocate_imports();
        self.relocate_references();
        self.require_support();
        self.desugar_unpacks();
        self.lower_declarations();
        self.hoist_declarations();
        self.reconcile_imports();
        self.place_declarations();

        debug!(
            directives = self.transforms.len(),
            imports_changed = self.plan.has_changes(),
            "lowered module"
        );
        if tracing::enabled!(Level::TRACE) {
            for (idx, directive) in self.transforms.iter() {
                trace!(node = idx.0, ?directive, "directive");
            }
        }
        self.transforms
    }

    // =========================================================================
    // Relocation
    // =========================================================================

    fn active_relocation(&self, module: &str, name: &str) -> Option<Relocation> {
        self.backports
            .relocation(module, name)
            .filter(|relocation| relocation.is_active(self.target))
    }

    /// Drop `from` imports of relocated symbols and import their replacement.
    fn relocate_imports(&mut self) {
        let arena = self.arena;
        for stmt in self.statements.clone() {
            let Some(data) = self.from_import_data(stmt) else {
                continue;
            };
            if data.level > 0 || data.is_star {
                continue;
            }
            let Some(module) = data.module.as_deref() else {
                continue;
            };
            for alias in data.names.iter() {
                let Some(alias) = arena.get(alias).and_then(|n| arena.get_import_alias(n)) else {
                    continue;
                };
                let Some(relocation) = self.active_relocation(module, &alias.name) else {
                    continue;
                };
                debug!(
                    from = %format!("{module}.{}", alias.name),
                    to = %format!("{}.{}", relocation.module, relocation.name),
                    "relocating import"
                );
                self.plan.discard(module, &alias.name);
                if !relocation.is_builtin() {
                    self.plan.require(relocation.module, relocation.head());
                }
            }
        }
    }

    /// Rename the outermost relocated prefix of each reference.
    fn relocate_references(&mut self) {
        let collected = self.collected;
        for reference in &collected.references {
            for &prefix in reference.prefixes.iter().rev() {
                let Some(dotted) = self.arena.dotted_name(prefix) else {
                    continue;
                };
                let fq_name = collected.imports.fq_name_of(&dotted);
                let Some((module, name)) = fq_name.rsplit_once('.') else {
                    continue;
                };
                let Some(relocation) = self.active_relocation(module, name) else {
                    continue;
                };

                let text = if relocation.is_builtin() {
                    collected
                        .imports
                        .resolve(MODULE_BUILTINS, relocation.name)
                        .unwrap_or_else(|| relocation.name.to_string())
                } else {
                    let head = self.plan.require(relocation.module, relocation.head());
                    match relocation.tail() {
                        Some(tail) => format!("{head}.{tail}"),
                        None => head,
                    }
                };
                if text != dotted {
                    trace!(from = %dotted, to = %text, "renaming reference");
                    self.transforms
                        .insert(prefix, TransformDirective::Replace { text });
                }
                break;
            }
        }
    }

    // =========================================================================
    // Support symbols
    // =========================================================================

    fn require_support(&mut self) {
        let collected = self.collected;
        for symbol in collected.support.iter() {
            let name = self.plan.require(symbol.0, symbol.1);
            self.support_names.insert(symbol, name);
        }
    }

    /// Output spelling of a support symbol, requiring it if the collector did not.
    fn support_name(&mut self, module: &'static str, name: &'static str) -> String {
        if let Some(spelling) = self.support_names.get(&(module, name)) {
            return spelling.clone();
        }
        let spelling = self.plan.require(module, name);
        self.support_names.insert((module, name), spelling.clone());
        spelling
    }

    fn unpack_name(&mut self) -> String {
        for module in [MODULE_TYPING_EXTENSIONS, MODULE_TYPING] {
            if let Some(spelling) = self.support_names.get(&(module, NAME_UNPACK)) {
                return spelling.clone();
            }
        }
        let module = if self.target.supports(Version::new(3, 13)) {
            MODULE_TYPING
        } else {
            MODULE_TYPING_EXTENSIONS
        };
        self.support_name(module, NAME_UNPACK)
    }

    // =========================================================================
    // Variadic unpacks
    // =========================================================================

    fn desugar_unpacks(&mut self) {
        let collected = self.collected;
        if self.target.supports(Version::new(3, 11)) || collected.unpacks.is_empty() {
            return;
        }
        let unpack = self.unpack_name();
        let printer = Printer::new(self.arena);
        for &site in &collected.unpacks {
            let Some(inner) = self
                .arena
                .get(site)
                .and_then(|node| self.arena.get_starred(node))
                .map(|starred| starred.expression)
            else {
                continue;
            };
            let text = format!("{unpack}[{}]", printer.render_node(&self.transforms, inner));
            self.transforms
                .insert(site, TransformDirective::Replace { text });
        }
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn lower_declarations(&mut self) {
        let collected = self.collected;
        let mut decls: Vec<(NodeIndex, &LoweredDecl)> = collected
            .lowered
            .iter()
            .map(|(&idx, decl)| (idx, decl))
            .collect();
        decls.sort_by_key(|&(idx, _)| self.arena.get(idx).map_or(0, |node| node.pos));

        for (idx, decl) in decls {
            debug!(qualname = %decl.qualname, kind = ?decl.kind, "lowering");
            match decl.kind {
                DeclKind::Function => self.lower_function(idx),
                DeclKind::Class => self.lower_class(idx, decl),
                DeclKind::TypeAlias => self.lower_type_alias(idx, decl),
            }
        }
    }

    fn strip_type_parameters(&mut self, list: NodeIndex, replacement: String) {
        if list.is_some() {
            self.transforms.insert(
                list,
                TransformDirective::Replace { text: replacement },
            );
        }
    }

    fn lower_function(&mut self, idx: NodeIndex) {
        let Some(data) = self.arena.get(idx).and_then(|n| self.arena.get_function(n)) else {
            return;
        };
        self.strip_type_parameters(data.type_parameters, String::new());
    }

    /// `A, B, *Ts` (or `Unpack[Ts]` below 3.11) for `Generic[...]`.
    fn subscript_elements(&mut self, params: &[String]) -> String {
        let collected = self.collected;
        let params: Vec<_> = params
            .iter()
            .filter_map(|name| collected.type_param(name))
            .collect();
        let unpack = if !self.target.supports(Version::new(3, 11))
            && params.iter().any(|param| param.is_variadic())
        {
            self.unpack_name()
        } else {
            NAME_UNPACK.to_string()
        };
        params
            .iter()
            .map(|param| param.render_subscript_element(self.target, &unpack))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn lower_class(&mut self, idx: NodeIndex, decl: &LoweredDecl) {
        let arena = self.arena;
        let collected = self.collected;
        let Some(data) = arena.get(idx).and_then(|n| arena.get_class(n)) else {
            return;
        };
        let elements = self.subscript_elements(&decl.params);
        let bases = collected.class_bases.get(&idx);

        if let Some(protocol) = bases.and_then(|b| b.protocol.and_then(|i| b.bases.get(i))) {
            self.strip_type_parameters(data.type_parameters, String::new());
            self.transforms.insert(
                protocol.node,
                TransformDirective::InsertAfter {
                    text: format!("[{elements}]"),
                },
            );
            return;
        }

        let generic = format!("{}[{elements}]", self.support_name(MODULE_TYPING, NAME_GENERIC));
        let Some(args) = arena
            .get(data.arguments)
            .and_then(|n| arena.get_argument_list(n))
        else {
            self.strip_type_parameters(data.type_parameters, format!("({generic})"));
            return;
        };

        self.strip_type_parameters(data.type_parameters, String::new());
        if let Some(last) = bases.and_then(|b| b.bases.last()) {
            self.transforms.insert(
                last.node,
                TransformDirective::InsertAfter {
                    text: format!(", {generic}"),
                },
            );
        } else if let Some(first) = args.arguments.first() {
            self.transforms.insert(
                first,
                TransformDirective::InsertBefore {
                    text: format!("{generic}, "),
                },
            );
        } else {
            self.transforms.insert(
                data.arguments,
                TransformDirective::Replace {
                    text: format!("({generic})"),
                },
            );
        }
    }

    fn lower_type_alias(&mut self, idx: NodeIndex, decl: &LoweredDecl) {
        let arena = self.arena;
        let Some(data) = arena.get(idx).and_then(|n| arena.get_type_alias(n)) else {
            return;
        };
        let name = arena.node_text(data.name).to_string();
        let value = Printer::new(arena).render_node(&self.transforms, data.value);

        let text = if decl.params.len() < 2 {
            let type_alias = self.support_name(MODULE_TYPING, NAME_TYPE_ALIAS);
            format!("{name}: {type_alias} = {value}")
        } else {
            let module = if self.target.supports(Version::new(3, 12)) {
                MODULE_TYPING
            } else {
                MODULE_TYPING_EXTENSIONS
            };
            let constructor = self.support_name(module, NAME_TYPE_ALIAS_TYPE);
            format!(
                "{name} = {constructor}(\"{name}\", {value}, type_params=({}))",
                decl.params.join(", ")
            )
        };
        self.transforms
            .insert(idx, TransformDirective::Replace { text });
    }

    // =========================================================================
    // Hoisted declarations
    // =========================================================================

    fn hoist_declarations(&mut self) {
        let collected = self.collected;
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for (&root, names) in &collected.hoisted {
            trace!(root = root.0, names = ?names, "hoisting declarations");
            for name in names {
                if !seen.insert(name.as_str()) {
                    continue;
                }
                let Some(param) = collected.type_param(name) else {
                    continue;
                };
                let support = param.required_support(self.target);
                let Some(&(module, constructor)) = support.first() else {
                    continue;
                };
                let constructor = self.support_name(module, constructor);
                let unpack = match support.get(1) {
                    Some(&(module, symbol)) => self.support_name(module, symbol),
                    None => NAME_UNPACK.to_string(),
                };
                let printer = Printer::new(self.arena);
                let renderer = printer.renderer(&self.transforms);
                let declaration = param.render_declaration(&constructor, &unpack, &renderer);
                self.declarations.push(declaration);
            }
        }
    }

    // =========================================================================
    // Node helpers
    // =========================================================================

    fn from_import_data(&self, stmt: NodeIndex) -> Option<&'a ImportFromData> {
        let arena = self.arena;
        arena.get(stmt).and_then(|node| arena.get_import_from(node))
    }

    fn is_import(&self, stmt: NodeIndex) -> bool {
        self.arena.is_kind(stmt, syntax_kind_ext::IMPORT_STATEMENT)
            || self.arena.is_kind(stmt, syntax_kind_ext::IMPORT_FROM_STATEMENT)
    }
}
