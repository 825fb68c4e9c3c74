//! Collection pass.
//!
//! `CollectorState` walks a parsed stub once, in document order, and produces
//! an immutable `Collected` value for the lowering pass:
//! - the import table;
//! - a `TypeParameter` for every parameter of every lowered generic declaration,
//!   deduplicated module-wide and attributed to the top-level statement that
//!   first introduced it;
//! - class base lists, dotted references, and variadic unpack sites;
//! - the support symbols (`TypeVar`, `Generic`, `TypeAlias`, ...) the lowered
//!   code needs.
//!
//! Constructs that have no place in a stub are rejected here with a `StubError`.

mod state_declarations;
mod state_imports;
mod state_policy;
mod state_references;

use crate::import_table::ImportTable;
use crate::stdlib::BackportTable;
use crate::type_params::{SupportSymbol, TypeParameter};
use indexmap::{IndexMap, IndexSet};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use smallvec::SmallVec;
use tracing::{Level, debug, debug_span, trace};
use unpy_common::limits::MAX_AST_DEPTH;
use unpy_common::{PythonVersion, Span, StubError};
use unpy_parser::parser::node::Node;
use unpy_parser::{NodeArena, NodeIndex, syntax_kind_ext};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    Class,
    Function,
    TypeAlias,
}

/// A declaration whose type parameters are lowered to explicit declarations.
#[derive(Clone, Debug, Serialize)]
pub struct LoweredDecl {
    pub kind: DeclKind,
    pub qualname: String,
    /// Parameter names in declaration order, keys into `Collected::type_params`.
    pub params: Vec<String>,
    /// Top-level statement that contains the declaration.
    #[serde(skip)]
    pub root: NodeIndex,
}

/// One positional base of a class.
#[derive(Clone, Debug, Serialize)]
pub struct BaseRef {
    /// The base expression as written.
    #[serde(skip)]
    pub node: NodeIndex,
    /// Dotted name after unwrapping `cast(...)` and subscripts.
    pub dotted: String,
    pub fq_name: String,
    pub subscripted: bool,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ClassBases {
    pub bases: Vec<BaseRef>,
    /// Index into `bases` of an unsubscripted `Protocol` base.
    pub protocol: Option<usize>,
}

/// A bare name or the outermost node of an attribute chain.
#[derive(Clone, Debug, Serialize)]
pub struct Reference {
    #[serde(skip)]
    pub node: NodeIndex,
    /// Each segment of the chain, outermost last.
    #[serde(skip)]
    pub prefixes: SmallVec<[NodeIndex; 4]>,
    pub dotted: String,
}

/// Support symbols required by the lowered code.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SupportRequirements {
    /// Symbols that still need an import.
    pub needed: IndexSet<SupportSymbol>,
    /// Symbols already reachable, with the expression that reaches them.
    pub satisfied: IndexMap<SupportSymbol, String>,
}

impl SupportRequirements {
    pub fn iter(&self) -> impl Iterator<Item = SupportSymbol> + '_ {
        self.needed
            .iter()
            .copied()
            .chain(self.satisfied.keys().copied())
    }

    pub fn contains(&self, symbol: SupportSymbol) -> bool {
        self.needed.contains(&symbol) || self.satisfied.contains_key(&symbol)
    }
}

/// Everything the lowering pass needs to know about a module.
#[derive(Debug)]
pub struct Collected {
    pub target: PythonVersion,
    pub module: NodeIndex,
    pub imports: ImportTable,
    /// `from ... import ...` statements, in document order.
    pub from_imports: Vec<NodeIndex>,
    /// Lowered parameters by name, in first-seen order.
    pub type_params: IndexMap<String, TypeParameter>,
    /// Parameter names introduced by each top-level statement.
    pub hoisted: IndexMap<NodeIndex, Vec<String>>,
    /// Lowered classes, functions and type aliases.
    pub lowered: FxHashMap<NodeIndex, LoweredDecl>,
    pub class_bases: FxHashMap<NodeIndex, ClassBases>,
    pub references: Vec<Reference>,
    /// `*Ts` nodes that unpack a lowered `TypeVarTuple`.
    pub unpacks: Vec<NodeIndex>,
    pub support: SupportRequirements,
}

impl Collected {
    pub fn type_param(&self, name: &str) -> Option<&TypeParameter> {
        self.type_params.get(name)
    }

    pub fn is_lowered(&self, decl: NodeIndex) -> bool {
        self.lowered.contains_key(&decl)
    }
}

pub struct CollectorState<'a> {
    pub(crate) arena: &'a NodeArena,
    pub(crate) target: PythonVersion,
    pub(crate) backports: &'a dyn BackportTable,
    pub(crate) imports: ImportTable,
    /// Names of the enclosing classes and functions.
    pub(crate) scope_stack: Vec<String>,
    /// Top-level statement being visited.
    pub(crate) root: NodeIndex,
    pub(crate) depth: u32,
    /// `TypeVarTuple` names of the enclosing lowered declarations.
    pub(crate) variadic_scopes: Vec<FxHashSet<String>>,
    pub(crate) from_imports: Vec<NodeIndex>,
    pub(crate) type_params: IndexMap<String, TypeParameter>,
    pub(crate) hoisted: IndexMap<NodeIndex, Vec<String>>,
    pub(crate) lowered: FxHashMap<NodeIndex, LoweredDecl>,
    pub(crate) class_bases: FxHashMap<NodeIndex, ClassBases>,
    pub(crate) references: Vec<Reference>,
    pub(crate) unpacks: Vec<NodeIndex>,
    pub(crate) support: IndexSet<SupportSymbol>,
}

impl<'a> CollectorState<'a> {
    pub fn new(
        arena: &'a NodeArena,
        target: PythonVersion,
        backports: &'a dyn BackportTable,
    ) -> CollectorState<'a> {
        CollectorState {
            arena,
            target,
            backports,
            imports: ImportTable::new(),
            scope_stack: Vec::new(),
            root: NodeIndex::NONE,
            depth: 0,
            variadic_scopes: Vec::new(),
            from_imports: Vec::new(),
            type_params: IndexMap::new(),
            hoisted: IndexMap::new(),
            lowered: FxHashMap::default(),
            class_bases: FxHashMap::default(),
            references: Vec::new(),
            unpacks: Vec::new(),
            support: IndexSet::new(),
        }
    }

    /// Walk `module` and return what the lowering pass needs.
    pub fn run(mut self, module: NodeIndex) -> Result<Collected, StubError> {
        let _span = debug_span!("collect", target = %self.target).entered();
        let statements = self
            .arena
            .get(module)
            .and_then(|node| self.arena.get_module(node))
            .map(|data| data.statements.nodes.clone())
            .unwrap_or_default();

        let globals = self.collect_global_names(&statements);
        self.imports.set_global_names(globals);

        for stmt in statements {
            self.root = stmt;
            self.visit_statement(stmt)?;
        }

        let support = self.split_support();
        debug!(
            type_params = self.type_params.len(),
            lowered = self.lowered.len(),
            references = self.references.len(),
            needed = support.needed.len(),
            "collected module"
        );
        if tracing::enabled!(Level::TRACE)
            && let Ok(dump) = serde_json::to_string(&self.type_params)
        {
            trace!(type_params = %dump, "collected type parameters");
        }

        Ok(Collected {
            target: self.target,
            module,
            imports: self.imports,
            from_imports: self.from_imports,
            type_params: self.type_params,
            hoisted: self.hoisted,
            lowered: self.lowered,
            class_bases: self.class_bases,
            references: self.references,
            unpacks: self.unpacks,
            support,
        })
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    pub(crate) fn span_of(&self, idx: NodeIndex) -> Span {
        self.arena
            .get(idx)
            .map_or(Span::default(), |node| Span::new(node.pos, node.end))
    }

    pub(crate) fn node(&self, idx: NodeIndex) -> Option<&'a Node> {
        self.arena.get(idx)
    }

    pub(crate) fn qualname(&self) -> String {
        self.scope_stack.join(".")
    }

    pub(crate) fn enter_depth(&mut self, idx: NodeIndex) -> Result<(), StubError> {
        self.depth += 1;
        if self.depth > MAX_AST_DEPTH {
            return Err(StubError::unsupported(
                "maximum nesting depth exceeded",
                self.span_of(idx),
            ));
        }
        Ok(())
    }

    pub(crate) fn exit_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn split_support(&self) -> SupportRequirements {
        let mut requirements = SupportRequirements::default();
        for &(module, name) in &self.support {
            let reachable = self.imports.resolve(module, name).or_else(|| {
                (module == crate::MODULE_TYPING)
                    .then(|| self.imports.resolve(crate::MODULE_TYPING_EXTENSIONS, name))
                    .flatten()
            });
            match reachable {
                Some(alias) => {
                    requirements.satisfied.insert((module, name), alias);
                }
                None => {
                    requirements.needed.insert((module, name));
                }
            }
        }
        requirements
    }

    // =========================================================================
    // Statements
    // =========================================================================

    pub(crate) fn visit_statements(&mut self, statements: &[NodeIndex]) -> Result<(), StubError> {
        for &stmt in statements {
            self.visit_statement(stmt)?;
        }
        Ok(())
    }

    pub(crate) fn visit_block(&mut self, block: NodeIndex) -> Result<(), StubError> {
        let Some(data) = self.node(block).and_then(|node| self.arena.get_block(node)) else {
            return Ok(());
        };
        self.visit_statements(&data.statements.nodes)
    }

    pub(crate) fn visit_statement(&mut self, idx: NodeIndex) -> Result<(), StubError> {
        let Some(node) = self.node(idx) else {
            return Ok(());
        };
        self.enter_depth(idx)?;
        match node.kind {
            k if k == syntax_kind_ext::IMPORT_STATEMENT => self.visit_import(idx, node)?,
            k if k == syntax_kind_ext::IMPORT_FROM_STATEMENT => self.visit_import_from(idx, node)?,
            k if k == syntax_kind_ext::CLASS_DEFINITION => self.visit_class(idx, node)?,
            k if k == syntax_kind_ext::FUNCTION_DEFINITION => self.visit_function(idx, node)?,
            k if k == syntax_kind_ext::TYPE_ALIAS_STATEMENT => self.visit_type_alias(idx, node)?,
            k if k == syntax_kind_ext::ASSIGNMENT_STATEMENT => self.visit_assignment(node)?,
            k if k == syntax_kind_ext::ANNOTATED_ASSIGNMENT => {
                self.visit_annotated_assignment(node)?
            }
            k if k == syntax_kind_ext::AUGMENTED_ASSIGNMENT => {
                if let Some(data) = self.arena.get_augmented_assignment(node) {
                    self.visit_expression(data.target)?;
                    self.visit_expression(data.value)?;
                }
            }
            k if k == syntax_kind_ext::EXPRESSION_STATEMENT => {
                if let Some(data) = self.arena.get_expr_statement(node) {
                    self.visit_expression(data.expression)?;
                }
            }
            k if k == syntax_kind_ext::IF_STATEMENT => {
                if let Some(data) = self.arena.get_if_statement(node) {
                    self.visit_expression(data.condition)?;
                    self.visit_block(data.then_block)?;
                    if self.arena.is_kind(data.else_block, syntax_kind_ext::IF_STATEMENT) {
                        self.visit_statement(data.else_block)?;
                    } else {
                        self.visit_block(data.else_block)?;
                    }
                }
            }
            k if k == syntax_kind_ext::KEYWORD_STATEMENT
                || k == syntax_kind_ext::COMPOUND_STATEMENT =>
            {
                return Err(self.executable_statement_error(idx));
            }
            _ => {}
        }
        self.exit_depth();
        Ok(())
    }
}
