//! Import statements and module-level names.

use super::CollectorState;
use crate::import_table::WILDCARD;
use crate::{MODULE_TYPING, MODULE_TYPING_EXTENSIONS};
use unpy_common::{Span, StubError, Version};
use unpy_parser::parser::node::Node;
use unpy_parser::{NodeIndex, syntax_kind_ext};

impl<'a> CollectorState<'a> {
    fn check_top_level_import(&self, idx: NodeIndex) -> Result<(), StubError> {
        if !self.scope_stack.is_empty() {
            return Err(StubError::unsupported(
                "only top-level import statements are supported",
                self.span_of(idx),
            ));
        }
        Ok(())
    }

    /// Reject a fully-qualified name that cannot be used at the target.
    pub(crate) fn check_unsupported_name(&self, fq_name: &str, span: Span) -> Result<(), StubError> {
        let Some(version) = self.backports.unsupported_name(fq_name) else {
            return Ok(());
        };
        if self.target.supports(version) {
            return Ok(());
        }
        let message = if version == Version::NEVER {
            format!("'{fq_name}' is not allowed in stubs")
        } else {
            format!("'{fq_name}' requires Python >= {version}")
        };
        Err(StubError::unsupported(message, span))
    }

    pub(crate) fn visit_import(&mut self, idx: NodeIndex, node: &'a Node) -> Result<(), StubError> {
        self.check_top_level_import(idx)?;
        let Some(data) = self.arena.get_import(node) else {
            return Ok(());
        };
        for alias_idx in data.names.iter() {
            let Some(alias) = self
                .node(alias_idx)
                .and_then(|n| self.arena.get_import_alias(n))
            else {
                continue;
            };
            let span = self.span_of(alias_idx);
            let fq_name =
                self.imports
                    .register_module_import(&alias.name, alias.asname.as_deref(), span)?;
            self.check_unsupported_name(&fq_name, span)?;
        }
        Ok(())
    }

    pub(crate) fn visit_import_from(
        &mut self,
        idx: NodeIndex,
        node: &'a Node,
    ) -> Result<(), StubError> {
        self.check_top_level_import(idx)?;
        let Some(data) = self.arena.get_import_from(node) else {
            return Ok(());
        };

        let mut module = ".".repeat(data.level as usize);
        if let Some(name) = &data.module {
            module.push_str(name);
        }

        if data.is_star {
            let relocates = module == MODULE_TYPING
                || module == MODULE_TYPING_EXTENSIONS
                || self.backports.relocates_from(&module);
            if relocates {
                return Err(StubError::unsupported(
                    format!("wildcard imports from '{module}' are not supported"),
                    self.span_of(idx),
                ));
            }
            self.imports
                .register_import(WILDCARD, Some(&module), None, self.span_of(idx))?;
        } else {
            for alias_idx in data.names.iter() {
                let Some(alias) = self
                    .node(alias_idx)
                    .and_then(|n| self.arena.get_import_alias(n))
                else {
                    continue;
                };
                let span = self.span_of(alias_idx);
                let fq_name = self.imports.register_import(
                    &alias.name,
                    Some(&module),
                    alias.asname.as_deref(),
                    span,
                )?;
                self.check_unsupported_name(&fq_name, span)?;
            }
        }

        self.from_imports.push(idx);
        Ok(())
    }

    /// Names bound at module level, including inside module-level `if` blocks.
    pub(crate) fn collect_global_names(&self, statements: &[NodeIndex]) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_global_names_into(statements, &mut names);
        names
    }

    fn collect_global_names_into(&self, statements: &[NodeIndex], names: &mut Vec<String>) {
        let arena = self.arena;
        let push_target = |target: NodeIndex, names: &mut Vec<String>| {
            if let Some(name) = arena.name_text(target) {
                names.push(name.to_string());
            }
        };

        for &stmt in statements {
            let Some(node) = arena.get(stmt) else {
                continue;
            };
            match node.kind {
                k if k == syntax_kind_ext::CLASS_DEFINITION => {
                    if let Some(data) = arena.get_class(node) {
                        push_target(data.name, names);
                    }
                }
                k if k == syntax_kind_ext::FUNCTION_DEFINITION => {
                    if let Some(data) = arena.get_function(node) {
                        push_target(data.name, names);
                    }
                }
                k if k == syntax_kind_ext::TYPE_ALIAS_STATEMENT => {
                    if let Some(data) = arena.get_type_alias(node) {
                        push_target(data.name, names);
                    }
                }
                k if k == syntax_kind_ext::ASSIGNMENT_STATEMENT => {
                    if let Some(data) = arena.get_assignment(node) {
                        for target in data.targets.iter() {
                            push_target(target, names);
                        }
                    }
                }
                k if k == syntax_kind_ext::ANNOTATED_ASSIGNMENT => {
                    if let Some(data) = arena.get_annotated_assignment(node) {
                        push_target(data.target, names);
                    }
                }
                k if k == syntax_kind_ext::IMPORT_STATEMENT => {
                    let Some(data) = arena.get_import(node) else {
                        continue;
                    };
                    for alias in data.names.iter() {
                        if let Some(alias) = arena.get(alias).and_then(|n| arena.get_import_alias(n)) {
                            let bound = alias.asname.as_deref().unwrap_or(&alias.name);
                            let head = bound.split('.').next().unwrap_or(bound);
                            names.push(head.to_string());
                        }
                    }
                }
                k if k == syntax_kind_ext::IMPORT_FROM_STATEMENT => {
                    let Some(data) = arena.get_import_from(node) else {
                        continue;
                    };
                    for alias in data.names.iter() {
                        if let Some(alias) = arena.get(alias).and_then(|n| arena.get_import_alias(n)) {
                            names.push(alias.asname.clone().unwrap_or_else(|| alias.name.clone()));
                        }
                    }
                }
                k if k == syntax_kind_ext::IF_STATEMENT => {
                    let Some(data) = arena.get_if_statement(node) else {
                        continue;
                    };
                    for branch in [data.then_block, data.else_block] {
                        if let Some(block) = arena.get(branch).and_then(|n| arena.get_block(n)) {
                            self.collect_global_names_into(&block.statements.nodes, names);
                        } else if arena.is_kind(branch, syntax_kind_ext::IF_STATEMENT) {
                            self.collect_global_names_into(&[branch], names);
                        }
                    }
                }
                _ => {}
            }
        }
    }
}
