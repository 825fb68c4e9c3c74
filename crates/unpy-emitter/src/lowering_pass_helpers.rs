//! Import reconciliation and statement placement for the lowering pass.

use super::*;
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;
use unpy_common::limits::MAX_STATEMENTS_AFTER_LAST_IMPORT;

/// Where new `from` import statements go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Anchor {
    Before(NodeIndex),
    After(NodeIndex),
}

impl Anchor {
    fn statement(self) -> NodeIndex {
        match self {
            Anchor::Before(stmt) | Anchor::After(stmt) => stmt,
        }
    }
}

/// `(name, asname)` of one imported symbol.
type ImportEntry = (String, Option<String>);

impl<'a> LoweringPass<'a> {
    // =========================================================================
    // Layout helpers
    // =========================================================================

    fn source(&self) -> &'a str {
        &self.arena.source_text
    }

    /// Leading whitespace of the line a statement starts on, if the statement
    /// is the first thing on it.
    fn indentation_of(&self, stmt: NodeIndex) -> String {
        let Some(node) = self.arena.get(stmt) else {
            return String::new();
        };
        line_prefix(self.source(), node.pos)
            .filter(|prefix| prefix.trim().is_empty())
            .unwrap_or_default()
            .to_string()
    }

    fn is_docstring(&self, stmt: NodeIndex) -> bool {
        self.arena
            .get(stmt)
            .and_then(|node| self.arena.get_expr_statement(node))
            .is_some_and(|data| self.arena.is_string(data.expression))
    }

    /// Whether a `;` separates `stmt` from a following statement on its line.
    fn semicolon_after(&self, stmt: NodeIndex) -> bool {
        self.arena
            .get(stmt)
            .and_then(|node| self.source().get(node.end as usize..))
            .is_some_and(|rest| rest.trim_start_matches([' ', '\t']).starts_with(';'))
    }

    /// Whether a `;` separates `stmt` from a preceding statement on its line.
    fn semicolon_before(&self, stmt: NodeIndex) -> bool {
        self.arena
            .get(stmt)
            .and_then(|node| line_prefix(self.source(), node.pos))
            .is_some_and(|prefix| prefix.trim_end().ends_with(';'))
    }

    /// Imports, `if` blocks that open with an import, and `__all__ = ...`.
    fn is_import_like(&self, stmt: NodeIndex) -> bool {
        if self.is_import(stmt) {
            return true;
        }
        let arena = self.arena;
        let Some(node) = arena.get(stmt) else {
            return false;
        };
        if let Some(data) = arena.get_if_statement(node) {
            return arena
                .get(data.then_block)
                .and_then(|block| arena.get_block(block))
                .and_then(|block| block.statements.nodes.first().copied())
                .is_some_and(|first| self.is_import(first));
        }
        arena.get_assignment(node).is_some_and(|data| {
            data.targets.nodes.len() == 1
                && data
                    .targets
                    .nodes
                    .first()
                    .and_then(|&target| arena.name_text(target))
                    == Some("__all__")
        })
    }

    fn statement_position(&self, stmt: NodeIndex) -> Option<usize> {
        self.statements.iter().position(|&s| s == stmt)
    }

    /// Whether the statement after `stmt` is not an import and starts on the
    /// very next line.
    fn followed_directly_by_code(&self, stmt: NodeIndex) -> bool {
        let Some(position) = self.statement_position(stmt) else {
            return false;
        };
        let Some(&next) = self.statements.get(position + 1) else {
            return false;
        };
        if self.is_import(next) {
            return false;
        }
        match (self.arena.get(stmt), self.arena.get(next)) {
            (Some(current), Some(following)) => {
                let gap = self
                    .source()
                    .get(current.end as usize..following.pos as usize)
                    .unwrap_or("");
                gap.matches('\n').count() <= 1
            }
            _ => false,
        }
    }

    // =========================================================================
    // Existing import statements
    // =========================================================================

    /// Rewrite the top-level `from` imports the plan touches, then add
    /// statements for modules that have none.
    pub(super) fn reconcile_imports(&mut self) {
        if !self.plan.has_changes() {
            return;
        }
        let arena = self.arena;
        let mut additions = self.plan.grouped_additions();
        let mut seen_modules: FxHashSet<&str> = FxHashSet::default();
        let mut emptied = Vec::new();

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
            let added = if seen_modules.insert(module) {
                additions.remove(module).unwrap_or_default()
            } else {
                Vec::new()
            };

            let mut entries: Vec<ImportEntry> = data
                .names
                .iter()
                .filter_map(|alias| arena.get(alias).and_then(|n| arena.get_import_alias(n)))
                .filter(|alias| !self.plan.is_removed(module, &alias.name))
                .map(|alias| (alias.name.clone(), alias.asname.clone()))
                .collect();
            if entries.len() == data.names.len() && added.is_empty() {
                continue;
            }
            entries.extend(added.into_iter().map(|name| (name, None)));
            entries.sort();
            entries.dedup();

            if entries.is_empty() {
                debug!(module, "removing emptied import");
                emptied.push(stmt);
                continue;
            }
            debug!(module, names = entries.len(), "rewriting import");
            let text = self.render_from_import(stmt, data, &entries);
            self.transforms
                .insert(stmt, TransformDirective::Replace { text });
        }

        self.insert_new_imports(&additions, &emptied);
        for stmt in emptied {
            if !self.transforms.has_transform(stmt) {
                self.transforms
                    .insert(stmt, TransformDirective::RemoveStatement);
            }
        }
    }

    /// The statement text with a new name list, keeping the statement's layout.
    fn render_from_import(
        &self,
        stmt: NodeIndex,
        data: &ImportFromData,
        entries: &[ImportEntry],
    ) -> String {
        let source = self.source();
        let Some(node) = self.arena.get(stmt) else {
            return String::new();
        };
        let names: Vec<String> = entries
            .iter()
            .map(|(name, asname)| match asname {
                Some(asname) => format!("{name} as {asname}"),
                None => name.clone(),
            })
            .collect();

        let region = &source[data.names_pos as usize..data.names_end as usize];
        let list = if data.parenthesized && region.contains('\n') {
            let indent = data
                .names
                .first()
                .and_then(|first| self.arena.get(first))
                .and_then(|first| line_prefix(source, first.pos))
                .filter(|prefix| prefix.trim().is_empty() && !prefix.is_empty())
                .unwrap_or("    ");
            let closing = region
                .strip_suffix(')')
                .and_then(|inner| inner.rsplit_once('\n'))
                .map(|(_, tail)| tail)
                .filter(|tail| tail.trim().is_empty())
                .unwrap_or("");
            let mut list = String::from("(\n");
            for name in &names {
                list.push_str(indent);
                list.push_str(name);
                list.push_str(",\n");
            }
            list.push_str(closing);
            list.push(')');
            list
        } else if data.parenthesized {
            format!("({})", names.join(", "))
        } else {
            names.join(", ")
        };

        format!(
            "{}{list}{}",
            &source[node.pos as usize..data.names_pos as usize],
            &source[data.names_end as usize..node.end as usize]
        )
    }

    // =========================================================================
    // New import statements
    // =========================================================================

    /// Before the first relative import or import of a module sorting after
    /// `typing`, else after the leading run of imports, else before the first
    /// statement that is not the docstring.
    fn new_import_anchor(&self) -> Option<Anchor> {
        let mut last_import = None;
        let mut since_last_import = 0;
        for &stmt in &self.statements {
            if let Some(data) = self.from_import_data(stmt) {
                let sorts_after_typing = data
                    .module
                    .as_deref()
                    .is_some_and(|module| module > MODULE_TYPING);
                if data.level > 0 || sorts_after_typing {
                    return Some(Anchor::Before(stmt));
                }
                last_import = Some(stmt);
                since_last_import = 0;
                continue;
            }
            if self.is_import(stmt) {
                last_import = Some(stmt);
                since_last_import = 0;
                continue;
            }
            let Some(kind) = self.arena.kind_of(stmt) else {
                continue;
            };
            if kind == syntax_kind_ext::CLASS_DEFINITION
                || kind == syntax_kind_ext::FUNCTION_DEFINITION
                || kind == syntax_kind_ext::IF_STATEMENT
                || kind == syntax_kind_ext::COMPOUND_STATEMENT
            {
                break;
            }
            since_last_import += 1;
            if last_import.is_some() && since_last_import >= MAX_STATEMENTS_AFTER_LAST_IMPORT {
                break;
            }
        }

        if let Some(last) = last_import {
            return Some(Anchor::After(last));
        }
        self.statements
            .iter()
            .copied()
            .find(|&stmt| !self.is_docstring(stmt))
            .map(Anchor::Before)
            .or_else(|| self.statements.last().copied().map(Anchor::After))
    }

    fn insert_new_imports(
        &mut self,
        additions: &BTreeMap<String, Vec<String>>,
        emptied: &[NodeIndex],
    ) {
        if additions.is_empty() {
            return;
        }
        let block = additions
            .iter()
            .map(|(module, names)| format!("from {module} import {}", names.join(", ")))
            .collect::<Vec<_>>()
            .join("\n");
        let Some(anchor) = self.new_import_anchor() else {
            return;
        };
        debug!(?anchor, modules = additions.len(), "adding import statements");

        let stmt = anchor.statement();
        let separate = self.followed_directly_by_code(stmt);
        if emptied.contains(&stmt) {
            self.new_imports = Some(Anchor::After(stmt));
            let mut text = block;
            if separate {
                text.push('\n');
            }
            // A statement sharing the line loses its `;` and keeps the rest.
            let directive = if self.semicolon_after(stmt) {
                text.push('\n');
                TransformDirective::InsertBefore { text }
            } else if self.semicolon_before(stmt) {
                TransformDirective::InsertAfter {
                    text: format!("\n{text}"),
                }
            } else {
                self.transforms
                    .insert(stmt, TransformDirective::Replace { text });
                return;
            };
            self.transforms.insert(stmt, directive);
            self.transforms
                .insert(stmt, TransformDirective::RemoveStatement);
            return;
        }
        self.new_imports = Some(anchor);

        match anchor {
            Anchor::After(last) => {
                let mut text = format!("\n{block}");
                if separate {
                    text.push('\n');
                }
                self.transforms
                    .insert(last, TransformDirective::InsertAfter { text });
            }
            Anchor::Before(first) if self.is_import(first) => {
                self.transforms.prepend(
                    first,
                    TransformDirective::InsertBefore {
                        text: format!("{block}\n"),
                    },
                );
            }
            Anchor::Before(first) => {
                self.transforms.prepend(
                    first,
                    TransformDirective::InsertBefore {
                        text: format!("{block}\n\n"),
                    },
                );
            }
        }
    }

    // =========================================================================
    // Synthesized declarations
    // =========================================================================

    /// Insert the hoisted declarations as one group, before the first
    /// statement that follows both the leading imports (with `__all__` and the
    /// docstring) and any new import statement.
    pub(super) fn place_declarations(&mut self) {
        if self.declarations.is_empty() {
            return;
        }
        let leading = self
            .statements
            .iter()
            .enumerate()
            .take_while(|&(i, &stmt)| {
                (i == 0 && self.is_docstring(stmt)) || self.is_import_like(stmt)
            })
            .count();
        let floor = match self.new_imports {
            Some(Anchor::Before(stmt)) => self.statement_position(stmt).unwrap_or(0),
            Some(Anchor::After(stmt)) => self.statement_position(stmt).map_or(0, |i| i + 1),
            None => 0,
        };
        let target = self
            .statements
            .iter()
            .skip(leading.max(floor))
            .copied()
            .find(|&stmt| !self.is_import_like(stmt));
        debug!(
            count = self.declarations.len(),
            ?target,
            "placing hoisted declarations"
        );

        match target {
            Some(stmt) => {
                let indent = self.indentation_of(stmt);
                let mut text = String::new();
                for declaration in &self.declarations {
                    text.push_str(declaration);
                    text.push('\n');
                    text.push_str(&indent);
                }
                self.transforms
                    .insert(stmt, TransformDirective::InsertBefore { text });
            }
            None => {
                // Nothing but imports after the leading run.
                let Some(last) = self
                    .statements
                    .iter()
                    .rev()
                    .copied()
                    .find(|&stmt| !self.is_import(stmt))
                else {
                    return;
                };
                let text = format!("\n{}", self.declarations.join("\n"));
                self.transforms
                    .insert(last, TransformDirective::InsertAfter { text });
            }
        }
    }
}

/// Text between the start of the line containing `pos` and `pos`.
fn line_prefix(source: &str, pos: u32) -> Option<&str> {
    let pos = pos as usize;
    let head = source.get(..pos)?;
    let line_start = head.rfind('\n').map_or(0, |i| i + 1);
    Some(&head[line_start..])
}
