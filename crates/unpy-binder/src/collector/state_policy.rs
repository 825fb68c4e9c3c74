//! Stub policy checks: executable code, quoted annotations, import aliasing.

use super::CollectorState;
use unpy_common::StubError;
use unpy_parser::parser::node::Node;
use unpy_parser::{NodeIndex, node_flags, syntax_kind_ext};

const QUOTED_ANNOTATION: &str = "quoted annotations should not be included in stubs";

/// Contents of a simple string literal, without prefix or quotes.
fn string_literal_value(text: &str) -> &str {
    let body = text.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(inner) = body
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    body
}

impl<'a> CollectorState<'a> {
    /// Annotations must be expressions, not strings.
    pub(crate) fn check_annotation(
        &self,
        idx: NodeIndex,
        context: Option<&str>,
    ) -> Result<(), StubError> {
        if !self.arena.is_string(idx) {
            return Ok(());
        }
        let message = match context {
            Some(context) => format!("{QUOTED_ANNOTATION} (in '{context}')"),
            None => QUOTED_ANNOTATION.to_string(),
        };
        Err(StubError::policy(message, self.span_of(idx)))
    }

    pub(crate) fn executable_statement_error(&self, idx: NodeIndex) -> StubError {
        let mut words = self
            .arena
            .node_text(idx)
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .filter(|word| !word.is_empty());
        let keyword = match words.next() {
            Some("async") => words.next().unwrap_or("async"),
            Some(word) => word,
            None => "statement",
        };
        StubError::policy(
            format!("'{keyword}' statements are useless in stubs"),
            self.span_of(idx),
        )
    }

    /// Expressions that cannot appear in a stub.
    pub(crate) fn check_expression_policy(
        &self,
        idx: NodeIndex,
        node: &Node,
    ) -> Result<(), StubError> {
        let message = match node.kind {
            k if k == syntax_kind_ext::BOOLEAN_EXPRESSION => "boolean operations are useless in stubs",
            k if k == syntax_kind_ext::STRING && node.has_flag(node_flags::FORMAT_STRING) => {
                "f-strings are useless in stubs"
            }
            k if k == syntax_kind_ext::LAMBDA => "'lambda' is an invalid expression",
            k if k == syntax_kind_ext::AWAIT_EXPRESSION => "'await' is an invalid expression",
            k if k == syntax_kind_ext::YIELD_EXPRESSION => "'yield' is an invalid expression",
            _ => return Ok(()),
        };
        Err(StubError::policy(message, self.span_of(idx)))
    }

    /// `x = alias` would create a second name for an import.
    fn check_assign_imported(&self, value: NodeIndex) -> Result<(), StubError> {
        if !(self.arena.is_kind(value, syntax_kind_ext::NAME)
            || self.arena.is_kind(value, syntax_kind_ext::ATTRIBUTE))
        {
            return Ok(());
        }
        let Some(dotted) = self.arena.dotted_name(value) else {
            return Ok(());
        };
        match self.imports.fq_name_of_alias(&dotted) {
            Some(fq_name) => Err(StubError::unsupported(
                format!("multiple import aliases for '{fq_name}'"),
                self.span_of(value),
            )),
            None => Ok(()),
        }
    }

    pub(crate) fn visit_assignment(&mut self, node: &'a Node) -> Result<(), StubError> {
        let arena = self.arena;
        let Some(data) = arena.get_assignment(node) else {
            return Ok(());
        };
        self.check_assign_imported(data.value)?;
        self.check_legacy_type_var(data.targets.nodes.as_slice(), data.value)?;

        for target in data.targets.iter() {
            match arena.name_text(target) {
                Some(name) if self.imports.is_import_alias(name) => {
                    return Err(StubError::unsupported(
                        format!("imported name '{name}' cannot be assigned to"),
                        self.span_of(target),
                    ));
                }
                Some(_) => {}
                None => self.visit_expression(target)?,
            }
        }
        self.visit_expression(data.value)
    }

    /// `T = TypeVar("T", "int")`: annotations may hide in legacy type variable
    /// arguments too.
    fn check_legacy_type_var(
        &self,
        targets: &[NodeIndex],
        value: NodeIndex,
    ) -> Result<(), StubError> {
        let arena = self.arena;
        let [target] = targets else {
            return Ok(());
        };
        let Some(target_name) = arena.name_text(*target) else {
            return Ok(());
        };
        let Some(call) = arena.get(value).and_then(|n| arena.get_call(n)) else {
            return Ok(());
        };
        let Some(callee) = arena.dotted_name(call.expression) else {
            return Ok(());
        };
        let Some(args) = arena
            .get(call.arguments)
            .and_then(|n| arena.get_argument_list(n))
        else {
            return Ok(());
        };
        if args.arguments.len() < 2 {
            return Ok(());
        }
        let Some(first) = args.arguments.first() else {
            return Ok(());
        };
        if !arena.is_string(first) || string_literal_value(arena.node_text(first)) != target_name {
            return Ok(());
        }

        let context = format!("{target_name} = {callee}(...)");
        for arg in args.arguments.iter().skip(1) {
            if let Some(keyword) = arena.get(arg).and_then(|n| arena.get_keyword_argument(n)) {
                if matches!(arena.name_text(keyword.name), Some("bound" | "default")) {
                    self.check_annotation(keyword.value, Some(&context))?;
                }
            } else {
                self.check_annotation(arg, Some(&context))?;
            }
        }
        Ok(())
    }

    pub(crate) fn visit_annotated_assignment(&mut self, node: &'a Node) -> Result<(), StubError> {
        let arena = self.arena;
        let Some(data) = arena.get_annotated_assignment(node) else {
            return Ok(());
        };
        if data.value.is_some() {
            self.check_assign_imported(data.value)?;
        }
        self.check_annotation(data.annotation, None)?;

        if data.value.is_some()
            && let Some(target) = arena.name_text(data.target)
            && let Some(type_alias) = self.imports.imported_from_typing_as("TypeAlias")
            && arena.dotted_name(data.annotation).as_deref() == Some(type_alias.as_str())
        {
            self.check_annotation(data.value, Some(target))?;
        }

        if arena.name_text(data.target).is_none() {
            self.visit_expression(data.target)?;
        }
        self.visit_expression(data.annotation)?;
        if data.value.is_some() {
            self.visit_expression(data.value)?;
        }
        Ok(())
    }
}
