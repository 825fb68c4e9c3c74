//! Expression walk: dotted references and variadic unpack sites.

use super::{CollectorState, Reference};
use tracing::trace;
use unpy_common::StubError;
use unpy_parser::{NodeIndex, syntax_kind_ext};

impl<'a> CollectorState<'a> {
    pub(crate) fn visit_expression(&mut self, idx: NodeIndex) -> Result<(), StubError> {
        let arena = self.arena;
        let Some(node) = arena.get(idx) else {
            return Ok(());
        };
        self.enter_depth(idx)?;
        self.check_expression_policy(idx, node)?;

        let is_chain = node.kind == syntax_kind_ext::NAME || node.kind == syntax_kind_ext::ATTRIBUTE;
        match arena.dotted_name(idx) {
            Some(dotted) if is_chain => self.record_reference(idx, dotted)?,
            _ => {
                if node.kind == syntax_kind_ext::STARRED {
                    self.record_unpack(idx);
                }
                for child in arena.expression_children(idx) {
                    self.visit_expression(child)?;
                }
            }
        }

        self.exit_depth();
        Ok(())
    }

    fn record_reference(&mut self, idx: NodeIndex, dotted: String) -> Result<(), StubError> {
        let prefixes = self.arena.dotted_prefixes(idx);
        for &prefix in &prefixes {
            let Some(prefix_dotted) = self.arena.dotted_name(prefix) else {
                continue;
            };
            let fq_name = self.imports.fq_name_of(&prefix_dotted);
            self.check_unsupported_name(&fq_name, self.span_of(prefix))?;
        }
        trace!(dotted = %dotted, "reference");
        self.references.push(Reference {
            node: idx,
            prefixes,
            dotted,
        });
        Ok(())
    }

    /// `*Ts` where `Ts` is a lowered `TypeVarTuple` of an enclosing declaration.
    fn record_unpack(&mut self, idx: NodeIndex) {
        let arena = self.arena;
        let Some(inner) = arena
            .get(idx)
            .and_then(|node| arena.get_starred(node))
            .map(|starred| starred.expression)
        else {
            return;
        };
        let Some(name) = arena.name_text(inner) else {
            return;
        };
        if self
            .variadic_scopes
            .iter()
            .any(|scope| scope.contains(name))
        {
            trace!(name, "variadic unpack");
            self.unpacks.push(idx);
        }
    }
}
