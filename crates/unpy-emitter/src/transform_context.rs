//! Transform Context - edit directives recorded by the lowering pass.
//!
//! The parsed tree is read-only. Instead of rewriting nodes, the lowering pass
//! records `TransformDirective`s keyed by the node they apply to, and the
//! `Printer` applies them to the original source text. Text that no directive
//! touches is copied byte for byte.

use rustc_hash::FxHashMap;
use unpy_parser::NodeIndex;

/// How the printer emits a node differently from its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformDirective {
    /// Emit `text` in place of the node. Edits nested inside the node are
    /// subsumed.
    Replace { text: String },

    /// Emit `text` directly before the node.
    InsertBefore { text: String },

    /// Emit `text` directly after the node.
    InsertAfter { text: String },

    /// Delete the statement, including its line when it is alone on it.
    RemoveStatement,

    /// Several directives on one node, applied in order.
    Chain(Vec<TransformDirective>),
}

impl TransformDirective {
    fn into_vec(self) -> Vec<TransformDirective> {
        match self {
            TransformDirective::Chain(directives) => directives,
            directive => vec![directive],
        }
    }
}

/// Transform context maps node indices to their transform directives
#[derive(Clone, Debug, Default)]
pub struct TransformContext {
    directives: FxHashMap<NodeIndex, TransformDirective>,
}

impl TransformContext {
    pub fn new() -> TransformContext {
        TransformContext::default()
    }

    /// Register a directive for a node, after any already registered.
    pub fn insert(&mut self, node: NodeIndex, directive: TransformDirective) {
        match self.directives.remove(&node) {
            Some(existing) => {
                let mut chain = existing.into_vec();
                chain.extend(directive.into_vec());
                self.directives
                    .insert(node, TransformDirective::Chain(chain));
            }
            None => {
                self.directives.insert(node, directive);
            }
        }
    }

    /// Register a directive for a node, before any already registered.
    pub fn prepend(&mut self, node: NodeIndex, directive: TransformDirective) {
        match self.directives.remove(&node) {
            Some(existing) => {
                let mut chain = directive.into_vec();
                chain.extend(existing.into_vec());
                self.directives
                    .insert(node, TransformDirective::Chain(chain));
            }
            None => {
                self.directives.insert(node, directive);
            }
        }
    }

    /// Get the transform directive for a node, if any
    pub fn get(&self, node: NodeIndex) -> Option<&TransformDirective> {
        self.directives.get(&node)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeIndex, &TransformDirective)> {
        self.directives.iter()
    }

    pub fn has_transform(&self, node: NodeIndex) -> bool {
        self.directives.contains_key(&node)
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replace(text: &str) -> TransformDirective {
        TransformDirective::Replace {
            text: text.to_string(),
        }
    }

    fn insert_before(text: &str) -> TransformDirective {
        TransformDirective::InsertBefore {
            text: text.to_string(),
        }
    }

    #[test]
    fn test_transform_context_basic() {
        let mut ctx = TransformContext::new();
        let node = NodeIndex(42);

        assert!(ctx.is_empty());
        assert!(!ctx.has_transform(node));

        ctx.insert(node, TransformDirective::RemoveStatement);
        assert_eq!(ctx.len(), 1);
        assert!(ctx.has_transform(node));
        assert_eq!(ctx.get(node), Some(&TransformDirective::RemoveStatement));
    }

    #[test]
    fn test_insert_chains_in_order() {
        let mut ctx = TransformContext::new();
        let node = NodeIndex(7);
        ctx.insert(node, replace("list"));
        ctx.insert(node, insert_before("x"));
        ctx.insert(node, TransformDirective::Chain(vec![insert_before("y")]));

        assert_eq!(
            ctx.get(node),
            Some(&TransformDirective::Chain(vec![
                replace("list"),
                insert_before("x"),
                insert_before("y"),
            ]))
        );
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_prepend_goes_first() {
        let mut ctx = TransformContext::new();
        let node = NodeIndex(3);
        ctx.prepend(node, insert_before("b"));
        ctx.insert(node, insert_before("c"));
        ctx.prepend(node, insert_before("a"));

        assert_eq!(
            ctx.get(node),
            Some(&TransformDirective::Chain(vec![
                insert_before("a"),
                insert_before("b"),
                insert_before("c"),
            ]))
        );
    }
}
