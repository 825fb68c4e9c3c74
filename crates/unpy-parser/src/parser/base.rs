//! Base types shared by the arena and the parser.

use serde::{Deserialize, Serialize};

/// Index of a node in `NodeArena::nodes`. `NodeIndex::NONE` marks an absent child.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    pub const NONE: NodeIndex = NodeIndex(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self == NodeIndex::NONE
    }

    #[inline]
    pub fn is_some(self) -> bool {
        self != NodeIndex::NONE
    }

    /// `Some(self)` unless this is `NONE`.
    #[inline]
    pub fn to_option(self) -> Option<NodeIndex> {
        self.is_some().then_some(self)
    }
}

impl Default for NodeIndex {
    fn default() -> Self {
        NodeIndex::NONE
    }
}

/// An ordered list of child nodes with the span that encloses them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeList {
    pub nodes: Vec<NodeIndex>,
    pub pos: u32,
    pub end: u32,
}

impl NodeList {
    pub fn new() -> NodeList {
        NodeList::default()
    }

    pub fn with_nodes(nodes: Vec<NodeIndex>, pos: u32, end: u32) -> NodeList {
        NodeList { nodes, pos, end }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.nodes.iter().copied()
    }

    pub fn first(&self) -> Option<NodeIndex> {
        self.nodes.first().copied()
    }

    pub fn last(&self) -> Option<NodeIndex> {
        self.nodes.last().copied()
    }
}
