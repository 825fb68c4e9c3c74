//! Printer - applies transform directives to the original source text.
//!
//! Directives become flat text edits sorted by position. An edit that starts
//! inside a replaced range is subsumed by the replacement; everything between
//! edits is copied verbatim, so unedited regions round-trip byte for byte.

use crate::transform_context::{TransformContext, TransformDirective};
use memchr::{memchr, memrchr};
use std::cmp::Reverse;
use unpy_binder::ExprRenderer;
use unpy_common::Span;
use unpy_parser::parser::node::Node;
use unpy_parser::{NodeArena, NodeIndex};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum EditKind {
    InsertAfter,
    InsertBefore,
    Replace,
}

#[derive(Debug)]
struct Edit<'t> {
    start: u32,
    end: u32,
    kind: EditKind,
    /// Owning node and position in its chain, for a stable order.
    seq: (u32, usize),
    text: &'t str,
}

pub struct Printer<'a> {
    arena: &'a NodeArena,
}

impl<'a> Printer<'a> {
    pub fn new(arena: &'a NodeArena) -> Printer<'a> {
        Printer { arena }
    }

    fn source(&self) -> &'a str {
        &self.arena.source_text
    }

    /// The whole module with every directive applied.
    pub fn print(&self, transforms: &TransformContext) -> String {
        let len = u32::try_from(self.source().len()).unwrap_or(u32::MAX);
        self.render_span(transforms, Span::new(0, len))
    }

    /// A sub-range of the source with the directives inside it applied.
    pub fn render_span(&self, transforms: &TransformContext, span: Span) -> String {
        let source = self.source();
        let edits = self.collect_edits(transforms);
        let mut out = String::with_capacity(span.len() as usize);
        let mut cursor = span.start;

        for edit in edits
            .iter()
            .filter(|edit| edit.start >= span.start && edit.end <= span.end)
        {
            if edit.start < cursor {
                continue;
            }
            out.push_str(slice(source, cursor, edit.start));
            out.push_str(edit.text);
            cursor = edit.end;
        }
        out.push_str(slice(source, cursor, span.end));
        out
    }

    /// A node's text with the directives inside it applied.
    pub fn render_node(&self, transforms: &TransformContext, node: NodeIndex) -> String {
        match self.arena.get(node) {
            Some(n) => self.render_span(transforms, Span::new(n.pos, n.end)),
            None => String::new(),
        }
    }

    /// An `ExprRenderer` that sees the current directives.
    pub fn renderer<'p>(&'p self, transforms: &'p TransformContext) -> EditedText<'p, 'a> {
        EditedText {
            printer: self,
            transforms,
        }
    }

    fn collect_edits<'t>(&self, transforms: &'t TransformContext) -> Vec<Edit<'t>> {
        let mut edits = Vec::with_capacity(transforms.len());
        for (&idx, directive) in transforms.iter() {
            let Some(node) = self.arena.get(idx) else {
                continue;
            };
            let mut chain_index = 0;
            self.push_edits(idx, node, directive, &mut chain_index, &mut edits);
        }
        edits.sort_by_key(|edit| (edit.start, edit.kind, Reverse(edit.end), edit.seq));
        edits
    }

    fn push_edits<'t>(
        &self,
        idx: NodeIndex,
        node: &Node,
        directive: &'t TransformDirective,
        chain_index: &mut usize,
        edits: &mut Vec<Edit<'t>>,
    ) {
        let seq = (idx.0, *chain_index);
        *chain_index += 1;
        let (start, end, kind, text) = match directive {
            TransformDirective::Replace { text } => (node.pos, node.end, EditKind::Replace, text.as_str()),
            TransformDirective::InsertBefore { text } => {
                (node.pos, node.pos, EditKind::InsertBefore, text.as_str())
            }
            TransformDirective::InsertAfter { text } => {
                (node.end, node.end, EditKind::InsertAfter, text.as_str())
            }
            TransformDirective::RemoveStatement => {
                let range = statement_removal_range(self.source(), node.pos, node.end);
                (range.start, range.end, EditKind::Replace, "")
            }
            TransformDirective::Chain(directives) => {
                for directive in directives {
                    self.push_edits(idx, node, directive, chain_index, edits);
                }
                return;
            }
        };
        edits.push(Edit {
            start,
            end,
            kind,
            seq,
            text,
        });
    }
}

/// Renders expressions through the printer, honoring nested edits.
pub struct EditedText<'p, 'a> {
    printer: &'p Printer<'a>,
    transforms: &'p TransformContext,
}

impl ExprRenderer for EditedText<'_, '_> {
    fn render_expr(&self, node: NodeIndex) -> String {
        self.printer.render_node(self.transforms, node)
    }
}

fn slice(source: &str, start: u32, end: u32) -> &str {
    source.get(start as usize..end as usize).unwrap_or("")
}

/// Range deleted for a removed statement.
///
/// A statement alone on its line takes the whole line with it. One of several
/// `;`-separated statements takes its separator instead.
pub(crate) fn statement_removal_range(source: &str, pos: u32, end: u32) -> Span {
    let bytes = source.as_bytes();
    let (pos_us, end_us) = (pos as usize, end as usize);
    let line_start = memrchr(b'\n', &bytes[..pos_us]).map_or(0, |i| i + 1);
    let line_end = memchr(b'\n', &bytes[end_us..]).map_or(bytes.len(), |i| end_us + i);

    let before = &source[line_start..pos_us];
    let after = source[end_us..line_end].trim_start();
    let alone_before = before.trim().is_empty();
    let alone_after = after.is_empty() || after.starts_with('#');

    if alone_before && alone_after {
        let stop = (line_end + 1).min(bytes.len());
        return Span::new(line_start as u32, stop as u32);
    }
    if let Some(rest) = after.strip_prefix(';') {
        let stop = line_end - rest.trim_start().len();
        return Span::new(pos, stop as u32);
    }
    let trimmed_before = before.trim_end();
    if let Some(head) = trimmed_before.strip_suffix(';') {
        let start = line_start + head.trim_end().len();
        return Span::new(start as u32, end);
    }
    Span::new(pos, end)
}
