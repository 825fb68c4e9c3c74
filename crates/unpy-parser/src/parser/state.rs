//! Parser state - token cursor, diagnostics and shared helpers.
//!
//! `ParserState` drives a `ScannerState` and builds nodes into a `NodeArena`.
//! Parse methods return `ParseResult<NodeIndex>`; the first error stops the
//! parse and is recorded as a `ParseDiagnostic`.

use super::base::NodeIndex;
use super::node::NodeArena;
use serde::Serialize;
use std::sync::Arc;
use unpy_common::limits::MAX_AST_DEPTH;
use unpy_scanner::{ScannerState, SyntaxKind};

/// A parse error with its byte range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParseDiagnostic {
    pub start: u32,
    pub length: u32,
    pub message: String,
}

pub(crate) type ParseResult<T> = Result<T, ParseDiagnostic>;

pub struct ParserState {
    pub(crate) scanner: ScannerState,
    pub(crate) arena: NodeArena,
    pub(crate) current_token: SyntaxKind,
    /// End of the last consumed token that was not layout (NEWLINE/INDENT/DEDENT).
    pub(crate) last_token_end: u32,
    pub(crate) recursion_depth: u32,
    pub(crate) parse_diagnostics: Vec<ParseDiagnostic>,
}

impl ParserState {
    pub fn new(file_name: impl Into<String>, source_text: impl Into<Arc<str>>) -> ParserState {
        let source_text: Arc<str> = source_text.into();
        ParserState {
            scanner: ScannerState::new(Arc::clone(&source_text)),
            arena: NodeArena::new(file_name, source_text),
            current_token: SyntaxKind::Unknown,
            last_token_end: 0,
            recursion_depth: 0,
            parse_diagnostics: Vec::new(),
        }
    }

    pub fn get_arena(&self) -> &NodeArena {
        &self.arena
    }

    pub fn into_arena(self) -> NodeArena {
        self.arena
    }

    pub fn get_diagnostics(&self) -> &[ParseDiagnostic] {
        &self.parse_diagnostics
    }

    // =========================================================================
    // Token cursor
    // =========================================================================

    #[inline]
    pub(crate) fn token(&self) -> SyntaxKind {
        self.current_token
    }

    #[inline]
    pub(crate) fn token_pos(&self) -> u32 {
        self.scanner.token_pos()
    }

    #[inline]
    pub(crate) fn token_end(&self) -> u32 {
        self.scanner.token_end()
    }

    pub(crate) fn token_text(&self) -> &str {
        self.scanner.token_text()
    }

    #[inline]
    pub(crate) fn is_token(&self, kind: SyntaxKind) -> bool {
        self.current_token == kind
    }

    /// Current token is an identifier spelled `text` (soft keywords).
    pub(crate) fn is_identifier_text(&self, text: &str) -> bool {
        self.current_token == SyntaxKind::Identifier && self.token_text() == text
    }

    pub(crate) fn next_token(&mut self) -> SyntaxKind {
        if !matches!(
            self.current_token,
            SyntaxKind::NewLineToken
                | SyntaxKind::IndentToken
                | SyntaxKind::DedentToken
                | SyntaxKind::EndOfFile
        ) {
            self.last_token_end = self.token_end();
        }
        self.current_token = self.scanner.scan();
        self.current_token
    }

    /// Consume the current token if it is `kind`.
    pub(crate) fn parse_optional(&mut self, kind: SyntaxKind) -> bool {
        if self.current_token == kind {
            self.next_token();
            true
        } else {
            false
        }
    }

    /// Consume `kind` or fail with "expected `what`".
    pub(crate) fn parse_expected(&mut self, kind: SyntaxKind, what: &str) -> ParseResult<()> {
        if self.parse_optional(kind) {
            Ok(())
        } else {
            Err(self.error_at_current(&format!("expected {what}")))
        }
    }

    /// Peek at the tokens after the current one without consuming anything.
    pub(crate) fn look_ahead<T>(&self, f: impl FnOnce(&mut ScannerState) -> T) -> T {
        let mut scanner = self.scanner.clone();
        f(&mut scanner)
    }

    /// Kind of the token after the current one.
    pub(crate) fn peek_token(&self) -> SyntaxKind {
        self.look_ahead(|scanner| scanner.scan())
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    pub(crate) fn error_at(&self, start: u32, length: u32, message: &str) -> ParseDiagnostic {
        ParseDiagnostic {
            start,
            length,
            message: message.to_string(),
        }
    }

    pub(crate) fn error_at_current(&self, message: &str) -> ParseDiagnostic {
        let detail = match self.current_token {
            SyntaxKind::EndOfFile => "end of file".to_string(),
            SyntaxKind::NewLineToken => "end of line".to_string(),
            SyntaxKind::IndentToken => return self.error_at(self.token_pos(), 0, "unexpected indent"),
            SyntaxKind::DedentToken => "dedent".to_string(),
            _ => format!("'{}'", self.token_text()),
        };
        let length = self.token_end().saturating_sub(self.token_pos());
        self.error_at(
            self.token_pos(),
            length,
            &format!("{message}, found {detail}"),
        )
    }

    // =========================================================================
    // Recursion guard
    // =========================================================================

    pub(crate) fn enter_recursion(&mut self) -> ParseResult<()> {
        self.recursion_depth += 1;
        if self.recursion_depth > MAX_AST_DEPTH {
            self.recursion_depth -= 1;
            return Err(self.error_at(self.token_pos(), 0, "maximum nesting depth exceeded"));
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn exit_recursion(&mut self) {
        self.recursion_depth = self.recursion_depth.saturating_sub(1);
    }

    /// End position for a node whose last token was just consumed.
    #[inline]
    pub(crate) fn node_end(&self) -> u32 {
        self.last_token_end
    }

    /// Create a node list from nodes already in the arena.
    pub(crate) fn make_list(&self, nodes: Vec<NodeIndex>) -> super::base::NodeList {
        self.arena.make_list(nodes)
    }
}
