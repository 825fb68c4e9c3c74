//! Scanner implementation - the lexical analyzer for Python stub source.
//!
//! `ScannerState` walks the source bytes and produces one `SyntaxKind` per call
//! to [`ScannerState::scan`]. Layout is tokenized the way CPython does it:
//!
//! - blank lines and comment-only lines produce no tokens
//! - a `NewLineToken` ends every logical line (one is synthesized at end of file)
//! - changes in indentation produce zero-width `IndentToken`/`DedentToken`s
//! - line breaks inside `()`, `[]`, `{}` and after a backslash are ignored
//!
//! Positions are byte offsets into the source text.

use crate::syntax_kind::{SyntaxKind, text_to_keyword, token_is_word};
use bitflags::bitflags;
use std::sync::Arc;

bitflags! {
    /// Extra information about the current token.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct TokenFlags: u16 {
        const NONE = 0;
        /// String literal with an `f` prefix.
        const FORMAT_STRING = 1 << 0;
        /// String literal with a `b` prefix.
        const BYTES = 1 << 1;
        /// String literal with an `r` prefix.
        const RAW = 1 << 2;
        /// Triple-quoted string literal.
        const TRIPLE_QUOTED = 1 << 3;
        /// String literal without a closing quote.
        const UNTERMINATED = 1 << 4;
        /// String literal with a `t` prefix (template string).
        const TEMPLATE_STRING = 1 << 5;
    }
}

/// A problem found while scanning. The scanner always makes progress after one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScannerDiagnostic {
    pub pos: u32,
    pub length: u32,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct ScannerState {
    source: Arc<str>,
    /// Current byte offset.
    pos: usize,
    /// End of the scanned range.
    end: usize,
    token: SyntaxKind,
    token_start: usize,
    token_flags: TokenFlags,
    paren_depth: u32,
    indent_stack: Vec<u32>,
    pending_dedents: u32,
    at_line_start: bool,
    line_has_content: bool,
    /// Fragment mode: no layout tokens, line breaks are whitespace.
    ignore_layout: bool,
    diagnostics: Vec<ScannerDiagnostic>,
}

impl ScannerState {
    /// Create a scanner over a whole module.
    pub fn new(source: Arc<str>) -> ScannerState {
        let end = source.len();
        ScannerState {
            source,
            pos: 0,
            end,
            token: SyntaxKind::Unknown,
            token_start: 0,
            token_flags: TokenFlags::NONE,
            paren_depth: 0,
            indent_stack: vec![0],
            pending_dedents: 0,
            at_line_start: true,
            line_has_content: false,
            ignore_layout: false,
            diagnostics: Vec::new(),
        }
    }

    /// Create a scanner over an expression fragment. Layout tokens are never produced.
    pub fn new_fragment(source: Arc<str>, start: usize, end: usize) -> ScannerState {
        let end = end.min(source.len());
        let mut scanner = ScannerState::new(source);
        scanner.pos = start.min(end);
        scanner.end = end;
        scanner.at_line_start = false;
        scanner.ignore_layout = true;
        scanner
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn token(&self) -> SyntaxKind {
        self.token
    }

    #[inline]
    pub fn token_pos(&self) -> u32 {
        self.token_start as u32
    }

    #[inline]
    pub fn token_end(&self) -> u32 {
        self.pos as u32
    }

    #[inline]
    pub fn token_flags(&self) -> TokenFlags {
        self.token_flags
    }

    pub fn token_text(&self) -> &str {
        self.source.get(self.token_start..self.pos).unwrap_or("")
    }

    pub fn source_text(&self) -> &str {
        &self.source
    }

    pub fn source_arc(&self) -> Arc<str> {
        Arc::clone(&self.source)
    }

    pub fn get_scanner_diagnostics(&self) -> &[ScannerDiagnostic] {
        &self.diagnostics
    }

    // =========================================================================
    // Scanning
    // =========================================================================

    /// Scan the next token and return its kind.
    pub fn scan(&mut self) -> SyntaxKind {
        self.token_flags = TokenFlags::NONE;

        if self.pending_dedents > 0 {
            self.pending_dedents -= 1;
            return self.finish(SyntaxKind::DedentToken, self.pos);
        }

        if self.at_line_start {
            self.at_line_start = false;
            if let Some(kind) = self.scan_indentation() {
                return kind;
            }
        }

        loop {
            self.skip_trivia();
            if self.pos >= self.end {
                return self.scan_end_of_file();
            }
            let ch = self.byte(self.pos);
            if ch == b'\n' || ch == b'\r' {
                let start = self.pos;
                self.consume_line_break();
                if self.paren_depth > 0 || self.ignore_layout || !self.line_has_content {
                    continue;
                }
                self.line_has_content = false;
                self.at_line_start = true;
                self.token_start = start;
                self.token = SyntaxKind::NewLineToken;
                return self.token;
            }
            break;
        }

        self.line_has_content = true;
        let start = self.pos;
        let ch = self.byte(start);

        if is_identifier_start(ch) {
            return self.scan_word(start);
        }
        if ch.is_ascii_digit() || (ch == b'.' && self.peek(1).is_ascii_digit()) {
            return self.scan_number(start);
        }
        if ch == b'"' || ch == b'\'' {
            return self.scan_string(start);
        }
        self.scan_punctuation(start)
    }

    /// Measure the indentation of the next non-blank line and emit INDENT/DEDENT.
    fn scan_indentation(&mut self) -> Option<SyntaxKind> {
        if self.ignore_layout {
            return None;
        }
        loop {
            let mut column: u32 = 0;
            while self.pos < self.end {
                match self.byte(self.pos) {
                    b' ' => column += 1,
                    b'\t' => column = (column / 8 + 1) * 8,
                    b'\x0c' => column = 0,
                    _ => break,
                }
                self.pos += 1;
            }
            if self.pos >= self.end {
                return None;
            }
            match self.byte(self.pos) {
                b'#' => {
                    self.skip_comment();
                    if self.pos < self.end {
                        self.consume_line_break();
                    }
                    continue;
                }
                b'\n' | b'\r' => {
                    self.consume_line_break();
                    continue;
                }
                b'\\' if matches!(self.peek(1), b'\n' | b'\r') => {
                    self.pos += 1;
                    self.consume_line_break();
                    continue;
                }
                _ => {}
            }

            let current = self.indent_stack.last().copied().unwrap_or(0);
            if column > current {
                self.indent_stack.push(column);
                return Some(self.finish(SyntaxKind::IndentToken, self.pos));
            }
            if column < current {
                let mut dedents = 0u32;
                while self.indent_stack.len() > 1
                    && self.indent_stack.last().is_some_and(|&top| top > column)
                {
                    self.indent_stack.pop();
                    dedents += 1;
                }
                if self.indent_stack.last().copied().unwrap_or(0) != column {
                    self.error(
                        self.pos,
                        0,
                        "unindent does not match any outer indentation level",
                    );
                }
                self.pending_dedents = dedents.saturating_sub(1);
                return Some(self.finish(SyntaxKind::DedentToken, self.pos));
            }
            return None;
        }
    }

    fn scan_end_of_file(&mut self) -> SyntaxKind {
        let end = self.end;
        self.pos = end;
        if !self.ignore_layout {
            if self.line_has_content {
                self.line_has_content = false;
                return self.finish(SyntaxKind::NewLineToken, end);
            }
            if self.indent_stack.len() > 1 {
                self.indent_stack.pop();
                return self.finish(SyntaxKind::DedentToken, end);
            }
        }
        self.finish(SyntaxKind::EndOfFile, end)
    }

    fn scan_word(&mut self, start: usize) -> SyntaxKind {
        let mut pos = start;
        while pos < self.end && is_identifier_part(self.byte(pos)) {
            pos += 1;
        }
        if pos < self.end && matches!(self.byte(pos), b'"' | b'\'') {
            if let Some(flags) = string_prefix_flags(self.slice(start, pos)) {
                self.pos = pos;
                self.token_flags = flags;
                return self.scan_string(start);
            }
        }
        self.pos = pos;
        let kind = text_to_keyword(self.slice(start, pos)).unwrap_or(SyntaxKind::Identifier);
        self.finish(kind, start)
    }

    fn scan_number(&mut self, start: usize) -> SyntaxKind {
        let mut pos = start;
        let radix_prefixed = self.byte(pos) == b'0' && matches!(self.peek(1), b'x' | b'X');
        while pos < self.end {
            let ch = self.byte(pos);
            let exponent_sign = matches!(ch, b'+' | b'-')
                && !radix_prefixed
                && pos > start
                && matches!(self.byte(pos - 1), b'e' | b'E');
            if ch.is_ascii_alphanumeric() || ch == b'_' || ch == b'.' || exponent_sign {
                pos += 1;
            } else {
                break;
            }
        }
        self.pos = pos;
        self.finish(SyntaxKind::NumericLiteral, start)
    }

    /// Scan a string literal. `self.pos` is at the opening quote; any prefix
    /// starts at `start` and its flags are already in `token_flags`.
    fn scan_string(&mut self, start: usize) -> SyntaxKind {
        let quote = self.byte(self.pos);
        let triple = self.peek(1) == quote && self.peek(2) == quote;
        if triple {
            self.token_flags |= TokenFlags::TRIPLE_QUOTED;
            self.pos += 3;
        } else {
            self.pos += 1;
        }

        loop {
            if self.pos >= self.end {
                self.token_flags |= TokenFlags::UNTERMINATED;
                self.error(start, self.pos - start, "unterminated string literal");
                break;
            }
            let ch = self.byte(self.pos);
            if ch == b'\\' {
                self.pos += 1;
                if self.pos < self.end {
                    if self.byte(self.pos) == b'\r' && self.peek(1) == b'\n' {
                        self.pos += 2;
                    } else {
                        self.pos += 1;
                    }
                }
                continue;
            }
            if triple {
                if ch == quote && self.peek(1) == quote && self.peek(2) == quote {
                    self.pos += 3;
                    break;
                }
            } else {
                if ch == quote {
                    self.pos += 1;
                    break;
                }
                if ch == b'\n' || ch == b'\r' {
                    self.token_flags |= TokenFlags::UNTERMINATED;
                    self.error(start, self.pos - start, "unterminated string literal");
                    break;
                }
            }
            self.pos += 1;
        }
        self.pos = self.pos.min(self.end);
        self.finish(SyntaxKind::StringLiteral, start)
    }

    fn scan_punctuation(&mut self, start: usize) -> SyntaxKind {
        let ch = self.byte(start);
        let next = self.peek(1);
        let third = self.peek(2);
        let (kind, len) = match ch {
            b'(' => (SyntaxKind::OpenParenToken, 1),
            b')' => (SyntaxKind::CloseParenToken, 1),
            b'[' => (SyntaxKind::OpenBracketToken, 1),
            b']' => (SyntaxKind::CloseBracketToken, 1),
            b'{' => (SyntaxKind::OpenBraceToken, 1),
            b'}' => (SyntaxKind::CloseBraceToken, 1),
            b',' => (SyntaxKind::CommaToken, 1),
            b';' => (SyntaxKind::SemicolonToken, 1),
            b'~' => (SyntaxKind::TildeToken, 1),
            b':' if next == b'=' => (SyntaxKind::ColonEqualsToken, 2),
            b':' => (SyntaxKind::ColonToken, 1),
            b'.' if next == b'.' && third == b'.' => (SyntaxKind::DotDotDotToken, 3),
            b'.' => (SyntaxKind::DotToken, 1),
            b'@' if next == b'=' => (SyntaxKind::AtEqualsToken, 2),
            b'@' => (SyntaxKind::AtToken, 1),
            b'=' if next == b'=' => (SyntaxKind::EqualsEqualsToken, 2),
            b'=' => (SyntaxKind::EqualsToken, 1),
            b'!' if next == b'=' => (SyntaxKind::ExclamationEqualsToken, 2),
            b'+' if next == b'=' => (SyntaxKind::PlusEqualsToken, 2),
            b'+' => (SyntaxKind::PlusToken, 1),
            b'-' if next == b'>' => (SyntaxKind::MinusGreaterThanToken, 2),
            b'-' if next == b'=' => (SyntaxKind::MinusEqualsToken, 2),
            b'-' => (SyntaxKind::MinusToken, 1),
            b'*' if next == b'*' && third == b'=' => (SyntaxKind::AsteriskAsteriskEqualsToken, 3),
            b'*' if next == b'*' => (SyntaxKind::AsteriskAsteriskToken, 2),
            b'*' if next == b'=' => (SyntaxKind::AsteriskEqualsToken, 2),
            b'*' => (SyntaxKind::AsteriskToken, 1),
            b'/' if next == b'/' && third == b'=' => (SyntaxKind::SlashSlashEqualsToken, 3),
            b'/' if next == b'/' => (SyntaxKind::SlashSlashToken, 2),
            b'/' if next == b'=' => (SyntaxKind::SlashEqualsToken, 2),
            b'/' => (SyntaxKind::SlashToken, 1),
            b'%' if next == b'=' => (SyntaxKind::PercentEqualsToken, 2),
            b'%' => (SyntaxKind::PercentToken, 1),
            b'|' if next == b'=' => (SyntaxKind::BarEqualsToken, 2),
            b'|' => (SyntaxKind::BarToken, 1),
            b'&' if next == b'=' => (SyntaxKind::AmpersandEqualsToken, 2),
            b'&' => (SyntaxKind::AmpersandToken, 1),
            b'^' if next == b'=' => (SyntaxKind::CaretEqualsToken, 2),
            b'^' => (SyntaxKind::CaretToken, 1),
            b'<' if next == b'<' && third == b'=' => (SyntaxKind::LessThanLessThanEqualsToken, 3),
            b'<' if next == b'<' => (SyntaxKind::LessThanLessThanToken, 2),
            b'<' if next == b'=' => (SyntaxKind::LessThanEqualsToken, 2),
            b'<' => (SyntaxKind::LessThanToken, 1),
            b'>' if next == b'>' && third == b'=' => {
                (SyntaxKind::GreaterThanGreaterThanEqualsToken, 3)
            }
            b'>' if next == b'>' => (SyntaxKind::GreaterThanGreaterThanToken, 2),
            b'>' if next == b'=' => (SyntaxKind::GreaterThanEqualsToken, 2),
            b'>' => (SyntaxKind::GreaterThanToken, 1),
            _ => (SyntaxKind::Unknown, 1),
        };

        match kind {
            SyntaxKind::OpenParenToken
            | SyntaxKind::OpenBracketToken
            | SyntaxKind::OpenBraceToken => self.paren_depth += 1,
            SyntaxKind::CloseParenToken
            | SyntaxKind::CloseBracketToken
            | SyntaxKind::CloseBraceToken => {
                self.paren_depth = self.paren_depth.saturating_sub(1);
            }
            SyntaxKind::Unknown => self.error(start, 1, "invalid character in source text"),
            _ => {}
        }

        self.pos = (start + len).min(self.end);
        self.finish(kind, start)
    }

    // =========================================================================
    // Trivia
    // =========================================================================

    /// Skip spaces, tabs, form feeds, comments and backslash continuations.
    fn skip_trivia(&mut self) {
        while self.pos < self.end {
            match self.byte(self.pos) {
                b' ' | b'\t' | b'\x0c' => self.pos += 1,
                b'#' => self.skip_comment(),
                b'\\' if matches!(self.peek(1), b'\n' | b'\r') => {
                    self.pos += 1;
                    self.consume_line_break();
                }
                _ => break,
            }
        }
    }

    fn skip_comment(&mut self) {
        let rest = &self.source.as_bytes()[self.pos..self.end];
        match memchr::memchr2(b'\n', b'\r', rest) {
            Some(offset) => self.pos += offset,
            None => self.pos = self.end,
        }
    }

    fn consume_line_break(&mut self) {
        if self.byte(self.pos) == b'\r' && self.peek(1) == b'\n' {
            self.pos += 2;
        } else {
            self.pos += 1;
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    #[inline]
    fn byte(&self, pos: usize) -> u8 {
        if pos < self.end {
            self.source.as_bytes()[pos]
        } else {
            0
        }
    }

    #[inline]
    fn peek(&self, offset: usize) -> u8 {
        self.byte(self.pos + offset)
    }

    fn slice(&self, start: usize, end: usize) -> &str {
        self.source.get(start..end).unwrap_or("")
    }

    fn finish(&mut self, kind: SyntaxKind, start: usize) -> SyntaxKind {
        self.token = kind;
        self.token_start = start;
        kind
    }

    fn error(&mut self, pos: usize, length: usize, message: &str) {
        self.diagnostics.push(ScannerDiagnostic {
            pos: pos as u32,
            length: length as u32,
            message: message.to_string(),
        });
    }

    /// Token text of `source[start..end]` with whitespace and comments removed.
    ///
    /// Adjacent word-like tokens keep a single separating space. Two
    /// expressions with the same canonical text are structurally equal.
    pub fn canonical_text(source: &Arc<str>, start: usize, end: usize) -> String {
        let mut scanner = ScannerState::new_fragment(Arc::clone(source), start, end);
        let mut out = String::with_capacity(end.saturating_sub(start));
        let mut previous_was_word = false;
        loop {
            let kind = scanner.scan();
            if kind == SyntaxKind::EndOfFile {
                break;
            }
            let is_word = token_is_word(kind);
            if is_word && previous_was_word {
                out.push(' ');
            }
            out.push_str(scanner.token_text());
            previous_was_word = is_word;
        }
        out
    }
}

#[inline]
fn is_identifier_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_' || ch >= 0x80
}

#[inline]
fn is_identifier_part(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_' || ch >= 0x80
}

/// Flags for a valid string prefix (`r`, `b`, `f`, `u`, `t` and their legal pairs).
fn string_prefix_flags(prefix: &str) -> Option<TokenFlags> {
    if prefix.len() > 2 {
        return None;
    }
    let mut flags = TokenFlags::NONE;
    for ch in prefix.chars() {
        let flag = match ch.to_ascii_lowercase() {
            'r' => TokenFlags::RAW,
            'b' => TokenFlags::BYTES,
            'f' => TokenFlags::FORMAT_STRING,
            't' => TokenFlags::TEMPLATE_STRING,
            'u' if prefix.len() == 1 => TokenFlags::NONE,
            _ => return None,
        };
        if flags.contains(flag) && flag != TokenFlags::NONE {
            return None;
        }
        flags |= flag;
    }
    let non_raw = flags - TokenFlags::RAW;
    if non_raw.bits().count_ones() > 1 {
        return None;
    }
    Some(flags)
}
