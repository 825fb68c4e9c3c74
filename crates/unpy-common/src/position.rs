//! Line/column positions for error reporting.

use memchr::memchr_iter;
use serde::Serialize;

/// Zero-based line and character (byte column) position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub const fn new(line: u32, character: u32) -> Position {
        Position { line, character }
    }
}

/// Precomputed line start offsets for a source text.
#[derive(Clone, Debug, Default)]
pub struct LineMap {
    line_starts: Vec<u32>,
}

impl LineMap {
    /// Build the line map. `\r\n` and `\n` both end a line; a lone `\r` does not.
    pub fn build(text: &str) -> LineMap {
        let mut line_starts = Vec::with_capacity(text.len() / 32 + 1);
        line_starts.push(0);
        for i in memchr_iter(b'\n', text.as_bytes()) {
            line_starts.push((i + 1) as u32);
        }
        LineMap { line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Convert a byte offset to a zero-based position.
    pub fn offset_to_position(&self, offset: u32) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next.saturating_sub(1),
        };
        let start = self.line_starts.get(line).copied().unwrap_or(0);
        Position::new(line as u32, offset.saturating_sub(start))
    }

    /// Byte offset of the start of a zero-based line.
    pub fn line_start(&self, line: u32) -> Option<u32> {
        self.line_starts.get(line as usize).copied()
    }
}
