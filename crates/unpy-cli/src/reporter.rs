use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::fmt::Write as _;

use unpy::{LineMap, StubError};

/// Lines of unchanged context around each diff hunk.
const DIFF_CONTEXT: usize = 3;

pub struct Reporter {
    color: bool,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter { color }
    }

    /// `path:line:col: <kind>: <message>` with a one-based line and column.
    pub fn format_error(&self, file: &str, source: &str, error: &StubError) -> String {
        let position = LineMap::build(source).offset_to_position(error.span().start);
        let location = format!("{}:{}:{}", file, position.line + 1, position.character + 1);
        let kind = error.kind().as_str();
        if self.color {
            format!("{}: {}: {}", location.bold(), kind.red().bold(), error.message())
        } else {
            format!("{location}: {kind}: {}", error.message())
        }
    }

    /// Unified diff from `before` to `after`, empty when they are equal.
    pub fn render_diff(&self, file: &str, before: &str, after: &str) -> String {
        if before == after {
            return String::new();
        }
        let diff = TextDiff::from_lines(before, after);
        let mut out = String::new();
        self.push_line(&mut out, &format!("--- {file}"), Style::Header);
        self.push_line(&mut out, &format!("+++ {file}"), Style::Header);

        for hunk in diff.unified_diff().context_radius(DIFF_CONTEXT).iter_hunks() {
            self.push_line(&mut out, &hunk.header().to_string(), Style::Hunk);
            for change in hunk.iter_changes() {
                let (sign, style) = match change.tag() {
                    ChangeTag::Delete => ('-', Style::Delete),
                    ChangeTag::Insert => ('+', Style::Insert),
                    ChangeTag::Equal => (' ', Style::Plain),
                };
                let text = change.value().trim_end_matches(['\n', '\r']);
                self.push_line(&mut out, &format!("{sign}{text}"), style);
                if change.missing_newline() {
                    out.push_str("\\ No newline at end of file\n");
                }
            }
        }
        out
    }

    fn push_line(&self, out: &mut String, line: &str, style: Style) {
        if !self.color {
            let _ = writeln!(out, "{line}");
            return;
        }
        let _ = match style {
            Style::Header => writeln!(out, "{}", line.bold()),
            Style::Hunk => writeln!(out, "{}", line.cyan()),
            Style::Delete => writeln!(out, "{}", line.red()),
            Style::Insert => writeln!(out, "{}", line.green()),
            Style::Plain => writeln!(out, "{line}"),
        };
    }
}

#[derive(Clone, Copy)]
enum Style {
    Header,
    Hunk,
    Delete,
    Insert,
    Plain,
}
