//! Centralized limits and thresholds.
//!
//! Recursion depths bound the parser and the collector so that pathological
//! input is reported as an error instead of overflowing the stack.

/// Maximum nesting depth of expressions and statements in the parser and collector.
///
/// ```python
/// x: list[list[list[list[...]]]]  # each level adds a frame
/// ```
pub const MAX_AST_DEPTH: u32 = 200;

/// Number of consecutive non-import statements after the last import at which
/// the search for a new import insertion point stops.
pub const MAX_STATEMENTS_AFTER_LAST_IMPORT: usize = 5;
