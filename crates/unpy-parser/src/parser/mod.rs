//! Parser module - thin-node arena AST and the recursive descent parser.

pub mod base;
pub mod node;
mod node_access;
mod node_arena;
pub mod state;
mod state_expressions;
mod state_statements;

pub use base::{NodeIndex, NodeList};
pub use node::{Node, NodeArena};
pub use state::{ParseDiagnostic, ParserState};

/// Extended node kinds. Token kinds from `unpy_scanner::SyntaxKind` occupy the
/// values below `FIRST_NODE`.
pub mod syntax_kind_ext {
    pub const FIRST_NODE: u16 = 128;

    // Module and statements
    pub const MODULE: u16 = FIRST_NODE;
    pub const IMPORT_STATEMENT: u16 = FIRST_NODE + 1;
    pub const IMPORT_FROM_STATEMENT: u16 = FIRST_NODE + 2;
    pub const IMPORT_ALIAS: u16 = FIRST_NODE + 3;
    pub const CLASS_DEFINITION: u16 = FIRST_NODE + 4;
    pub const FUNCTION_DEFINITION: u16 = FIRST_NODE + 5;
    pub const DECORATOR: u16 = FIRST_NODE + 6;
    pub const PARAMETER_LIST: u16 = FIRST_NODE + 7;
    pub const PARAMETER: u16 = FIRST_NODE + 8;
    pub const TYPE_PARAMETER_LIST: u16 = FIRST_NODE + 9;
    pub const TYPE_PARAMETER: u16 = FIRST_NODE + 10;
    pub const TYPE_ALIAS_STATEMENT: u16 = FIRST_NODE + 11;
    pub const ASSIGNMENT_STATEMENT: u16 = FIRST_NODE + 12;
    pub const ANNOTATED_ASSIGNMENT: u16 = FIRST_NODE + 13;
    pub const AUGMENTED_ASSIGNMENT: u16 = FIRST_NODE + 14;
    pub const EXPRESSION_STATEMENT: u16 = FIRST_NODE + 15;
    pub const IF_STATEMENT: u16 = FIRST_NODE + 16;
    pub const BLOCK: u16 = FIRST_NODE + 17;
    /// `pass`, `del`, `return`, `raise`, `assert`, `global`, `nonlocal`, `break`, `continue`
    pub const KEYWORD_STATEMENT: u16 = FIRST_NODE + 18;
    /// `try`, `with`, `for`, `while`, `match`, kept opaque
    pub const COMPOUND_STATEMENT: u16 = FIRST_NODE + 19;

    // Expressions
    pub const NAME: u16 = FIRST_NODE + 32;
    /// `None`, `True`, `False`
    pub const CONSTANT: u16 = FIRST_NODE + 33;
    pub const NUMBER: u16 = FIRST_NODE + 34;
    /// One or more adjacent string literals
    pub const STRING: u16 = FIRST_NODE + 35;
    pub const ELLIPSIS: u16 = FIRST_NODE + 36;
    pub const ATTRIBUTE: u16 = FIRST_NODE + 37;
    pub const SUBSCRIPT: u16 = FIRST_NODE + 38;
    pub const SLICE: u16 = FIRST_NODE + 39;
    pub const CALL: u16 = FIRST_NODE + 40;
    pub const ARGUMENT_LIST: u16 = FIRST_NODE + 41;
    pub const KEYWORD_ARGUMENT: u16 = FIRST_NODE + 42;
    pub const STARRED: u16 = FIRST_NODE + 43;
    pub const DOUBLE_STARRED: u16 = FIRST_NODE + 44;
    pub const TUPLE: u16 = FIRST_NODE + 45;
    pub const LIST: u16 = FIRST_NODE + 46;
    pub const SET: u16 = FIRST_NODE + 47;
    pub const DICT: u16 = FIRST_NODE + 48;
    pub const BINARY_EXPRESSION: u16 = FIRST_NODE + 49;
    /// `and` / `or`
    pub const BOOLEAN_EXPRESSION: u16 = FIRST_NODE + 50;
    pub const COMPARE_EXPRESSION: u16 = FIRST_NODE + 51;
    pub const UNARY_EXPRESSION: u16 = FIRST_NODE + 52;
    pub const CONDITIONAL_EXPRESSION: u16 = FIRST_NODE + 53;
    pub const LAMBDA: u16 = FIRST_NODE + 54;
    pub const AWAIT_EXPRESSION: u16 = FIRST_NODE + 55;
    pub const YIELD_EXPRESSION: u16 = FIRST_NODE + 56;
    /// `name := value`
    pub const NAMED_EXPRESSION: u16 = FIRST_NODE + 57;

    pub fn is_statement(kind: u16) -> bool {
        (IMPORT_STATEMENT..=COMPOUND_STATEMENT).contains(&kind)
            && !matches!(
                kind,
                IMPORT_ALIAS
                    | DECORATOR
                    | PARAMETER_LIST
                    | PARAMETER
                    | TYPE_PARAMETER_LIST
                    | TYPE_PARAMETER
                    | BLOCK
            )
    }

    pub fn is_expression(kind: u16) -> bool {
        (NAME..=NAMED_EXPRESSION).contains(&kind)
            && !matches!(kind, ARGUMENT_LIST | KEYWORD_ARGUMENT | SLICE)
    }
}

/// Bits stored in `Node::flags`.
pub mod node_flags {
    /// Tuple written with surrounding parentheses.
    pub const PARENTHESIZED: u16 = 1 << 0;
    /// String containing an f-string (or t-string) part.
    pub const FORMAT_STRING: u16 = 1 << 1;
    /// Bytes literal.
    pub const BYTES: u16 = 1 << 2;
    /// `yield from`.
    pub const YIELD_FROM: u16 = 1 << 3;
    /// Block whose statements follow the colon on the same line.
    pub const INLINE_BLOCK: u16 = 1 << 4;
    /// Trailing comma before the closing bracket.
    pub const TRAILING_COMMA: u16 = 1 << 5;
    /// `not in` / `is not`.
    pub const NEGATED: u16 = 1 << 6;
}
