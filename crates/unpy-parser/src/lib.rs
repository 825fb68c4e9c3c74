//! Python stub parser and AST types for unpy.
//!
//! This crate provides:
//! - `NodeArena` - Arena-based AST storage with thin 16-byte nodes
//! - `ParserState` - Recursive descent parser for the stub subset of Python
//! - `syntax_kind_ext` - Node kinds that extend the scanner's token kinds

pub mod parser;

pub use parser::{
    NodeArena, NodeIndex, NodeList, ParseDiagnostic, ParserState, node, node_flags,
    syntax_kind_ext,
};

#[cfg(test)]
#[path = "../tests/parser_tests.rs"]
mod parser_tests;

#[cfg(test)]
#[path = "../tests/node_access_tests.rs"]
mod node_access_tests;
