//! Python stub scanner/tokenizer for unpy.
//!
//! This crate provides the lexical analysis phase:
//! - `SyntaxKind` - Token types
//! - `ScannerState` - Tokenizer state machine, including `INDENT`/`DEDENT`
//!   synthesis and implicit line joining inside brackets

pub mod syntax_kind;
pub use syntax_kind::*;

pub mod scanner_impl;
pub use scanner_impl::{ScannerDiagnostic, ScannerState, TokenFlags};

#[cfg(test)]
#[path = "../tests/scanner_tests.rs"]
mod scanner_tests;
