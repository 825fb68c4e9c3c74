//! unpy: backport Python 3.12+ stub syntax to older Python versions.
//!
//! The engine runs in three stages over a single `.pyi` source text:
//!
//! 1. `ParserState` builds the arena AST (first diagnostic becomes a syntax error)
//! 2. `CollectorState` validates the stub and gathers type parameters, imports
//!    and relocations into an immutable `Collected`
//! 3. `LoweringPass` turns `Collected` into text edits and `Printer` applies
//!    them to the original source
//!
//! ```
//! use unpy::{PythonVersion, transform_source};
//!
//! let out = transform_source("type Id = int\n", PythonVersion::Py311).unwrap();
//! assert_eq!(out, "from typing import TypeAlias\n\nId: TypeAlias = int\n");
//! ```

use tracing::{debug, debug_span};

pub use unpy_binder as binder;
pub use unpy_common as common;
pub use unpy_emitter as emitter;
pub use unpy_parser as parser;
pub use unpy_scanner as scanner;

pub use unpy_binder::{BackportTable, StdlibBackports};
pub use unpy_common::{LineMap, Position, PythonVersion, Span, StubError, StubErrorKind};

// Tracing subscriber setup (UNPY_LOG / UNPY_LOG_FORMAT)
pub mod tracing_config;

/// Options for a single transformation run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransformOptions {
    /// The oldest Python version the output must support.
    pub target: PythonVersion,
}

impl TransformOptions {
    pub fn new(target: PythonVersion) -> TransformOptions {
        TransformOptions { target }
    }
}

/// Backport `source` to `target` using the standard library tables.
pub fn transform_source(source: &str, target: PythonVersion) -> Result<String, StubError> {
    transform(source, &TransformOptions::new(target))
}

/// Backport `source` with explicit options.
pub fn transform(source: &str, options: &TransformOptions) -> Result<String, StubError> {
    transform_with_table(source, options, &StdlibBackports)
}

/// Backport `source` with a custom backport table.
///
/// Nothing is produced on failure; the first error is returned as-is.
pub fn transform_with_table(
    source: &str,
    options: &TransformOptions,
    backports: &dyn BackportTable,
) -> Result<String, StubError> {
    let _span = debug_span!("transform", target = %options.target, len = source.len()).entered();

    let mut parser = unpy_parser::ParserState::new("<stub>", source);
    let module = parser.parse_module();
    if let Some(diagnostic) = parser.get_diagnostics().first() {
        let end = diagnostic.start.saturating_add(diagnostic.length);
        return Err(StubError::syntax(
            diagnostic.message.clone(),
            Span::new(diagnostic.start, end),
        ));
    }
    let arena = parser.into_arena();

    let collected =
        unpy_binder::CollectorState::new(&arena, options.target, backports).run(module)?;
    let transforms = unpy_emitter::LoweringPass::new(&arena, &collected, backports).run();
    if transforms.is_empty() {
        debug!("nothing to backport");
        return Ok(source.to_string());
    }
    Ok(unpy_emitter::Printer::new(&arena).print(&transforms))
}
