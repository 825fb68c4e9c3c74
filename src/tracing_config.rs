//! Tracing configuration for debugging backport decisions.
//!
//! Supports three output formats controlled by `UNPY_LOG_FORMAT`:
//!
//! - `text` (default): standard `tracing-subscriber` flat output
//! - `tree`: hierarchical indented output via `tracing-tree`
//! - `json`: one JSON object per span/event
//!
//! ## Quick start
//!
//! ```bash
//! # Which declarations were lowered and which imports changed
//! UNPY_LOG=debug UNPY_LOG_FORMAT=tree unpy stub.pyi
//!
//! # Per-node detail from the collector only
//! UNPY_LOG="unpy_binder=trace" unpy stub.pyi
//!
//! # JSON for tooling
//! UNPY_LOG=debug UNPY_LOG_FORMAT=json unpy stub.pyi
//! ```
//!
//! The subscriber is only initialised when `UNPY_LOG` (or `RUST_LOG`) is set.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

const LOG_ENV: &str = "UNPY_LOG";
const LOG_FORMAT_ENV: &str = "UNPY_LOG_FORMAT";

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Standard flat text lines (default).
    Text,
    /// Hierarchical indented tree via `tracing-tree`.
    Tree,
    /// Newline-delimited JSON objects.
    Json,
}

impl LogFormat {
    /// Parse a format name; anything unrecognised is `Text`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    fn from_env() -> Self {
        Self::parse(&std::env::var(LOG_FORMAT_ENV).unwrap_or_default())
    }
}

/// Build an `EnvFilter` from `UNPY_LOG`, falling back to `RUST_LOG`.
fn build_filter() -> EnvFilter {
    if let Ok(val) = std::env::var(LOG_ENV) {
        EnvFilter::builder().parse_lossy(val)
    } else {
        EnvFilter::from_default_env()
    }
}

/// Initialise the global tracing subscriber.
///
/// Does nothing when neither `UNPY_LOG` nor `RUST_LOG` is set. All output
/// goes to stderr so it never mixes with the transformed stub on stdout.
pub fn init_tracing() {
    let has_unpy_log = std::env::var(LOG_ENV).is_ok();
    let has_rust_log = std::env::var("RUST_LOG").is_ok();
    if !has_unpy_log && !has_rust_log {
        return;
    }

    let filter = build_filter();
    match LogFormat::from_env() {
        LogFormat::Tree => {
            let tree_layer = tracing_tree::HierarchicalLayer::default()
                .with_writer(std::io::stderr)
                .with_indent_amount(2)
                .with_indent_lines(true)
                .with_deferred_spans(true)
                .with_span_retrace(true)
                .with_targets(true);

            Registry::default().with(filter).with(tree_layer).init();
        }
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);

            Registry::default().with(filter).with(json_layer).init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
