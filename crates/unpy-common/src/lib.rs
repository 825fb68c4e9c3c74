//! Common types and utilities for the unpy stub backporter.
//!
//! This crate provides foundational types used across all unpy crates:
//! - Source spans (`Span`)
//! - Line/column mapping (`LineMap`, `Position`)
//! - The error taxonomy shared by every pass (`StubError`)
//! - Target versions and version intervals (`PythonVersion`, `Version`, `VersionInterval`)
//! - Traversal limits

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Position types for line/column source locations
pub mod position;
pub use position::{LineMap, Position};

// Error taxonomy
pub mod diagnostics;
pub use diagnostics::{StubError, StubErrorKind};

// Target versions
pub mod version;
pub use version::{PythonVersion, Version, VersionInterval};

// Centralized limits and thresholds
pub mod limits;
