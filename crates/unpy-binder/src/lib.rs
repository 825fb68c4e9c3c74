//! Binding and collection for unpy.
//!
//! This crate provides:
//! - `TypeParameter` - the closed model of PEP 695 type parameters
//! - `ImportTable` - import bindings and the reverse alias resolver
//! - `CollectorState` - the collection pass producing `Collected`
//! - `StdlibBackports` - version tables for the Python standard library

pub mod collector;
pub mod import_table;
pub mod stdlib;
pub mod type_params;

pub use collector::{
    BaseRef, ClassBases, Collected, CollectorState, DeclKind, LoweredDecl, Reference,
    SupportRequirements,
};
pub use import_table::{AccessPath, ImportTable};
pub use stdlib::{BackportTable, Relocation, StdlibBackports};
pub use type_params::{
    ExprRenderer, SupportSymbol, TypeExpr, TypeParameter, TypeVarBound, Variance,
};

pub const MODULE_BUILTINS: &str = "builtins";
pub const MODULE_TYPING: &str = "typing";
pub const MODULE_TYPING_EXTENSIONS: &str = "typing_extensions";

#[cfg(test)]
#[path = "../tests/stdlib_tests.rs"]
mod stdlib_tests;

#[cfg(test)]
#[path = "../tests/type_params_tests.rs"]
mod type_params_tests;

#[cfg(test)]
#[path = "../tests/import_table_tests.rs"]
mod import_table_tests;

#[cfg(test)]
#[path = "../tests/collector_tests.rs"]
mod collector_tests;
