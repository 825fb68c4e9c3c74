//! Lowering and printing for unpy.
//!
//! This crate provides:
//! - `TransformContext` - edit directives keyed by node
//! - `ImportPlan` - the import delta of a module
//! - `LoweringPass` - turns a `Collected` summary into directives
//! - `Printer` - applies directives to the original source text

pub mod import_plan;
pub mod lowering_pass;
pub mod printer;
pub mod transform_context;

pub use import_plan::ImportPlan;
pub use lowering_pass::LoweringPass;
pub use printer::{EditedText, Printer};
pub use transform_context::{TransformContext, TransformDirective};

#[cfg(test)]
#[path = "../tests/printer_tests.rs"]
mod printer_tests;

#[cfg(test)]
#[path = "../tests/import_plan_tests.rs"]
mod import_plan_tests;

#[cfg(test)]
#[path = "../tests/lowering_pass_tests.rs"]
mod lowering_pass_tests;
