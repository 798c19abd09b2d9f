//! Schema subsystem for docrule
//!
//! Schemas are declared once as dotted field paths mapped to field rules,
//! then compiled into an immutable rule tree that every validation shares.
//!
//! # Design Principles
//!
//! - Schema mistakes are compile errors, never validation errors
//! - Compiled trees are immutable and shared through `Arc`
//! - Declaration order is traversal order

mod compiler;
mod definition;
mod errors;
mod loader;
mod rule;
pub mod types;

pub use compiler::{compile, ArrayNode, Branch, CompiledSchema, RuleNode};
pub use definition::SchemaDefinition;
pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, Severity};
pub use loader::{SchemaFile, SchemaLoader};
pub use rule::{DefaultValue, FieldRule, TransformFn, ValidateFn};
pub use types::{ElementType, FieldType, TypeMismatch};
