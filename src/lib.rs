//! docrule - schema-driven validation and normalization of JSON documents
//!
//! A schema maps dotted field paths to rules. It is compiled once into an
//! immutable rule tree, then any number of documents are validated against
//! it concurrently. Validation either yields the normalized document or
//! every violation found, each with the path where it occurred.
//!
//! ```ignore
//! use docrule::schema::{compile, types, FieldRule, SchemaDefinition};
//! use docrule::validate::{validate, ValidateOptions};
//!
//! let schema = compile(
//!     &SchemaDefinition::new()
//!         .field("account.name", FieldRule::new(types::string()).required().trim()),
//! )?;
//! let normalized = validate(&document, &schema, &ValidateOptions::default()).await?;
//! ```

pub mod cli;
pub mod config;
pub mod observability;
pub mod schema;
pub mod validate;
