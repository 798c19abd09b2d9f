//! CLI module for docrule
//!
//! - compile: load a schema file and print its rule tree
//! - check: validate documents and print one result per document

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, XssArg};
pub use commands::{check, compile, run, run_command, SchemaSource};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_document, write_json};
