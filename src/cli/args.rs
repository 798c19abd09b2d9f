//! CLI argument definitions using clap
//!
//! Commands:
//! - docrule compile --schema <file>
//! - docrule check --schema <file> [--config <file>] <documents...>
//! - docrule check --schema-id <id> --schema-version <v> [--config <file>] <documents...>

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::validate::XssPolicy;

/// docrule - schema-driven JSON document validation
#[derive(Parser, Debug)]
#[command(name = "docrule")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a schema file and print its rule tree
    Compile {
        /// Path to the schema file
        #[arg(long)]
        schema: PathBuf,
    },

    /// Validate documents against a schema file or a registered schema
    Check {
        /// Path to the schema file
        #[arg(long, required_unless_present = "schema_id", conflicts_with = "schema_id")]
        schema: Option<PathBuf>,

        /// Schema ID to resolve from the configured schema directory
        #[arg(long, requires = "schema_version")]
        schema_id: Option<String>,

        /// Schema version to resolve, used with --schema-id
        #[arg(long, requires = "schema_id")]
        schema_version: Option<String>,

        /// Path to an engine configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Stop at the first violation in each document
        #[arg(long)]
        stop_on_first_error: bool,

        /// Override the configured markup policy
        #[arg(long, value_enum)]
        xss: Option<XssArg>,

        /// Skip transforms, for documents that were already normalized
        #[arg(long)]
        recheck: bool,

        /// Document files; `-` reads one document from stdin
        #[arg(required = true)]
        documents: Vec<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum XssArg {
    Strip,
    Reject,
}

impl From<XssArg> for XssPolicy {
    fn from(arg: XssArg) -> Self {
        match arg {
            XssArg::Strip => XssPolicy::Strip,
            XssArg::Reject => XssPolicy::Reject,
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
