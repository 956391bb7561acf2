//! CLI argument definitions using clap
//!
//! Commands:
//! - qryc validate --config <path>
//! - qryc index --config <path>
//! - qryc params --config <path> [--query <name>]

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// qryc - schema-aware query compiler
#[derive(Parser, Debug)]
#[command(name = "qryc")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate every query in the query file against the models
    Validate {
        /// Path to configuration file
        #[arg(long, default_value = "./qryc.json")]
        config: PathBuf,
    },

    /// Compile an index definition for every query
    Index {
        /// Path to configuration file
        #[arg(long, default_value = "./qryc.json")]
        config: PathBuf,
    },

    /// List the typed parameters of each query
    Params {
        /// Path to configuration file
        #[arg(long, default_value = "./qryc.json")]
        config: PathBuf,

        /// Only analyze the named query
        #[arg(long)]
        query: Option<String>,
    },
}

impl Command {
    /// Configuration file the command runs against
    pub fn config_path(&self) -> &Path {
        match self {
            Command::Validate { config }
            | Command::Index { config }
            | Command::Params { config, .. } => config,
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
