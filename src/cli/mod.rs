//! CLI module for qryc
//!
//! Provides command-line interface for:
//! - validate: Check a query file against its models
//! - index: Compile composite index definitions
//! - params: Extract typed parameter manifests

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{index, params, run, run_command, validate, Config};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{error_response, response, write_error, write_response};
