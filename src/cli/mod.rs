//! CLI module for credquery
//!
//! Provides command-line interface for:
//! - translate: Print the physical request for a logical query
//! - search: Run a logical query against a JSON document file

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{run, run_command, search, translate};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_error, write_response};
