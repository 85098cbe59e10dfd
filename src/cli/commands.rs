//! CLI command implementations
//!
//! Both commands read a single logical query from stdin. Translation and
//! search failures are answered with the error envelope; only setup
//! failures (config, I/O, runtime) abort the process.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::config::Config;
use crate::error::QueryError;
use crate::query::LogicalQuery;
use crate::search::{MemorySearchExecutor, StaticIdentityResolver, StoredDocument};

use super::args::{CallerArgs, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Translate { config, caller } => translate(&config, &caller),
        Command::Search {
            config,
            documents,
            caller,
        } => search(&config, &documents, &caller),
    }
}

/// Print the physical request for the logical query on stdin
pub fn translate(config_path: &Path, caller: &CallerArgs) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let query = match parse_query(read_request()?) {
        Ok(query) => query,
        Err(e) => return report(&e),
    };

    let service = config.service(
        Arc::new(MemorySearchExecutor::new()),
        Arc::new(resolver(caller)),
    );

    match service.translate_for_caller(&query) {
        Ok(request) => write_response(serde_json::to_value(&request)?),
        Err(e) => report(&e),
    }
}

/// Run the logical query on stdin against a document file
pub fn search(config_path: &Path, documents_path: &Path, caller: &CallerArgs) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let documents = load_documents(documents_path)?;
    let query = match parse_query(read_request()?) {
        Ok(query) => query,
        Err(e) => return report(&e),
    };

    let service = config.service(
        Arc::new(MemorySearchExecutor::from_documents(documents)),
        Arc::new(resolver(caller)),
    );

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::runtime_failed(format!("Failed to create tokio runtime: {}", e)))?;

    match rt.block_on(service.translate_and_execute(&query)) {
        Ok(response) => write_response(serde_json::to_value(&response)?),
        Err(e) => report(&e),
    }
}

fn parse_query(value: Value) -> Result<LogicalQuery, QueryError> {
    serde_json::from_value(value)
        .map_err(|e| QueryError::invalid_query(format!("malformed logical query: {}", e)))
}

fn load_documents(path: &Path) -> CliResult<Vec<StoredDocument>> {
    let content = fs::read_to_string(path).map_err(|e| {
        CliError::io_error(format!("Failed to read {}: {}", path.display(), e))
    })?;
    Ok(serde_json::from_str(&content)?)
}

fn resolver(caller: &CallerArgs) -> StaticIdentityResolver {
    match caller.identity() {
        Some(identity) => StaticIdentityResolver::authenticated(identity),
        None => StaticIdentityResolver::anonymous(),
    }
}

fn report(err: &QueryError) -> CliResult<()> {
    write_error(err.code(), &err.to_string())
}
