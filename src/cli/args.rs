//! CLI argument definitions using clap
//!
//! Commands:
//! - credquery translate --config <path> [--principal <name> --realm <name>]
//! - credquery search --config <path> --documents <path> [--principal <name> --realm <name>]

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::search::CallerIdentity;

/// credquery - logical to physical query translation for credential search
#[derive(Parser, Debug)]
#[command(name = "credquery")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Translate a logical query read from stdin and print the physical request
    Translate {
        /// Path to configuration file
        #[arg(long, default_value = "./credquery.json")]
        config: PathBuf,

        #[command(flatten)]
        caller: CallerArgs,
    },

    /// Execute a logical query against documents loaded from a JSON file
    Search {
        /// Path to configuration file
        #[arg(long, default_value = "./credquery.json")]
        config: PathBuf,

        /// JSON array of `{"id": ..., "source": {...}}` documents
        #[arg(long)]
        documents: PathBuf,

        #[command(flatten)]
        caller: CallerArgs,
    },
}

/// Identity of the caller, used only by owner-scoped queries
#[derive(Args, Debug, Clone, Default)]
pub struct CallerArgs {
    /// Authenticated principal name
    #[arg(long, requires = "realm")]
    pub principal: Option<String>,

    /// Realm the principal authenticated against
    #[arg(long, requires = "principal")]
    pub realm: Option<String>,
}

impl CallerArgs {
    pub fn identity(&self) -> Option<CallerIdentity> {
        match (&self.principal, &self.realm) {
            (Some(principal), Some(realm)) => Some(CallerIdentity::new(principal, realm)),
            _ => None,
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_with_caller() {
        let cli = Cli::try_parse_from([
            "credquery",
            "translate",
            "--principal",
            "alice",
            "--realm",
            "native",
        ])
        .unwrap();
        match cli.command {
            Command::Translate { config, caller } => {
                assert_eq!(config, PathBuf::from("./credquery.json"));
                assert_eq!(caller.identity(), Some(CallerIdentity::new("alice", "native")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_principal_requires_realm() {
        let res = Cli::try_parse_from(["credquery", "translate", "--principal", "alice"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_search_requires_documents() {
        assert!(Cli::try_parse_from(["credquery", "search"]).is_err());
    }
}
