//! credquery CLI entry point
//!
//! Parses arguments, dispatches via `cli::run`, and exits non-zero on
//! setup failures. All logic lives in the CLI module.

use credquery::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
