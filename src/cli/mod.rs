//! CLI module for menddb
//!
//! Provides the inspection binary:
//! - verify: read-only conformance report
//! - migrate: sweep every record through the repair engine
//! - list: list record identifiers
//! - get: print one record

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{get, list, migrate, run, run_command, verify};
pub use errors::{CliError, CliResult};
