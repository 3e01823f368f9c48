//! CLI argument definitions using clap
//!
//! Commands:
//! - menddb verify --dir <d> --schema <s>
//! - menddb migrate --dir <d> --schema <s>
//! - menddb list --dir <d> --schema <s>
//! - menddb get --dir <d> --schema <s> --id <id>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// menddb - A self-repairing, schema-validated document store
#[derive(Parser, Debug)]
#[command(name = "menddb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Report each record's conformance without touching anything
    Verify {
        /// Store directory
        #[arg(long)]
        dir: PathBuf,

        /// Path to the schema JSON file
        #[arg(long)]
        schema: PathBuf,
    },

    /// Open the store, forcing every record through the repair engine
    Migrate {
        /// Store directory
        #[arg(long)]
        dir: PathBuf,

        /// Path to the schema JSON file
        #[arg(long)]
        schema: PathBuf,
    },

    /// List every record identifier in the store
    List {
        /// Store directory
        #[arg(long)]
        dir: PathBuf,

        /// Path to the schema JSON file
        #[arg(long)]
        schema: PathBuf,
    },

    /// Print one record
    Get {
        /// Store directory
        #[arg(long)]
        dir: PathBuf,

        /// Path to the schema JSON file
        #[arg(long)]
        schema: PathBuf,

        /// Record identifier
        #[arg(long)]
        id: String,
    },
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
