//! CLI command implementations
//!
//! `verify`, `list` and `get` are read-only: they walk the store
//! directory directly instead of opening a `Store`, because opening one
//! runs the migration sweep and rewrites records. `migrate` is the
//! explicit way to do that rewrite.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::schema::{first_divergence, load_schema};
use crate::store::Store;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};

/// Parse arguments and dispatch to a command.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Dispatch one parsed command.
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Verify { dir, schema } => verify(&dir, &schema),
        Command::Migrate { dir, schema } => migrate(&dir, &schema),
        Command::List { dir, schema } => list(&dir, &schema),
        Command::Get { dir, schema, id } => get(&dir, &schema, &id),
    }
}

/// Report each record's conformance, read-only.
pub fn verify(dir: &Path, schema_path: &Path) -> CliResult<()> {
    let schema = load_schema(schema_path)?;

    let mut conformant = 0usize;
    let mut divergent = 0usize;
    let mut unreadable = 0usize;

    for (id, path) in record_files(dir)? {
        match read_value(&path) {
            Ok(stored) => {
                let repaired = schema.conform(&stored);
                match first_divergence(&stored, &repaired) {
                    None => {
                        conformant += 1;
                        println!("{}: ok", id);
                    }
                    Some(d) => {
                        divergent += 1;
                        println!("{}: diverges - {}", id, d);
                    }
                }
            }
            Err(reason) => {
                unreadable += 1;
                println!("{}: unreadable - {}", id, reason);
            }
        }
    }

    println!(
        "{} conformant, {} divergent, {} unreadable",
        conformant, divergent, unreadable
    );
    Ok(())
}

/// Open the store, which sweeps every record through the repair engine.
pub fn migrate(dir: &Path, schema_path: &Path) -> CliResult<()> {
    let schema = load_schema(schema_path)?;
    let store = Store::open(dir, schema)?;
    let report = store.migrate()?;
    println!(
        "{} scanned, {} repaired, {} skipped",
        report.scanned, report.repaired, report.skipped
    );
    Ok(())
}

/// List every record identifier.
pub fn list(dir: &Path, schema_path: &Path) -> CliResult<()> {
    // The schema is loaded for validation only; listing never parses
    // records, but a bad schema should fail the command all the same.
    load_schema(schema_path)?;

    for (id, _) in record_files(dir)? {
        println!("{}", id);
    }
    Ok(())
}

/// Print one record as stored.
pub fn get(dir: &Path, schema_path: &Path, id: &str) -> CliResult<()> {
    load_schema(schema_path)?;

    let path = dir.join(format!("{}.json", id));
    if !path.exists() {
        return Err(CliError::RecordMissing(id.to_string()));
    }

    let content = fs::read_to_string(&path)?;
    print!("{}", content);
    Ok(())
}

/// Enumerates `<id>.json` files under the store directory, sorted by id.
fn record_files(dir: &Path) -> CliResult<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map_or(true, |ext| ext != "json") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            files.push((stem.to_string(), path.clone()));
        }
    }
    files.sort();
    Ok(files)
}

fn read_value(path: &Path) -> Result<Value, String> {
    let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&content).map_err(|e| e.to_string())
}
