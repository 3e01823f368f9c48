//! Schema file loading for the inspection CLI
//!
//! A schema can be written to disk as pretty-printed JSON and loaded back.
//! Loading validates the structure; a malformed or invalid schema file is
//! fatal, since nothing downstream can run against it.

use std::fs;
use std::path::Path;

use super::errors::{SchemaError, SchemaResult};
use super::types::Schema;

/// Loads and validates a schema from a JSON file.
pub fn load_schema(path: &Path) -> SchemaResult<Schema> {
    let content = fs::read_to_string(path).map_err(|e| {
        SchemaError::malformed(path.display().to_string(), format!("failed to read: {}", e))
    })?;

    let schema: Schema = serde_json::from_str(&content).map_err(|e| {
        SchemaError::malformed(path.display().to_string(), format!("invalid JSON: {}", e))
    })?;

    schema
        .validate_structure()
        .map_err(|reason| SchemaError::invalid_structure(&schema.name, reason))?;

    Ok(schema)
}

/// Writes a schema to a JSON file, pretty-printed.
///
/// The schema is validated first; an invalid declaration is never persisted.
pub fn save_schema(path: &Path, schema: &Schema) -> SchemaResult<()> {
    schema
        .validate_structure()
        .map_err(|reason| SchemaError::invalid_structure(&schema.name, reason))?;

    let content = serde_json::to_string_pretty(schema).map_err(|e| {
        SchemaError::malformed(
            path.display().to_string(),
            format!("failed to serialize: {}", e),
        )
    })?;

    fs::write(path, content).map_err(|e| {
        SchemaError::malformed(
            path.display().to_string(),
            format!("failed to write: {}", e),
        )
    })?;

    Ok(())
}
