//! CLI-specific error type
//!
//! A thin wrapper over the subsystem errors; the binary prints it and
//! exits non-zero.

use thiserror::Error;

use crate::schema::SchemaError;
use crate::store::StoreError;

/// CLI errors
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Schema(#[from] SchemaError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("record '{0}' not found in store")]
    RecordMissing(String),
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
