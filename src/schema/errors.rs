//! Schema error types
//!
//! Error codes:
//! - MEND_MALFORMED_SCHEMA (FATAL) - schema file unreadable or invalid JSON
//! - MEND_INVALID_SCHEMA (FATAL) - schema structure violates its own rules
//!
//! The repair engine itself never fails; these errors only arise when a
//! schema is declared or loaded, before any record is touched.

use std::fmt;

/// Severity levels for schema errors.
///
/// Everything here is fatal: a store cannot run against a bad schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The store must refuse to start
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Schema-specific error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Schema file unreadable or not valid JSON
    MendMalformedSchema,
    /// Schema declaration breaks a structural rule
    MendInvalidSchema,
}

impl SchemaErrorCode {
    /// Returns the string code.
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::MendMalformedSchema => "MEND_MALFORMED_SCHEMA",
            SchemaErrorCode::MendInvalidSchema => "MEND_INVALID_SCHEMA",
        }
    }

    /// Returns the severity level for this error.
    pub fn severity(&self) -> Severity {
        Severity::Fatal
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A single field-level difference between a supplied value and what the
/// schema repairs it to. Carried inside `SchemaViolation` store errors.
#[derive(Debug, Clone)]
pub struct Divergence {
    /// Field path (e.g. "stats.hp" or "tags[2]")
    pub field: String,
    /// What the schema requires at that path
    pub expected: String,
    /// What the value actually held
    pub actual: String,
}

impl Divergence {
    pub fn new(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "field '{}': expected {}, got {}",
            self.field, self.expected, self.actual
        )
    }
}

/// Schema error type with full context.
#[derive(Debug)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    schema_name: Option<String>,
}

impl SchemaError {
    /// Create an error for an unreadable or syntactically bad schema file.
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::MendMalformedSchema,
            message: format!("malformed schema file '{}': {}", path.into(), reason.into()),
            schema_name: None,
        }
    }

    /// Create an error for a structurally invalid schema declaration.
    pub fn invalid_structure(name: impl Into<String>, reason: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            code: SchemaErrorCode::MendInvalidSchema,
            message: format!("schema '{}' is invalid: {}", name, reason.into()),
            schema_name: Some(name),
        }
    }

    /// Returns the error code.
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the severity level.
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the schema name if applicable.
    pub fn schema_name(&self) -> Option<&str> {
        self.schema_name.as_deref()
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;
