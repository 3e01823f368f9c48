//! Store error types
//!
//! Error codes:
//! - MEND_NOT_FOUND (ERROR) - no record satisfied a predicate; loud but
//!   expected, handled per call site
//! - MEND_SCHEMA_VIOLATION (FATAL) - a record still diverged from schema
//!   at save time; signals a bug in a mutation or an unrepairable edge
//! - MEND_STORE_IO (ERROR) - filesystem failure, propagated uncaught
//! - MEND_RECORD_CORRUPT (ERROR) - a stored record failed to parse

use std::fmt;
use std::io;

use crate::schema::Divergence;

/// Severity levels for store errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, caller decides what to do
    Error,
    /// Caller or data bug; never silently recovered
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Store-specific error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    /// No record satisfied the predicate
    MendNotFound,
    /// Record diverges from schema at the save boundary
    MendSchemaViolation,
    /// Filesystem failure
    MendStoreIo,
    /// Stored record is unparseable
    MendRecordCorrupt,
}

impl StoreErrorCode {
    /// Returns the string code.
    pub fn code(&self) -> &'static str {
        match self {
            StoreErrorCode::MendNotFound => "MEND_NOT_FOUND",
            StoreErrorCode::MendSchemaViolation => "MEND_SCHEMA_VIOLATION",
            StoreErrorCode::MendStoreIo => "MEND_STORE_IO",
            StoreErrorCode::MendRecordCorrupt => "MEND_RECORD_CORRUPT",
        }
    }

    /// Returns the severity level for this error.
    pub fn severity(&self) -> Severity {
        match self {
            StoreErrorCode::MendSchemaViolation => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Store error type with full context.
#[derive(Debug)]
pub struct StoreError {
    code: StoreErrorCode,
    message: String,
    divergence: Option<Divergence>,
    source: Option<io::Error>,
}

impl StoreError {
    /// Create a not-found error for a failed predicate match.
    pub fn not_found(record_type: impl Into<String>) -> Self {
        Self {
            code: StoreErrorCode::MendNotFound,
            message: format!("no '{}' record matched the predicate", record_type.into()),
            divergence: None,
            source: None,
        }
    }

    /// Create a fatal error for opening a store with a structurally
    /// invalid schema.
    pub fn invalid_schema(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: StoreErrorCode::MendSchemaViolation,
            message: format!("schema '{}' is invalid: {}", name.into(), reason.into()),
            divergence: None,
            source: None,
        }
    }

    /// Create a schema violation error (FATAL).
    pub fn schema_violation(record_id: impl Into<String>, divergence: Divergence) -> Self {
        Self {
            code: StoreErrorCode::MendSchemaViolation,
            message: format!(
                "record '{}' diverges from schema: {}",
                record_id.into(),
                divergence
            ),
            divergence: Some(divergence),
            source: None,
        }
    }

    /// Create an I/O error wrapping the underlying failure.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StoreErrorCode::MendStoreIo,
            message: message.into(),
            divergence: None,
            source: Some(source),
        }
    }

    /// Create a corrupt-record error for an unparseable file.
    pub fn corrupt(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: StoreErrorCode::MendRecordCorrupt,
            message: format!("unparseable record '{}': {}", path.into(), reason.into()),
            divergence: None,
            source: None,
        }
    }

    /// Returns the error code.
    pub fn code(&self) -> StoreErrorCode {
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

    /// Returns the divergence details for schema violations.
    pub fn divergence(&self) -> Option<&Divergence> {
        self.divergence.as_ref()
    }

    /// Returns whether this is an expected-to-be-handled miss.
    pub fn is_not_found(&self) -> bool {
        self.code == StoreErrorCode::MendNotFound
    }

    /// Returns whether this error is fatal.
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for StoreError {
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

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(StoreErrorCode::MendNotFound.code(), "MEND_NOT_FOUND");
        assert_eq!(
            StoreErrorCode::MendSchemaViolation.code(),
            "MEND_SCHEMA_VIOLATION"
        );
        assert_eq!(StoreErrorCode::MendStoreIo.code(), "MEND_STORE_IO");
        assert_eq!(
            StoreErrorCode::MendRecordCorrupt.code(),
            "MEND_RECORD_CORRUPT"
        );
    }

    #[test]
    fn test_only_schema_violation_fatal() {
        assert_eq!(
            StoreErrorCode::MendSchemaViolation.severity(),
            Severity::Fatal
        );
        assert_eq!(StoreErrorCode::MendNotFound.severity(), Severity::Error);
        assert_eq!(StoreErrorCode::MendStoreIo.severity(), Severity::Error);
        assert_eq!(
            StoreErrorCode::MendRecordCorrupt.severity(),
            Severity::Error
        );
    }

    #[test]
    fn test_not_found_is_expected() {
        let err = StoreError::not_found("users");
        assert!(err.is_not_found());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_schema_violation_carries_divergence() {
        let err = StoreError::schema_violation("u-1", Divergence::new("count", "0", "\"5\""));
        assert!(err.is_fatal());
        let display = format!("{}", err);
        assert!(display.contains("MEND_SCHEMA_VIOLATION"));
        assert!(display.contains("FATAL"));
        assert!(display.contains("count"));
        assert_eq!(err.divergence().unwrap().field, "count");
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err = StoreError::io(
            "failed to write record",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_fatal());
    }
}
