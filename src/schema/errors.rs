//! Schema error types
//!
//! Error codes:
//! - DOCRULE_SCHEMA_MALFORMED_PATH (FATAL)
//! - DOCRULE_SCHEMA_DUPLICATE_PATH (FATAL)
//! - DOCRULE_SCHEMA_PATH_COLLISION (FATAL)
//! - DOCRULE_SCHEMA_INVALID_RULE (FATAL)
//! - DOCRULE_SCHEMA_MALFORMED (FATAL)
//! - DOCRULE_SCHEMA_UNKNOWN (REJECT)
//! - DOCRULE_SCHEMA_UNKNOWN_VERSION (REJECT)
//! - DOCRULE_SCHEMA_IMMUTABLE (REJECT)
//!
//! These are programming errors in a schema definition or lookup. They are
//! reported immediately and never mixed with per-document violations.

use std::fmt;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Request rejected, the caller may retry with a different schema
    Reject,
    /// The schema itself is unusable
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Empty path or empty path segment
    MalformedPath,
    /// Same path declared twice with different type shapes
    DuplicatePath,
    /// A path is claimed both as a leaf and as a branch
    PathCollision,
    /// Rule options contradict each other or the field type
    InvalidRule,
    /// Schema file could not be read or parsed
    MalformedSchema,
    /// Schema ID not registered
    UnknownSchema,
    /// Schema version not registered
    UnknownSchemaVersion,
    /// Attempt to replace a registered schema version
    SchemaImmutable,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::MalformedPath => "DOCRULE_SCHEMA_MALFORMED_PATH",
            SchemaErrorCode::DuplicatePath => "DOCRULE_SCHEMA_DUPLICATE_PATH",
            SchemaErrorCode::PathCollision => "DOCRULE_SCHEMA_PATH_COLLISION",
            SchemaErrorCode::InvalidRule => "DOCRULE_SCHEMA_INVALID_RULE",
            SchemaErrorCode::MalformedSchema => "DOCRULE_SCHEMA_MALFORMED",
            SchemaErrorCode::UnknownSchema => "DOCRULE_SCHEMA_UNKNOWN",
            SchemaErrorCode::UnknownSchemaVersion => "DOCRULE_SCHEMA_UNKNOWN_VERSION",
            SchemaErrorCode::SchemaImmutable => "DOCRULE_SCHEMA_IMMUTABLE",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            SchemaErrorCode::UnknownSchema
            | SchemaErrorCode::UnknownSchemaVersion
            | SchemaErrorCode::SchemaImmutable => Severity::Reject,
            _ => Severity::Fatal,
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error type with full context
#[derive(Debug)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    /// Offending field path, if the error concerns a single field
    path: Option<String>,
}

impl SchemaError {
    fn new(code: SchemaErrorCode, message: String, path: Option<String>) -> Self {
        Self {
            code,
            message,
            path,
        }
    }

    /// Create a malformed path error
    pub fn malformed_path(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            SchemaErrorCode::MalformedPath,
            format!("Field path '{}' has an empty segment", path),
            Some(path),
        )
    }

    /// Create a duplicate path error
    pub fn duplicate_path(path: impl Into<String>, first: &str, second: &str) -> Self {
        let path = path.into();
        Self::new(
            SchemaErrorCode::DuplicatePath,
            format!(
                "Field '{}' declared twice with conflicting types ({} vs {})",
                path, first, second
            ),
            Some(path),
        )
    }

    /// Create a leaf/branch collision error
    pub fn path_collision(path: impl Into<String>, other: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            SchemaErrorCode::PathCollision,
            format!(
                "Field '{}' is declared as a value but '{}' nests fields under it",
                path,
                other.into()
            ),
            Some(path),
        )
    }

    /// Create an invalid rule error
    pub fn invalid_rule(path: impl Into<String>, reason: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            SchemaErrorCode::InvalidRule,
            format!("Invalid rule for field '{}': {}", path, reason.into()),
            Some(path),
        )
    }

    /// Create an error for a malformed schema file or declarative definition
    pub fn malformed_schema(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            SchemaErrorCode::MalformedSchema,
            format!("Malformed schema '{}': {}", source.into(), reason.into()),
            None,
        )
    }

    /// Create an unknown schema error
    pub fn unknown_schema(schema_id: impl Into<String>) -> Self {
        Self::new(
            SchemaErrorCode::UnknownSchema,
            format!("Schema '{}' not found", schema_id.into()),
            None,
        )
    }

    /// Create an unknown schema version error
    pub fn unknown_version(schema_id: impl Into<String>, version: impl Into<String>) -> Self {
        Self::new(
            SchemaErrorCode::UnknownSchemaVersion,
            format!(
                "Schema '{}' version '{}' not found",
                schema_id.into(),
                version.into()
            ),
            None,
        )
    }

    /// Create a schema immutable error
    pub fn schema_immutable(schema_id: impl Into<String>, version: impl Into<String>) -> Self {
        Self::new(
            SchemaErrorCode::SchemaImmutable,
            format!(
                "Schema '{}' version '{}' is already registered",
                schema_id.into(),
                version.into()
            ),
            None,
        )
    }

    /// Prefixes the offending path, used when compiling nested schemas
    pub(crate) fn nested_under(mut self, prefix: &str) -> Self {
        if let Some(path) = self.path.take() {
            let full = format!("{}[].{}", prefix, path);
            self.message = self.message.replacen(&format!("'{}'", path), &format!("'{}'", full), 1);
            self.path = Some(full);
        }
        self
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the offending field path if applicable
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SchemaErrorCode::MalformedPath.code(), "DOCRULE_SCHEMA_MALFORMED_PATH");
        assert_eq!(SchemaErrorCode::PathCollision.code(), "DOCRULE_SCHEMA_PATH_COLLISION");
        assert_eq!(SchemaErrorCode::SchemaImmutable.code(), "DOCRULE_SCHEMA_IMMUTABLE");
    }

    #[test]
    fn test_severity_levels() {
        assert_eq!(SchemaErrorCode::PathCollision.severity(), Severity::Fatal);
        assert_eq!(SchemaErrorCode::InvalidRule.severity(), Severity::Fatal);
        assert_eq!(SchemaErrorCode::UnknownSchema.severity(), Severity::Reject);
        assert_eq!(SchemaErrorCode::SchemaImmutable.severity(), Severity::Reject);
    }

    #[test]
    fn test_display_includes_code_and_severity() {
        let err = SchemaError::path_collision("account", "account.name");
        let display = format!("{}", err);
        assert!(display.contains("FATAL"));
        assert!(display.contains("DOCRULE_SCHEMA_PATH_COLLISION"));
        assert!(display.contains("account.name"));
        assert_eq!(err.path(), Some("account"));
    }

    #[test]
    fn test_nested_under_prefixes_path() {
        let err = SchemaError::invalid_rule("name", "minLength exceeds maxLength")
            .nested_under("account.friends");
        assert_eq!(err.path(), Some("account.friends[].name"));
        assert!(err.message().contains("'account.friends[].name'"));
    }
}
