//! CLI error types
//!
//! Every CLI error ends the process with a non-zero exit code.

use std::io;

use thiserror::Error;

use crate::schema::SchemaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file missing or invalid
    ConfigError,
    /// Reading input or writing output failed
    IoError,
    /// A document file is not valid JSON
    InvalidDocument,
    /// The schema file could not be loaded or compiled
    SchemaError,
    /// At least one document failed validation
    ValidationFailed,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "DOCRULE_CLI_CONFIG_ERROR",
            Self::IoError => "DOCRULE_CLI_IO_ERROR",
            Self::InvalidDocument => "DOCRULE_CLI_INVALID_DOCUMENT",
            Self::SchemaError => "DOCRULE_CLI_SCHEMA_ERROR",
            Self::ValidationFailed => "DOCRULE_CLI_VALIDATION_FAILED",
        }
    }
}

#[derive(Debug, Error)]
#[error("{}: {message}", .code.code())]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn invalid_document(source: &str, msg: impl Into<String>) -> Self {
        Self::new(
            CliErrorCode::InvalidDocument,
            format!("{}: {}", source, msg.into()),
        )
    }

    pub fn validation_failed(failed: usize, total: usize) -> Self {
        Self::new(
            CliErrorCode::ValidationFailed,
            format!("{} of {} document(s) failed validation", failed, total),
        )
    }

    pub fn code(&self) -> CliErrorCode {
        self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<SchemaError> for CliError {
    fn from(e: SchemaError) -> Self {
        Self::new(CliErrorCode::SchemaError, e.to_string())
    }
}

pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code() {
        let err = CliError::validation_failed(2, 5);
        assert_eq!(
            err.to_string(),
            "DOCRULE_CLI_VALIDATION_FAILED: 2 of 5 document(s) failed validation"
        );
        assert_eq!(err.code(), CliErrorCode::ValidationFailed);
    }

    #[test]
    fn test_schema_error_conversion() {
        let err: CliError = SchemaError::malformed_path("a..b").into();
        assert_eq!(err.code_str(), "DOCRULE_CLI_SCHEMA_ERROR");
        assert!(err.message().contains("DOCRULE_SCHEMA_MALFORMED_PATH"));
    }
}
