//! Validation errors and results
//!
//! Violations are data, not failures of the engine: every one is recorded
//! with its path, in traversal order, and handed back to the caller.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Name of the rule a value violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ViolationRule {
    Required,
    NotNull,
    Type,
    MinLength,
    MaxLength,
    Validate,
    Xss,
}

impl ViolationRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationRule::Required => "required",
            ViolationRule::NotNull => "notNull",
            ViolationRule::Type => "type",
            ViolationRule::MinLength => "minLength",
            ViolationRule::MaxLength => "maxLength",
            ViolationRule::Validate => "validate",
            ViolationRule::Xss => "xss",
        }
    }

    /// Taxonomy class of the violation.
    pub fn kind(&self) -> ViolationKind {
        match self {
            ViolationRule::Required => ViolationKind::MissingRequired,
            ViolationRule::NotNull => ViolationKind::NullNotAllowed,
            ViolationRule::Type => ViolationKind::TypeMismatch,
            ViolationRule::MinLength | ViolationRule::MaxLength => ViolationKind::LengthViolation,
            ViolationRule::Validate => ViolationKind::CustomValidationFailed,
            ViolationRule::Xss => ViolationKind::XssDetected,
        }
    }
}

impl fmt::Display for ViolationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Violation classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    MissingRequired,
    NullNotAllowed,
    TypeMismatch,
    LengthViolation,
    XssDetected,
    CustomValidationFailed,
}

/// One structured violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Dotted path, array indices as numeric segments
    pub path: String,
    pub rule: ViolationRule,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, rule: ViolationRule, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            rule,
            message: message.into(),
        }
    }

    pub fn required(path: &str) -> Self {
        Self::new(path, ViolationRule::Required, format!("'{}' is required", path))
    }

    pub fn not_null(path: &str) -> Self {
        Self::new(path, ViolationRule::NotNull, format!("'{}' must not be null", path))
    }

    pub fn type_mismatch(path: &str, expected: &str, found: &str) -> Self {
        Self::new(
            path,
            ViolationRule::Type,
            format!("'{}': expected {}, got {}", path, expected, found),
        )
    }

    pub fn min_length(path: &str, min: usize, actual: usize) -> Self {
        Self::new(
            path,
            ViolationRule::MinLength,
            format!("'{}' has length {}, minimum is {}", path, actual, min),
        )
    }

    pub fn max_length(path: &str, max: usize, actual: usize) -> Self {
        Self::new(
            path,
            ViolationRule::MaxLength,
            format!("'{}' has length {}, maximum is {}", path, actual, max),
        )
    }

    pub fn xss(path: &str) -> Self {
        Self::new(path, ViolationRule::Xss, format!("'{}' contains markup", path))
    }

    pub fn custom(path: &str) -> Self {
        Self::new(
            path,
            ViolationRule::Validate,
            format!("'{}' failed custom validation", path),
        )
    }

    pub fn kind(&self) -> ViolationKind {
        self.rule.kind()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.rule, self.message)
    }
}

/// Outcome of validating one document: the normalized value plus every
/// violation in traversal order.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub value: Value,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Success carries the normalized document, failure carries all errors.
    pub fn into_outcome(self) -> Result<Value, ValidationFailure> {
        if self.errors.is_empty() {
            Ok(self.value)
        } else {
            Err(ValidationFailure::new(self.errors))
        }
    }
}

/// A rejected document, exposing the complete error list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("document failed validation with {} error(s): {}", .errors.len(), summary(.errors))]
pub struct ValidationFailure {
    errors: Vec<ValidationError>,
}

impl ValidationFailure {
    pub fn new(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }
}

fn summary(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} ({})", e.path, e.rule))
        .collect::<Vec<_>>()
        .join(", ")
}
