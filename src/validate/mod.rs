//! Document validation
//!
//! Validates JSON documents against a [`CompiledSchema`]. A validation
//! either returns the normalized document or the complete list of
//! violations; it never stops at the first one unless asked to.
//!
//! The free functions are pure. [`Validator`] binds a schema to options and
//! records outcomes into logs and metrics.

mod errors;
mod options;
mod sanitizer;
mod walker;

use std::sync::Arc;

use serde_json::Value;

use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::schema::CompiledSchema;

pub use errors::{ValidationError, ValidationFailure, ValidationResult, ViolationKind, ViolationRule};
pub use options::{ValidateOptions, XssPolicy};
pub use sanitizer::{Sanitized, Sanitizer};
pub use walker::{validate, validate_detailed, validate_now, ROOT_PATH};

/// A compiled schema bound to validation options.
///
/// Cheap to clone and safe to share across tasks.
#[derive(Debug, Clone)]
pub struct Validator {
    schema: Arc<CompiledSchema>,
    options: ValidateOptions,
    metrics: Option<Arc<MetricsRegistry>>,
    /// Label used in log lines
    name: Option<String>,
}

impl Validator {
    pub fn new(schema: Arc<CompiledSchema>) -> Self {
        Self {
            schema,
            options: ValidateOptions::default(),
            metrics: None,
            name: None,
        }
    }

    pub fn with_options(mut self, options: ValidateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn schema(&self) -> &Arc<CompiledSchema> {
        &self.schema
    }

    pub fn options(&self) -> &ValidateOptions {
        &self.options
    }

    /// Validates a document, returning the normalized value or every error.
    pub async fn validate(&self, document: &Value) -> Result<Value, ValidationFailure> {
        self.validate_detailed(document).await.into_outcome()
    }

    /// Validates a document and returns the normalized value with every error.
    pub async fn validate_detailed(&self, document: &Value) -> ValidationResult {
        let result = validate_detailed(document, &self.schema, &self.options).await;
        self.record(&result);
        result
    }

    /// Re-checks a stored document: same rules, transforms not applied.
    pub async fn recheck(&self, document: &Value) -> Result<Value, ValidationFailure> {
        let options = ValidateOptions {
            run_transforms: false,
            ..self.options.clone()
        };
        let result = validate_detailed(document, &self.schema, &options).await;
        self.record(&result);
        result.into_outcome()
    }

    fn record(&self, result: &ValidationResult) {
        let name = self.name.as_deref().unwrap_or("-");
        if result.is_valid() {
            if let Some(metrics) = &self.metrics {
                metrics.record_accepted();
            }
            log_event_with_fields(Event::DocumentAccepted, &[("schema", name)]);
        } else {
            if let Some(metrics) = &self.metrics {
                metrics.record_rejected(result.errors.len());
            }
            let count = result.errors.len().to_string();
            let first = result
                .errors
                .first()
                .map(|e| format!("{} ({})", e.path, e.rule))
                .unwrap_or_default();
            log_event_with_fields(
                Event::DocumentRejected,
                &[
                    ("errors", count.as_str()),
                    ("first", first.as_str()),
                    ("schema", name),
                ],
            );
        }
    }
}
