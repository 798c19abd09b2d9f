//! Field rules: the per-field validation and normalization configuration

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::{ready, BoxFuture, FutureExt};
use serde_json::Value;

use super::types::FieldType;

/// Custom check. Resolves to `false` when the value is rejected.
pub type ValidateFn = Arc<dyn Fn(Value) -> BoxFuture<'static, bool> + Send + Sync>;

/// Custom transform producing the final normalized value.
pub type TransformFn = Arc<dyn Fn(Value) -> BoxFuture<'static, Value> + Send + Sync>;

/// Value substituted for an absent field.
#[derive(Clone)]
pub enum DefaultValue {
    /// Cloned for every document
    Value(Value),
    /// Invoked for every document
    Producer(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    pub fn resolve(&self) -> Value {
        match self {
            DefaultValue::Value(value) => value.clone(),
            DefaultValue::Producer(produce) => produce(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Value(value) => write!(f, "Value({})", value),
            DefaultValue::Producer(_) => write!(f, "Producer(..)"),
        }
    }
}

/// Full configuration of one field.
///
/// Only the type is mandatory. Every other option starts out neutral:
/// flags off, bounds unset, no callbacks.
#[derive(Clone)]
pub struct FieldRule {
    pub field_type: FieldType,
    pub required: bool,
    pub not_null: bool,
    pub default: Option<DefaultValue>,
    pub trim: bool,
    pub lowercase: bool,
    pub deny_xss: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub(crate) validate: Option<ValidateFn>,
    pub(crate) transform: Option<TransformFn>,
}

impl FieldRule {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            not_null: false,
            default: None,
            trim: false,
            lowercase: false,
            deny_xss: false,
            min_length: None,
            max_length: None,
            validate: None,
            transform: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Literal default, cloned into each document missing the field.
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(DefaultValue::Value(value));
        self
    }

    /// Default computed per document.
    pub fn default_with<F>(mut self, produce: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Producer(Arc::new(produce)));
        self
    }

    pub fn trim(mut self) -> Self {
        self.trim = true;
        self
    }

    pub fn lowercase(mut self) -> Self {
        self.lowercase = true;
        self
    }

    pub fn deny_xss(mut self) -> Self {
        self.deny_xss = true;
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Synchronous custom check.
    pub fn validate<F>(mut self, check: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.validate = Some(Arc::new(move |value: Value| ready(check(&value)).boxed()));
        self
    }

    /// Asynchronous custom check.
    pub fn validate_async<F, Fut>(mut self, check: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.validate = Some(Arc::new(move |value: Value| check(value).boxed()));
        self
    }

    /// Synchronous transform.
    pub fn transform<F>(mut self, map: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(move |value: Value| ready(map(value)).boxed()));
        self
    }

    /// Asynchronous transform.
    pub fn transform_async<F, Fut>(mut self, map: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Value> + Send + 'static,
    {
        self.transform = Some(Arc::new(move |value: Value| map(value).boxed()));
        self
    }

    pub fn has_validate(&self) -> bool {
        self.validate.is_some()
    }

    pub fn has_transform(&self) -> bool {
        self.transform.is_some()
    }

    /// Short list of the enabled options, used by schema outlines.
    pub fn flags(&self) -> Vec<String> {
        let mut flags = Vec::new();
        if self.required {
            flags.push("required".to_string());
        }
        if self.not_null {
            flags.push("notNull".to_string());
        }
        if self.default.is_some() {
            flags.push("default".to_string());
        }
        if self.trim {
            flags.push("trim".to_string());
        }
        if self.lowercase {
            flags.push("lowercase".to_string());
        }
        if self.deny_xss {
            flags.push("denyXSS".to_string());
        }
        if let Some(min) = self.min_length {
            flags.push(format!("minLength={}", min));
        }
        if let Some(max) = self.max_length {
            flags.push(format!("maxLength={}", max));
        }
        if self.has_validate() {
            flags.push("validate".to_string());
        }
        if self.has_transform() {
            flags.push("transform".to_string());
        }
        flags
    }
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRule")
            .field("field_type", &self.field_type)
            .field("required", &self.required)
            .field("not_null", &self.not_null)
            .field("default", &self.default)
            .field("trim", &self.trim)
            .field("lowercase", &self.lowercase)
            .field("deny_xss", &self.deny_xss)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("validate", &self.has_validate())
            .field("transform", &self.has_transform())
            .finish()
    }
}
