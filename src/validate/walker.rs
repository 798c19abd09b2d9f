//! Document walker
//!
//! Walks a compiled rule tree and a document in lockstep. Every leaf goes
//! through the same pipeline:
//!
//! 1. presence (default substitution, `required`)
//! 2. null check (`notNull`)
//! 3. type check and coercion
//! 4. trim, then lowercase
//! 5. markup sanitization (`denyXSS`)
//! 6. length bounds
//! 7. custom validate
//! 8. custom transform
//!
//! A failing step records one error for the field and skips the rest of its
//! pipeline. Array nodes run steps 1-3 and 6 on the container, walk every
//! element, and run steps 7-8 on the normalized array once everything
//! beneath it passed.
//!
//! Errors are collected in traversal order: schema declaration order, depth
//! first, array elements by ascending index.

use futures_util::future::{join_all, BoxFuture, FutureExt};
use serde_json::{Map, Value};

use crate::schema::types::json_kind;
use crate::schema::{ArrayNode, Branch, CompiledSchema, FieldRule, RuleNode};

use super::errors::{ValidationError, ValidationFailure, ValidationResult};
use super::options::{ValidateOptions, XssPolicy};
use super::sanitizer::Sanitizer;

/// Path reported for a document that is not an object.
pub const ROOT_PATH: &str = "$root";

/// Validates `document` and returns the normalized value with every error.
pub async fn validate_detailed(
    document: &Value,
    schema: &CompiledSchema,
    options: &ValidateOptions,
) -> ValidationResult {
    if !document.is_object() {
        return ValidationResult {
            value: document.clone(),
            errors: vec![ValidationError::type_mismatch(
                ROOT_PATH,
                "object",
                json_kind(document),
            )],
        };
    }

    let walker = Walker::new(options);
    let outcome = walker
        .walk_branch(schema.root(), Some(document.clone()), String::new())
        .await;

    ValidationResult {
        value: outcome.value.unwrap_or_else(|| Value::Object(Map::new())),
        errors: outcome.errors,
    }
}

/// Validates `document`; success carries the normalized document, failure
/// carries the complete error list.
pub async fn validate(
    document: &Value,
    schema: &CompiledSchema,
    options: &ValidateOptions,
) -> Result<Value, ValidationFailure> {
    validate_detailed(document, schema, options)
        .await
        .into_outcome()
}

/// Runs a validation without an executor.
///
/// Returns `None` if an asynchronous callback did not complete on the first
/// poll; with synchronous callbacks only, this always returns `Some`.
pub fn validate_now(
    document: &Value,
    schema: &CompiledSchema,
    options: &ValidateOptions,
) -> Option<ValidationResult> {
    validate_detailed(document, schema, options).now_or_never()
}

/// Result of walking one node. `value` is `None` when the field is absent
/// and nothing was substituted.
struct Outcome {
    value: Option<Value>,
    errors: Vec<ValidationError>,
}

impl Outcome {
    fn ok(value: Value) -> Self {
        Self {
            value: Some(value),
            errors: Vec::new(),
        }
    }

    fn absent() -> Self {
        Self {
            value: None,
            errors: Vec::new(),
        }
    }

    fn unchanged(value: Option<Value>) -> Self {
        Self {
            value,
            errors: Vec::new(),
        }
    }

    fn failed(value: Option<Value>, error: ValidationError) -> Self {
        Self {
            value,
            errors: vec![error],
        }
    }
}

enum BranchInput {
    Absent,
    Null,
    Object,
}

/// One pending child walk.
struct Job<'s> {
    node: &'s RuleNode,
    value: Option<Value>,
    path: String,
    element: bool,
}

struct Walker<'a> {
    options: &'a ValidateOptions,
    sanitizer: Sanitizer,
}

impl<'a> Walker<'a> {
    fn new(options: &'a ValidateOptions) -> Self {
        Self {
            options,
            sanitizer: Sanitizer::new(),
        }
    }

    fn walk_node<'s>(
        &'s self,
        node: &'s RuleNode,
        value: Option<Value>,
        path: String,
    ) -> BoxFuture<'s, Outcome> {
        async move {
            match node {
                RuleNode::Leaf(rule) => self.walk_leaf(rule, value, &path).await,
                RuleNode::Branch(branch) => self.walk_branch(branch, value, path).await,
                RuleNode::Array(array) => self.walk_array(array, value, path).await,
            }
        }
        .boxed()
    }

    /// Array elements: sub-documents must be objects, anything else goes
    /// through the element node as a present value.
    fn walk_element<'s>(
        &'s self,
        node: &'s RuleNode,
        value: Value,
        path: String,
    ) -> BoxFuture<'s, Outcome> {
        match node {
            RuleNode::Branch(_) if !value.is_object() => {
                let error = ValidationError::type_mismatch(&path, "object", json_kind(&value));
                async move { Outcome::failed(Some(value), error) }.boxed()
            }
            _ => self.walk_node(node, Some(value), path),
        }
    }

    async fn walk_leaf(&self, rule: &FieldRule, value: Option<Value>, path: &str) -> Outcome {
        let value = match self.prepare(rule, value, path) {
            Ok(value) => value,
            Err(done) => return done,
        };
        let value = normalize_string(rule, value);
        let value = match self.sanitize(rule, value, path) {
            Ok(value) => value,
            Err(done) => return done,
        };
        if let Some(error) = check_length(rule, &value, path) {
            return Outcome::failed(Some(value), error);
        }
        self.finish(rule, value, path).await
    }

    async fn walk_branch(&self, branch: &Branch, value: Option<Value>, path: String) -> Outcome {
        let (mut map, input) = match value {
            None => (Map::new(), BranchInput::Absent),
            Some(Value::Null) => (Map::new(), BranchInput::Null),
            Some(Value::Object(map)) => (map, BranchInput::Object),
            Some(other) => {
                let error = ValidationError::type_mismatch(&path, "object", json_kind(&other));
                return Outcome::failed(Some(other), error);
            }
        };

        // Taking values out leaves the keys in place, so normalized values
        // are written back at their original positions.
        let jobs: Vec<Job> = branch
            .children()
            .map(|(key, node)| Job {
                node,
                value: map.get_mut(key).map(Value::take),
                path: join_path(&path, key),
                element: false,
            })
            .collect();

        let outcomes = self.walk_jobs(jobs).await;

        let mut errors = Vec::new();
        let mut produced = false;
        for ((key, _), outcome) in branch.children().zip(outcomes) {
            if let Some(child) = outcome.value {
                map.insert(key.to_string(), child);
                produced = true;
            }
            errors.extend(outcome.errors);
        }

        // An absent or null sub-object only materializes if a child produced
        // a value, typically a default.
        let value = match input {
            BranchInput::Object => Some(Value::Object(map)),
            _ if produced => Some(Value::Object(map)),
            BranchInput::Null => Some(Value::Null),
            BranchInput::Absent => None,
        };
        Outcome { value, errors }
    }

    async fn walk_array(&self, array: &ArrayNode, value: Option<Value>, path: String) -> Outcome {
        let rule = &array.rule;
        let value = match self.prepare(rule, value, &path) {
            Ok(value) => value,
            Err(done) => return done,
        };

        let mut errors = Vec::new();
        if let Some(error) = check_length(rule, &value, &path) {
            errors.push(error);
            if self.options.stop_on_first_error {
                return Outcome {
                    value: Some(value),
                    errors,
                };
            }
        }

        let items = match value {
            Value::Array(items) => items,
            // prepare() already checked the container shape
            other => return Outcome::unchanged(Some(other)),
        };

        let jobs: Vec<Job> = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| Job {
                node: array.element.as_ref(),
                value: Some(item),
                path: format!("{}.{}", path, index),
                element: true,
            })
            .collect();

        let mut normalized = Vec::new();
        for outcome in self.walk_jobs(jobs).await {
            normalized.push(outcome.value.unwrap_or(Value::Null));
            errors.extend(outcome.errors);
        }
        let value = Value::Array(normalized);

        if errors.is_empty() {
            self.finish(rule, value, &path).await
        } else {
            Outcome {
                value: Some(value),
                errors,
            }
        }
    }

    /// Walks sibling nodes.
    ///
    /// Siblings run concurrently and their outcomes come back in input
    /// order. With `stop_on_first_error` they run one at a time, and once
    /// one fails the rest are returned untouched.
    async fn walk_jobs<'s>(&'s self, jobs: Vec<Job<'s>>) -> Vec<Outcome> {
        if !self.options.stop_on_first_error {
            return join_all(jobs.into_iter().map(|job| self.run_job(job))).await;
        }

        let mut outcomes = Vec::with_capacity(jobs.len());
        let mut failed = false;
        for job in jobs {
            if failed {
                outcomes.push(Outcome::unchanged(job.value));
                continue;
            }
            let outcome = self.run_job(job).await;
            failed = !outcome.errors.is_empty();
            outcomes.push(outcome);
        }
        outcomes
    }

    fn run_job<'s>(&'s self, job: Job<'s>) -> BoxFuture<'s, Outcome> {
        match (job.element, job.value) {
            (true, Some(value)) => self.walk_element(job.node, value, job.path),
            (_, value) => self.walk_node(job.node, value, job.path),
        }
    }

    /// Steps 1-3: presence, null check, type coercion.
    ///
    /// `Err` carries the finished outcome when the pipeline stops early.
    fn prepare(&self, rule: &FieldRule, value: Option<Value>, path: &str) -> Result<Value, Outcome> {
        let value = match value {
            Some(value) => value,
            None => match &rule.default {
                Some(default) => default.resolve(),
                None if rule.required => {
                    return Err(Outcome::failed(None, ValidationError::required(path)))
                }
                None => return Err(Outcome::absent()),
            },
        };

        if value.is_null() {
            return Err(if rule.not_null {
                Outcome::failed(Some(Value::Null), ValidationError::not_null(path))
            } else {
                Outcome::ok(Value::Null)
            });
        }

        match rule.field_type.check_and_coerce(&value) {
            Ok(coerced) => Ok(coerced),
            Err(mismatch) => {
                let error =
                    ValidationError::type_mismatch(path, &mismatch.expected, mismatch.found);
                Err(Outcome::failed(Some(value), error))
            }
        }
    }

    /// Step 5.
    fn sanitize(&self, rule: &FieldRule, value: Value, path: &str) -> Result<Value, Outcome> {
        let text = match value {
            Value::String(text) if rule.deny_xss => text,
            other => return Ok(other),
        };

        let sanitized = self.sanitizer.sanitize(&text);
        if !sanitized.flagged {
            return Ok(Value::String(text));
        }
        match self.options.xss_policy {
            XssPolicy::Strip => Ok(Value::String(sanitized.value)),
            XssPolicy::Reject => Err(Outcome::failed(
                Some(Value::String(text)),
                ValidationError::xss(path),
            )),
        }
    }

    /// Steps 7-8. Transforms see only values that passed every check.
    async fn finish(&self, rule: &FieldRule, value: Value, path: &str) -> Outcome {
        if let Some(check) = &rule.validate {
            if !check(value.clone()).await {
                return Outcome::failed(Some(value), ValidationError::custom(path));
            }
        }

        match &rule.transform {
            Some(transform) if self.options.run_transforms => Outcome::ok(transform(value).await),
            _ => Outcome::ok(value),
        }
    }
}

/// Step 4.
fn normalize_string(rule: &FieldRule, value: Value) -> Value {
    match value {
        Value::String(text) if rule.trim || rule.lowercase => {
            let text = if rule.trim {
                text.trim().to_string()
            } else {
                text
            };
            let text = if rule.lowercase {
                text.to_lowercase()
            } else {
                text
            };
            Value::String(text)
        }
        other => other,
    }
}

/// Step 6. Strings are measured in characters, arrays in elements.
fn check_length(rule: &FieldRule, value: &Value, path: &str) -> Option<ValidationError> {
    let len = match value {
        Value::String(text) => text.chars().count(),
        Value::Array(items) => items.len(),
        _ => return None,
    };
    if let Some(min) = rule.min_length {
        if len < min {
            return Some(ValidationError::min_length(path, min, len));
        }
    }
    if let Some(max) = rule.max_length {
        if len > max {
            return Some(ValidationError::max_length(path, max, len));
        }
    }
    None
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}
