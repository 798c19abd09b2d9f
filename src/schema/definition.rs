//! Schema definitions: ordered dotted-path to field-rule mappings
//!
//! A definition is authored either in Rust through [`SchemaDefinition::field`]
//! or in the declarative JSON format:
//!
//! ```json
//! {
//!   "account.name": { "type": "string", "required": true, "trim": true },
//!   "account.friends": { "type": { "array": "string" }, "default": [] },
//!   "account.pets": { "type": { "array": { "name": { "type": "string" } } } }
//! }
//! ```
//!
//! `{"array": X}` is always read as an array descriptor. `X` is a type tag,
//! another array descriptor, or a map of fields for sub-documents.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::errors::{SchemaError, SchemaResult};
use super::rule::FieldRule;
use super::types::{ElementType, FieldType};

/// Ordered mapping from dotted field path to rule.
///
/// Declaration order drives traversal order and therefore error order.
#[derive(Debug, Clone, Default)]
pub struct SchemaDefinition {
    fields: Vec<(String, FieldRule)>,
}

impl SchemaDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, builder style.
    pub fn field(mut self, path: impl Into<String>, rule: FieldRule) -> Self {
        self.insert(path, rule);
        self
    }

    /// Appends a field declaration.
    ///
    /// Declarations are not merged here; repeated paths are resolved by
    /// the compiler so that conflicting shapes are reported there.
    pub fn insert(&mut self, path: impl Into<String>, rule: FieldRule) {
        self.fields.push((path.into(), rule));
    }

    /// Replaces the rule at `path` with `update(rule)`, for attaching
    /// callbacks to definitions parsed from JSON. Returns false when the
    /// path is not declared.
    pub fn update<F>(&mut self, path: &str, update: F) -> bool
    where
        F: FnOnce(FieldRule) -> FieldRule,
    {
        match self.fields.iter_mut().rev().find(|(p, _)| p == path) {
            Some((_, rule)) => {
                let current = std::mem::replace(rule, FieldRule::new(FieldType::String));
                *rule = update(current);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, path: &str) -> Option<&FieldRule> {
        self.fields.iter().rev().find(|(p, _)| p == path).map(|(_, r)| r)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldRule)> {
        self.fields.iter().map(|(p, r)| (p.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Same paths in the same order with the same type shapes.
    pub fn same_shape(&self, other: &SchemaDefinition) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(&other.fields)
                .all(|((pa, ra), (pb, rb))| pa == pb && ra.field_type.same_shape(&rb.field_type))
    }

    /// Parses the declarative JSON format.
    pub fn from_json(value: &Value) -> SchemaResult<Self> {
        let fields = value
            .as_object()
            .ok_or_else(|| SchemaError::malformed_schema("<json>", "fields must be an object"))?;
        Self::from_json_map(fields)
    }

    pub fn from_json_str(content: &str) -> SchemaResult<Self> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| SchemaError::malformed_schema("<json>", format!("Invalid JSON: {}", e)))?;
        Self::from_json(&value)
    }

    pub(crate) fn from_json_map(fields: &Map<String, Value>) -> SchemaResult<Self> {
        let mut definition = Self::new();
        for (path, spec) in fields {
            definition.insert(path.clone(), parse_rule(path, spec)?);
        }
        Ok(definition)
    }
}

/// Declarative form of one rule.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RuleSpec {
    #[serde(rename = "type")]
    field_type: Value,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    not_null: bool,
    #[serde(default)]
    default: Option<Value>,
    #[serde(default)]
    trim: bool,
    #[serde(default)]
    lowercase: bool,
    #[serde(default, rename = "denyXSS")]
    deny_xss: bool,
    #[serde(default)]
    min_length: Option<usize>,
    #[serde(default)]
    max_length: Option<usize>,
}

fn parse_rule(path: &str, spec: &Value) -> SchemaResult<FieldRule> {
    if let Some(obj) = spec.as_object() {
        for key in ["validate", "transform"] {
            if obj.contains_key(key) {
                return Err(SchemaError::malformed_schema(
                    path,
                    format!("'{}' callbacks cannot be declared in JSON", key),
                ));
            }
        }
    }

    let spec: RuleSpec = serde_json::from_value(spec.clone())
        .map_err(|e| SchemaError::malformed_schema(path, e.to_string()))?;

    let mut rule = FieldRule::new(parse_type(path, &spec.field_type)?);
    rule.required = spec.required;
    rule.not_null = spec.not_null;
    rule.trim = spec.trim;
    rule.lowercase = spec.lowercase;
    rule.deny_xss = spec.deny_xss;
    rule.min_length = spec.min_length;
    rule.max_length = spec.max_length;
    if let Some(default) = spec.default {
        rule = rule.default_value(default);
    }
    Ok(rule)
}

fn parse_type(path: &str, spec: &Value) -> SchemaResult<FieldType> {
    match spec {
        Value::String(tag) => match tag.as_str() {
            "string" => Ok(FieldType::String),
            "number" => Ok(FieldType::Number),
            "boolean" => Ok(FieldType::Boolean),
            "date" => Ok(FieldType::Date),
            other => Err(SchemaError::malformed_schema(
                path,
                format!("unknown type '{}'", other),
            )),
        },
        Value::Object(obj) if obj.len() == 1 && obj.contains_key("array") => {
            let element = parse_element(path, &obj["array"])?;
            Ok(FieldType::Array(Box::new(element)))
        }
        _ => Err(SchemaError::malformed_schema(
            path,
            "type must be a type name or {\"array\": <element>}",
        )),
    }
}

fn parse_element(path: &str, spec: &Value) -> SchemaResult<ElementType> {
    match spec {
        Value::String(_) => Ok(ElementType::Type(parse_type(path, spec)?)),
        Value::Object(obj) if obj.len() == 1 && obj.contains_key("array") => {
            Ok(ElementType::Type(parse_type(path, spec)?))
        }
        Value::Object(obj) => Ok(ElementType::Schema(SchemaDefinition::from_json_map(obj)?)),
        _ => Err(SchemaError::malformed_schema(
            path,
            "array element must be a type name, an array descriptor or a field map",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::errors::SchemaErrorCode;
    use crate::schema::types;
    use serde_json::json;

    #[test]
    fn test_builder_keeps_declaration_order() {
        let def = SchemaDefinition::new()
            .field("b", FieldRule::new(types::string()))
            .field("a", FieldRule::new(types::number()))
            .field("c.d", FieldRule::new(types::boolean()));

        let paths: Vec<_> = def.iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["b", "a", "c.d"]);
    }

    #[test]
    fn test_parse_declarative_schema() {
        let def = SchemaDefinition::from_json(&json!({
            "account.name": {
                "type": "string",
                "required": true,
                "trim": true,
                "lowercase": true,
                "denyXSS": true,
                "minLength": 1,
                "maxLength": 20
            },
            "account.friends": { "type": { "array": "string" }, "notNull": true, "default": [] },
            "newsletter": { "type": "boolean", "default": true },
            "created": { "type": "date" }
        }))
        .unwrap();

        assert_eq!(def.len(), 4);
        let name = def.get("account.name").unwrap();
        assert!(name.required && name.trim && name.lowercase && name.deny_xss);
        assert_eq!(name.min_length, Some(1));
        assert_eq!(name.max_length, Some(20));

        let friends = def.get("account.friends").unwrap();
        assert!(friends.not_null);
        assert_eq!(friends.field_type.describe(), "array<string>");
        assert_eq!(friends.default.as_ref().unwrap().resolve(), json!([]));
    }

    #[test]
    fn test_parse_nested_arrays_of_documents() {
        let def = SchemaDefinition::from_json(&json!({
            "account.friends": {
                "type": { "array": {
                    "name": { "type": "string" },
                    "nicknames": { "type": { "array": {
                        "name": { "type": "string" },
                        "giver": { "type": { "array": { "name": { "type": "string" } } } }
                    } } }
                } }
            },
            "matrix": { "type": { "array": { "array": "number" } } }
        }))
        .unwrap();

        let friends = def.get("account.friends").unwrap();
        assert_eq!(friends.field_type.describe(), "array<object>");
        assert_eq!(
            def.get("matrix").unwrap().field_type.describe(),
            "array<array<number>>"
        );
    }

    #[test]
    fn test_parse_rejects_unknown_type_and_keys() {
        let err = SchemaDefinition::from_json(&json!({ "a": { "type": "uuid" } })).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::MalformedSchema);

        let err = SchemaDefinition::from_json(&json!({ "a": { "type": "string", "trimm": true } }))
            .unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::MalformedSchema);

        let err = SchemaDefinition::from_json(&json!({ "a": { "type": "string", "validate": "x" } }))
            .unwrap_err();
        assert!(err.message().contains("callbacks"));
    }

    #[test]
    fn test_update_attaches_callbacks() {
        let mut def =
            SchemaDefinition::from_json(&json!({ "name": { "type": "string" } })).unwrap();
        assert!(def.update("name", |rule| rule.validate(|v| v != "tim")));
        assert!(def.get("name").unwrap().has_validate());
        assert!(!def.update("missing", |rule| rule));
    }
}
