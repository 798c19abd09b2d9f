//! Field type descriptors and the type registry
//!
//! Supported types:
//! - string: UTF-8 string, never coerced from other kinds
//! - number: JSON number, or a string holding exactly one finite number
//! - boolean: JSON boolean, or the strings "true" / "false"
//! - date: RFC 3339 string, `YYYY-MM-DD` string or epoch milliseconds,
//!   normalized to an RFC 3339 UTC string
//! - array: ordered sequence whose elements follow an element type or a
//!   nested schema definition

use std::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde_json::{Number, Value};
use thiserror::Error;

use super::definition::SchemaDefinition;

/// Type descriptor for a field.
#[derive(Debug, Clone)]
pub enum FieldType {
    /// UTF-8 string
    String,
    /// Integer or finite floating point number
    Number,
    /// Boolean
    Boolean,
    /// Point in time
    Date,
    /// Ordered sequence of elements
    Array(Box<ElementType>),
}

/// What each element of an array field must be.
#[derive(Debug, Clone)]
pub enum ElementType {
    /// A primitive or nested array type
    Type(FieldType),
    /// A sub-document governed by its own schema definition
    Schema(SchemaDefinition),
}

/// A value that cannot be coerced to the expected type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected}, got {found}")]
pub struct TypeMismatch {
    /// Expected type description
    pub expected: String,
    /// JSON kind actually found
    pub found: &'static str,
}

impl TypeMismatch {
    pub fn new(expected: impl Into<String>, found: &Value) -> Self {
        Self {
            expected: expected.into(),
            found: json_kind(found),
        }
    }
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Array(_) => "array",
        }
    }

    /// Full description including element types, e.g. `array<array<string>>`.
    pub fn describe(&self) -> String {
        match self {
            FieldType::Array(element) => format!("array<{}>", element.describe()),
            other => other.type_name().to_string(),
        }
    }

    /// Whether `minLength` / `maxLength` apply to this type.
    pub fn has_length(&self) -> bool {
        matches!(self, FieldType::String | FieldType::Array(_))
    }

    /// Structural equality of two descriptors, ignoring rule options
    /// attached to fields of nested schemas.
    pub fn same_shape(&self, other: &FieldType) -> bool {
        match (self, other) {
            (FieldType::Array(a), FieldType::Array(b)) => a.same_shape(b),
            (a, b) => a.type_name() == b.type_name(),
        }
    }

    /// Checks `value` against this type and returns its coerced form.
    ///
    /// For arrays only the container shape is checked here. Elements are
    /// coerced where possible and left untouched otherwise, so the walker
    /// can report each failing element at its own path.
    pub fn check_and_coerce(&self, value: &Value) -> Result<Value, TypeMismatch> {
        match self {
            FieldType::String => match value {
                Value::String(_) => Ok(value.clone()),
                _ => Err(TypeMismatch::new("string", value)),
            },
            FieldType::Number => match value {
                Value::Number(_) => Ok(value.clone()),
                Value::String(s) => {
                    parse_number(s.trim()).ok_or_else(|| TypeMismatch::new("number", value))
                }
                _ => Err(TypeMismatch::new("number", value)),
            },
            FieldType::Boolean => match value {
                Value::Bool(_) => Ok(value.clone()),
                Value::String(s) if s == "true" => Ok(Value::Bool(true)),
                Value::String(s) if s == "false" => Ok(Value::Bool(false)),
                _ => Err(TypeMismatch::new("boolean", value)),
            },
            FieldType::Date => parse_date(value)
                .map(|dt| Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)))
                .ok_or_else(|| TypeMismatch::new("date", value)),
            FieldType::Array(element) => {
                let items = value
                    .as_array()
                    .ok_or_else(|| TypeMismatch::new(self.describe(), value))?;
                let coerced = match element.as_ref() {
                    ElementType::Type(inner) => items
                        .iter()
                        .map(|item| inner.check_and_coerce(item).unwrap_or_else(|_| item.clone()))
                        .collect(),
                    ElementType::Schema(_) => items.clone(),
                };
                Ok(Value::Array(coerced))
            }
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

impl ElementType {
    pub fn describe(&self) -> String {
        match self {
            ElementType::Type(inner) => inner.describe(),
            ElementType::Schema(_) => "object".to_string(),
        }
    }

    pub fn same_shape(&self, other: &ElementType) -> bool {
        match (self, other) {
            (ElementType::Type(a), ElementType::Type(b)) => a.same_shape(b),
            (ElementType::Schema(a), ElementType::Schema(b)) => a.same_shape(b),
            _ => false,
        }
    }
}

/// Returns the JSON kind name for error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn parse_number(s: &str) -> Option<Value> {
    if s.is_empty() {
        return None;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::from(i));
    }
    let f = s.parse::<f64>().ok().filter(|f| f.is_finite())?;
    Number::from_f64(f).map(Value::Number)
}

fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            let day = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
            Some(Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0)?))
        }
        Value::Number(n) => Utc.timestamp_millis_opt(n.as_i64()?).single(),
        _ => None,
    }
}

/// `string` type
pub fn string() -> FieldType {
    FieldType::String
}

/// `number` type
pub fn number() -> FieldType {
    FieldType::Number
}

/// `boolean` type
pub fn boolean() -> FieldType {
    FieldType::Boolean
}

/// `date` type
pub fn date() -> FieldType {
    FieldType::Date
}

/// `array(T)` of a primitive or nested array type
pub fn array(element: FieldType) -> FieldType {
    FieldType::Array(Box::new(ElementType::Type(element)))
}

/// `array(schema)` of sub-documents
pub fn array_of(schema: SchemaDefinition) -> FieldType {
    FieldType::Array(Box::new(ElementType::Schema(schema)))
}
