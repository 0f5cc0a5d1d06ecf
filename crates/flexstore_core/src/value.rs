//! Loosely typed field values.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A field value as supplied by a caller.
///
/// The engine infers SQL column types from these variants, so callers tag
/// the shape of each value explicitly rather than relying on runtime probing.
///
/// # Examples
///
/// ```
/// use flexstore_core::Value;
///
/// let total: Value = 19.99.into();
/// let note: Value = "ok".into();
/// let missing = Value::Null;
///
/// assert!(missing.is_null());
/// assert!(!note.is_null());
/// assert_eq!(total, Value::Float(19.99));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent value. Carries no type information of its own.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// String value. May still classify as numeric during type inference.
    Text(String),
    /// Nested array or object. Serialized to JSON text before storage.
    Structured(JsonValue),
}

impl Value {
    /// Whether this value is the null variant.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this value is a nested array or object.
    pub fn is_structured(&self) -> bool {
        matches!(self, Value::Structured(_))
    }

    /// Render the structured variant to its JSON string form.
    ///
    /// Returns `None` for every other variant.
    pub fn structured_to_text(&self) -> Option<Result<String, serde_json::Error>> {
        match self {
            Value::Structured(json) => Some(serde_json::to_string(json)),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            JsonValue::String(s) => Value::Text(s),
            nested @ (JsonValue::Array(_) | JsonValue::Object(_)) => Value::Structured(nested),
        }
    }
}
