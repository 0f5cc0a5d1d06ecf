//! Column type inference from sample values.
//!
//! Given one field value, derives the SQL column type the engine will use
//! when creating or migrating a table. Numeric classification runs before
//! the string branch so that numeric strings such as `"5"` map to `INT`
//! rather than `VARCHAR`.

use crate::StoreResult;
use flexstore_core::Value;
use flexstore_error::{StoreError, StoreErrorKind};

/// Display width for INT columns.
pub const INT_DISPLAY_WIDTH: u32 = 11;
/// Display width for FLOAT columns.
pub const FLOAT_DISPLAY_WIDTH: u32 = 11;
/// Maximum byte length stored in a VARCHAR column before falling back to TEXT.
pub const VARCHAR_LENGTH: u32 = 255;

/// SQL column type inferred from a sample value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ColumnType {
    /// Integer column with the fixed display width.
    #[display("INT({})", INT_DISPLAY_WIDTH)]
    Int,
    /// Floating point column with the fixed display width.
    #[display("FLOAT({})", FLOAT_DISPLAY_WIDTH)]
    Float,
    /// Boolean column.
    #[display("BOOL")]
    Bool,
    /// Bounded string column.
    #[display("VARCHAR({})", _0)]
    Varchar(u32),
    /// Unbounded text column. Also used for serialized structured values.
    #[display("TEXT")]
    Text,
}

/// A column type expression: type keyword plus nullability clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display, derive_getters::Getters)]
#[display("{} {}", column_type, if *nullable { "NULL" } else { "NOT NULL" })]
pub struct TypeExpr {
    /// The inferred column type.
    column_type: ColumnType,
    /// Whether the column accepts NULL.
    nullable: bool,
}

impl TypeExpr {
    /// Create a type expression.
    pub fn new(column_type: ColumnType, nullable: bool) -> Self {
        Self {
            column_type,
            nullable,
        }
    }
}

/// Infer the SQL column type for a sample value.
///
/// Classification order: numeric (integers, floats, and strings that parse
/// fully as a number), then boolean, then structured values (stored as
/// serialized TEXT), then strings by byte length. A float whose value equals
/// its integer truncation classifies as `INT`.
///
/// # Errors
///
/// Returns a `TypeInference` error for [`Value::Null`] — a null sample
/// carries no type information, and silently defaulting would hide the gap
/// from the caller.
///
/// # Examples
///
/// ```
/// use flexstore::{ColumnType, Value, infer_type};
///
/// let expr = infer_type(&Value::Text("5".to_string()), true).unwrap();
/// assert_eq!(*expr.column_type(), ColumnType::Int);
/// assert_eq!(expr.to_string(), "INT(11) NULL");
/// ```
pub fn infer_type(value: &Value, nullable: bool) -> StoreResult<TypeExpr> {
    let column_type = match value {
        Value::Int(_) => ColumnType::Int,
        Value::Float(f) => numeric_type(*f),
        Value::Bool(_) => ColumnType::Bool,
        Value::Structured(_) => ColumnType::Text,
        Value::Text(s) => match parse_numeric(s) {
            Some(f) => numeric_type(f),
            None if s.len() <= VARCHAR_LENGTH as usize => ColumnType::Varchar(VARCHAR_LENGTH),
            None => ColumnType::Text,
        },
        Value::Null => {
            return Err(StoreError::new(StoreErrorKind::TypeInference(
                "cannot infer a column type from a null value".to_string(),
            )));
        }
    };

    Ok(TypeExpr::new(column_type, nullable))
}

/// INT when the value survives integer truncation, FLOAT otherwise.
fn numeric_type(f: f64) -> ColumnType {
    if f != f.trunc() {
        ColumnType::Float
    } else {
        ColumnType::Int
    }
}

/// Parse a string that is a number in its entirety, rejecting the
/// non-finite spellings (`inf`, `NaN`) that `f64` would otherwise accept.
fn parse_numeric(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|f| f.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_int() {
        let expr = infer_type(&Value::Int(42), true).unwrap();
        assert_eq!(*expr.column_type(), ColumnType::Int);
        assert_eq!(expr.to_string(), "INT(11) NULL");
    }

    #[test]
    fn test_infer_float() {
        let expr = infer_type(&Value::Float(19.99), true).unwrap();
        assert_eq!(*expr.column_type(), ColumnType::Float);
        assert_eq!(expr.to_string(), "FLOAT(11) NULL");
    }

    #[test]
    fn test_whole_float_is_int() {
        let expr = infer_type(&Value::Float(3.0), true).unwrap();
        assert_eq!(*expr.column_type(), ColumnType::Int);
    }

    #[test]
    fn test_numeric_string_precedence() {
        let expr = infer_type(&Value::Text("5".to_string()), true).unwrap();
        assert_eq!(*expr.column_type(), ColumnType::Int);

        let expr = infer_type(&Value::Text("5.5".to_string()), true).unwrap();
        assert_eq!(*expr.column_type(), ColumnType::Float);
    }

    #[test]
    fn test_partial_numeric_string_is_varchar() {
        let expr = infer_type(&Value::Text("5 apples".to_string()), true).unwrap();
        assert_eq!(*expr.column_type(), ColumnType::Varchar(255));
    }

    #[test]
    fn test_non_finite_string_is_varchar() {
        let expr = infer_type(&Value::Text("inf".to_string()), true).unwrap();
        assert_eq!(*expr.column_type(), ColumnType::Varchar(255));
        let expr = infer_type(&Value::Text("NaN".to_string()), true).unwrap();
        assert_eq!(*expr.column_type(), ColumnType::Varchar(255));
    }

    #[test]
    fn test_bool() {
        let expr = infer_type(&Value::Bool(true), true).unwrap();
        assert_eq!(*expr.column_type(), ColumnType::Bool);
        assert_eq!(expr.to_string(), "BOOL NULL");
    }

    #[test]
    fn test_structured_is_text() {
        let value = Value::Structured(serde_json::json!({"a": [1, 2]}));
        let expr = infer_type(&value, true).unwrap();
        assert_eq!(*expr.column_type(), ColumnType::Text);
    }

    #[test]
    fn test_string_length_boundary() {
        let short = "x".repeat(255);
        let expr = infer_type(&Value::Text(short), true).unwrap();
        assert_eq!(*expr.column_type(), ColumnType::Varchar(255));

        let long = "x".repeat(256);
        let expr = infer_type(&Value::Text(long), true).unwrap();
        assert_eq!(*expr.column_type(), ColumnType::Text);
    }

    #[test]
    fn test_not_null_clause() {
        let expr = infer_type(&Value::Int(1), false).unwrap();
        assert_eq!(expr.to_string(), "INT(11) NOT NULL");
    }

    #[test]
    fn test_null_value_is_undetermined() {
        let err = infer_type(&Value::Null, true).unwrap_err();
        assert!(matches!(err.kind, StoreErrorKind::TypeInference(_)));
    }
}
