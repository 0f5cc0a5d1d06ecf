//! DDL statement builders for table creation and column migration.

use crate::infer::{INT_DISPLAY_WIDTH, TypeExpr, infer_type};
use crate::StoreResult;
use flexstore_core::Record;
use flexstore_error::{StoreError, StoreErrorKind};

/// Name of the auto-incrementing primary key column added to every table.
pub const PRIMARY_KEY: &str = "id";

/// Storage options applied to created tables.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct TableOptions {
    /// MySQL storage engine.
    engine: String,
    /// Table character set.
    charset: String,
}

impl TableOptions {
    /// Create options with an explicit engine and character set.
    pub fn new(engine: impl Into<String>, charset: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            charset: charset.into(),
        }
    }
}

impl Default for TableOptions {
    fn default() -> Self {
        Self::new("MyISAM", "utf8")
    }
}

/// Explicit column definition for [`model_table_sql`].
///
/// Used when the caller supplies the schema up front instead of letting the
/// engine infer it from sample values.
///
/// # Examples
///
/// ```
/// use flexstore::ColumnModelBuilder;
///
/// let column = ColumnModelBuilder::default()
///     .name("name")
///     .sql_type("VARCHAR")
///     .length(100u32)
///     .null(false)
///     .build()
///     .unwrap();
/// assert_eq!(column.name, "name");
/// ```
#[derive(Debug, Clone, PartialEq, derive_builder::Builder)]
#[builder(setter(into), pattern = "owned")]
pub struct ColumnModel {
    /// Column name.
    pub name: String,
    /// SQL type keyword (e.g. `INT`, `VARCHAR`).
    pub sql_type: String,
    /// Length or display width.
    #[builder(setter(strip_option), default)]
    pub length: Option<u32>,
    /// Type attribute (e.g. `unsigned`).
    #[builder(setter(strip_option), default)]
    pub attribute: Option<String>,
    /// Default value expression. Takes precedence over `null`.
    #[builder(setter(strip_option), default)]
    pub default_value: Option<String>,
    /// Explicit nullability. Ignored when a default value is given.
    #[builder(setter(strip_option), default)]
    pub null: Option<bool>,
    /// Trailing attributes (e.g. `auto_increment`).
    #[builder(setter(strip_option), default)]
    pub extra: Option<String>,
}

/// Validate a table or column name: alphanumeric and underscores only.
pub(crate) fn validate_identifier(name: &str) -> StoreResult<()> {
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(StoreError::new(StoreErrorKind::InvalidIdentifier(
            name.to_string(),
        )));
    }
    Ok(())
}

/// The primary key column definition shared by both creation paths.
fn primary_key_column() -> String {
    format!(
        "`{}` int({}) unsigned NOT NULL auto_increment",
        PRIMARY_KEY, INT_DISPLAY_WIDTH
    )
}

/// Build a `CREATE TABLE IF NOT EXISTS` statement from a sample record.
///
/// Every field except one literally named [`PRIMARY_KEY`] becomes a column
/// whose type is inferred from the field's value, in record order. The
/// statement carries an auto-incrementing unsigned primary key and the
/// engine/charset from `options`.
///
/// # Errors
///
/// Returns `TypeInference` naming the field when a value's type cannot be
/// classified, and `InvalidIdentifier` for unusable table or field names.
pub fn create_table_sql(
    table: &str,
    sample: &Record,
    options: &TableOptions,
) -> StoreResult<String> {
    validate_identifier(table)?;

    let mut columns = vec![primary_key_column()];

    for (name, value) in sample.iter() {
        if name == PRIMARY_KEY {
            continue;
        }
        validate_identifier(name)?;
        let expr = infer_type(value, true).map_err(|_| {
            StoreError::new(StoreErrorKind::TypeInference(format!(
                "undetermined type for field '{}'",
                name
            )))
        })?;
        columns.push(format!("`{}` {}", name, expr));
    }

    columns.push(format!("PRIMARY KEY (`{}`)", PRIMARY_KEY));

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS `{}` ({}) ENGINE={} DEFAULT CHARSET={}",
        table,
        columns.join(", "),
        options.engine(),
        options.charset()
    ))
}

/// Build a `CREATE TABLE IF NOT EXISTS` statement from explicit columns.
///
/// The caller controls type, length, attributes, default and nullability per
/// field. A field named [`PRIMARY_KEY`] is skipped; the generated primary
/// key column takes its place. A default-value clause suppresses the
/// nullability clause for that field.
pub fn model_table_sql(
    table: &str,
    columns: &[ColumnModel],
    options: &TableOptions,
) -> StoreResult<String> {
    validate_identifier(table)?;

    let mut defs = vec![primary_key_column()];

    for column in columns {
        if column.name == PRIMARY_KEY {
            continue;
        }
        validate_identifier(&column.name)?;

        let mut def = format!("`{}` {}", column.name, column.sql_type);
        if let Some(length) = column.length {
            def.push_str(&format!("({})", length));
        }
        if let Some(attribute) = &column.attribute {
            def.push_str(&format!(" {}", attribute));
        }
        if let Some(default) = &column.default_value {
            def.push_str(&format!(" DEFAULT {}", default));
        } else if let Some(null) = column.null {
            def.push_str(if null { " DEFAULT NULL" } else { " NOT NULL" });
        }
        if let Some(extra) = &column.extra {
            def.push_str(&format!(" {}", extra));
        }
        defs.push(def);
    }

    defs.push(format!("PRIMARY KEY (`{}`)", PRIMARY_KEY));

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS `{}` ({}) ENGINE={} DEFAULT CHARSET={}",
        table,
        defs.join(", "),
        options.engine(),
        options.charset()
    ))
}

/// Build an `ALTER TABLE ... ADD` statement for one column.
pub fn add_column_sql(table: &str, field: &str, expr: &TypeExpr) -> StoreResult<String> {
    validate_identifier(table)?;
    validate_identifier(field)?;
    Ok(format!("ALTER TABLE `{}` ADD `{}` {}", table, field, expr))
}
