//! Diesel-backed MySQL driver adapter.

use crate::ddl::validate_identifier;
use crate::driver::{ColumnInfo, Driver, ExecResult};
use crate::StoreResult;
use diesel::mysql::MysqlConnection;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text, Unsigned};
use flexstore_core::{Record, Value};
use flexstore_error::{StoreError, StoreErrorKind};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, instrument};

/// Establish a connection to the MySQL database.
///
/// Reads the `DATABASE_URL` environment variable to determine the
/// connection string.
///
/// # Errors
///
/// Returns an error if:
/// - `DATABASE_URL` environment variable is not set
/// - Connection to the database fails
pub fn establish_connection() -> StoreResult<MysqlConnection> {
    let database_url = std::env::var("DATABASE_URL").map_err(|_| {
        StoreError::new(StoreErrorKind::Connection(
            "DATABASE_URL environment variable not set".to_string(),
        ))
    })?;

    MysqlConnection::establish(&database_url)
        .map_err(|e| StoreError::new(StoreErrorKind::Connection(e.to_string())))
}

/// [`Driver`] implementation over a shared diesel MySQL connection.
#[derive(Clone)]
pub struct MysqlDriver {
    connection: Arc<Mutex<MysqlConnection>>,
}

impl MysqlDriver {
    /// Wrap an existing shared connection.
    pub fn new(connection: Arc<Mutex<MysqlConnection>>) -> Self {
        Self { connection }
    }

    /// Connect using the `DATABASE_URL` environment variable.
    pub fn connect() -> StoreResult<Self> {
        Ok(Self::new(Arc::new(Mutex::new(establish_connection()?))))
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, MysqlConnection>> {
        self.connection
            .lock()
            .map_err(|e| StoreError::new(StoreErrorKind::Connection(e.to_string())))
    }
}

/// Render a value as a MySQL literal, quoting and escaping strings.
fn sql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Text(s) => quote_string(s),
        // The engine flattens structured values before the write; render
        // any stragglers as their JSON text form.
        Value::Structured(json) => quote_string(&json.to_string()),
    }
}

fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "''"))
}

/// Render a filter record as an AND-joined WHERE clause body.
fn where_clause(filter: &Record) -> StoreResult<String> {
    let mut parts = Vec::with_capacity(filter.len());
    for (name, value) in filter.iter() {
        validate_identifier(name)?;
        match value {
            Value::Null => parts.push(format!("`{}` IS NULL", name)),
            other => parts.push(format!("`{}` = {}", name, sql_literal(other))),
        }
    }
    Ok(parts.join(" AND "))
}

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

#[derive(QueryableByName)]
struct LastInsertIdRow {
    #[diesel(sql_type = Unsigned<BigInt>)]
    id: u64,
}

#[derive(QueryableByName)]
struct ColumnRow {
    #[diesel(sql_type = Text)]
    name: String,
    #[diesel(sql_type = Text)]
    data_type: String,
    #[diesel(sql_type = Text)]
    is_nullable: String,
    #[diesel(sql_type = diesel::sql_types::Nullable<Text>)]
    column_default: Option<String>,
}

impl Driver for MysqlDriver {
    #[instrument(skip(self, sql))]
    fn execute(&self, sql: &str) -> StoreResult<ExecResult> {
        debug!(sql = %sql, "Executing statement");
        let mut conn = self.lock()?;
        let rows = diesel::sql_query(sql).execute(&mut *conn)?;
        Ok(ExecResult::new(rows as u64, None))
    }

    #[instrument(skip(self, record), fields(field_count = record.len()))]
    fn insert(&self, table: &str, record: &Record) -> StoreResult<ExecResult> {
        validate_identifier(table)?;

        let mut columns = Vec::with_capacity(record.len());
        let mut values = Vec::with_capacity(record.len());
        for (name, value) in record.iter() {
            validate_identifier(name)?;
            columns.push(format!("`{}`", name));
            values.push(sql_literal(value));
        }

        let sql = format!(
            "INSERT INTO `{}` ({}) VALUES ({})",
            table,
            columns.join(", "),
            values.join(", ")
        );
        debug!(sql = %sql, "Inserting record");

        let mut conn = self.lock()?;
        let rows = diesel::sql_query(&sql).execute(&mut *conn)?;

        let assigned: LastInsertIdRow =
            diesel::sql_query("SELECT LAST_INSERT_ID() AS id").get_result(&mut *conn)?;
        let last_insert_id = (assigned.id != 0).then_some(assigned.id);

        Ok(ExecResult::new(rows as u64, last_insert_id))
    }

    #[instrument(skip(self, record, filter), fields(field_count = record.len()))]
    fn update(&self, table: &str, record: &Record, filter: &Record) -> StoreResult<u64> {
        validate_identifier(table)?;

        let mut assignments = Vec::with_capacity(record.len());
        for (name, value) in record.iter() {
            validate_identifier(name)?;
            assignments.push(format!("`{}` = {}", name, sql_literal(value)));
        }

        let mut sql = format!("UPDATE `{}` SET {}", table, assignments.join(", "));
        if !filter.is_empty() {
            sql.push_str(&format!(" WHERE {}", where_clause(filter)?));
        }
        debug!(sql = %sql, "Updating records");

        let mut conn = self.lock()?;
        let rows = diesel::sql_query(&sql).execute(&mut *conn)?;
        Ok(rows as u64)
    }

    #[instrument(skip(self))]
    fn table_exists(&self, table: &str) -> StoreResult<bool> {
        let mut conn = self.lock()?;
        let result: CountRow = diesel::sql_query(
            "SELECT COUNT(*) AS count FROM information_schema.tables \
             WHERE table_schema = DATABASE() AND table_name = ?",
        )
        .bind::<Text, _>(table)
        .get_result(&mut *conn)?;

        Ok(result.count > 0)
    }

    #[instrument(skip(self))]
    fn columns(&self, table: &str) -> StoreResult<Vec<ColumnInfo>> {
        let mut conn = self.lock()?;
        let rows: Vec<ColumnRow> = diesel::sql_query(
            "SELECT column_name AS name, data_type, is_nullable, column_default \
             FROM information_schema.columns \
             WHERE table_schema = DATABASE() AND table_name = ? \
             ORDER BY ordinal_position",
        )
        .bind::<Text, _>(table)
        .load(&mut *conn)?;

        if rows.is_empty() {
            return Err(StoreError::new(StoreErrorKind::TableNotFound(
                table.to_string(),
            )));
        }

        Ok(rows
            .into_iter()
            .map(|row| ColumnInfo {
                name: row.name,
                data_type: row.data_type,
                is_nullable: row.is_nullable == "YES",
                column_default: row.column_default,
            })
            .collect())
    }

    #[instrument(skip(self, filter))]
    fn count_rows(&self, table: &str, filter: &Record) -> StoreResult<i64> {
        validate_identifier(table)?;

        let mut sql = format!("SELECT COUNT(*) AS count FROM `{}`", table);
        if !filter.is_empty() {
            sql.push_str(&format!(" WHERE {}", where_clause(filter)?));
        }

        let mut conn = self.lock()?;
        let result: CountRow = diesel::sql_query(&sql).get_result(&mut *conn)?;
        Ok(result.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sql_literal_scalars() {
        assert_eq!(sql_literal(&Value::Null), "NULL");
        assert_eq!(sql_literal(&Value::Bool(true)), "1");
        assert_eq!(sql_literal(&Value::Bool(false)), "0");
        assert_eq!(sql_literal(&Value::Int(-3)), "-3");
        assert_eq!(sql_literal(&Value::Float(1.5)), "1.5");
    }

    #[test]
    fn test_sql_literal_escapes_strings() {
        let v = Value::Text("it's a \\ test".to_string());
        assert_eq!(sql_literal(&v), "'it''s a \\\\ test'");
    }

    #[test]
    fn test_sql_literal_structured_falls_back_to_json() {
        let v = Value::Structured(json!({"a": 1}));
        assert_eq!(sql_literal(&v), "'{\"a\":1}'");
    }

    #[test]
    fn test_where_clause() {
        let filter = Record::new().with("id", 4).with("name", "x");
        assert_eq!(where_clause(&filter).unwrap(), "`id` = 4 AND `name` = 'x'");
    }

    #[test]
    fn test_where_clause_null_uses_is_null() {
        let filter = Record::new().with("deleted_at", Value::Null);
        assert_eq!(where_clause(&filter).unwrap(), "`deleted_at` IS NULL");
    }

    #[test]
    fn test_where_clause_rejects_bad_identifier() {
        let filter = Record::new().with("id; --", 1);
        assert!(where_clause(&filter).is_err());
    }
}
