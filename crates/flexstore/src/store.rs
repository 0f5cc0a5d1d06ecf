//! Record reconciliation against an evolving table schema.

use crate::ddl::{self, ColumnModel, TableOptions};
use crate::driver::{ColumnInfo, Driver};
use crate::infer::infer_type;
use crate::registry::SchemaRegistry;
use crate::StoreResult;
use flexstore_core::{Record, Value};
use flexstore_error::{StoreError, StoreErrorKind};
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

/// How a write treats fields that are not yet columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum WriteMode {
    /// Auto-create missing tables and columns to match the record.
    #[display("elastic")]
    Elastic,
    /// Drop unknown fields; never modify the schema.
    #[display("restricted")]
    Restricted,
}

/// Schema-on-write access layer over a [`Driver`].
///
/// Owns the schema metadata caches for one logical connection and reconciles
/// each incoming record against the evolving table schema before delegating
/// the actual write to the driver.
#[derive(Debug, derive_getters::Getters)]
pub struct FlexStore<D> {
    driver: D,
    registry: SchemaRegistry,
    options: TableOptions,
}

impl<D: Driver> FlexStore<D> {
    /// Create a store with default table options.
    pub fn new(driver: D) -> Self {
        Self::with_options(driver, TableOptions::default())
    }

    /// Create a store with explicit storage engine and charset options.
    pub fn with_options(driver: D, options: TableOptions) -> Self {
        Self {
            driver,
            registry: SchemaRegistry::new(),
            options,
        }
    }

    /// Whether a table exists, consulting the positive cache first.
    ///
    /// A failed driver probe is treated as "does not exist": the follow-up
    /// creation is `IF NOT EXISTS` and therefore harmless if the probe was
    /// wrong.
    #[instrument(skip(self))]
    pub fn exists(&self, table: &str) -> StoreResult<bool> {
        ddl::validate_identifier(table)?;

        if self.registry.table_known(table) {
            return Ok(true);
        }

        match self.driver.table_exists(table) {
            Ok(true) => {
                self.registry.mark_table(table);
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(e) => {
                warn!(error = %e, table, "Existence probe failed, treating table as absent");
                Ok(false)
            }
        }
    }

    /// The set of column names known for a table.
    ///
    /// Cached per table until the next migration. A failed probe yields an
    /// empty set, which restricted-mode writes degrade on gracefully.
    #[instrument(skip(self))]
    pub fn fields(&self, table: &str) -> StoreResult<HashSet<String>> {
        ddl::validate_identifier(table)?;

        if let Some(cached) = self.registry.columns(table) {
            return Ok(cached);
        }

        let names: HashSet<String> = match self.driver.columns(table) {
            Ok(columns) => columns.into_iter().map(|c| c.name).collect(),
            Err(e) => {
                warn!(error = %e, table, "Column probe failed, treating schema as empty");
                return Ok(HashSet::new());
            }
        };

        // An empty snapshot usually means the table is missing; caching it
        // would go stale the moment the table is created.
        if !names.is_empty() {
            self.registry.store_columns(table, names.clone());
        }

        Ok(names)
    }

    /// Create a table whose columns are inferred from a sample record.
    ///
    /// Idempotent: the generated statement is `CREATE TABLE IF NOT EXISTS`.
    #[instrument(skip(self, sample), fields(field_count = sample.len()))]
    pub fn create(&self, table: &str, sample: &Record) -> StoreResult<()> {
        let sql = ddl::create_table_sql(table, sample, &self.options)?;
        debug!(sql = %sql, "Creating table");
        self.driver.execute(&sql)?;
        self.registry.mark_table(table);
        info!(table, columns = sample.len(), "Created table from sample record");
        Ok(())
    }

    /// Create a table from explicit column definitions.
    #[instrument(skip(self, columns), fields(column_count = columns.len()))]
    pub fn model(&self, table: &str, columns: &[ColumnModel]) -> StoreResult<()> {
        let sql = ddl::model_table_sql(table, columns, &self.options)?;
        debug!(sql = %sql, "Creating modeled table");
        self.driver.execute(&sql)?;
        self.registry.mark_table(table);
        info!(table, columns = columns.len(), "Created table from explicit model");
        Ok(())
    }

    /// Add columns to an existing table, one per field in `additions`.
    ///
    /// Column types are inferred from the sample values. Each addition is
    /// executed independently: a failure is recorded and the remaining
    /// fields still run, and already-applied columns are not rolled back.
    /// A duplicate-column error means a concurrent caller migrated the same
    /// field first and is not treated as a failure. The table's column
    /// cache entry is evicted in every outcome.
    #[instrument(skip(self, additions), fields(field_count = additions.len()))]
    pub fn add_columns(&self, table: &str, additions: &Record) -> StoreResult<()> {
        let mut failures = Vec::new();

        for (name, value) in additions.iter() {
            let expr = match infer_type(value, true) {
                Ok(expr) => expr,
                Err(_) => {
                    failures.push(format!("undetermined type for field '{}'", name));
                    continue;
                }
            };

            let sql = match ddl::add_column_sql(table, name, &expr) {
                Ok(sql) => sql,
                Err(e) => {
                    failures.push(format!("{}: {}", name, e.kind));
                    continue;
                }
            };

            debug!(sql = %sql, "Adding column");
            match self.driver.execute(&sql) {
                Ok(_) => info!(table, column = name, "Added column"),
                Err(e) if is_duplicate_column(&e) => {
                    debug!(table, column = name, "Column already added concurrently");
                }
                Err(e) => failures.push(format!("{}: {}", name, e.kind)),
            }
        }

        self.registry.invalidate(table);

        if failures.is_empty() {
            Ok(())
        } else {
            Err(StoreError::new(StoreErrorKind::Migration(
                failures.join("; "),
            )))
        }
    }

    /// Insert a record, reconciling the schema first.
    ///
    /// In [`WriteMode::Elastic`] the table is created from the record if
    /// missing, and fields without a matching column are migrated in. In
    /// [`WriteMode::Restricted`] the record is projected down to existing
    /// columns; when nothing survives the projection the write is skipped
    /// and `Ok(None)` returned. Structured values are serialized to JSON
    /// text immediately before the write in both modes.
    ///
    /// Returns the identifier the store assigned to the new row, when the
    /// driver reports one.
    #[instrument(skip(self, record), fields(field_count = record.len(), mode = %mode))]
    pub fn insert(
        &self,
        table: &str,
        record: &Record,
        mode: WriteMode,
    ) -> StoreResult<Option<u64>> {
        let record = match mode {
            WriteMode::Elastic => {
                self.reconcile(table, record)?;
                record.serialize_structured()?
            }
            WriteMode::Restricted => {
                let flattened = record.serialize_structured()?;
                let projected = self.project(table, &flattened)?;
                if projected.is_empty() {
                    warn!(table, "No record fields match existing columns, skipping insert");
                    return Ok(None);
                }
                projected
            }
        };

        let result = self.driver.insert(table, &record)?;
        debug!(table, id = ?result.last_insert_id(), "Inserted record");
        Ok(*result.last_insert_id())
    }

    /// Update rows matching `filter`, reconciling the schema first.
    ///
    /// Mirrors [`FlexStore::insert`], with two differences: an elastic
    /// update against a nonexistent table writes nothing and returns
    /// `Ok(false)`, and the result is a success flag rather than an
    /// identifier. Zero rows affected still counts as success.
    #[instrument(skip(self, record, filter), fields(field_count = record.len(), mode = %mode))]
    pub fn update(
        &self,
        table: &str,
        record: &Record,
        filter: &Record,
        mode: WriteMode,
    ) -> StoreResult<bool> {
        let record = match mode {
            WriteMode::Elastic => {
                if !self.exists(table)? {
                    debug!(table, "Table does not exist, nothing to update");
                    return Ok(false);
                }
                self.reconcile(table, record)?;
                record.serialize_structured()?
            }
            WriteMode::Restricted => {
                let flattened = record.serialize_structured()?;
                let projected = self.project(table, &flattened)?;
                if projected.is_empty() {
                    warn!(table, "No record fields match existing columns, skipping update");
                    return Ok(false);
                }
                projected
            }
        };

        self.driver.update(table, &record, filter)?;
        Ok(true)
    }

    /// Project a record down to fields that are already columns.
    ///
    /// Fields without a matching column are dropped; columns without a
    /// matching field are omitted rather than set to NULL. Record field
    /// order is preserved. The result may be empty and callers must handle
    /// that (typically by skipping the write).
    pub fn project(&self, table: &str, record: &Record) -> StoreResult<Record> {
        let known = self.fields(table)?;
        Ok(record
            .iter()
            .filter(|(name, _)| known.contains(*name))
            .map(|(name, value)| (name, value.clone()))
            .collect())
    }

    /// Column metadata for a table, optionally narrowed to one field.
    #[instrument(skip(self))]
    pub fn show(&self, table: &str, field: Option<&str>) -> StoreResult<Vec<ColumnInfo>> {
        ddl::validate_identifier(table)?;
        let mut columns = self.driver.columns(table)?;
        if let Some(field) = field {
            columns.retain(|c| c.name == field);
        }
        Ok(columns)
    }

    /// Drop one column from a table and evict its cached schema snapshot.
    #[instrument(skip(self))]
    pub fn drop_column(&self, table: &str, field: &str) -> StoreResult<()> {
        ddl::validate_identifier(table)?;
        ddl::validate_identifier(field)?;
        self.driver
            .execute(&format!("ALTER TABLE `{}` DROP `{}`", table, field))?;
        self.registry.invalidate(table);
        info!(table, column = field, "Dropped column");
        Ok(())
    }

    /// Drop a table and forget everything cached about it.
    #[instrument(skip(self))]
    pub fn drop_table(&self, table: &str) -> StoreResult<()> {
        ddl::validate_identifier(table)?;
        self.driver.execute(&format!("DROP TABLE `{}`", table))?;
        self.registry.forget_table(table);
        info!(table, "Dropped table");
        Ok(())
    }

    /// Start a transaction on the underlying connection.
    pub fn begin(&self) -> StoreResult<()> {
        self.driver.execute("START TRANSACTION")?;
        Ok(())
    }

    /// Commit the current transaction.
    pub fn commit(&self) -> StoreResult<()> {
        self.driver.execute("COMMIT")?;
        Ok(())
    }

    /// Roll back the current transaction.
    pub fn rollback(&self) -> StoreResult<()> {
        self.driver.execute("ROLLBACK")?;
        Ok(())
    }

    /// Whether a row with the given primary key value exists.
    pub fn row_exists(&self, table: &str, id: impl Into<Value>) -> StoreResult<bool> {
        let filter = Record::new().with(ddl::PRIMARY_KEY, id);
        self.row_exists_where(table, &filter)
    }

    /// Whether at least one row matches the filter record.
    #[instrument(skip(self, filter))]
    pub fn row_exists_where(&self, table: &str, filter: &Record) -> StoreResult<bool> {
        ddl::validate_identifier(table)?;
        Ok(self.driver.count_rows(table, filter)? > 0)
    }

    /// Bring the table's schema in line with the record: create the table
    /// if it is missing, otherwise migrate in any fields it does not have.
    fn reconcile(&self, table: &str, record: &Record) -> StoreResult<()> {
        if !self.exists(table)? {
            return self.create(table, record);
        }

        let known = self.fields(table)?;
        let missing: Record = record
            .iter()
            .filter(|(name, _)| !known.contains(*name))
            .map(|(name, value)| (name, value.clone()))
            .collect();

        if !missing.is_empty() {
            debug!(table, count = missing.len(), "Migrating missing columns");
            self.add_columns(table, &missing)?;
        }

        Ok(())
    }
}

/// Whether a driver error reports an already-existing column.
///
/// MySQL raises error 1060 ("Duplicate column name") when two callers race
/// to migrate the same field; the column the caller wanted now exists, so
/// the outcome is the desired one.
fn is_duplicate_column(error: &StoreError) -> bool {
    match &error.kind {
        StoreErrorKind::Query(msg) => msg.contains("Duplicate column"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_duplicate_column() {
        let dup = StoreError::new(StoreErrorKind::Query(
            "Duplicate column name 'qty'".to_string(),
        ));
        assert!(is_duplicate_column(&dup));

        let other = StoreError::new(StoreErrorKind::Query("syntax error".to_string()));
        assert!(!is_duplicate_column(&other));

        let migration = StoreError::new(StoreErrorKind::Migration("Duplicate column".to_string()));
        assert!(!is_duplicate_column(&migration));
    }

    #[test]
    fn test_write_mode_display() {
        assert_eq!(WriteMode::Elastic.to_string(), "elastic");
        assert_eq!(WriteMode::Restricted.to_string(), "restricted");
    }
}
