//! The driver boundary consumed by the engine.

use crate::StoreResult;
use flexstore_core::Record;

/// Outcome of a write statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, derive_getters::Getters)]
pub struct ExecResult {
    /// Number of rows the statement touched.
    rows_affected: u64,
    /// Identifier assigned to an inserted row, when the driver reports one.
    last_insert_id: Option<u64>,
}

impl ExecResult {
    /// Create an execution result.
    pub fn new(rows_affected: u64, last_insert_id: Option<u64>) -> Self {
        Self {
            rows_affected,
            last_insert_id,
        }
    }
}

/// One column of a table as reported by the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// SQL data type as reported by the store.
    pub data_type: String,
    /// Whether the column accepts NULL.
    pub is_nullable: bool,
    /// Default value expression, if any.
    pub column_default: Option<String>,
}

/// Blocking SQL driver capability.
///
/// The engine reconciles records against the schema and then delegates all
/// statement execution to this trait. Implementations are expected to make
/// each call independently; the engine performs no locking around them.
pub trait Driver: Send + Sync {
    /// Execute a DDL or transaction-control statement.
    fn execute(&self, sql: &str) -> StoreResult<ExecResult>;

    /// Insert one record into a table, returning execution metadata.
    fn insert(&self, table: &str, record: &Record) -> StoreResult<ExecResult>;

    /// Update rows matching `filter`, returning the number of rows touched.
    ///
    /// Zero rows touched is a successful outcome, not an error.
    fn update(&self, table: &str, record: &Record, filter: &Record) -> StoreResult<u64>;

    /// Probe the store for the presence of a table.
    fn table_exists(&self, table: &str) -> StoreResult<bool>;

    /// Report the columns of a table in ordinal position order.
    fn columns(&self, table: &str) -> StoreResult<Vec<ColumnInfo>>;

    /// Count rows matching `filter`.
    fn count_rows(&self, table: &str, filter: &Record) -> StoreResult<i64>;
}
