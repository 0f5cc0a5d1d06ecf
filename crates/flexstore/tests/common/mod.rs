//! In-memory mock driver for exercising the reconciler without a database.

// Not every test binary touches every helper.
#![allow(dead_code)]

use flexstore::{ColumnInfo, Driver, ExecResult, Record, StoreError, StoreErrorKind, StoreResult};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, Once, PoisonError};

static INIT: Once = Once::new();

/// Route engine logs through the test writer, honoring `RUST_LOG`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

#[derive(Default)]
struct State {
    tables: HashMap<String, Vec<String>>,
    executed: Vec<String>,
    inserted: Vec<(String, Record)>,
    updated: Vec<(String, Record, Record)>,
    probes: usize,
    next_id: u64,
    matching_rows: i64,
    fail_probes: bool,
    duplicate_columns: Vec<String>,
    failing_columns: Vec<String>,
}

/// A driver that applies DDL to an in-memory schema and records every call.
#[derive(Default)]
pub struct MockDriver {
    state: Mutex<State>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing table with the given column names.
    pub fn with_table(self, table: &str, columns: &[&str]) -> Self {
        self.lock().tables.insert(
            table.to_string(),
            columns.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    /// Make every schema probe fail with a connection-style error.
    pub fn failing_probes(self) -> Self {
        self.lock().fail_probes = true;
        self
    }

    /// Make adding the named column fail as a duplicate.
    pub fn with_duplicate_column(self, column: &str) -> Self {
        self.lock().duplicate_columns.push(column.to_string());
        self
    }

    /// Make adding the named column fail outright.
    pub fn with_failing_column(self, column: &str) -> Self {
        self.lock().failing_columns.push(column.to_string());
        self
    }

    /// Fix the row count reported for filtered lookups.
    pub fn with_matching_rows(self, rows: i64) -> Self {
        self.lock().matching_rows = rows;
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.lock().executed.clone()
    }

    pub fn inserted(&self) -> Vec<(String, Record)> {
        self.lock().inserted.clone()
    }

    pub fn updated(&self) -> Vec<(String, Record, Record)> {
        self.lock().updated.clone()
    }

    pub fn probes(&self) -> usize {
        self.lock().probes
    }

    pub fn column_names(&self, table: &str) -> Option<Vec<String>> {
        self.lock().tables.get(table).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Identifier segments of a statement, in backtick order.
fn backtick_segments(sql: &str) -> Vec<String> {
    sql.split('`')
        .enumerate()
        .filter(|(i, _)| i % 2 == 1)
        .map(|(_, s)| s.to_string())
        .collect()
}

impl Driver for MockDriver {
    fn execute(&self, sql: &str) -> StoreResult<ExecResult> {
        let mut state = self.lock();
        state.executed.push(sql.to_string());

        let idents = backtick_segments(sql);

        if sql.starts_with("CREATE TABLE IF NOT EXISTS") {
            let table = idents[0].clone();
            let mut columns = Vec::new();
            for ident in &idents[1..] {
                if !columns.contains(ident) {
                    columns.push(ident.clone());
                }
            }
            state.tables.entry(table).or_insert(columns);
        } else if sql.starts_with("ALTER TABLE") && sql.contains(" ADD ") {
            let table = idents[0].clone();
            let column = idents[1].clone();
            if state.duplicate_columns.contains(&column) {
                return Err(StoreError::new(StoreErrorKind::Query(format!(
                    "Duplicate column name '{}'",
                    column
                ))));
            }
            if state.failing_columns.contains(&column) {
                return Err(StoreError::new(StoreErrorKind::Query(format!(
                    "Row size too large adding '{}'",
                    column
                ))));
            }
            state.tables.entry(table).or_default().push(column);
        } else if sql.starts_with("ALTER TABLE") && sql.contains(" DROP ") {
            let table = idents[0].clone();
            let column = idents[1].clone();
            if let Some(columns) = state.tables.get_mut(&table) {
                columns.retain(|c| *c != column);
            }
        } else if sql.starts_with("DROP TABLE") {
            let table = idents[0].clone();
            state.tables.remove(&table);
        }

        Ok(ExecResult::new(0, None))
    }

    fn insert(&self, table: &str, record: &Record) -> StoreResult<ExecResult> {
        let mut state = self.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.inserted.push((table.to_string(), record.clone()));
        Ok(ExecResult::new(1, Some(id)))
    }

    fn update(&self, table: &str, record: &Record, filter: &Record) -> StoreResult<u64> {
        let mut state = self.lock();
        let rows = state.matching_rows.max(0) as u64;
        state
            .updated
            .push((table.to_string(), record.clone(), filter.clone()));
        Ok(rows)
    }

    fn table_exists(&self, table: &str) -> StoreResult<bool> {
        let mut state = self.lock();
        state.probes += 1;
        if state.fail_probes {
            return Err(StoreError::new(StoreErrorKind::Connection(
                "connection refused".to_string(),
            )));
        }
        Ok(state.tables.contains_key(table))
    }

    fn columns(&self, table: &str) -> StoreResult<Vec<ColumnInfo>> {
        let mut state = self.lock();
        state.probes += 1;
        if state.fail_probes {
            return Err(StoreError::new(StoreErrorKind::Connection(
                "connection refused".to_string(),
            )));
        }
        let columns = state
            .tables
            .get(table)
            .ok_or_else(|| StoreError::new(StoreErrorKind::TableNotFound(table.to_string())))?;
        Ok(columns
            .iter()
            .map(|name| ColumnInfo {
                name: name.clone(),
                data_type: "varchar".to_string(),
                is_nullable: true,
                column_default: None,
            })
            .collect())
    }

    fn count_rows(&self, _table: &str, _filter: &Record) -> StoreResult<i64> {
        Ok(self.lock().matching_rows)
    }
}
