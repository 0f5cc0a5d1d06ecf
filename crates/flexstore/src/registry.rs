//! Cached schema metadata for one logical database connection.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, trace};

/// Process-local cache of schema facts observed from the driver.
///
/// Holds two caches: a positive-only set of table names known to exist, and
/// a per-table snapshot of known column names. Negative existence results
/// are never cached, so an out-of-band table creation is picked up by the
/// next probe. Column snapshots are evicted whenever this engine migrates
/// the table, keeping them a subset of the true schema at all times.
///
/// One registry is owned per [`FlexStore`](crate::FlexStore) instance and
/// torn down with it; both caches sit behind mutexes so concurrent callers
/// on the same store cannot corrupt them.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    tables: Mutex<HashSet<String>>,
    columns: Mutex<HashMap<String, HashSet<String>>>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the table has been observed to exist.
    ///
    /// `false` means "unknown", not "absent" — callers fall through to a
    /// fresh driver probe.
    pub fn table_known(&self, table: &str) -> bool {
        self.lock_tables().contains(table)
    }

    /// Record that a table exists.
    pub fn mark_table(&self, table: &str) {
        trace!(table, "Caching table existence");
        self.lock_tables().insert(table.to_string());
    }

    /// The cached column-name snapshot for a table, if one is held.
    pub fn columns(&self, table: &str) -> Option<HashSet<String>> {
        self.lock_columns().get(table).cloned()
    }

    /// Store a column-name snapshot for a table.
    pub fn store_columns(&self, table: &str, columns: HashSet<String>) {
        trace!(table, count = columns.len(), "Caching column names");
        self.lock_columns().insert(table.to_string(), columns);
    }

    /// Evict the column snapshot for a table.
    ///
    /// Called after every migration so the next lookup re-probes the driver
    /// and picks up the new columns.
    pub fn invalidate(&self, table: &str) {
        if self.lock_columns().remove(table).is_some() {
            debug!(table, "Evicted column cache entry");
        }
    }

    /// Forget everything known about a table, existence included.
    ///
    /// Used when a table is dropped through the engine.
    pub fn forget_table(&self, table: &str) {
        self.lock_tables().remove(table);
        self.lock_columns().remove(table);
        debug!(table, "Evicted all cached schema facts");
    }

    // A poisoned lock still guards structurally sound maps; recover the guard.
    fn lock_tables(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_columns(&self) -> std::sync::MutexGuard<'_, HashMap<String, HashSet<String>>> {
        self.columns.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existence_cache_is_positive_only() {
        let registry = SchemaRegistry::new();
        assert!(!registry.table_known("orders"));
        registry.mark_table("orders");
        assert!(registry.table_known("orders"));
    }

    #[test]
    fn test_column_snapshot_roundtrip() {
        let registry = SchemaRegistry::new();
        assert!(registry.columns("orders").is_none());

        let cols: HashSet<String> = ["id", "total"].iter().map(|s| s.to_string()).collect();
        registry.store_columns("orders", cols.clone());
        assert_eq!(registry.columns("orders"), Some(cols));
    }

    #[test]
    fn test_invalidate_evicts_columns_but_not_existence() {
        let registry = SchemaRegistry::new();
        registry.mark_table("orders");
        registry.store_columns("orders", HashSet::from(["id".to_string()]));

        registry.invalidate("orders");
        assert!(registry.columns("orders").is_none());
        assert!(registry.table_known("orders"));
    }

    #[test]
    fn test_forget_table_evicts_both() {
        let registry = SchemaRegistry::new();
        registry.mark_table("orders");
        registry.store_columns("orders", HashSet::from(["id".to_string()]));

        registry.forget_table("orders");
        assert!(!registry.table_known("orders"));
        assert!(registry.columns("orders").is_none());
    }
}
