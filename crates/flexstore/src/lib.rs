//! Schema-on-write record persistence.
//!
//! Callers hand this crate loosely typed records (field-name to value
//! mappings) and it persists them into a relational store, creating tables
//! and columns that do not yet exist and inferring SQL column types from the
//! runtime shape of sample values.
//!
//! # Write modes
//!
//! - **Elastic** — missing tables are created from the record and missing
//!   columns are added before the write, so the schema follows the data.
//! - **Restricted** — the record is projected down to columns that already
//!   exist; unknown fields are dropped and the schema is never modified.
//!
//! # Example
//!
//! ```rust,ignore
//! use flexstore::{FlexStore, MysqlDriver, Record, WriteMode};
//!
//! let store = FlexStore::new(MysqlDriver::connect()?);
//! let order = Record::new().with("total", 19.99).with("note", "ok");
//!
//! // Creates the `orders` table on first use, with FLOAT and VARCHAR
//! // columns inferred from the sample values.
//! let id = store.insert("orders", &order, WriteMode::Elastic)?;
//! ```

mod ddl;
mod driver;
mod infer;
#[cfg(feature = "mysql")]
mod mysql;
mod registry;
mod store;

pub use ddl::{ColumnModel, ColumnModelBuilder, TableOptions};
pub use driver::{ColumnInfo, Driver, ExecResult};
pub use infer::{ColumnType, TypeExpr, infer_type};
#[cfg(feature = "mysql")]
pub use mysql::{MysqlDriver, establish_connection};
pub use registry::SchemaRegistry;
pub use store::{FlexStore, WriteMode};

// Re-export the caller-facing data types and errors.
pub use flexstore_core::{Record, Value};
pub use flexstore_error::{StoreError, StoreErrorKind};

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
