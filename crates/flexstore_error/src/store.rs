//! Store error types.

/// Store error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StoreErrorKind {
    /// Connection failed
    #[display("Database connection error: {}", _0)]
    Connection(String),
    /// Query execution failed
    #[display("Database query error: {}", _0)]
    Query(String),
    /// Serialization/deserialization error
    #[display("Serialization error: {}", _0)]
    Serialization(String),
    /// Schema migration failed
    #[display("Migration error: {}", _0)]
    Migration(String),
    /// Table not found
    #[display("Table '{}' not found in database", _0)]
    TableNotFound(String),
    /// A column type could not be inferred from a sample value
    #[display("Type inference error: {}", _0)]
    TypeInference(String),
    /// Table or column name failed validation
    #[display("Invalid identifier '{}'", _0)]
    InvalidIdentifier(String),
}

/// Store error with source location tracking.
///
/// # Examples
///
/// ```
/// use flexstore_error::{StoreError, StoreErrorKind};
///
/// let err = StoreError::new(StoreErrorKind::TableNotFound("users".to_string()));
/// assert!(format!("{}", err).contains("not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Store Error: {} at line {} in {}", kind, line, file)]
pub struct StoreError {
    /// The kind of error that occurred
    pub kind: StoreErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StoreError {
    /// Create a new StoreError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StoreErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

// Diesel error conversions (only available with mysql feature)
#[cfg(feature = "mysql")]
impl From<diesel::result::Error> for StoreError {
    fn from(err: diesel::result::Error) -> Self {
        StoreError::new(StoreErrorKind::Query(err.to_string()))
    }
}

#[cfg(feature = "mysql")]
impl From<diesel::ConnectionError> for StoreError {
    fn from(err: diesel::ConnectionError) -> Self {
        StoreError::new(StoreErrorKind::Connection(err.to_string()))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::new(StoreErrorKind::Serialization(err.to_string()))
    }
}
