//! Error types for the FlexStore schema-on-write engine.
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `StoreErrorKind` enumerates the specific error conditions
//! - `StoreError` wraps the kind with source location tracking
//! - Errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use flexstore_error::{StoreError, StoreErrorKind};
//!
//! fn probe() -> Result<(), StoreError> {
//!     Err(StoreError::new(StoreErrorKind::TableNotFound("orders".to_string())))
//! }
//!
//! match probe() {
//!     Ok(()) => println!("found"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod store;

pub use store::{StoreError, StoreErrorKind};
