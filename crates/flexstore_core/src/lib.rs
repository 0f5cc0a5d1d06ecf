//! Core data types for the FlexStore schema-on-write engine.
//!
//! This crate provides the loosely typed [`Value`] variant and the ordered
//! [`Record`] mapping that callers hand to the engine for persistence.
//! Values are constructed explicitly by callers, so column type inference
//! becomes a total function over a closed set of variants instead of
//! runtime type probing.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod record;
mod value;

pub use record::Record;
pub use value::Value;
