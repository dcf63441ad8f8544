//! Core identifiers, constants, and error types for Bramble.
//!
//! This crate provides:
//! - [`ObjectId`] - Stable identifiers for runtime story objects
//! - [`Constant`] - Literal values stored in a compiled module
//! - [`ValueType`] - Type names used in runtime type errors
//! - [`Error`] - Rich error types with context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod constant;
pub mod error;
pub mod object_id;
pub mod types;

pub use constant::Constant;
pub use error::{Error, ErrorContext, ErrorKind};
pub use object_id::ObjectId;
pub use types::ValueType;

/// Result type alias using the Bramble error type.
pub type Result<T> = std::result::Result<T, Error>;
