//! Core types for xbase
//!
//! This crate defines the fundamental types shared by every layer:
//! - [`Value`]: one decoded field value
//! - [`FieldType`]: the closed set of column types and their tag bytes
//! - [`TextEncoding`]: text encodings for character and memo data
//! - [`Error`]: the single error type

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod encoding;
pub mod error;
pub mod field_type;
pub mod value;

pub use encoding::TextEncoding;
pub use error::{Error, Result};
pub use field_type::FieldType;
pub use value::Value;
