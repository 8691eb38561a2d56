//! Convenient imports for xbase.
//!
//! ```ignore
//! use xbase::prelude::*;
//!
//! let table = Table::open("people.dbf", &ReadOptions::default())?;
//! ```

// Tables
pub use crate::{ReadOptions, ReadStop, ReadSummary, Table, TableBuilder, WriteOptions};

// Error handling
pub use crate::{Error, Result};

// Schema and records
pub use crate::{FieldDescriptor, Record, Schema, Version};

// Values
pub use crate::{FieldType, TextEncoding, Value};

// Entity mapping
pub use crate::mapping::Mapping;
