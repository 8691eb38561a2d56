//! # xbase
//!
//! Reader and writer for dBase and FoxPro `.dbf` tables, with `.dbt` and
//! `.fpt` memo sidecars.
//!
//! ## Quick Start
//!
//! ```ignore
//! use xbase::prelude::*;
//!
//! // Define a table
//! let mut table = Table::builder()
//!     .field(FieldDescriptor::integer("ID")?)
//!     .field(FieldDescriptor::character("FULLNAME", 50)?)
//!     .build()?;
//!
//! // Add a record
//! let mut record = table.new_record();
//! record.set_by_name("id", 1)?;
//! record.set_by_name("fullname", "John Doe")?;
//! table.push(record)?;
//!
//! // Save, then open again (memo sidecars are found automatically)
//! table.save("people.dbf", &WriteOptions::default())?;
//! let table = Table::open("people.dbf", &ReadOptions::default())?;
//! ```
//!
//! ## Layers
//!
//! - `xbase-core` - values, field types, errors, text encodings
//! - `xbase-format` - header, descriptors, field codecs, records, memo blocks
//! - `xbase-table` - whole-table read/write and sidecar discovery
//! - [`mapping`] - explicit entity mapping over records

#![warn(missing_docs)]

pub mod mapping;
pub mod prelude;

// Re-export main entry points
pub use mapping::Mapping;
pub use xbase_core::{Error, FieldType, Result, TextEncoding, Value};
pub use xbase_format::{FieldDescriptor, Header, MemoFormat, Record, Schema, Version};
pub use xbase_table::{
    find_memo_sidecar, ReadOptions, ReadStop, ReadSummary, Table, TableBuilder, TableImage,
    WriteOptions,
};
