//! On-disk layout of dBase/FoxPro tables
//!
//! This crate knows how bytes map to tables, without touching files:
//! - Header: version dispatch and the fixed 32-byte prefix
//! - FieldDescriptor / Schema: the field table and record geometry
//! - codec: one encoder strategy per field type
//! - Record: deletion flag plus values, encoded against a shared Schema
//! - MemoStore / MemoWriter: `.dbt` and `.fpt` sidecars

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod descriptor;
pub mod header;
pub mod memo;
pub mod record;
pub mod schema;

pub use codec::{DecodeContext, EncodeContext, FieldCodec};
pub use descriptor::FieldDescriptor;
pub use header::{Header, HeaderFamily, Version};
pub use memo::{MemoFormat, MemoKind, MemoPayload, MemoStore, MemoWriter};
pub use record::Record;
pub use schema::Schema;
