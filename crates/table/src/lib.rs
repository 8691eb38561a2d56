//! dBase/FoxPro tables in memory
//!
//! This crate ties the format layer to streams and files:
//! - Table: read, write, open and save whole tables
//! - TableBuilder: define a new table
//! - ReadOptions / WriteOptions: encoding, memo and version choices
//! - find_memo_sidecar: `.fpt` / `.dbt` discovery

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod options;
pub mod sidecar;
pub mod table;

pub use builder::TableBuilder;
pub use options::{ReadOptions, WriteOptions};
pub use sidecar::find_memo_sidecar;
pub use table::{ReadStop, ReadSummary, Table, TableImage, EOF_MARKER};
