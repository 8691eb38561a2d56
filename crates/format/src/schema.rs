//! Table schema: the ordered field descriptor list
//!
//! A [`Schema`] is built once and then shared (via `Arc`) by the table and
//! every record, so records can resolve names and slice their bytes without
//! holding their own copy of the descriptors.

use crate::descriptor::FieldDescriptor;
use rustc_hash::FxHashMap;
use xbase_core::{Error, Result};

/// Byte width of the deletion flag that prefixes every record
pub const DELETION_FLAG_SIZE: usize = 1;

/// Ordered, immutable list of field descriptors with a name index
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<FieldDescriptor>,
    /// Lower-cased name -> position
    index: FxHashMap<String, usize>,
    /// Byte offset of each field within a record, after the deletion flag
    offsets: Vec<usize>,
    record_length: usize,
}

impl Schema {
    /// Build a schema, rejecting duplicate names (ignoring case)
    pub fn new(fields: Vec<FieldDescriptor>) -> Result<Self> {
        let mut index = FxHashMap::with_capacity_and_hasher(fields.len(), Default::default());
        let mut offsets = Vec::with_capacity(fields.len());
        let mut offset = DELETION_FLAG_SIZE;

        for (position, field) in fields.iter().enumerate() {
            if index.insert(field.name().to_lowercase(), position).is_some() {
                return Err(Error::DuplicateField(field.name().to_string()));
            }
            offsets.push(offset);
            offset += field.length();
        }

        if offset > u16::MAX as usize {
            return Err(Error::SchemaConsistency(format!(
                "record length {} exceeds {}",
                offset,
                u16::MAX
            )));
        }

        Ok(Self {
            fields,
            index,
            offsets,
            record_length: offset,
        })
    }

    /// Schema with no fields
    pub fn empty() -> Self {
        Self {
            fields: Vec::new(),
            index: FxHashMap::default(),
            offsets: Vec::new(),
            record_length: DELETION_FLAG_SIZE,
        }
    }

    /// Descriptors in schema order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the schema has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field at `position`
    pub fn field(&self, position: usize) -> Option<&FieldDescriptor> {
        self.fields.get(position)
    }

    /// Position of a field by case-insensitive name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(&name.to_lowercase()).copied()
    }

    /// Field by case-insensitive name
    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.position(name).map(|i| &self.fields[i])
    }

    /// Byte offset of the field at `position` within a record
    pub fn offset(&self, position: usize) -> Option<usize> {
        self.offsets.get(position).copied()
    }

    /// `1 + sum(field lengths)`
    pub fn record_length(&self) -> usize {
        self.record_length
    }

    /// Check if any field stores a memo pointer
    pub fn has_memo_fields(&self) -> bool {
        self.fields.iter().any(|f| f.field_type().is_memo())
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl Eq for Schema {}
