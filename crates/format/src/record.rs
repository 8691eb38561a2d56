//! Records: deletion flag plus one value per schema field
//!
//! A record always holds exactly `schema.len()` values; every mutator checks
//! the value against the field before storing it so that a record which
//! exists can always be encoded, up to length overflow.

use crate::codec::{check_type, decode_field, encode_field, DecodeContext, EncodeContext};
use crate::schema::{Schema, DELETION_FLAG_SIZE};
use std::sync::Arc;
use xbase_core::{Error, Result, Value};

/// Deletion flag of a live record
pub const DELETION_FLAG_ACTIVE: u8 = 0x20;

/// Deletion flag of a soft-deleted record
pub const DELETION_FLAG_DELETED: u8 = 0x2A;

/// One table row
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    deleted: bool,
    values: Vec<Value>,
    schema: Arc<Schema>,
}

impl Record {
    /// Live record with every field `Null`
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            deleted: false,
            values: vec![Value::Null; schema.len()],
            schema,
        }
    }

    /// Record from values in schema order
    pub fn from_values(schema: Arc<Schema>, values: Vec<Value>) -> Result<Self> {
        if values.len() != schema.len() {
            return Err(Error::SchemaConsistency(format!(
                "{} values for {} fields",
                values.len(),
                schema.len()
            )));
        }
        for (field, value) in schema.fields().iter().zip(&values) {
            check_type(field, value)?;
        }
        Ok(Self {
            deleted: false,
            values,
            schema,
        })
    }

    /// Decode one record from its raw bytes.
    ///
    /// `raw` must hold at least `schema.record_length()` bytes; anything
    /// past that is ignored.
    pub fn decode(raw: &[u8], schema: &Arc<Schema>, ctx: &DecodeContext<'_>) -> Result<Self> {
        let expected = schema.record_length();
        if raw.len() < expected {
            return Err(Error::TruncatedRecord {
                expected,
                available: raw.len(),
            });
        }

        let deleted = match raw[0] {
            DELETION_FLAG_ACTIVE => false,
            DELETION_FLAG_DELETED => true,
            other => {
                return Err(Error::format(
                    "record",
                    format!("invalid deletion flag 0x{:02X}", other),
                ))
            }
        };

        let mut values = Vec::with_capacity(schema.len());
        let mut offset = DELETION_FLAG_SIZE;
        for field in schema.fields() {
            let end = offset + field.length();
            values.push(decode_field(field, &raw[offset..end], ctx)?);
            offset = end;
        }

        Ok(Self {
            deleted,
            values,
            schema: Arc::clone(schema),
        })
    }

    /// Encode to exactly `schema.record_length()` bytes
    pub fn encode(&self, ctx: &mut EncodeContext<'_>) -> Result<Vec<u8>> {
        let mut buf = vec![b' '; self.schema.record_length()];
        buf[0] = if self.deleted {
            DELETION_FLAG_DELETED
        } else {
            DELETION_FLAG_ACTIVE
        };

        let mut offset = DELETION_FLAG_SIZE;
        for (field, value) in self.schema.fields().iter().zip(&self.values) {
            let end = offset + field.length();
            encode_field(field, value, &mut buf[offset..end], ctx)?;
            offset = end;
        }
        Ok(buf)
    }

    /// Value at `position`
    pub fn get(&self, position: usize) -> Option<&Value> {
        self.values.get(position)
    }

    /// Value by case-insensitive field name
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.schema.position(name).and_then(|i| self.values.get(i))
    }

    /// Replace the value at `position`
    pub fn set(&mut self, position: usize, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let field = self.schema.field(position).ok_or_else(|| {
            Error::SchemaConsistency(format!(
                "field position {} out of range for {} fields",
                position,
                self.schema.len()
            ))
        })?;
        check_type(field, &value)?;
        self.values[position] = value;
        Ok(())
    }

    /// Replace a value by case-insensitive field name
    pub fn set_by_name(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let position = self
            .schema
            .position(name)
            .ok_or_else(|| Error::UnknownField(name.to_string()))?;
        self.set(position, value)
    }

    /// Check if the record is soft-deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Set or clear the soft-delete flag
    pub fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }

    /// Values in schema order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Shared schema
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// `(field name, value)` pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name())
            .zip(self.values.iter())
    }
}
