//! Field type tags
//!
//! The format's type set is fixed and finite. Each tag byte maps to exactly
//! one [`FieldType`]; an unknown tag is rejected when the schema is defined,
//! never later while encoding or decoding.

use crate::error::{Error, Result};
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Column type, keyed by the descriptor's type tag byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// `C` - space padded text
    Character,
    /// `N` - right-aligned ASCII number
    Numeric,
    /// `F` - right-aligned ASCII number (dBase IV float)
    Float,
    /// `I` - 4-byte little-endian signed integer
    Integer,
    /// `Y` - 8-byte little-endian integer scaled by 10 000
    Currency,
    /// `B` - 8-byte little-endian IEEE-754 double
    Double,
    /// `D` - `YYYYMMDD`
    Date,
    /// `T` - Julian day plus milliseconds since midnight
    DateTime,
    /// `L` - one of `T`, `F`, `?`
    Logical,
    /// `M` - memo block pointer, text payload
    Memo,
    /// `G` - memo block pointer, binary payload
    General,
    /// `P` - memo block pointer, binary payload
    Picture,
    /// `0` - Visual FoxPro null-flag system column
    NullFlags,
}

impl FieldType {
    /// All known types, in tag order of the table above
    pub const ALL: [FieldType; 13] = [
        FieldType::Character,
        FieldType::Numeric,
        FieldType::Float,
        FieldType::Integer,
        FieldType::Currency,
        FieldType::Double,
        FieldType::Date,
        FieldType::DateTime,
        FieldType::Logical,
        FieldType::Memo,
        FieldType::General,
        FieldType::Picture,
        FieldType::NullFlags,
    ];

    /// Resolve a descriptor type tag
    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            b'C' => Ok(FieldType::Character),
            b'N' => Ok(FieldType::Numeric),
            b'F' => Ok(FieldType::Float),
            b'I' => Ok(FieldType::Integer),
            b'Y' => Ok(FieldType::Currency),
            b'B' => Ok(FieldType::Double),
            b'D' => Ok(FieldType::Date),
            b'T' => Ok(FieldType::DateTime),
            b'L' => Ok(FieldType::Logical),
            b'M' => Ok(FieldType::Memo),
            b'G' => Ok(FieldType::General),
            b'P' => Ok(FieldType::Picture),
            b'0' => Ok(FieldType::NullFlags),
            other => Err(Error::UnknownFieldType(other)),
        }
    }

    /// Descriptor type tag byte
    pub fn tag(&self) -> u8 {
        match self {
            FieldType::Character => b'C',
            FieldType::Numeric => b'N',
            FieldType::Float => b'F',
            FieldType::Integer => b'I',
            FieldType::Currency => b'Y',
            FieldType::Double => b'B',
            FieldType::Date => b'D',
            FieldType::DateTime => b'T',
            FieldType::Logical => b'L',
            FieldType::Memo => b'M',
            FieldType::General => b'G',
            FieldType::Picture => b'P',
            FieldType::NullFlags => b'0',
        }
    }

    /// Human readable type name (for error messages)
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Character => "Character",
            FieldType::Numeric => "Numeric",
            FieldType::Float => "Float",
            FieldType::Integer => "Integer",
            FieldType::Currency => "Currency",
            FieldType::Double => "Double",
            FieldType::Date => "Date",
            FieldType::DateTime => "DateTime",
            FieldType::Logical => "Logical",
            FieldType::Memo => "Memo",
            FieldType::General => "General",
            FieldType::Picture => "Picture",
            FieldType::NullFlags => "NullFlags",
        }
    }

    /// Fields whose stored bytes are a pointer into the memo sidecar
    pub fn is_memo(&self) -> bool {
        matches!(
            self,
            FieldType::Memo | FieldType::General | FieldType::Picture
        )
    }

    /// Length used when a schema is built without an explicit length
    pub fn default_length(&self) -> Option<usize> {
        match self {
            FieldType::Integer => Some(4),
            FieldType::Currency | FieldType::Double | FieldType::DateTime => Some(8),
            FieldType::Date => Some(8),
            FieldType::Logical => Some(1),
            FieldType::Memo | FieldType::General | FieldType::Picture => Some(10),
            FieldType::Character | FieldType::Numeric | FieldType::Float => None,
            FieldType::NullFlags => None,
        }
    }

    /// Check whether `length` is a legal stored width for this type
    pub fn is_valid_length(&self, length: usize) -> bool {
        match self {
            FieldType::Character | FieldType::NullFlags => (1..=255).contains(&length),
            FieldType::Numeric | FieldType::Float => (1..=20).contains(&length),
            FieldType::Integer => length == 4,
            FieldType::Currency | FieldType::Double | FieldType::DateTime => length == 8,
            FieldType::Date => length == 8,
            FieldType::Logical => length == 1,
            FieldType::Memo | FieldType::General | FieldType::Picture => {
                length == 4 || length == 10
            }
        }
    }

    /// Type family accepted by this field (for error messages)
    pub fn expected(&self) -> &'static str {
        match self {
            FieldType::Character => "String",
            FieldType::Numeric | FieldType::Float | FieldType::Currency | FieldType::Double => {
                "Int or Float"
            }
            FieldType::Integer => "Int",
            FieldType::Date => "Date",
            FieldType::DateTime => "DateTime",
            FieldType::Logical => "Bool",
            FieldType::Memo => "String or Bytes",
            FieldType::General | FieldType::Picture | FieldType::NullFlags => "Bytes",
        }
    }

    /// Check whether a value's runtime type can be stored in this field.
    ///
    /// `Null` is accepted everywhere; each encoder defines its blank form.
    /// A `Float` passes here for `N`/`F` fields, but the encoder rejects a
    /// fractional one when the field has no decimals. An integral `Float`
    /// stored that way reads back as `Int` when it fits in an `i64`.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (FieldType::Character, Value::String(_)) => true,
            (
                FieldType::Numeric | FieldType::Float | FieldType::Currency | FieldType::Double,
                Value::Int(_) | Value::Float(_),
            ) => true,
            (FieldType::Integer, Value::Int(_)) => true,
            (FieldType::Date, Value::Date(_)) => true,
            (FieldType::DateTime, Value::DateTime(_)) => true,
            (FieldType::Logical, Value::Bool(_)) => true,
            (FieldType::Memo, Value::String(_) | Value::Bytes(_)) => true,
            (FieldType::General | FieldType::Picture, Value::Bytes(_)) => true,
            (FieldType::NullFlags, Value::Bytes(_)) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
