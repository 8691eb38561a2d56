//! Field encoder strategies
//!
//! One [`FieldCodec`] per field type. Selection is a fixed `match` on
//! [`FieldType`] ([`codec_for`]); the type set is closed, so there is no
//! registration step and no way to reach an encoder for an unknown tag.
//!
//! Every codec encodes into a caller-provided slice of exactly
//! `field.length()` bytes and decodes from a slice of the same size.

mod binary;
mod date;
mod logical;
mod memo;
mod numeric;
mod text;

use crate::descriptor::FieldDescriptor;
use crate::memo::{MemoStore, MemoWriter};
use xbase_core::{Error, FieldType, Result, TextEncoding, Value};

pub use binary::{julian_day_to_date, date_to_julian_day};

/// State available while decoding a record
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext<'a> {
    /// Encoding for character and memo text
    pub encoding: TextEncoding,
    /// Memo sidecar, when one was found
    pub memo: Option<&'a MemoStore<'a>>,
}

impl<'a> DecodeContext<'a> {
    /// Context without a memo sidecar
    pub fn new(encoding: TextEncoding) -> Self {
        Self {
            encoding,
            memo: None,
        }
    }

    /// Attach a memo sidecar
    pub fn with_memo(mut self, memo: &'a MemoStore<'a>) -> Self {
        self.memo = Some(memo);
        self
    }
}

/// State available while encoding a record
#[derive(Debug)]
pub struct EncodeContext<'a> {
    /// Encoding for character and memo text
    pub encoding: TextEncoding,
    /// Sidecar receiving memo payloads
    pub memo: Option<&'a mut MemoWriter>,
}

impl<'a> EncodeContext<'a> {
    /// Context without a memo writer
    pub fn new(encoding: TextEncoding) -> Self {
        Self {
            encoding,
            memo: None,
        }
    }

    /// Attach a memo writer
    pub fn with_memo(mut self, memo: &'a mut MemoWriter) -> Self {
        self.memo = Some(memo);
        self
    }
}

/// Encode/decode strategy for one field type
pub trait FieldCodec: Sync {
    /// Encode `value` into `out`, which is exactly `field.length()` bytes.
    ///
    /// Implementations validate before writing: on error `out` is left
    /// untouched.
    fn encode(
        &self,
        field: &FieldDescriptor,
        value: &Value,
        out: &mut [u8],
        ctx: &mut EncodeContext<'_>,
    ) -> Result<()>;

    /// Decode `bytes`, which is exactly `field.length()` bytes
    fn decode(&self, field: &FieldDescriptor, bytes: &[u8], ctx: &DecodeContext<'_>)
        -> Result<Value>;
}

/// Codec bound to a field type
pub fn codec_for(field_type: FieldType) -> &'static dyn FieldCodec {
    match field_type {
        FieldType::Character => &text::CharacterCodec,
        FieldType::Numeric | FieldType::Float => &numeric::NumericCodec,
        FieldType::Integer => &binary::IntegerCodec,
        FieldType::Currency => &binary::CurrencyCodec,
        FieldType::Double => &binary::DoubleCodec,
        FieldType::DateTime => &binary::DateTimeCodec,
        FieldType::Date => &date::DateCodec,
        FieldType::Logical => &logical::LogicalCodec,
        FieldType::Memo | FieldType::General | FieldType::Picture => &memo::MemoCodec,
        FieldType::NullFlags => &binary::RawCodec,
    }
}

/// Encode one field value
pub fn encode_field(
    field: &FieldDescriptor,
    value: &Value,
    out: &mut [u8],
    ctx: &mut EncodeContext<'_>,
) -> Result<()> {
    debug_assert_eq!(out.len(), field.length());
    check_type(field, value)?;
    codec_for(field.field_type()).encode(field, value, out, ctx)
}

/// Decode one field value
pub fn decode_field(field: &FieldDescriptor, bytes: &[u8], ctx: &DecodeContext<'_>) -> Result<Value> {
    debug_assert_eq!(bytes.len(), field.length());
    codec_for(field.field_type()).decode(field, bytes, ctx)
}

/// Reject values the field's encoder cannot represent
pub fn check_type(field: &FieldDescriptor, value: &Value) -> Result<()> {
    if field.field_type().accepts(value) {
        Ok(())
    } else {
        Err(type_mismatch(field, value))
    }
}

pub(crate) fn type_mismatch(field: &FieldDescriptor, value: &Value) -> Error {
    Error::TypeMismatch {
        field: field.name().to_string(),
        expected: field.field_type().expected(),
        actual: value.type_name(),
    }
}

pub(crate) fn overflow(field: &FieldDescriptor, actual: usize) -> Error {
    Error::FieldOverflow {
        field: field.name().to_string(),
        declared: field.length(),
        actual,
    }
}

/// Check if a field's bytes are blank (spaces or NULs)
pub(crate) fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(|&b| b == b' ' || b == 0)
}

/// Right-align ASCII `text` in `out`, padding on the left with spaces
pub(crate) fn write_right_aligned(field: &FieldDescriptor, text: &[u8], out: &mut [u8]) -> Result<()> {
    if text.len() > out.len() {
        return Err(overflow(field, text.len()));
    }
    let pad = out.len() - text.len();
    out[..pad].fill(b' ');
    out[pad..].copy_from_slice(text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_type_has_a_codec() {
        // Each field type must round-trip its blank value.
        for ty in FieldType::ALL {
            let length = ty.default_length().unwrap_or(10);
            let field = FieldDescriptor::new("F", ty, length, 0).unwrap();
            let mut out = vec![0xAAu8; length];
            let mut enc = EncodeContext::new(TextEncoding::Utf8);
            encode_field(&field, &Value::Null, &mut out, &mut enc).unwrap();
            let dec = DecodeContext::new(TextEncoding::Utf8);
            let back = decode_field(&field, &out, &dec).unwrap();
            match ty {
                FieldType::Integer => assert_eq!(back, Value::Int(0)),
                FieldType::Currency | FieldType::Double => assert_eq!(back, Value::Float(0.0)),
                FieldType::NullFlags => assert_eq!(back, Value::Bytes(vec![0; length])),
                _ => assert!(back.is_null(), "{} blank decoded to {:?}", ty, back),
            }
        }
    }

    #[test]
    fn test_type_mismatch_names_field() {
        let field = FieldDescriptor::integer("AGE").unwrap();
        let mut out = [0u8; 4];
        let mut ctx = EncodeContext::new(TextEncoding::Utf8);
        let err = encode_field(&field, &Value::String("30".into()), &mut out, &mut ctx).unwrap_err();
        match err {
            Error::TypeMismatch { field, actual, .. } => {
                assert_eq!(field, "AGE");
                assert_eq!(actual, "String");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(out, [0u8; 4]);
    }
}
