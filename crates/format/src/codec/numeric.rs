//! ASCII numeric fields (`N`, `F`)

use super::{is_blank, type_mismatch, write_right_aligned, DecodeContext, EncodeContext, FieldCodec};
use crate::descriptor::FieldDescriptor;
use xbase_core::{Error, Result, Value};

/// `N` / `F`: right-aligned decimal text with `decimal_count` fraction digits
pub(crate) struct NumericCodec;

impl NumericCodec {
    fn render(field: &FieldDescriptor, value: &Value) -> Result<Option<String>> {
        let decimals = field.decimal_count();
        let text = match value {
            Value::Null => return Ok(None),
            Value::Int(i) if decimals == 0 => i.to_string(),
            Value::Int(i) => format!("{}.{}", i, "0".repeat(decimals)),
            Value::Float(f) if decimals == 0 && f.fract() != 0.0 => {
                return Err(Error::ValueOutOfRange {
                    field: field.name().to_string(),
                    value: f.to_string(),
                })
            }
            Value::Float(f) if f.is_finite() => {
                let text = format!("{:.*}", decimals, f);
                // "-0" / "-0.00" would otherwise survive rounding of tiny negatives
                if text.starts_with('-') && text[1..].bytes().all(|b| b == b'0' || b == b'.') {
                    text[1..].to_string()
                } else {
                    text
                }
            }
            Value::Float(f) => {
                return Err(Error::ValueOutOfRange {
                    field: field.name().to_string(),
                    value: f.to_string(),
                })
            }
            other => return Err(type_mismatch(field, other)),
        };
        Ok(Some(text))
    }
}

impl FieldCodec for NumericCodec {
    fn encode(
        &self,
        field: &FieldDescriptor,
        value: &Value,
        out: &mut [u8],
        _ctx: &mut EncodeContext<'_>,
    ) -> Result<()> {
        match Self::render(field, value)? {
            Some(text) => write_right_aligned(field, text.as_bytes(), out),
            None => {
                out.fill(b' ');
                Ok(())
            }
        }
    }

    fn decode(&self, field: &FieldDescriptor, bytes: &[u8], _ctx: &DecodeContext<'_>) -> Result<Value> {
        if is_blank(bytes) {
            return Ok(Value::Null);
        }

        let malformed = || {
            Error::format(
                field.name(),
                format!("invalid numeric text {:?}", String::from_utf8_lossy(bytes)),
            )
        };

        let text = std::str::from_utf8(bytes)
            .map_err(|_| malformed())?
            .trim_matches(|c| c == ' ' || c == '\0');
        let valid_chars = text
            .bytes()
            .enumerate()
            .all(|(i, b)| b.is_ascii_digit() || b == b'.' || (i == 0 && (b == b'-' || b == b'+')));
        if !valid_chars || text.matches('.').count() > 1 {
            return Err(malformed());
        }

        if field.decimal_count() == 0 && !text.contains('.') {
            // Wide integral fields can hold more digits than i64
            text.parse::<i64>()
                .map(Value::Int)
                .or_else(|_| text.parse::<f64>().map(Value::Float))
                .map_err(|_| malformed())
        } else {
            text.parse::<f64>().map(Value::Float).map_err(|_| malformed())
        }
    }
}
