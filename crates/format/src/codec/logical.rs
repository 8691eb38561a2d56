//! Logical fields (`L`)

use super::{type_mismatch, DecodeContext, EncodeContext, FieldCodec};
use crate::descriptor::FieldDescriptor;
use xbase_core::{Error, Result, Value};

/// `L`: one byte, three states. `?` (or a blank) is unknown.
pub(crate) struct LogicalCodec;

impl FieldCodec for LogicalCodec {
    fn encode(
        &self,
        field: &FieldDescriptor,
        value: &Value,
        out: &mut [u8],
        _ctx: &mut EncodeContext<'_>,
    ) -> Result<()> {
        out[0] = match value {
            Value::Bool(true) => b'T',
            Value::Bool(false) => b'F',
            Value::Null => b'?',
            other => return Err(type_mismatch(field, other)),
        };
        Ok(())
    }

    fn decode(&self, field: &FieldDescriptor, bytes: &[u8], _ctx: &DecodeContext<'_>) -> Result<Value> {
        match bytes[0] {
            b'T' | b't' | b'Y' | b'y' => Ok(Value::Bool(true)),
            b'F' | b'f' | b'N' | b'n' => Ok(Value::Bool(false)),
            b'?' | b' ' | 0 => Ok(Value::Null),
            other => Err(Error::format(
                field.name(),
                format!("invalid logical byte 0x{:02X}", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xbase_core::TextEncoding;

    fn decode(byte: u8) -> Result<Value> {
        let field = FieldDescriptor::logical("ACTIVE").unwrap();
        LogicalCodec.decode(&field, &[byte], &DecodeContext::new(TextEncoding::Utf8))
    }

    #[test]
    fn test_three_states() {
        let field = FieldDescriptor::logical("ACTIVE").unwrap();
        let mut ctx = EncodeContext::new(TextEncoding::Utf8);
        for (value, byte) in [
            (Value::Bool(true), b'T'),
            (Value::Bool(false), b'F'),
            (Value::Null, b'?'),
        ] {
            let mut out = [0u8; 1];
            LogicalCodec.encode(&field, &value, &mut out, &mut ctx).unwrap();
            assert_eq!(out[0], byte);
            assert_eq!(decode(byte).unwrap(), value);
        }
    }

    #[test]
    fn test_alternate_spellings() {
        assert_eq!(decode(b'y').unwrap(), Value::Bool(true));
        assert_eq!(decode(b'n').unwrap(), Value::Bool(false));
        assert!(decode(b' ').unwrap().is_null());
    }

    #[test]
    fn test_invalid_byte() {
        assert!(decode(b'X').unwrap_err().is_format());
    }
}
