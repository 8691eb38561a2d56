//! Character fields

use super::{overflow, type_mismatch, DecodeContext, EncodeContext, FieldCodec};
use crate::descriptor::FieldDescriptor;
use xbase_core::{Error, Result, Value};

/// `C`: text right-padded with spaces.
///
/// Text that does not fit is rejected with `FieldOverflow`; it is never
/// truncated. All-blank fields decode to `Null`.
pub(crate) struct CharacterCodec;

impl FieldCodec for CharacterCodec {
    fn encode(
        &self,
        field: &FieldDescriptor,
        value: &Value,
        out: &mut [u8],
        ctx: &mut EncodeContext<'_>,
    ) -> Result<()> {
        let text = match value {
            Value::Null => {
                out.fill(b' ');
                return Ok(());
            }
            Value::String(s) => s,
            other => return Err(type_mismatch(field, other)),
        };

        let bytes = ctx.encoding.encode(text).ok_or_else(|| Error::Encoding {
            field: field.name().to_string(),
            encoding: ctx.encoding.name(),
        })?;
        if bytes.len() > out.len() {
            return Err(overflow(field, bytes.len()));
        }

        out[..bytes.len()].copy_from_slice(&bytes);
        out[bytes.len()..].fill(b' ');
        Ok(())
    }

    fn decode(&self, field: &FieldDescriptor, bytes: &[u8], ctx: &DecodeContext<'_>) -> Result<Value> {
        let end = bytes
            .iter()
            .rposition(|&b| b != b' ' && b != 0)
            .map_or(0, |i| i + 1);
        if end == 0 {
            return Ok(Value::Null);
        }

        ctx.encoding
            .decode(&bytes[..end])
            .map(Value::String)
            .ok_or_else(|| {
                Error::format(
                    field.name(),
                    format!("text is not valid {}", ctx.encoding.name()),
                )
            })
    }
}
