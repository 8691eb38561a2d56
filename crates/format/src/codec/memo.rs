//! Memo pointer fields (`M`, `G`, `P`)

use super::{is_blank, type_mismatch, write_right_aligned, DecodeContext, EncodeContext, FieldCodec};
use crate::descriptor::FieldDescriptor;
use crate::memo::MemoKind;
use byteorder::{ByteOrder, LittleEndian};
use tracing::warn;
use xbase_core::{Error, FieldType, Result, Value};

/// Block pointer into the memo sidecar.
///
/// Four-byte fields (FoxPro) hold the pointer as a little-endian u32; ten-byte
/// fields (dBase) hold it as right-aligned ASCII digits. Pointer 0 or a blank
/// field means no memo.
pub(crate) struct MemoCodec;

impl MemoCodec {
    fn read_pointer(field: &FieldDescriptor, bytes: &[u8]) -> Result<u32> {
        if bytes.len() == 4 {
            return Ok(LittleEndian::read_u32(bytes));
        }
        if is_blank(bytes) {
            return Ok(0);
        }
        std::str::from_utf8(bytes)
            .ok()
            .map(|s| s.trim_matches(|c| c == ' ' || c == '\0'))
            .and_then(|s| s.parse::<u32>().ok())
            .ok_or_else(|| {
                Error::format(
                    field.name(),
                    format!("invalid memo pointer {:?}", String::from_utf8_lossy(bytes)),
                )
            })
    }

    fn write_pointer(field: &FieldDescriptor, pointer: u32, out: &mut [u8]) -> Result<()> {
        if out.len() == 4 {
            LittleEndian::write_u32(out, pointer);
            return Ok(());
        }
        if pointer == 0 {
            out.fill(b' ');
            return Ok(());
        }
        write_right_aligned(field, pointer.to_string().as_bytes(), out)
    }
}

impl FieldCodec for MemoCodec {
    fn encode(
        &self,
        field: &FieldDescriptor,
        value: &Value,
        out: &mut [u8],
        ctx: &mut EncodeContext<'_>,
    ) -> Result<()> {
        let (kind, payload) = match (field.field_type(), value) {
            (_, Value::Null) => return Self::write_pointer(field, 0, out),
            (FieldType::Memo, Value::String(s)) => {
                let bytes = ctx.encoding.encode(s).ok_or_else(|| Error::Encoding {
                    field: field.name().to_string(),
                    encoding: ctx.encoding.name(),
                })?;
                (MemoKind::Text, bytes)
            }
            (_, Value::Bytes(b)) => (MemoKind::Binary, b.clone()),
            (_, other) => return Err(type_mismatch(field, other)),
        };

        if payload.is_empty() {
            return Self::write_pointer(field, 0, out);
        }

        let writer = ctx.memo.as_deref_mut().ok_or(Error::MemoTargetRequired)?;
        let pointer = writer.append(kind, &payload)?;
        Self::write_pointer(field, pointer, out)
    }

    fn decode(&self, field: &FieldDescriptor, bytes: &[u8], ctx: &DecodeContext<'_>) -> Result<Value> {
        let pointer = Self::read_pointer(field, bytes)?;
        if pointer == 0 {
            return Ok(Value::Null);
        }

        let store = match ctx.memo {
            Some(store) => store,
            None => return Ok(Value::Null),
        };

        let payload = match store.block(pointer)? {
            Some(payload) => payload,
            None => {
                warn!(
                    "Memo block {} for field {} is past the end of the sidecar",
                    pointer,
                    field.name()
                );
                return Ok(Value::Null);
            }
        };

        match (field.field_type(), payload.kind) {
            (FieldType::Memo, MemoKind::Text) => ctx
                .encoding
                .decode(payload.data)
                .map(Value::String)
                .ok_or_else(|| {
                    Error::format(
                        field.name(),
                        format!("memo text is not valid {}", ctx.encoding.name()),
                    )
                }),
            _ => Ok(Value::Bytes(payload.data.to_vec())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memo::{MemoFormat, MemoStore, MemoWriter};
    use xbase_core::TextEncoding;

    #[test]
    fn test_zero_pointer_without_sidecar() {
        let field = FieldDescriptor::memo("NOTES").unwrap();
        let ctx = DecodeContext::new(TextEncoding::Utf8);
        assert!(MemoCodec.decode(&field, b"         0", &ctx).unwrap().is_null());
        assert!(MemoCodec.decode(&field, b"          ", &ctx).unwrap().is_null());
    }

    #[test]
    fn test_nonzero_pointer_without_sidecar() {
        let field = FieldDescriptor::memo("NOTES").unwrap();
        let ctx = DecodeContext::new(TextEncoding::Utf8);
        assert!(MemoCodec.decode(&field, b"         3", &ctx).unwrap().is_null());
    }

    #[test]
    fn test_payload_requires_writer() {
        let field = FieldDescriptor::memo("NOTES").unwrap();
        let mut out = [0u8; 10];
        let mut ctx = EncodeContext::new(TextEncoding::Utf8);
        let err = MemoCodec
            .encode(&field, &Value::from("hello"), &mut out, &mut ctx)
            .unwrap_err();
        assert!(matches!(err, Error::MemoTargetRequired));
    }

    #[test]
    fn test_ascii_pointer_roundtrip() {
        let field = FieldDescriptor::memo("NOTES").unwrap();
        let mut writer = MemoWriter::new(MemoFormat::DBase3);
        let mut out = [0u8; 10];
        {
            let mut ctx = EncodeContext::new(TextEncoding::Utf8).with_memo(&mut writer);
            MemoCodec
                .encode(&field, &Value::from("hello memo"), &mut out, &mut ctx)
                .unwrap();
        }
        assert_eq!(&out, b"         1");

        let bytes = writer.into_bytes();
        let store = MemoStore::new(&bytes, MemoFormat::DBase3).unwrap();
        let ctx = DecodeContext::new(TextEncoding::Utf8).with_memo(&store);
        assert_eq!(
            MemoCodec.decode(&field, &out, &ctx).unwrap(),
            Value::from("hello memo")
        );
    }

    #[test]
    fn test_binary_pointer_roundtrip() {
        let field = FieldDescriptor::new("IMAGE", FieldType::General, 4, 0).unwrap();
        let mut writer = MemoWriter::new(MemoFormat::FoxPro);
        let mut out = [0u8; 4];
        {
            let mut ctx = EncodeContext::new(TextEncoding::Utf8).with_memo(&mut writer);
            MemoCodec
                .encode(&field, &Value::Bytes(vec![0xDE, 0xAD]), &mut out, &mut ctx)
                .unwrap();
        }
        assert_eq!(LittleEndian::read_u32(&out), 8);

        let bytes = writer.into_bytes();
        let store = MemoStore::new(&bytes, MemoFormat::FoxPro).unwrap();
        let ctx = DecodeContext::new(TextEncoding::Utf8).with_memo(&store);
        assert_eq!(
            MemoCodec.decode(&field, &out, &ctx).unwrap(),
            Value::Bytes(vec![0xDE, 0xAD])
        );
    }

    #[test]
    fn test_bad_pointer_text() {
        let field = FieldDescriptor::memo("NOTES").unwrap();
        let ctx = DecodeContext::new(TextEncoding::Utf8);
        assert!(MemoCodec.decode(&field, b"      12x ", &ctx).unwrap_err().is_format());
    }
}
