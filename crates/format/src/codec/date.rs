//! Date fields (`D`)

use super::{is_blank, type_mismatch, DecodeContext, EncodeContext, FieldCodec};
use crate::descriptor::FieldDescriptor;
use chrono::{Datelike, NaiveDate};
use xbase_core::{Error, Result, Value};

/// `D`: eight ASCII digits `YYYYMMDD`; blanks or zeros are the empty date
pub(crate) struct DateCodec;

impl FieldCodec for DateCodec {
    fn encode(
        &self,
        field: &FieldDescriptor,
        value: &Value,
        out: &mut [u8],
        _ctx: &mut EncodeContext<'_>,
    ) -> Result<()> {
        match value {
            Value::Null => out.fill(b' '),
            Value::Date(date) => {
                if !(0..=9999).contains(&date.year()) {
                    return Err(Error::ValueOutOfRange {
                        field: field.name().to_string(),
                        value: date.to_string(),
                    });
                }
                let text = format!("{:04}{:02}{:02}", date.year(), date.month(), date.day());
                out.copy_from_slice(text.as_bytes());
            }
            other => return Err(type_mismatch(field, other)),
        }
        Ok(())
    }

    fn decode(&self, field: &FieldDescriptor, bytes: &[u8], _ctx: &DecodeContext<'_>) -> Result<Value> {
        if is_blank(bytes) || bytes.iter().all(|&b| b == b'0') {
            return Ok(Value::Null);
        }

        let malformed = || {
            Error::format(
                field.name(),
                format!("invalid date text {:?}", String::from_utf8_lossy(bytes)),
            )
        };

        if !bytes.iter().all(u8::is_ascii_digit) {
            return Err(malformed());
        }
        let digits = |range: std::ops::Range<usize>| {
            bytes[range]
                .iter()
                .fold(0u32, |acc, &b| acc * 10 + u32::from(b - b'0'))
        };

        NaiveDate::from_ymd_opt(digits(0..4) as i32, digits(4..6), digits(6..8))
            .map(Value::Date)
            .ok_or_else(malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xbase_core::TextEncoding;

    fn field() -> FieldDescriptor {
        FieldDescriptor::date("BORN").unwrap()
    }

    fn decode(bytes: &[u8]) -> Result<Value> {
        DateCodec.decode(&field(), bytes, &DecodeContext::new(TextEncoding::Utf8))
    }

    #[test]
    fn test_encode_layout() {
        let mut out = [0u8; 8];
        let mut ctx = EncodeContext::new(TextEncoding::Utf8);
        let date = NaiveDate::from_ymd_opt(1994, 3, 7).unwrap();
        DateCodec
            .encode(&field(), &Value::Date(date), &mut out, &mut ctx)
            .unwrap();
        assert_eq!(&out, b"19940307");
        assert_eq!(decode(&out).unwrap(), Value::Date(date));
    }

    #[test]
    fn test_empty_dates() {
        assert!(decode(b"        ").unwrap().is_null());
        assert!(decode(b"00000000").unwrap().is_null());
        assert!(decode(&[0u8; 8]).unwrap().is_null());
    }

    #[test]
    fn test_invalid_dates() {
        assert!(decode(b"20230230").unwrap_err().is_format());
        assert!(decode(b"2023-1-1").unwrap_err().is_format());
        assert!(decode(b"20231301").unwrap_err().is_format());
    }
}
