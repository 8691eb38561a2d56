//! Little-endian binary fields (`I`, `Y`, `B`, `T`, `0`)

use super::{overflow, type_mismatch, DecodeContext, EncodeContext, FieldCodec};
use crate::descriptor::FieldDescriptor;
use byteorder::{ByteOrder, LittleEndian};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use xbase_core::{Error, Result, Value};

/// Julian day number of 0001-01-01 minus one (chrono counts CE days from 1)
const JULIAN_DAY_CE_OFFSET: i64 = 1_721_425;

const MILLIS_PER_DAY: u32 = 86_400_000;

const CURRENCY_SCALE: i64 = 10_000;

/// Convert a Julian day number to a calendar date
pub fn julian_day_to_date(day: i32) -> Option<NaiveDate> {
    let ce_days = i32::try_from(day as i64 - JULIAN_DAY_CE_OFFSET).ok()?;
    NaiveDate::from_num_days_from_ce_opt(ce_days)
}

/// Convert a calendar date to its Julian day number
pub fn date_to_julian_day(date: NaiveDate) -> i32 {
    (date.num_days_from_ce() as i64 + JULIAN_DAY_CE_OFFSET) as i32
}

fn out_of_range(field: &FieldDescriptor, value: impl ToString) -> Error {
    Error::ValueOutOfRange {
        field: field.name().to_string(),
        value: value.to_string(),
    }
}

/// `I`: signed 32-bit integer
pub(crate) struct IntegerCodec;

impl FieldCodec for IntegerCodec {
    fn encode(
        &self,
        field: &FieldDescriptor,
        value: &Value,
        out: &mut [u8],
        _ctx: &mut EncodeContext<'_>,
    ) -> Result<()> {
        let n = match value {
            Value::Null => 0,
            Value::Int(i) => i32::try_from(*i).map_err(|_| out_of_range(field, i))?,
            other => return Err(type_mismatch(field, other)),
        };
        LittleEndian::write_i32(out, n);
        Ok(())
    }

    fn decode(&self, _field: &FieldDescriptor, bytes: &[u8], _ctx: &DecodeContext<'_>) -> Result<Value> {
        Ok(Value::Int(LittleEndian::read_i32(bytes) as i64))
    }
}

/// `Y`: signed 64-bit integer holding the amount times 10 000
pub(crate) struct CurrencyCodec;

impl FieldCodec for CurrencyCodec {
    fn encode(
        &self,
        field: &FieldDescriptor,
        value: &Value,
        out: &mut [u8],
        _ctx: &mut EncodeContext<'_>,
    ) -> Result<()> {
        let scaled = match value {
            Value::Null => 0,
            Value::Int(i) => i
                .checked_mul(CURRENCY_SCALE)
                .ok_or_else(|| out_of_range(field, i))?,
            Value::Float(f) => {
                let scaled = (f * CURRENCY_SCALE as f64).round();
                if !scaled.is_finite() || scaled.abs() >= i64::MAX as f64 {
                    return Err(out_of_range(field, f));
                }
                scaled as i64
            }
            other => return Err(type_mismatch(field, other)),
        };
        LittleEndian::write_i64(out, scaled);
        Ok(())
    }

    fn decode(&self, _field: &FieldDescriptor, bytes: &[u8], _ctx: &DecodeContext<'_>) -> Result<Value> {
        let scaled = LittleEndian::read_i64(bytes);
        Ok(Value::Float(scaled as f64 / CURRENCY_SCALE as f64))
    }
}

/// `B`: IEEE-754 double
pub(crate) struct DoubleCodec;

impl FieldCodec for DoubleCodec {
    fn encode(
        &self,
        field: &FieldDescriptor,
        value: &Value,
        out: &mut [u8],
        _ctx: &mut EncodeContext<'_>,
    ) -> Result<()> {
        let f = match value {
            Value::Null => 0.0,
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            other => return Err(type_mismatch(field, other)),
        };
        LittleEndian::write_f64(out, f);
        Ok(())
    }

    fn decode(&self, _field: &FieldDescriptor, bytes: &[u8], _ctx: &DecodeContext<'_>) -> Result<Value> {
        Ok(Value::Float(LittleEndian::read_f64(bytes)))
    }
}

/// `T`: Julian day (i32 LE) then milliseconds since midnight (u32 LE)
pub(crate) struct DateTimeCodec;

impl FieldCodec for DateTimeCodec {
    fn encode(
        &self,
        field: &FieldDescriptor,
        value: &Value,
        out: &mut [u8],
        _ctx: &mut EncodeContext<'_>,
    ) -> Result<()> {
        let (day, millis) = match value {
            Value::Null => (0, 0),
            Value::DateTime(dt) => {
                let time = dt.time();
                let millis = time.num_seconds_from_midnight() * 1000
                    + (time.nanosecond() / 1_000_000).min(999);
                (date_to_julian_day(dt.date()), millis)
            }
            other => return Err(type_mismatch(field, other)),
        };
        LittleEndian::write_i32(&mut out[0..4], day);
        LittleEndian::write_u32(&mut out[4..8], millis);
        Ok(())
    }

    fn decode(&self, field: &FieldDescriptor, bytes: &[u8], _ctx: &DecodeContext<'_>) -> Result<Value> {
        let day = LittleEndian::read_i32(&bytes[0..4]);
        let millis = LittleEndian::read_u32(&bytes[4..8]);
        if day == 0 {
            return Ok(Value::Null);
        }

        let date = julian_day_to_date(day)
            .ok_or_else(|| Error::format(field.name(), format!("invalid Julian day {}", day)))?;
        if millis >= MILLIS_PER_DAY {
            return Err(Error::format(
                field.name(),
                format!("time of day {}ms out of range", millis),
            ));
        }
        let time = NaiveTime::from_num_seconds_from_midnight_opt(
            millis / 1000,
            (millis % 1000) * 1_000_000,
        )
        .ok_or_else(|| Error::format(field.name(), "invalid time of day"))?;

        Ok(Value::DateTime(NaiveDateTime::new(date, time)))
    }
}

/// `0`: opaque bytes, zero padded
pub(crate) struct RawCodec;

impl FieldCodec for RawCodec {
    fn encode(
        &self,
        field: &FieldDescriptor,
        value: &Value,
        out: &mut [u8],
        _ctx: &mut EncodeContext<'_>,
    ) -> Result<()> {
        match value {
            Value::Null => out.fill(0),
            Value::Bytes(b) => {
                if b.len() > out.len() {
                    return Err(overflow(field, b.len()));
                }
                out[..b.len()].copy_from_slice(b);
                out[b.len()..].fill(0);
            }
            other => return Err(type_mismatch(field, other)),
        }
        Ok(())
    }

    fn decode(&self, _field: &FieldDescriptor, bytes: &[u8], _ctx: &DecodeContext<'_>) -> Result<Value> {
        Ok(Value::Bytes(bytes.to_vec()))
    }
}
