//! Binary-format (PostgreSQL send/recv) decoders and encoders
use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, Bytes, BytesMut};
use chrono::TimeDelta;

use crate::Result;
use crate::codec::ParseContext;
use crate::codec::text::check_integer_range;
use crate::error::CodecError;
use crate::types::datetime_utils::{
    MICROS_PER_DAY, date_to_pg_days, datetime_to_pg_microseconds, microseconds_to_time, pg_days_to_date,
    pg_microseconds_to_datetime, time_to_microseconds,
};
use crate::types::{DecimalHandler, NativeValue, TypeIdentifier};

fn malformed(type_id: TypeIdentifier, bytes: &[u8]) -> CodecError {
    CodecError::format(type_id, format!("\\x{}", hex::encode(bytes)))
}

fn expect_len(type_id: TypeIdentifier, bytes: &[u8], len: usize) -> Result<()> {
    if bytes.len() == len { Ok(()) } else { Err(malformed(type_id, bytes)) }
}

pub fn decode_integer(type_id: TypeIdentifier, bytes: &[u8], _ctx: &ParseContext) -> Result<NativeValue> {
    let value = match (type_id, bytes.len()) {
        (TypeIdentifier::Int2, 2) => BigEndian::read_i16(bytes) as i64,
        (TypeIdentifier::Int4, 4) => BigEndian::read_i32(bytes) as i64,
        (TypeIdentifier::Int8, 8) => BigEndian::read_i64(bytes),
        _ => return Err(malformed(type_id, bytes)),
    };
    Ok(NativeValue::Integer(value))
}

pub fn encode_integer(type_id: TypeIdentifier, value: &NativeValue) -> Result<Bytes> {
    let NativeValue::Integer(v) = value else {
        return Err(value.mismatch(type_id));
    };
    check_integer_range(type_id, *v)?;
    let mut buf = BytesMut::with_capacity(8);
    match type_id {
        TypeIdentifier::Int2 => buf.put_i16(*v as i16),
        TypeIdentifier::Int4 => buf.put_i32(*v as i32),
        _ => buf.put_i64(*v),
    }
    Ok(buf.freeze())
}

pub fn decode_numeric(_type_id: TypeIdentifier, bytes: &[u8], _ctx: &ParseContext) -> Result<NativeValue> {
    DecimalHandler::decode_numeric(bytes).map(NativeValue::Numeric)
}

pub fn encode_numeric(type_id: TypeIdentifier, value: &NativeValue) -> Result<Bytes> {
    match value {
        NativeValue::Numeric(decimal) => DecimalHandler::encode_numeric(decimal).map(Bytes::from),
        other => Err(other.mismatch(type_id)),
    }
}

pub fn decode_float(type_id: TypeIdentifier, bytes: &[u8], _ctx: &ParseContext) -> Result<NativeValue> {
    let value = match (type_id, bytes.len()) {
        (TypeIdentifier::Float4, 4) => BigEndian::read_f32(bytes) as f64,
        (TypeIdentifier::Float8, 8) => BigEndian::read_f64(bytes),
        _ => return Err(malformed(type_id, bytes)),
    };
    Ok(NativeValue::Float(value))
}

pub fn encode_float(type_id: TypeIdentifier, value: &NativeValue) -> Result<Bytes> {
    let NativeValue::Float(v) = value else {
        return Err(value.mismatch(type_id));
    };
    let mut buf = BytesMut::with_capacity(8);
    if type_id == TypeIdentifier::Float4 {
        let narrowed = *v as f32;
        if v.is_finite() && narrowed.is_infinite() {
            return Err(CodecError::range(type_id, v));
        }
        buf.put_f32(narrowed);
    } else {
        buf.put_f64(*v);
    }
    Ok(buf.freeze())
}

pub fn decode_bool(type_id: TypeIdentifier, bytes: &[u8], _ctx: &ParseContext) -> Result<NativeValue> {
    match bytes {
        [0] => Ok(NativeValue::Bool(false)),
        [1] => Ok(NativeValue::Bool(true)),
        _ => Err(malformed(type_id, bytes)),
    }
}

pub fn encode_bool(type_id: TypeIdentifier, value: &NativeValue) -> Result<Bytes> {
    match value {
        NativeValue::Bool(b) => Ok(Bytes::from(vec![*b as u8])),
        other => Err(other.mismatch(type_id)),
    }
}

/// Binary format is the same as text format for character types
pub fn decode_text(type_id: TypeIdentifier, bytes: &[u8], _ctx: &ParseContext) -> Result<NativeValue> {
    std::str::from_utf8(bytes)
        .map(|s| NativeValue::Text(s.to_string()))
        .map_err(|_| malformed(type_id, bytes))
}

pub fn encode_text(type_id: TypeIdentifier, value: &NativeValue) -> Result<Bytes> {
    match value {
        NativeValue::Text(s) => Ok(Bytes::copy_from_slice(s.as_bytes())),
        other => Err(other.mismatch(type_id)),
    }
}

/// int32 days since 2000-01-01
pub fn decode_date(type_id: TypeIdentifier, bytes: &[u8], _ctx: &ParseContext) -> Result<NativeValue> {
    expect_len(type_id, bytes, 4)?;
    let days = BigEndian::read_i32(bytes);
    pg_days_to_date(days)
        .map(NativeValue::Date)
        .ok_or_else(|| CodecError::range(type_id, days))
}

pub fn encode_date(type_id: TypeIdentifier, value: &NativeValue) -> Result<Bytes> {
    let NativeValue::Date(date) = value else {
        return Err(value.mismatch(type_id));
    };
    let mut buf = BytesMut::with_capacity(4);
    buf.put_i32(date_to_pg_days(*date));
    Ok(buf.freeze())
}

/// int64 microseconds since midnight; 24:00:00 folds to midnight
pub fn decode_time(type_id: TypeIdentifier, bytes: &[u8], _ctx: &ParseContext) -> Result<NativeValue> {
    expect_len(type_id, bytes, 8)?;
    let micros = BigEndian::read_i64(bytes);
    if micros == MICROS_PER_DAY {
        return Ok(NativeValue::Time(chrono::NaiveTime::MIN));
    }
    microseconds_to_time(micros)
        .map(NativeValue::Time)
        .ok_or_else(|| CodecError::range(type_id, micros))
}

pub fn encode_time(type_id: TypeIdentifier, value: &NativeValue) -> Result<Bytes> {
    let NativeValue::Time(time) = value else {
        return Err(value.mismatch(type_id));
    };
    let mut buf = BytesMut::with_capacity(8);
    buf.put_i64(time_to_microseconds(*time));
    Ok(buf.freeze())
}

/// int64 local microseconds followed by int32 zone seconds west of UTC
pub fn decode_timetz(type_id: TypeIdentifier, bytes: &[u8], _ctx: &ParseContext) -> Result<NativeValue> {
    expect_len(type_id, bytes, 12)?;
    let micros = BigEndian::read_i64(&bytes[0..8]);
    let zone_west = BigEndian::read_i32(&bytes[8..12]);
    if !(0..=MICROS_PER_DAY).contains(&micros) {
        return Err(CodecError::range(type_id, micros));
    }
    let local = microseconds_to_time(micros % MICROS_PER_DAY).ok_or_else(|| CodecError::range(type_id, micros))?;
    let (utc, _) = local.overflowing_add_signed(TimeDelta::seconds(zone_west as i64));
    Ok(NativeValue::TimeTz(utc))
}

pub fn encode_timetz(type_id: TypeIdentifier, value: &NativeValue) -> Result<Bytes> {
    let NativeValue::TimeTz(time) = value else {
        return Err(value.mismatch(type_id));
    };
    let mut buf = BytesMut::with_capacity(12);
    buf.put_i64(time_to_microseconds(*time));
    buf.put_i32(0);
    Ok(buf.freeze())
}

/// int64 microseconds since 2000-01-01 00:00:00
pub fn decode_timestamp(type_id: TypeIdentifier, bytes: &[u8], _ctx: &ParseContext) -> Result<NativeValue> {
    expect_len(type_id, bytes, 8)?;
    let micros = BigEndian::read_i64(bytes);
    let datetime = pg_microseconds_to_datetime(micros).ok_or_else(|| CodecError::range(type_id, micros))?;
    Ok(match type_id {
        TypeIdentifier::Timestamptz => NativeValue::TimestampTz(datetime.and_utc()),
        _ => NativeValue::Timestamp(datetime),
    })
}

pub fn encode_timestamp(type_id: TypeIdentifier, value: &NativeValue) -> Result<Bytes> {
    let naive = match (type_id, value) {
        (TypeIdentifier::Timestamp, NativeValue::Timestamp(dt)) => *dt,
        (TypeIdentifier::Timestamptz, NativeValue::TimestampTz(dt)) => dt.naive_utc(),
        (_, other) => return Err(other.mismatch(type_id)),
    };
    let micros = datetime_to_pg_microseconds(&naive).ok_or_else(|| CodecError::range(type_id, naive))?;
    let mut buf = BytesMut::with_capacity(8);
    buf.put_i64(micros);
    Ok(buf.freeze())
}
