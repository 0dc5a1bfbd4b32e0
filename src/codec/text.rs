//! Text-format decoders and encoders, one pair per scalar family
use std::fmt;

use crate::Result;
use crate::codec::ParseContext;
use crate::codec::datetime_parser;
use crate::error::CodecError;
use crate::types::datetime_utils::{format_date, format_time, format_timestamp, format_timestamptz, format_timetz};
use crate::types::{DecimalHandler, NativeValue, TypeIdentifier};

pub fn decode_integer(type_id: TypeIdentifier, input: &str, _ctx: &ParseContext) -> Result<NativeValue> {
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CodecError::format(type_id, input));
    }

    let value: i64 = trimmed.parse().map_err(|_| CodecError::range(type_id, trimmed))?;
    check_integer_range(type_id, value)?;
    Ok(NativeValue::Integer(value))
}

pub fn encode_integer(type_id: TypeIdentifier, value: &NativeValue) -> Result<String> {
    let NativeValue::Integer(v) = value else {
        return Err(value.mismatch(type_id));
    };
    check_integer_range(type_id, *v)?;
    let mut buf = itoa::Buffer::new();
    Ok(buf.format(*v).to_string())
}

/// No implicit widening: the declared type bounds the value
pub(crate) fn check_integer_range(type_id: TypeIdentifier, value: i64) -> Result<()> {
    match type_id.integer_bounds() {
        Some((min, max)) if value < min || value > max => Err(CodecError::range(type_id, value)),
        _ => Ok(()),
    }
}

pub fn decode_numeric(_type_id: TypeIdentifier, input: &str, _ctx: &ParseContext) -> Result<NativeValue> {
    DecimalHandler::parse_decimal(input).map(NativeValue::Numeric)
}

pub fn encode_numeric(type_id: TypeIdentifier, value: &NativeValue) -> Result<String> {
    match value {
        NativeValue::Numeric(decimal) => Ok(DecimalHandler::format_decimal(decimal)),
        other => Err(other.mismatch(type_id)),
    }
}

/// Special float spellings accepted on input
fn special_float(text: &str) -> Option<f64> {
    match text.to_ascii_lowercase().as_str() {
        "nan" => Some(f64::NAN),
        "infinity" | "+infinity" | "inf" | "+inf" => Some(f64::INFINITY),
        "-infinity" | "-inf" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

/// True when every mantissa digit is zero, so a parsed zero is not underflow
fn mantissa_is_zero(text: &str) -> bool {
    text.split(['e', 'E'])
        .next()
        .unwrap_or("")
        .bytes()
        .all(|b| matches!(b, b'0' | b'.' | b'+' | b'-'))
}

pub fn decode_float(type_id: TypeIdentifier, input: &str, _ctx: &ParseContext) -> Result<NativeValue> {
    let trimmed = input.trim();
    if let Some(special) = special_float(trimmed) {
        return Ok(NativeValue::Float(special));
    }
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit() || b"+-.eE".contains(&b)) {
        return Err(CodecError::format(type_id, input));
    }

    let value = if type_id == TypeIdentifier::Float4 {
        trimmed.parse::<f32>().map(f64::from)
    } else {
        trimmed.parse::<f64>()
    }
    .map_err(|_| CodecError::format(type_id, input))?;

    if value.is_infinite() || (value == 0.0 && !mantissa_is_zero(trimmed)) {
        return Err(CodecError::range(type_id, trimmed));
    }
    Ok(NativeValue::Float(value))
}

/// Shortest round-trip digits, exponent form for very large or small magnitudes
fn format_float<F: fmt::Display + fmt::LowerExp>(value: F, as_f64: f64) -> String {
    if as_f64.is_nan() {
        return "NaN".to_string();
    }
    if as_f64.is_infinite() {
        return if as_f64 > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let magnitude = as_f64.abs();
    if magnitude != 0.0 && !(1e-4..1e15).contains(&magnitude) {
        let exp = format!("{value:e}");
        match exp.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{mantissa}e+{exponent}"),
            _ => exp,
        }
    } else {
        value.to_string()
    }
}

pub fn encode_float(type_id: TypeIdentifier, value: &NativeValue) -> Result<String> {
    let NativeValue::Float(v) = value else {
        return Err(value.mismatch(type_id));
    };
    if type_id == TypeIdentifier::Float4 {
        let narrowed = *v as f32;
        if v.is_finite() && narrowed.is_infinite() {
            return Err(CodecError::range(type_id, v));
        }
        Ok(format_float(narrowed, narrowed as f64))
    } else {
        Ok(format_float(*v, *v))
    }
}

pub fn decode_bool(type_id: TypeIdentifier, input: &str, _ctx: &ParseContext) -> Result<NativeValue> {
    match input.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Ok(NativeValue::Bool(true)),
        "false" | "f" | "no" | "n" | "0" => Ok(NativeValue::Bool(false)),
        _ => Err(CodecError::format(type_id, input)),
    }
}

pub fn encode_bool(type_id: TypeIdentifier, value: &NativeValue) -> Result<String> {
    match value {
        NativeValue::Bool(true) => Ok("t".to_string()),
        NativeValue::Bool(false) => Ok("f".to_string()),
        other => Err(other.mismatch(type_id)),
    }
}

/// Character data passes through untouched; padding is the server's business
pub fn decode_text(_type_id: TypeIdentifier, input: &str, _ctx: &ParseContext) -> Result<NativeValue> {
    Ok(NativeValue::Text(input.to_string()))
}

pub fn encode_text(type_id: TypeIdentifier, value: &NativeValue) -> Result<String> {
    match value {
        NativeValue::Text(s) => Ok(s.clone()),
        other => Err(other.mismatch(type_id)),
    }
}

pub fn decode_date(_type_id: TypeIdentifier, input: &str, ctx: &ParseContext) -> Result<NativeValue> {
    datetime_parser::parse_date(input, ctx).map(NativeValue::Date)
}

pub fn encode_date(type_id: TypeIdentifier, value: &NativeValue) -> Result<String> {
    match value {
        NativeValue::Date(date) => Ok(format_date(*date)),
        other => Err(other.mismatch(type_id)),
    }
}

pub fn decode_time(_type_id: TypeIdentifier, input: &str, _ctx: &ParseContext) -> Result<NativeValue> {
    datetime_parser::parse_time(input).map(NativeValue::Time)
}

pub fn encode_time(type_id: TypeIdentifier, value: &NativeValue) -> Result<String> {
    match value {
        NativeValue::Time(time) => Ok(format_time(*time)),
        other => Err(other.mismatch(type_id)),
    }
}

pub fn decode_timetz(_type_id: TypeIdentifier, input: &str, ctx: &ParseContext) -> Result<NativeValue> {
    datetime_parser::parse_timetz(input, ctx).map(NativeValue::TimeTz)
}

pub fn encode_timetz(type_id: TypeIdentifier, value: &NativeValue) -> Result<String> {
    match value {
        NativeValue::TimeTz(time) => Ok(format_timetz(*time)),
        other => Err(other.mismatch(type_id)),
    }
}

pub fn decode_timestamp(_type_id: TypeIdentifier, input: &str, ctx: &ParseContext) -> Result<NativeValue> {
    datetime_parser::parse_timestamp(input, ctx).map(NativeValue::Timestamp)
}

pub fn encode_timestamp(type_id: TypeIdentifier, value: &NativeValue) -> Result<String> {
    match value {
        NativeValue::Timestamp(dt) => Ok(format_timestamp(dt)),
        other => Err(other.mismatch(type_id)),
    }
}

pub fn decode_timestamptz(_type_id: TypeIdentifier, input: &str, ctx: &ParseContext) -> Result<NativeValue> {
    datetime_parser::parse_timestamptz(input, ctx).map(NativeValue::TimestampTz)
}

pub fn encode_timestamptz(type_id: TypeIdentifier, value: &NativeValue) -> Result<String> {
    match value {
        NativeValue::TimestampTz(dt) => Ok(format_timestamptz(dt)),
        other => Err(other.mismatch(type_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ctx() -> ParseContext {
        ParseContext::default()
    }

    #[test]
    fn test_integer_boundaries() {
        let ctx = ctx();
        let int2 = TypeIdentifier::Int2;
        assert_eq!(decode_integer(int2, "-32768", &ctx).unwrap(), NativeValue::Integer(-32768));
        assert_eq!(decode_integer(int2, "32767", &ctx).unwrap(), NativeValue::Integer(32767));
        assert!(matches!(decode_integer(int2, "-32769", &ctx), Err(CodecError::Range { .. })));
        assert!(matches!(decode_integer(int2, "32768", &ctx), Err(CodecError::Range { .. })));

        let int8 = TypeIdentifier::Int8;
        assert_eq!(
            decode_integer(int8, "-9223372036854775808", &ctx).unwrap(),
            NativeValue::Integer(i64::MIN)
        );
        assert!(matches!(decode_integer(int8, "9223372036854775808", &ctx), Err(CodecError::Range { .. })));
        assert!(matches!(decode_integer(int8, "12a", &ctx), Err(CodecError::Format { .. })));
        assert!(matches!(decode_integer(int8, "-", &ctx), Err(CodecError::Format { .. })));
        assert!(matches!(decode_integer(int8, "1.0", &ctx), Err(CodecError::Format { .. })));
    }

    #[test]
    fn test_encode_integer_checks_target_range() {
        assert_eq!(encode_integer(TypeIdentifier::Int2, &NativeValue::Integer(-128)).unwrap(), "-128");
        assert!(matches!(
            encode_integer(TypeIdentifier::Int2, &NativeValue::Integer(40000)),
            Err(CodecError::Range { .. })
        ));
        assert!(matches!(
            encode_integer(TypeIdentifier::Int4, &NativeValue::Bool(true)),
            Err(CodecError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_float_decoding() {
        let ctx = ctx();
        let float8 = TypeIdentifier::Float8;
        assert_eq!(decode_float(float8, "9e-6", &ctx).unwrap(), NativeValue::Float(9e-6));
        assert_eq!(decode_float(float8, "-128.497839", &ctx).unwrap(), NativeValue::Float(-128.497839));
        assert_eq!(decode_float(float8, "-Infinity", &ctx).unwrap(), NativeValue::Float(f64::NEG_INFINITY));
        assert!(decode_float(float8, "NaN", &ctx).unwrap().as_f64().unwrap().is_nan());
        assert!(matches!(decode_float(float8, "1e400", &ctx), Err(CodecError::Range { .. })));
        assert!(matches!(decode_float(float8, "abc", &ctx), Err(CodecError::Format { .. })));

        let float4 = TypeIdentifier::Float4;
        assert_eq!(decode_float(float4, "1.9", &ctx).unwrap(), NativeValue::Float(1.9f32 as f64));
        assert!(matches!(decode_float(float4, "1e39", &ctx), Err(CodecError::Range { .. })));
        assert!(matches!(decode_float(float4, "1e-50", &ctx), Err(CodecError::Range { .. })));
        assert_eq!(decode_float(float4, "0.000", &ctx).unwrap(), NativeValue::Float(0.0));
    }

    #[test]
    fn test_float_encoding() {
        let float8 = TypeIdentifier::Float8;
        let enc = |v: f64| encode_float(float8, &NativeValue::Float(v)).unwrap();
        assert_eq!(enc(123.456), "123.456");
        assert_eq!(enc(-1.0), "-1");
        assert_eq!(enc(9e-6), "9e-6");
        assert_eq!(enc(1e300), "1e+300");
        assert_eq!(enc(f64::NAN), "NaN");
        assert_eq!(enc(f64::INFINITY), "Infinity");

        let float4 = TypeIdentifier::Float4;
        assert_eq!(encode_float(float4, &NativeValue::Float(1.9f32 as f64)).unwrap(), "1.9");
        assert!(matches!(
            encode_float(float4, &NativeValue::Float(1e300)),
            Err(CodecError::Range { .. })
        ));
    }

    #[test]
    fn test_bool_synonyms() {
        let ctx = ctx();
        for text in ["TRUE", "t", "true", "y", "yes", "1", " Yes "] {
            assert_eq!(decode_bool(TypeIdentifier::Bool, text, &ctx).unwrap(), NativeValue::Bool(true), "{text}");
        }
        for text in ["FALSE", "f", "false", "n", "no", "0", "N"] {
            assert_eq!(decode_bool(TypeIdentifier::Bool, text, &ctx).unwrap(), NativeValue::Bool(false), "{text}");
        }
        for text in ["maybe", "on", "off", "2", ""] {
            assert_eq!(
                decode_bool(TypeIdentifier::Bool, text, &ctx),
                Err(CodecError::format(TypeIdentifier::Bool, text)),
                "{text}"
            );
        }
    }

    #[test]
    fn test_text_is_identity() {
        let ctx = ctx();
        let padded = "The quick brown fox      ";
        assert_eq!(decode_text(TypeIdentifier::Char, padded, &ctx).unwrap(), NativeValue::Text(padded.to_string()));
        assert_eq!(encode_text(TypeIdentifier::Varchar, &NativeValue::from("€€€€")).unwrap(), "€€€€");
    }

    #[test]
    fn test_temporal_mismatch() {
        let err = encode_timetz(TypeIdentifier::Timetz, &NativeValue::Time(chrono::NaiveTime::MIN)).unwrap_err();
        assert_eq!(err, CodecError::TypeMismatch { expected: TypeIdentifier::Timetz, found: "time" });
    }
}
