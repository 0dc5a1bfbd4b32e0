mod common;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use pgcodec::{CodecError, Format, NativeValue, RawValue, Registry, TypeIdentifier};
use pretty_assertions::assert_eq;
use std::str::FromStr;

use common::{hms, naive, utc, ymd};

fn decode(type_id: TypeIdentifier, text: &str) -> Result<NativeValue, CodecError> {
    Registry::default().decode_text(type_id, text)
}

fn assert_roundtrip(type_id: TypeIdentifier, value: NativeValue) {
    let registry = Registry::default();
    for format in [Format::Text, Format::Binary] {
        let raw = registry
            .encode(type_id, &value, format)
            .unwrap_or_else(|e| panic!("encode {type_id} {value} as {format:?}: {e}"));
        let back = registry
            .decode(type_id, &raw)
            .unwrap_or_else(|e| panic!("decode {type_id} {value} as {format:?}: {e}"));
        assert_eq!(back, value, "{type_id} via {format:?}");
    }
}

#[test]
fn test_integer_columns() {
    assert_eq!(decode(TypeIdentifier::Int2, "-128").unwrap(), NativeValue::Integer(-128));
    assert_eq!(decode(TypeIdentifier::Int4, "2147483647").unwrap(), NativeValue::Integer(i32::MAX as i64));
    assert_eq!(decode(TypeIdentifier::Int8, "-9223372036854775808").unwrap(), NativeValue::Integer(i64::MIN));

    let err = decode(TypeIdentifier::Int4, "2147483648").unwrap_err();
    assert!(matches!(err, CodecError::Range { .. }));
    assert_eq!(err.sqlstate(), "22003");
    assert!(matches!(decode(TypeIdentifier::Int2, "-32769"), Err(CodecError::Range { .. })));
    assert!(matches!(decode(TypeIdentifier::Int4, "-2147483649"), Err(CodecError::Range { .. })));
    assert!(matches!(decode(TypeIdentifier::Int8, "-9223372036854775809"), Err(CodecError::Range { .. })));
    assert!(matches!(decode(TypeIdentifier::Int8, "9223372036854775808"), Err(CodecError::Range { .. })));
    assert_eq!(decode(TypeIdentifier::Int2, "forty").unwrap_err().sqlstate(), "22P02");
}

#[test]
fn test_numeric_keeps_exact_digits() {
    let value = decode(TypeIdentifier::Numeric, "12345678901234567890.123456789012345").unwrap();
    assert_eq!(
        value,
        NativeValue::Numeric(BigDecimal::from_str("12345678901234567890.123456789012345").unwrap())
    );
    let text = Registry::default().encode_text(TypeIdentifier::Numeric, &value).unwrap();
    assert_eq!(text, "12345678901234567890.123456789012345");

    assert!(matches!(decode(TypeIdentifier::Numeric, "NaN"), Err(CodecError::Range { .. })));
    assert!(matches!(decode(TypeIdentifier::Numeric, &"9".repeat(140_000)), Err(CodecError::Range { .. })));
    assert!(matches!(decode(TypeIdentifier::Numeric, "12,5"), Err(CodecError::Format { .. })));
}

#[test]
fn test_float_columns() {
    assert_eq!(decode(TypeIdentifier::Float8, "-128.497839").unwrap(), NativeValue::Float(-128.497839));
    assert_eq!(decode(TypeIdentifier::Float8, "9e-6").unwrap(), NativeValue::Float(9e-6));
    assert_eq!(decode(TypeIdentifier::Float4, "1.9").unwrap(), NativeValue::Float(1.9f32 as f64));
    assert!(matches!(decode(TypeIdentifier::Float4, "1e39"), Err(CodecError::Range { .. })));
}

#[test]
fn test_bool_and_text_columns() {
    assert_eq!(decode(TypeIdentifier::Bool, "t").unwrap(), NativeValue::Bool(true));
    assert_eq!(decode(TypeIdentifier::Bool, "FALSE").unwrap(), NativeValue::Bool(false));
    assert_eq!(decode(TypeIdentifier::Varchar, "hello, world").unwrap(), NativeValue::from("hello, world"));
    assert_eq!(decode(TypeIdentifier::Char, "abc  ").unwrap(), NativeValue::from("abc  "));
}

#[test]
fn test_date_inputs() {
    assert_eq!(decode(TypeIdentifier::Date, "2020-01-06").unwrap(), NativeValue::Date(ymd(2020, 1, 6)));
    assert_eq!(decode(TypeIdentifier::Date, "01.20.2020").unwrap(), NativeValue::Date(ymd(2020, 1, 20)));
    assert_eq!(decode(TypeIdentifier::Date, "4713-01-12").unwrap(), NativeValue::Date(ymd(4713, 1, 12)));
    assert_eq!(decode(TypeIdentifier::Date, "Jun 1,2008").unwrap(), NativeValue::Date(ymd(2008, 6, 1)));

    let err = decode(TypeIdentifier::Date, "2021-02-29").unwrap_err();
    assert!(matches!(err, CodecError::Range { .. }));
    assert_eq!(err.sqlstate(), "22008");
    assert_eq!(decode(TypeIdentifier::Date, "someday").unwrap_err().sqlstate(), "22007");
}

#[test]
fn test_time_and_timetz_inputs() {
    assert_eq!(decode(TypeIdentifier::Time, "12:30:10").unwrap(), NativeValue::Time(hms(12, 30, 10)));
    assert_eq!(decode(TypeIdentifier::Time, "24:00:00").unwrap(), NativeValue::Time(hms(0, 0, 0)));

    let cases = [
        ("12:30:10 WDT", hms(3, 30, 10)),
        ("24:00:00 WET", hms(0, 0, 0)),
        ("22:44:54 CET", hms(21, 44, 54)),
        ("18:42:22 GMT", hms(18, 42, 22)),
        ("00:00:00 EST", hms(5, 0, 0)),
    ];
    for (input, expected) in cases {
        assert_eq!(decode(TypeIdentifier::Timetz, input).unwrap(), NativeValue::TimeTz(expected), "{input}");
    }

    let err = decode(TypeIdentifier::Timetz, "10:00:00 XYZT").unwrap_err();
    assert_eq!(err, CodecError::UnknownTimezone("XYZT".to_string()));
    assert_eq!(err.sqlstate(), "22023");
}

#[test]
fn test_timestamp_inputs() {
    assert_eq!(
        decode(TypeIdentifier::Timestamp, "2020-01-06 10:00:00.5").unwrap(),
        NativeValue::Timestamp(naive(2020, 1, 6, 10, 0, 0) + chrono::Duration::milliseconds(500))
    );
    assert_eq!(
        decode(TypeIdentifier::Timestamp, "Jun 1,2008 09:59:59").unwrap(),
        NativeValue::Timestamp(naive(2008, 6, 1, 9, 59, 59))
    );
    assert!(matches!(
        decode(TypeIdentifier::Timestamp, "2020-01-06 10:00:00 EST"),
        Err(CodecError::Format { .. })
    ));
}

#[test]
fn test_timestamptz_inputs_normalize_to_utc() {
    let cases = [
        ("Jun 1,2008  09:59:59 EST", utc(2008, 6, 1, 14, 59, 59)),
        ("Dec 31,2008 18:20 US/Pacific", utc(2009, 1, 1, 2, 20, 0)),
        ("Dec 15,2008 18:20 US/Pacific", utc(2008, 12, 16, 2, 20, 0)),
        ("Jun 1,2008 18:20 US/Pacific", utc(2008, 6, 2, 1, 20, 0)),
        ("2008-06-01 09:59:59 America/New_York", utc(2008, 6, 1, 13, 59, 59)),
        ("4713-01-12 00:00:00 UTC", utc(4713, 1, 12, 0, 0, 0)),
        ("2020-01-06T10:00:00Z", utc(2020, 1, 6, 10, 0, 0)),
        ("2020-01-06 10:00:00-07", utc(2020, 1, 6, 17, 0, 0)),
        ("2020-01-06 10:00:00", utc(2020, 1, 6, 10, 0, 0)),
    ];
    for (input, expected) in cases {
        assert_eq!(decode(TypeIdentifier::Timestamptz, input).unwrap(), NativeValue::TimestampTz(expected), "{input}");
    }
}

#[test]
fn test_canonical_text_output() {
    let registry = Registry::default();
    let cases = [
        (TypeIdentifier::Int8, NativeValue::Integer(-42), "-42"),
        (TypeIdentifier::Bool, NativeValue::Bool(false), "f"),
        (TypeIdentifier::Float8, NativeValue::Float(1e300), "1e+300"),
        (TypeIdentifier::Date, NativeValue::Date(ymd(-43, 3, 15)), "0044-03-15 BC"),
        (TypeIdentifier::Date, NativeValue::Date(NaiveDate::MAX), "infinity"),
        (TypeIdentifier::Time, NativeValue::Time(hms(9, 5, 0)), "09:05:00"),
        (TypeIdentifier::Timetz, NativeValue::TimeTz(hms(3, 30, 10)), "03:30:10+00"),
        (TypeIdentifier::Timestamp, NativeValue::Timestamp(naive(2008, 6, 1, 9, 59, 59)), "2008-06-01 09:59:59"),
        (
            TypeIdentifier::Timestamptz,
            NativeValue::TimestampTz(utc(2009, 1, 1, 2, 20, 0)),
            "2009-01-01 02:20:00+00",
        ),
    ];
    for (type_id, value, expected) in cases {
        assert_eq!(registry.encode_text(type_id, &value).unwrap(), expected, "{type_id}");
    }
}

#[test]
fn test_values_survive_both_formats() {
    assert_roundtrip(TypeIdentifier::Int2, NativeValue::Integer(i16::MIN as i64));
    assert_roundtrip(TypeIdentifier::Int4, NativeValue::Integer(i32::MAX as i64));
    assert_roundtrip(TypeIdentifier::Int8, NativeValue::Integer(i64::MIN));
    assert_roundtrip(
        TypeIdentifier::Numeric,
        NativeValue::Numeric(BigDecimal::from_str("-98765432109876543210.0001").unwrap()),
    );
    assert_roundtrip(TypeIdentifier::Float4, NativeValue::Float(1.9f32 as f64));
    assert_roundtrip(TypeIdentifier::Float8, NativeValue::Float(-128.497839));
    assert_roundtrip(TypeIdentifier::Float8, NativeValue::Float(f64::INFINITY));
    assert_roundtrip(TypeIdentifier::Bool, NativeValue::Bool(true));
    assert_roundtrip(TypeIdentifier::Varchar, NativeValue::from("€€€€ and more"));
    assert_roundtrip(TypeIdentifier::Date, NativeValue::Date(ymd(4713, 1, 12)));
    assert_roundtrip(TypeIdentifier::Date, NativeValue::Date(ymd(-4712, 1, 1)));
    assert_roundtrip(TypeIdentifier::Time, NativeValue::Time(hms(23, 59, 59)));
    assert_roundtrip(TypeIdentifier::Timetz, NativeValue::TimeTz(hms(21, 44, 54)));
    assert_roundtrip(TypeIdentifier::Timestamp, NativeValue::Timestamp(naive(1999, 12, 31, 23, 59, 59)));
    assert_roundtrip(TypeIdentifier::Timestamptz, NativeValue::TimestampTz(utc(2008, 6, 1, 14, 59, 59)));
}

#[test]
fn test_binary_wire_layout() {
    let registry = Registry::default();
    let epoch = registry
        .encode(TypeIdentifier::Timestamp, &NativeValue::Timestamp(naive(2000, 1, 1, 0, 0, 0)), Format::Binary)
        .unwrap();
    assert_eq!(epoch.as_bytes(), &[0u8; 8]);

    let date = registry
        .encode(TypeIdentifier::Date, &NativeValue::Date(ymd(2000, 1, 2)), Format::Binary)
        .unwrap();
    assert_eq!(date.as_bytes(), &[0, 0, 0, 1]);

    let short = RawValue::binary(vec![0u8, 1, 2]);
    assert!(matches!(registry.decode(TypeIdentifier::Int4, &short), Err(CodecError::Format { .. })));
}

#[test]
fn test_type_names_resolve() {
    assert_eq!(TypeIdentifier::from_name("timestamp with time zone"), Some(TypeIdentifier::Timestamptz));
    assert_eq!(TypeIdentifier::from_name("varchar(32)"), Some(TypeIdentifier::Varchar));
    assert_eq!(TypeIdentifier::from_oid(1700), Some(TypeIdentifier::Numeric));
}
