use bigdecimal::BigDecimal;
use bigdecimal::num_bigint::BigInt;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::fmt;

use crate::error::CodecError;
use crate::types::TypeIdentifier;

/// PostgreSQL wire format code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    #[default]
    Text = 0,
    Binary = 1,
}

impl Format {
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Format::Text),
            1 => Some(Format::Binary),
            _ => None,
        }
    }

    pub fn code(&self) -> i16 {
        *self as i16
    }
}

/// A column value as it travels on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawValue {
    format: Format,
    data: Bytes,
}

impl RawValue {
    pub fn new(format: Format, data: impl Into<Bytes>) -> Self {
        Self { format, data: data.into() }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(Format::Text, value.into())
    }

    pub fn binary(data: impl Into<Bytes>) -> Self {
        Self::new(Format::Binary, data)
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    /// View the payload as UTF-8 text, as required by the text format
    pub fn as_str(&self, type_id: TypeIdentifier) -> Result<&str, CodecError> {
        std::str::from_utf8(&self.data)
            .map_err(|_| CodecError::format(type_id, String::from_utf8_lossy(&self.data)))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Strongly typed value handed to application code.
///
/// Zone-aware variants hold UTC; the source offset is not kept.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Integer(i64),
    Numeric(BigDecimal),
    Float(f64),
    Bool(bool),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    TimeTz(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
}

impl NativeValue {
    /// Short name of the variant, used in mismatch errors
    pub fn kind(&self) -> &'static str {
        match self {
            NativeValue::Integer(_) => "integer",
            NativeValue::Numeric(_) => "numeric",
            NativeValue::Float(_) => "float",
            NativeValue::Bool(_) => "boolean",
            NativeValue::Text(_) => "text",
            NativeValue::Date(_) => "date",
            NativeValue::Time(_) => "time",
            NativeValue::TimeTz(_) => "time with time zone",
            NativeValue::Timestamp(_) => "timestamp",
            NativeValue::TimestampTz(_) => "timestamp with time zone",
        }
    }

    /// Whether this variant is the one `type_id` decodes to
    pub fn belongs_to(&self, type_id: TypeIdentifier) -> bool {
        use TypeIdentifier as T;
        matches!(
            (self, type_id),
            (NativeValue::Integer(_), T::Int2 | T::Int4 | T::Int8)
                | (NativeValue::Numeric(_), T::Numeric)
                | (NativeValue::Float(_), T::Float4 | T::Float8)
                | (NativeValue::Bool(_), T::Bool)
                | (NativeValue::Text(_), T::Char | T::Varchar)
                | (NativeValue::Date(_), T::Date)
                | (NativeValue::Time(_), T::Time)
                | (NativeValue::TimeTz(_), T::Timetz)
                | (NativeValue::Timestamp(_), T::Timestamp)
                | (NativeValue::TimestampTz(_), T::Timestamptz)
        )
    }

    pub(crate) fn mismatch(&self, expected: TypeIdentifier) -> CodecError {
        CodecError::TypeMismatch { expected, found: self.kind() }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            NativeValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NativeValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            NativeValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NativeValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<&BigDecimal> {
        match self {
            NativeValue::Numeric(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i16> for NativeValue {
    fn from(v: i16) -> Self {
        NativeValue::Integer(v as i64)
    }
}

impl From<i32> for NativeValue {
    fn from(v: i32) -> Self {
        NativeValue::Integer(v as i64)
    }
}

impl From<i64> for NativeValue {
    fn from(v: i64) -> Self {
        NativeValue::Integer(v)
    }
}

impl From<f32> for NativeValue {
    fn from(v: f32) -> Self {
        NativeValue::Float(v as f64)
    }
}

impl From<f64> for NativeValue {
    fn from(v: f64) -> Self {
        NativeValue::Float(v)
    }
}

impl From<bool> for NativeValue {
    fn from(v: bool) -> Self {
        NativeValue::Bool(v)
    }
}

impl From<&str> for NativeValue {
    fn from(v: &str) -> Self {
        NativeValue::Text(v.to_string())
    }
}

impl From<String> for NativeValue {
    fn from(v: String) -> Self {
        NativeValue::Text(v)
    }
}

impl From<BigDecimal> for NativeValue {
    fn from(v: BigDecimal) -> Self {
        NativeValue::Numeric(v)
    }
}

impl From<rust_decimal::Decimal> for NativeValue {
    fn from(v: rust_decimal::Decimal) -> Self {
        // Mantissa and scale carry over exactly, trailing zeros included
        NativeValue::Numeric(BigDecimal::new(BigInt::from(v.mantissa()), v.scale() as i64))
    }
}

impl From<NaiveDate> for NativeValue {
    fn from(v: NaiveDate) -> Self {
        NativeValue::Date(v)
    }
}

impl From<NaiveTime> for NativeValue {
    fn from(v: NaiveTime) -> Self {
        NativeValue::Time(v)
    }
}

impl From<NaiveDateTime> for NativeValue {
    fn from(v: NaiveDateTime) -> Self {
        NativeValue::Timestamp(v)
    }
}

impl From<DateTime<Utc>> for NativeValue {
    fn from(v: DateTime<Utc>) -> Self {
        NativeValue::TimestampTz(v)
    }
}

/// Opaque bytes bound as a binary parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Binary(Bytes);

impl Binary {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Binary(data.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_inner(self) -> Bytes {
        self.0
    }

    /// PostgreSQL `bytea` hex escape form, e.g. `\x48656c6c6f`
    pub fn to_hex_text(&self) -> String {
        format!("\\x{}", hex::encode(&self.0))
    }

    /// Parse the hex escape form produced by [`Binary::to_hex_text`]
    pub fn from_hex_text(text: &str) -> Option<Self> {
        let digits = text.strip_prefix("\\x").or_else(|| text.strip_prefix("\\X"))?;
        hex::decode(digits).ok().map(Binary::new)
    }

    /// Raw value in binary format, bytes untouched
    pub fn to_raw(&self) -> RawValue {
        RawValue::binary(self.0.clone())
    }
}

impl From<Vec<u8>> for Binary {
    fn from(v: Vec<u8>) -> Self {
        Binary::new(v)
    }
}

impl From<&[u8]> for Binary {
    fn from(v: &[u8]) -> Self {
        Binary::new(Bytes::copy_from_slice(v))
    }
}

impl AsRef<[u8]> for Binary {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeValue::Integer(v) => write!(f, "{v}"),
            NativeValue::Numeric(v) => write!(f, "{v}"),
            NativeValue::Float(v) => write!(f, "{v}"),
            NativeValue::Bool(v) => write!(f, "{v}"),
            NativeValue::Text(v) => f.write_str(v),
            NativeValue::Date(v) => write!(f, "{v}"),
            NativeValue::Time(v) => write!(f, "{v}"),
            NativeValue::TimeTz(v) => write!(f, "{v}+00"),
            NativeValue::Timestamp(v) => write!(f, "{v}"),
            NativeValue::TimestampTz(v) => write!(f, "{v}"),
        }
    }
}
