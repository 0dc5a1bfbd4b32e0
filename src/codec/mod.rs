// Per-type conversion between wire representations and native values
pub mod binary;
pub mod datetime_parser;
pub mod text;

use bytes::Bytes;
use chrono::{Offset, Utc};
use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::Result;
use crate::config::{CodecConfig, DateOrder};
use crate::error::ConfigError;
use crate::types::{Format, NativeValue, RawValue, TimezoneTable, TypeIdentifier, Zone};

type TextDecodeFn = fn(TypeIdentifier, &str, &ParseContext) -> Result<NativeValue>;
type TextEncodeFn = fn(TypeIdentifier, &NativeValue) -> Result<String>;
type BinaryDecodeFn = fn(TypeIdentifier, &[u8], &ParseContext) -> Result<NativeValue>;
type BinaryEncodeFn = fn(TypeIdentifier, &NativeValue) -> Result<Bytes>;

/// Outcome of decoding one column; `Ok(None)` is SQL NULL
pub type ColumnResult = Result<Option<NativeValue>>;

/// Settings the decoders consult, captured once when a registry is built
#[derive(Debug, Clone, PartialEq)]
pub struct ParseContext {
    pub date_order: DateOrder,
    pub timezones: TimezoneTable,
    /// Zone applied to timestamptz/timetz input without a zone token
    pub session_zone: Zone,
}

impl ParseContext {
    pub fn new(date_order: DateOrder, timezones: TimezoneTable, session_zone: impl Into<Zone>) -> Self {
        Self { date_order, timezones, session_zone: session_zone.into() }
    }
}

impl Default for ParseContext {
    fn default() -> Self {
        Self {
            date_order: DateOrder::default(),
            timezones: TimezoneTable::builtin(),
            session_zone: Zone::Fixed(Utc.fix()),
        }
    }
}

/// Decode/encode functions for one type, per wire format
#[derive(Clone, Copy)]
pub struct Codec {
    type_id: TypeIdentifier,
    decode_text: TextDecodeFn,
    encode_text: TextEncodeFn,
    decode_binary: BinaryDecodeFn,
    encode_binary: BinaryEncodeFn,
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec").field("type_id", &self.type_id).finish()
    }
}

impl Codec {
    /// The codec for `type_id`; adding an identifier without a codec fails to compile
    pub fn for_type(type_id: TypeIdentifier) -> Self {
        use TypeIdentifier as T;
        let (decode_text, encode_text, decode_binary, encode_binary): (
            TextDecodeFn,
            TextEncodeFn,
            BinaryDecodeFn,
            BinaryEncodeFn,
        ) = match type_id {
            T::Int2 | T::Int4 | T::Int8 => {
                (text::decode_integer, text::encode_integer, binary::decode_integer, binary::encode_integer)
            }
            T::Numeric => (text::decode_numeric, text::encode_numeric, binary::decode_numeric, binary::encode_numeric),
            T::Float4 | T::Float8 => {
                (text::decode_float, text::encode_float, binary::decode_float, binary::encode_float)
            }
            T::Bool => (text::decode_bool, text::encode_bool, binary::decode_bool, binary::encode_bool),
            T::Char | T::Varchar => (text::decode_text, text::encode_text, binary::decode_text, binary::encode_text),
            T::Date => (text::decode_date, text::encode_date, binary::decode_date, binary::encode_date),
            T::Time => (text::decode_time, text::encode_time, binary::decode_time, binary::encode_time),
            T::Timetz => (text::decode_timetz, text::encode_timetz, binary::decode_timetz, binary::encode_timetz),
            T::Timestamp => {
                (text::decode_timestamp, text::encode_timestamp, binary::decode_timestamp, binary::encode_timestamp)
            }
            T::Timestamptz => (
                text::decode_timestamptz,
                text::encode_timestamptz,
                binary::decode_timestamp,
                binary::encode_timestamp,
            ),
        };
        Self { type_id, decode_text, encode_text, decode_binary, encode_binary }
    }

    pub fn type_id(&self) -> TypeIdentifier {
        self.type_id
    }

    pub fn decode(&self, raw: &RawValue, ctx: &ParseContext) -> Result<NativeValue> {
        match raw.format() {
            Format::Text => (self.decode_text)(self.type_id, raw.as_str(self.type_id)?, ctx),
            Format::Binary => (self.decode_binary)(self.type_id, raw.as_bytes(), ctx),
        }
    }

    pub fn encode(&self, value: &NativeValue, format: Format) -> Result<RawValue> {
        if !value.belongs_to(self.type_id) {
            return Err(value.mismatch(self.type_id));
        }
        match format {
            Format::Text => (self.encode_text)(self.type_id, value).map(RawValue::text),
            Format::Binary => (self.encode_binary)(self.type_id, value).map(RawValue::binary),
        }
    }
}

static GLOBAL_REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let config = CodecConfig::from_env();
    Registry::from_config(&config).unwrap_or_else(|e| {
        warn!("Invalid codec configuration ({}), using built-in defaults", e);
        Registry::new(ParseContext::default())
    })
});

/// Immutable table of codecs, one per [`TypeIdentifier`]
#[derive(Debug, Clone)]
pub struct Registry {
    codecs: [Codec; TypeIdentifier::COUNT],
    context: ParseContext,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(ParseContext::default())
    }
}

impl Registry {
    /// Process-wide registry, configured from the environment on first use
    pub fn global() -> &'static Registry {
        &GLOBAL_REGISTRY
    }

    pub fn new(context: ParseContext) -> Self {
        let codecs = TypeIdentifier::ALL.map(Codec::for_type);
        debug!(
            "Initialized codec registry: {} codecs, timezone table {} ({} entries)",
            codecs.len(),
            context.timezones.version(),
            context.timezones.len()
        );
        Self { codecs, context }
    }

    pub fn from_config(config: &CodecConfig) -> std::result::Result<Self, ConfigError> {
        let mut timezones = TimezoneTable::builtin();
        if let Some(path) = &config.timezone_table {
            timezones.extend(TimezoneTable::from_json_file(path)?);
        }

        let session_zone = timezones
            .resolve(&config.session_time_zone, TypeIdentifier::Timestamptz)
            .map_err(|_| ConfigError::UnknownTimezone(config.session_time_zone.clone()))?;

        Ok(Self::new(ParseContext::new(config.date_order, timezones, session_zone)))
    }

    pub fn codec(&self, type_id: TypeIdentifier) -> &Codec {
        &self.codecs[type_id.index()]
    }

    pub fn context(&self) -> &ParseContext {
        &self.context
    }

    pub fn decode(&self, type_id: TypeIdentifier, raw: &RawValue) -> Result<NativeValue> {
        self.codec(type_id).decode(raw, &self.context)
    }

    pub fn decode_text(&self, type_id: TypeIdentifier, text: &str) -> Result<NativeValue> {
        self.decode(type_id, &RawValue::text(text))
    }

    pub fn encode(&self, type_id: TypeIdentifier, value: &NativeValue, format: Format) -> Result<RawValue> {
        self.codec(type_id).encode(value, format)
    }

    /// Encode in text format and return the text
    pub fn encode_text(&self, type_id: TypeIdentifier, value: &NativeValue) -> Result<String> {
        let raw = self.encode(type_id, value, Format::Text)?;
        // Text encoders only produce Strings
        Ok(String::from_utf8_lossy(raw.as_bytes()).into_owned())
    }

    /// Decode one row; each column succeeds or fails on its own
    pub fn decode_row<'a, I>(&self, columns: I) -> Vec<ColumnResult>
    where
        I: IntoIterator<Item = (TypeIdentifier, Option<&'a RawValue>)>,
    {
        columns
            .into_iter()
            .map(|(type_id, raw)| raw.map(|raw| self.decode(type_id, raw)).transpose())
            .collect()
    }

    /// Decode by PostgreSQL type OID, as found in a RowDescription
    pub fn decode_oid(&self, oid: i32, raw: &RawValue) -> Option<Result<NativeValue>> {
        TypeIdentifier::from_oid(oid).map(|type_id| self.decode(type_id, raw))
    }
}
