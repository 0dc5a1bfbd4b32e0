//! Field- and tick-based constructors for parameter values.
//!
//! Tick constructors read seconds since the Unix epoch and interpret them in
//! the local system time zone before handing the calendar fields to the
//! field constructors.

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::Result;
use crate::error::CodecError;
use crate::types::{Binary, NativeValue, TypeIdentifier};

/// Seconds since the Unix epoch.
///
/// Floating-point seconds convert through `TryFrom`, truncating toward zero;
/// NaN, infinities and values beyond `i64` are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticks(pub i64);

impl From<i64> for Ticks {
    fn from(secs: i64) -> Self {
        Ticks(secs)
    }
}

impl From<i32> for Ticks {
    fn from(secs: i32) -> Self {
        Ticks(secs as i64)
    }
}

impl TryFrom<f64> for Ticks {
    type Error = CodecError;

    fn try_from(secs: f64) -> Result<Self> {
        let whole = secs.trunc();
        // i64::MAX as f64 rounds up to 2^63, itself out of range
        if !whole.is_finite() || whole < i64::MIN as f64 || whole >= i64::MAX as f64 {
            return Err(CodecError::range(TypeIdentifier::Timestamp, secs));
        }
        Ok(Ticks(whole as i64))
    }
}

pub fn date(year: i32, month: u32, day: u32) -> Result<NativeValue> {
    NaiveDate::from_ymd_opt(year, month, day)
        .map(NativeValue::Date)
        .ok_or_else(|| CodecError::range(TypeIdentifier::Date, format!("{year}-{month}-{day}")))
}

pub fn time(hour: u32, minute: u32, second: u32) -> Result<NativeValue> {
    NaiveTime::from_hms_opt(hour, minute, second)
        .map(NativeValue::Time)
        .ok_or_else(|| CodecError::range(TypeIdentifier::Time, format!("{hour}:{minute}:{second}")))
}

pub fn timestamp(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Result<NativeValue> {
    let date = NaiveDate::from_ymd_opt(year, month, day);
    let time = NaiveTime::from_hms_opt(hour, minute, second);
    match (date, time) {
        (Some(d), Some(t)) => Ok(NativeValue::Timestamp(NaiveDateTime::new(d, t))),
        _ => Err(CodecError::range(
            TypeIdentifier::Timestamp,
            format!("{year}-{month}-{day} {hour}:{minute}:{second}"),
        )),
    }
}

fn local_fields(ticks: Ticks, type_id: TypeIdentifier) -> Result<NaiveDateTime> {
    DateTime::from_timestamp(ticks.0, 0)
        .map(|utc| utc.with_timezone(&Local).naive_local())
        .ok_or_else(|| CodecError::range(type_id, ticks.0))
}

pub fn date_from_ticks(ticks: impl Into<Ticks>) -> Result<NativeValue> {
    let local = local_fields(ticks.into(), TypeIdentifier::Date)?;
    date(local.year(), local.month(), local.day())
}

pub fn time_from_ticks(ticks: impl Into<Ticks>) -> Result<NativeValue> {
    let local = local_fields(ticks.into(), TypeIdentifier::Time)?;
    time(local.hour(), local.minute(), local.second())
}

pub fn timestamp_from_ticks(ticks: impl Into<Ticks>) -> Result<NativeValue> {
    let local = local_fields(ticks.into(), TypeIdentifier::Timestamp)?;
    timestamp(local.year(), local.month(), local.day(), local.hour(), local.minute(), local.second())
}

/// Mark a byte string as a binary parameter
pub fn binary(bytes: impl Into<bytes::Bytes>) -> Binary {
    Binary::new(bytes)
}
