/// Utility functions for datetime conversions against the PostgreSQL epoch
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Utc};
use std::fmt::Write;

/// PostgreSQL epoch (2000-01-01) in days from 0001-01-01 (CE day 1)
const PG_EPOCH_CE_DAYS: i32 = 730120;

/// Microseconds in one day
pub const MICROS_PER_DAY: i64 = 86_400_000_000;

/// 2000-01-01 00:00:00
fn pg_epoch() -> NaiveDateTime {
    NaiveDate::from_num_days_from_ce_opt(PG_EPOCH_CE_DAYS)
        .unwrap_or_default()
        .and_time(NaiveTime::MIN)
}

/// Days since 2000-01-01; infinite dates map to the i32 sentinels
pub fn date_to_pg_days(date: NaiveDate) -> i32 {
    if date == NaiveDate::MAX {
        return i32::MAX;
    }
    if date == NaiveDate::MIN {
        return i32::MIN;
    }
    date.num_days_from_ce() - PG_EPOCH_CE_DAYS
}

/// Inverse of [`date_to_pg_days`]; `None` outside the calendar range
pub fn pg_days_to_date(days: i32) -> Option<NaiveDate> {
    match days {
        i32::MAX => Some(NaiveDate::MAX),
        i32::MIN => Some(NaiveDate::MIN),
        _ => NaiveDate::from_num_days_from_ce_opt(days.checked_add(PG_EPOCH_CE_DAYS)?),
    }
}

/// Microseconds since midnight, sub-microsecond precision dropped
pub fn time_to_microseconds(time: NaiveTime) -> i64 {
    let micros = (time.nanosecond() / 1000).min(999_999);
    time.num_seconds_from_midnight() as i64 * 1_000_000 + micros as i64
}

/// Time of day for a microsecond count in `0..MICROS_PER_DAY`
pub fn microseconds_to_time(micros: i64) -> Option<NaiveTime> {
    if !(0..MICROS_PER_DAY).contains(&micros) {
        return None;
    }
    let secs = (micros / 1_000_000) as u32;
    let nanos = (micros % 1_000_000) as u32 * 1000;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
}

/// Microseconds since 2000-01-01 00:00:00; infinite timestamps map to the i64 sentinels
pub fn datetime_to_pg_microseconds(dt: &NaiveDateTime) -> Option<i64> {
    if *dt == NaiveDateTime::MAX {
        return Some(i64::MAX);
    }
    if *dt == NaiveDateTime::MIN {
        return Some(i64::MIN);
    }
    dt.signed_duration_since(pg_epoch()).num_microseconds()
}

pub fn pg_microseconds_to_datetime(micros: i64) -> Option<NaiveDateTime> {
    match micros {
        i64::MAX => Some(NaiveDateTime::MAX),
        i64::MIN => Some(NaiveDateTime::MIN),
        _ => pg_epoch().checked_add_signed(TimeDelta::microseconds(micros)),
    }
}

/// Year as written on the wire: astronomical year 0 is 1 BC
fn era_year(year: i32) -> (i32, bool) {
    if year <= 0 { (1 - year, true) } else { (year, false) }
}

/// Append `YYYY-MM-DD`, without the era suffix
fn push_date_fields(buf: &mut String, date: NaiveDate) {
    let (year, _) = era_year(date.year());
    let _ = write!(buf, "{:04}-{:02}-{:02}", year, date.month(), date.day());
}

/// Append `HH:MM:SS[.ffffff]`, trailing fractional zeros trimmed
pub fn push_time(buf: &mut String, time: NaiveTime) {
    let micros = time_to_microseconds(time) % 1_000_000;
    let _ = write!(buf, "{:02}:{:02}:{:02}", time.hour(), time.minute(), time.second());
    if micros > 0 {
        let frac = format!("{micros:06}");
        buf.push('.');
        buf.push_str(frac.trim_end_matches('0'));
    }
}

/// Format a date as PostgreSQL does in ISO style
pub fn format_date(date: NaiveDate) -> String {
    if date == NaiveDate::MAX {
        return "infinity".to_string();
    }
    if date == NaiveDate::MIN {
        return "-infinity".to_string();
    }
    let mut buf = String::with_capacity(13);
    push_date_fields(&mut buf, date);
    if era_year(date.year()).1 {
        buf.push_str(" BC");
    }
    buf
}

pub fn format_time(time: NaiveTime) -> String {
    let mut buf = String::with_capacity(15);
    push_time(&mut buf, time);
    buf
}

/// Time of day already normalized to UTC
pub fn format_timetz(time: NaiveTime) -> String {
    let mut buf = String::with_capacity(18);
    push_time(&mut buf, time);
    buf.push_str("+00");
    buf
}

fn format_datetime(dt: &NaiveDateTime, zone_suffix: &str) -> String {
    let mut buf = String::with_capacity(32);
    push_date_fields(&mut buf, dt.date());
    buf.push(' ');
    push_time(&mut buf, dt.time());
    buf.push_str(zone_suffix);
    if era_year(dt.year()).1 {
        buf.push_str(" BC");
    }
    buf
}

pub fn format_timestamp(dt: &NaiveDateTime) -> String {
    if *dt == NaiveDateTime::MAX {
        return "infinity".to_string();
    }
    if *dt == NaiveDateTime::MIN {
        return "-infinity".to_string();
    }
    format_datetime(dt, "")
}

pub fn format_timestamptz(dt: &DateTime<Utc>) -> String {
    let naive = dt.naive_utc();
    if naive == NaiveDateTime::MAX {
        return "infinity".to_string();
    }
    if naive == NaiveDateTime::MIN {
        return "-infinity".to_string();
    }
    format_datetime(&naive, "+00")
}
