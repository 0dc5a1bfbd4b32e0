//! Text grammar for `date`, `time[tz]` and `timestamp[tz]` input.
//!
//! A value is read left to right: an optional era suffix is split off
//! first, then a date prefix, a time-of-day prefix, and whatever is left
//! is treated as the zone token.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::codec::ParseContext;
use crate::config::DateOrder;
use crate::error::CodecError;
use crate::types::{TypeIdentifier, Zone};
use crate::types::datetime_utils::{MICROS_PER_DAY, microseconds_to_time};

/// YYYY-MM-DD, YYYY/MM/DD, YYYY.MM.DD
static YEAR_FIRST_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4,})([-/.])(\d{1,2})([-/.])(\d{1,2})").expect("valid date pattern"));

/// MM-DD-YYYY, MM.DD.YYYY, MM/DD/YY (or day first, per DateOrder)
static YEAR_LAST_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})([-/.])(\d{1,2})([-/.])(\d{4,}|\d{2})\b").expect("valid date pattern"));

/// Jun 1,2008 / June 1, 2008 / Dec 31 2008
static MONTH_NAME_FIRST_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^([a-z]{3,9})\.?\s*(\d{1,2})(?:st|nd|rd|th)?\s*,?\s*(\d{4,})").expect("valid date pattern")
});

/// 1 Jun 2008 / 01-Jun-2008
static DAY_FIRST_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d{1,2})[\s-]+([a-z]{3,9})\.?[\s,-]+(\d{4,})").expect("valid date pattern")
});

/// H:MM[:SS[.ffffff]] [AM|PM]
static TIME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d{1,2}):(\d{1,2})(?::(\d{1,2})(?:[.,](\d+))?)?(?:\s*(am|pm)\b)?")
        .expect("valid time pattern")
});

const MONTH_NAMES: [&str; 12] = [
    "january", "february", "march", "april", "may", "june",
    "july", "august", "september", "october", "november", "december",
];

/// Calendar fields before validation, year in wire (era) numbering
struct DateFields {
    year: i32,
    month: u32,
    day: u32,
}

enum Special {
    Infinity,
    NegInfinity,
}

fn special_value(input: &str) -> Option<Special> {
    match input.trim().to_ascii_lowercase().as_str() {
        "infinity" | "+infinity" => Some(Special::Infinity),
        "-infinity" => Some(Special::NegInfinity),
        _ => None,
    }
}

/// Split a trailing `BC`/`AD` token; returns the remainder and whether it was BC
fn split_era(input: &str) -> (&str, bool) {
    let trimmed = input.trim();
    if let Some(idx) = trimmed.rfind(char::is_whitespace) {
        let (head, tail) = trimmed.split_at(idx);
        match tail.trim().to_ascii_uppercase().as_str() {
            "BC" | "B.C." => return (head.trim_end(), true),
            "AD" | "A.D." => return (head.trim_end(), false),
            _ => {}
        }
    }
    (trimmed, false)
}

fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.to_ascii_lowercase();
    MONTH_NAMES
        .iter()
        .position(|full| lower.len() >= 3 && full.starts_with(lower.as_str()))
        .map(|i| i as u32 + 1)
}

fn number<T: std::str::FromStr>(caps: &Captures<'_>, i: usize, type_id: TypeIdentifier) -> Result<T, CodecError> {
    caps[i].parse().map_err(|_| CodecError::range(type_id, &caps[0]))
}

/// Two-digit years follow the server's pivot: 00-69 is 20xx, 70-99 is 19xx
fn expand_two_digit_year(year: i32) -> i32 {
    if year < 70 { 2000 + year } else { 1900 + year }
}

fn year_last(year: i32, two_digit: bool) -> i32 {
    if two_digit { expand_two_digit_year(year) } else { year }
}

/// Read the date at the start of `input`, returning the unconsumed rest
fn parse_date_prefix<'a>(
    input: &'a str,
    order: DateOrder,
    type_id: TypeIdentifier,
) -> Result<(DateFields, &'a str), CodecError> {
    if let Some(caps) = YEAR_FIRST_PATTERN.captures(input)
        && caps[2] == caps[4]
    {
        let fields = DateFields {
            year: number(&caps, 1, type_id)?,
            month: number(&caps, 3, type_id)?,
            day: number(&caps, 5, type_id)?,
        };
        return Ok((fields, &input[caps[0].len()..]));
    }

    if let Some(caps) = YEAR_LAST_PATTERN.captures(input)
        && caps[2] == caps[4]
    {
        let first: u32 = number(&caps, 1, type_id)?;
        let second: u32 = number(&caps, 3, type_id)?;
        let third: i32 = number(&caps, 5, type_id)?;
        let two_digit_year = caps[5].len() == 2;
        let fields = match order {
            // yy-mm-dd when every field has two digits; a four-digit year stays last
            DateOrder::Ymd if two_digit_year && caps[1].len() == 2 => DateFields {
                year: expand_two_digit_year(first as i32),
                month: second,
                day: third as u32,
            },
            DateOrder::Dmy => DateFields { year: year_last(third, two_digit_year), month: second, day: first },
            DateOrder::Mdy | DateOrder::Ymd => {
                DateFields { year: year_last(third, two_digit_year), month: first, day: second }
            }
        };
        return Ok((fields, &input[caps[0].len()..]));
    }

    if let Some(caps) = MONTH_NAME_FIRST_PATTERN.captures(input)
        && let Some(month) = month_from_name(&caps[1])
    {
        let fields = DateFields { year: number(&caps, 3, type_id)?, month, day: number(&caps, 2, type_id)? };
        return Ok((fields, &input[caps[0].len()..]));
    }

    if let Some(caps) = DAY_FIRST_PATTERN.captures(input)
        && let Some(month) = month_from_name(&caps[2])
    {
        let fields = DateFields { year: number(&caps, 3, type_id)?, month, day: number(&caps, 1, type_id)? };
        return Ok((fields, &input[caps[0].len()..]));
    }

    Err(CodecError::format(type_id, input))
}

fn build_date(fields: DateFields, bc: bool, type_id: TypeIdentifier, input: &str) -> Result<NaiveDate, CodecError> {
    if fields.year == 0 {
        return Err(CodecError::range(type_id, input));
    }
    let year = if bc { 1 - fields.year } else { fields.year };
    NaiveDate::from_ymd_opt(year, fields.month, fields.day).ok_or_else(|| CodecError::range(type_id, input))
}

/// Read a time of day at the start of `input`.
///
/// Returns microseconds since midnight in `0..=MICROS_PER_DAY`; the upper
/// bound is the `24:00:00` end-of-day value, left for the caller to place.
fn parse_time_prefix(input: &str, type_id: TypeIdentifier) -> Result<(i64, &str), CodecError> {
    let caps = TIME_PATTERN.captures(input).ok_or_else(|| CodecError::format(type_id, input))?;
    let out_of_range = || CodecError::range(type_id, &caps[0]);

    let mut hour: i64 = number(&caps, 1, type_id)?;
    let minute: i64 = number(&caps, 2, type_id)?;
    let second: i64 = match caps.get(3) {
        Some(_) => number(&caps, 3, type_id)?,
        None => 0,
    };

    let mut micros: i64 = 0;
    if let Some(frac) = caps.get(4) {
        let digits = frac.as_str();
        let padded = format!("{:0<6}", &digits[..digits.len().min(6)]);
        micros = padded.parse().map_err(|_| out_of_range())?;
        // Round half up at the seventh digit, as the server does
        if digits.as_bytes().get(6).is_some_and(|d| *d >= b'5') {
            micros += 1;
        }
    }

    if let Some(meridiem) = caps.get(5) {
        if !(1..=12).contains(&hour) {
            return Err(out_of_range());
        }
        let pm = meridiem.as_str().eq_ignore_ascii_case("pm");
        hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
    }

    if minute > 59 || second > 59 || hour > 24 {
        return Err(out_of_range());
    }
    let total = ((hour * 60 + minute) * 60 + second) * 1_000_000 + micros;
    if total > MICROS_PER_DAY {
        return Err(out_of_range());
    }
    Ok((total, &input[caps[0].len()..]))
}

/// Fold the `24:00:00` sentinel back to midnight
fn time_of_day(micros: i64, type_id: TypeIdentifier, input: &str) -> Result<NaiveTime, CodecError> {
    microseconds_to_time(micros % MICROS_PER_DAY).ok_or_else(|| CodecError::range(type_id, input))
}

fn require_empty(rest: &str, type_id: TypeIdentifier, input: &str) -> Result<(), CodecError> {
    if rest.trim().is_empty() { Ok(()) } else { Err(CodecError::format(type_id, input)) }
}

/// Zone token if present, else the session zone
fn zone(rest: &str, ctx: &ParseContext, type_id: TypeIdentifier) -> Result<Zone, CodecError> {
    let token = rest.trim();
    if token.is_empty() { Ok(ctx.session_zone) } else { ctx.timezones.resolve(token, type_id) }
}

pub fn parse_date(input: &str, ctx: &ParseContext) -> Result<NaiveDate, CodecError> {
    let type_id = TypeIdentifier::Date;
    match special_value(input) {
        Some(Special::Infinity) => return Ok(NaiveDate::MAX),
        Some(Special::NegInfinity) => return Ok(NaiveDate::MIN),
        None => {}
    }

    let (body, bc) = split_era(input);
    let (fields, rest) = parse_date_prefix(body, ctx.date_order, type_id)?;
    require_empty(rest, type_id, input)?;
    build_date(fields, bc, type_id, input)
}

pub fn parse_time(input: &str) -> Result<NaiveTime, CodecError> {
    let type_id = TypeIdentifier::Time;
    let trimmed = input.trim();
    let (micros, rest) = parse_time_prefix(trimmed, type_id)?;
    require_empty(rest, type_id, input)?;
    time_of_day(micros, type_id, input)
}

/// Time of day with zone, normalized to UTC modulo 24 hours.
///
/// There is no date to consult daylight-saving rules against, so a region
/// name contributes its standard offset.
pub fn parse_timetz(input: &str, ctx: &ParseContext) -> Result<NaiveTime, CodecError> {
    let type_id = TypeIdentifier::Timetz;
    let trimmed = input.trim();
    let (micros, rest) = parse_time_prefix(trimmed, type_id)?;
    let offset = zone(rest, ctx, type_id)?.standard_offset();
    let local = time_of_day(micros, type_id, input)?;
    let (utc, _) = local.overflowing_sub_signed(TimeDelta::seconds(offset.local_minus_utc() as i64));
    Ok(utc)
}

/// Date, optional time, and the unconsumed rest
fn parse_datetime_prefix<'a>(
    body: &'a str,
    bc: bool,
    ctx: &ParseContext,
    type_id: TypeIdentifier,
    input: &str,
) -> Result<(NaiveDateTime, &'a str), CodecError> {
    let (fields, rest) = parse_date_prefix(body, ctx.date_order, type_id)?;
    let date = build_date(fields, bc, type_id, input)?;

    let rest = rest.trim_start();
    let starts_with_digit = |s: &str| s.starts_with(|c: char| c.is_ascii_digit());
    let rest = match rest.strip_prefix(['T', 't']) {
        Some(time) if starts_with_digit(time) => time,
        _ => rest,
    };
    let (micros, rest) = if starts_with_digit(rest) {
        parse_time_prefix(rest, type_id)?
    } else {
        (0, rest)
    };

    // 24:00:00 on a timestamp is midnight of the following day
    let datetime = date
        .and_time(NaiveTime::MIN)
        .checked_add_signed(TimeDelta::microseconds(micros))
        .ok_or_else(|| CodecError::range(type_id, input))?;
    Ok((datetime, rest))
}

pub fn parse_timestamp(input: &str, ctx: &ParseContext) -> Result<NaiveDateTime, CodecError> {
    let type_id = TypeIdentifier::Timestamp;
    match special_value(input) {
        Some(Special::Infinity) => return Ok(NaiveDateTime::MAX),
        Some(Special::NegInfinity) => return Ok(NaiveDateTime::MIN),
        None => {}
    }

    let (body, bc) = split_era(input);
    let (datetime, rest) = parse_datetime_prefix(body, bc, ctx, type_id, input)?;
    require_empty(rest, type_id, input)?;
    Ok(datetime)
}

/// Timestamp with zone, returned as the equivalent UTC instant
pub fn parse_timestamptz(input: &str, ctx: &ParseContext) -> Result<DateTime<Utc>, CodecError> {
    let type_id = TypeIdentifier::Timestamptz;
    match special_value(input) {
        Some(Special::Infinity) => return Ok(NaiveDateTime::MAX.and_utc()),
        Some(Special::NegInfinity) => return Ok(NaiveDateTime::MIN.and_utc()),
        None => {}
    }

    let (body, bc) = split_era(input);
    let (local, rest) = parse_datetime_prefix(body, bc, ctx, type_id, input)?;
    let offset = zone(rest, ctx, type_id)?.offset_at(local);
    local
        .checked_sub_signed(TimeDelta::seconds(offset.local_minus_utc() as i64))
        .map(|utc| utc.and_utc())
        .ok_or_else(|| CodecError::range(type_id, input))
}
