//! Time zone resolution for `timestamptz` and `timetz` decoding.
//!
//! Abbreviations (`EST`, `CET`, ...) come from a versioned table and map to
//! one fixed UTC offset each. Region names (`America/New_York`) come from
//! the IANA database and carry their daylight-saving rules, so the offset
//! depends on the wall-clock time being converted.

use chrono::{FixedOffset, LocalResult, NaiveDateTime, Offset, TimeDelta, TimeZone};
use chrono_tz::{OffsetComponents, Tz};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{CodecError, ConfigError};
use crate::types::TypeIdentifier;

pub const BUILTIN_TABLE_VERSION: &str = "builtin-1";

/// Largest displacement the server accepts: 15:59:59
const MAX_OFFSET_SECONDS: i32 = 15 * 3600 + 59 * 60 + 59;

const HOUR: i32 = 3600;
const HALF: i32 = 1800;

static BUILTIN_ZONES: &[(&str, i32)] = &[
    ("UTC", 0),
    ("UT", 0),
    ("Z", 0),
    ("ZULU", 0),
    ("GMT", 0),
    ("WET", 0),
    ("WEST", HOUR),
    ("BST", HOUR),
    ("CET", HOUR),
    ("CEST", 2 * HOUR),
    ("MET", HOUR),
    ("MEST", 2 * HOUR),
    ("EET", 2 * HOUR),
    ("EEST", 3 * HOUR),
    ("IST", 2 * HOUR),
    ("MSK", 3 * HOUR),
    ("NST", -(3 * HOUR + HALF)),
    ("NDT", -(2 * HOUR + HALF)),
    ("AST", -4 * HOUR),
    ("ADT", -3 * HOUR),
    ("EST", -5 * HOUR),
    ("EDT", -4 * HOUR),
    ("CST", -6 * HOUR),
    ("CDT", -5 * HOUR),
    ("MST", -7 * HOUR),
    ("MDT", -6 * HOUR),
    ("PST", -8 * HOUR),
    ("PDT", -7 * HOUR),
    ("AKST", -9 * HOUR),
    ("AKDT", -8 * HOUR),
    ("HST", -10 * HOUR),
    ("SGT", 8 * HOUR),
    ("HKT", 8 * HOUR),
    ("AWST", 8 * HOUR),
    ("WST", 8 * HOUR),
    ("WDT", 9 * HOUR),
    ("JST", 9 * HOUR),
    ("KST", 9 * HOUR),
    ("ACST", 9 * HOUR + HALF),
    ("ACDT", 10 * HOUR + HALF),
    ("AEST", 10 * HOUR),
    ("AEDT", 11 * HOUR),
    ("NZST", 12 * HOUR),
    ("NZDT", 13 * HOUR),
];

static NUMERIC_OFFSET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-])(\d{1,2})(?::?(\d{2}))?(?::?(\d{2}))?$").expect("valid offset pattern")
});

/// On-disk shape of a user supplied table
#[derive(Debug, Deserialize)]
struct TimezoneTableFile {
    #[serde(default)]
    version: Option<String>,
    zones: HashMap<String, String>,
}

/// Longest daylight-saving gap searched when a wall-clock time does not exist
const MAX_GAP_STEPS: i64 = 8;

/// Days from 1970-01-01 to 2000-01-01, whose rules define a region's standard offset
const STANDARD_REFERENCE_DAYS: i64 = 10_957;

/// A resolved zone token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Fixed(FixedOffset),
    Region(Tz),
}

impl From<FixedOffset> for Zone {
    fn from(offset: FixedOffset) -> Self {
        Zone::Fixed(offset)
    }
}

impl From<Tz> for Zone {
    fn from(tz: Tz) -> Self {
        Zone::Region(tz)
    }
}

impl Zone {
    /// Offset in force at the wall-clock time `local`.
    ///
    /// An ambiguous time (clocks turned back) reads as standard time, the
    /// later instant. A skipped time (clocks turned forward) takes the
    /// offset in force just before the transition.
    pub fn offset_at(&self, local: NaiveDateTime) -> FixedOffset {
        let tz = match self {
            Zone::Fixed(offset) => return *offset,
            Zone::Region(tz) => tz,
        };
        match tz.offset_from_local_datetime(&local) {
            LocalResult::Single(offset) => offset.fix(),
            LocalResult::Ambiguous(_, later) => later.fix(),
            LocalResult::None => (1..=MAX_GAP_STEPS)
                .find_map(|step| {
                    let before = local.checked_sub_signed(TimeDelta::minutes(30 * step))?;
                    tz.offset_from_local_datetime(&before).latest().map(|o| o.fix())
                })
                .unwrap_or_else(|| self.standard_offset()),
        }
    }

    /// Offset without daylight saving, used where no date is known (`timetz`)
    pub fn standard_offset(&self) -> FixedOffset {
        match self {
            Zone::Fixed(offset) => *offset,
            Zone::Region(tz) => {
                let reference = NaiveDateTime::default() + TimeDelta::days(STANDARD_REFERENCE_DAYS);
                let offset = tz.offset_from_utc_datetime(&reference);
                FixedOffset::east_opt(offset.base_utc_offset().num_seconds() as i32).unwrap_or_else(|| offset.fix())
            }
        }
    }
}

/// Immutable mapping from zone abbreviations to fixed UTC offsets
#[derive(Debug, Clone, PartialEq)]
pub struct TimezoneTable {
    version: String,
    zones: HashMap<String, FixedOffset>,
}

impl Default for TimezoneTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TimezoneTable {
    /// Table without any entries; numeric offsets still resolve
    pub fn empty(version: impl Into<String>) -> Self {
        Self { version: version.into(), zones: HashMap::new() }
    }

    pub fn builtin() -> Self {
        let zones = BUILTIN_ZONES
            .iter()
            .filter_map(|(name, secs)| FixedOffset::east_opt(*secs).map(|offset| (name.to_string(), offset)))
            .collect();
        Self { version: BUILTIN_TABLE_VERSION.to_string(), zones }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Look up a zone name, case-insensitively
    pub fn get(&self, name: &str) -> Option<FixedOffset> {
        self.zones.get(&name.to_ascii_uppercase()).copied()
    }

    pub fn insert(&mut self, name: &str, offset: FixedOffset) {
        self.zones.insert(name.to_ascii_uppercase(), offset);
    }

    /// Add or override entries from `other`; the version becomes `other`'s
    pub fn extend(&mut self, other: TimezoneTable) {
        self.version = other.version;
        self.zones.extend(other.zones);
    }

    /// Parse a JSON table: `{"version": "...", "zones": {"EST": "-05:00"}}`
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let file: TimezoneTableFile = serde_json::from_str(json)?;
        let mut table = Self::empty(file.version.unwrap_or_else(|| "custom".to_string()));
        for (name, offset) in file.zones {
            match parse_numeric_offset(offset.trim()) {
                Some(secs) if secs.abs() <= MAX_OFFSET_SECONDS => {
                    if let Some(fixed) = FixedOffset::east_opt(secs) {
                        table.insert(&name, fixed);
                        continue;
                    }
                    return Err(ConfigError::InvalidOffset { name, offset });
                }
                _ => return Err(ConfigError::InvalidOffset { name, offset }),
            }
        }
        Ok(table)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("Loading timezone table from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        let table = Self::from_json_str(&json)?;
        info!("Loaded {} timezone entries (version {}) from {}", table.len(), table.version, path.display());
        Ok(table)
    }

    /// Resolve a zone token: a numeric offset such as `+05:30`, an
    /// abbreviation present in the table, or an IANA region name.
    /// Abbreviations win over region names of the same spelling.
    pub fn resolve(&self, token: &str, type_id: TypeIdentifier) -> Result<Zone, CodecError> {
        let token = token.trim();
        if token.starts_with(['+', '-']) {
            let secs = parse_numeric_offset(token).ok_or_else(|| CodecError::format(type_id, token))?;
            if secs.abs() > MAX_OFFSET_SECONDS {
                return Err(CodecError::range(type_id, token));
            }
            return FixedOffset::east_opt(secs).map(Zone::Fixed).ok_or_else(|| CodecError::range(type_id, token));
        }
        if let Some(offset) = self.get(token) {
            return Ok(Zone::Fixed(offset));
        }
        Tz::from_str_insensitive(token)
            .map(Zone::Region)
            .map_err(|_| CodecError::UnknownTimezone(token.to_string()))
    }
}

/// Seconds east of UTC for `±HH`, `±HHMM`, `±HH:MM` or `±HH:MM:SS`
fn parse_numeric_offset(token: &str) -> Option<i32> {
    let caps = NUMERIC_OFFSET_PATTERN.captures(token)?;
    let field = |i: usize| caps.get(i).map_or(Some(0), |m| m.as_str().parse::<i32>().ok());
    let (hours, minutes, seconds) = (field(2)?, field(3)?, field(4)?);
    if minutes > 59 || seconds > 59 {
        return None;
    }
    let secs = hours * 3600 + minutes * 60 + seconds;
    Some(if &caps[1] == "-" { -secs } else { secs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn hours(h: i32) -> FixedOffset {
        FixedOffset::east_opt(h * 3600).unwrap()
    }

    #[test]
    fn test_builtin_abbreviations() {
        let table = TimezoneTable::builtin();
        assert_eq!(table.get("EST"), Some(hours(-5)));
        assert_eq!(table.get("cet"), Some(hours(1)));
        assert_eq!(table.get("WDT"), Some(hours(9)));
        assert_eq!(table.get("US/Pacific"), None);
        assert_eq!(table.get("GMT"), Some(hours(0)));
        assert_eq!(table.get("XYZ"), None);
    }

    #[test]
    fn test_resolve_numeric_offsets() {
        let table = TimezoneTable::builtin();
        let t = TypeIdentifier::Timestamptz;
        assert_eq!(table.resolve("+05", t).unwrap(), Zone::Fixed(hours(5)));
        assert_eq!(table.resolve("-0800", t).unwrap(), Zone::Fixed(hours(-8)));
        assert_eq!(
            table.resolve("+05:30", t).unwrap(),
            Zone::Fixed(FixedOffset::east_opt(5 * 3600 + 1800).unwrap())
        );
        assert_eq!(
            table.resolve("-03:30:15", t).unwrap(),
            Zone::Fixed(FixedOffset::east_opt(-(3 * 3600 + 1800 + 15)).unwrap())
        );
        assert!(matches!(table.resolve("+16", t), Err(CodecError::Range { .. })));
        assert!(matches!(table.resolve("+05:75", t), Err(CodecError::Format { .. })));
    }

    #[test]
    fn test_resolve_unknown_name() {
        let table = TimezoneTable::builtin();
        assert_eq!(
            table.resolve("Mars/Olympus", TypeIdentifier::Timetz),
            Err(CodecError::UnknownTimezone("Mars/Olympus".to_string()))
        );
    }

    #[test]
    fn test_region_names_follow_daylight_saving() {
        let table = TimezoneTable::builtin();
        let t = TypeIdentifier::Timestamptz;
        let zone = table.resolve("america/new_york", t).unwrap();
        assert_eq!(zone, Zone::Region(Tz::America__New_York));

        let at = |y, m, d, h, mi| NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, mi, 0).unwrap();
        assert_eq!(zone.offset_at(at(2008, 6, 1, 9, 59)), hours(-4));
        assert_eq!(zone.offset_at(at(2008, 12, 31, 18, 20)), hours(-5));
        // Clocks turned back: 01:30 happens twice, read as standard time
        assert_eq!(zone.offset_at(at(2008, 11, 2, 1, 30)), hours(-5));
        // Clocks turned forward: 02:30 never happens, keep the earlier offset
        assert_eq!(zone.offset_at(at(2008, 3, 9, 2, 30)), hours(-5));
        assert_eq!(zone.standard_offset(), hours(-5));

        let sydney = table.resolve("Australia/Sydney", t).unwrap();
        assert_eq!(sydney.standard_offset(), hours(10));
        assert_eq!(sydney.offset_at(at(2020, 1, 15, 12, 0)), hours(11));
    }

    #[test]
    fn test_abbreviations_win_over_region_names() {
        let mut table = TimezoneTable::builtin();
        table.insert("EST", hours(-4));
        assert_eq!(table.resolve("EST", TypeIdentifier::Timestamptz).unwrap(), Zone::Fixed(hours(-4)));
    }

    #[test]
    fn test_json_table_extends_builtin() {
        let custom = TimezoneTable::from_json_str(
            r#"{"version": "site-2024", "zones": {"IST": "+05:30", "XST": "-02"}}"#,
        )
        .unwrap();
        assert_eq!(custom.version(), "site-2024");

        let mut table = TimezoneTable::builtin();
        table.extend(custom);
        assert_eq!(table.get("IST"), FixedOffset::east_opt(5 * 3600 + 1800));
        assert_eq!(table.get("xst"), Some(hours(-2)));
        assert_eq!(table.get("EST"), Some(hours(-5)));
        assert_eq!(table.version(), "site-2024");
    }

    #[test]
    fn test_json_table_rejects_bad_offset() {
        let err = TimezoneTable::from_json_str(r#"{"zones": {"BAD": "noon"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOffset { .. }));
    }
}
