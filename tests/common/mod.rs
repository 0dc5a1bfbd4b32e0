use std::sync::Once;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Route library logs to the test harness; filter with `RUST_LOG`
#[allow(dead_code)]
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

#[allow(dead_code)]
pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[allow(dead_code)]
pub fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, s).unwrap()
}

#[allow(dead_code)]
pub fn naive(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    ymd(y, mo, d).and_hms_opt(h, mi, s).unwrap()
}

#[allow(dead_code)]
pub fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    naive(y, mo, d, h, mi, s).and_utc()
}
