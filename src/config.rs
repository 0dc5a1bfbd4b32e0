use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

use crate::error::ConfigError;

/// Field order for ambiguous numeric dates such as `01-06-2020` or `20-01-06`.
/// Mirrors the server's `DateStyle` order component; `Ymd` reads all-two-digit
/// dates year first and otherwise behaves like `Mdy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DateOrder {
    #[default]
    Mdy,
    Dmy,
    Ymd,
}

impl FromStr for DateOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MDY" | "US" => Ok(DateOrder::Mdy),
            "DMY" | "EUROPEAN" => Ok(DateOrder::Dmy),
            "YMD" => Ok(DateOrder::Ymd),
            _ => Err(ConfigError::InvalidDateOrder(s.to_string())),
        }
    }
}

/// Configuration for building a [`Registry`](crate::Registry)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Month/day order for ambiguous numeric dates
    pub date_order: DateOrder,
    /// Zone assumed for timestamptz/timetz input that carries none
    pub session_time_zone: String,
    /// JSON table merged over the built-in time zone abbreviations
    pub timezone_table: Option<PathBuf>,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            date_order: DateOrder::Mdy,
            session_time_zone: "UTC".to_string(),
            timezone_table: None,
        }
    }
}

impl CodecConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("PGCODEC_DATE_ORDER") {
            match val.parse::<DateOrder>() {
                Ok(order) => config.date_order = order,
                Err(e) => warn!("Ignoring PGCODEC_DATE_ORDER: {}", e),
            }
        }

        if let Ok(zone) = std::env::var("PGCODEC_TIMEZONE")
            && !zone.trim().is_empty()
        {
            config.session_time_zone = zone.trim().to_string();
        }

        if let Ok(path) = std::env::var("PGCODEC_TIMEZONE_TABLE")
            && !path.is_empty()
        {
            config.timezone_table = Some(PathBuf::from(path));
        }

        config
    }

    /// Parse configuration from a JSON document; missing fields take defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
