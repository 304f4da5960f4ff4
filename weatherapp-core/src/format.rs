//! Display helpers shared by the front-ends.

use chrono::{DateTime, FixedOffset};

pub const PLACEHOLDER: &str = "N/A";

pub const DATE_PATTERN: &str = "%b %d %Y";
pub const TIME_PATTERN: &str = "%H:%M";
pub const WEEKDAY_PATTERN: &str = "%a";
/// Day header of the forecast view, e.g. "Wed, Nov 15".
pub const DAY_PATTERN: &str = "%a, %b %d";

/// URL of the provider's 2x icon for `icon` (e.g. "10d").
pub fn icon_url(icon: &str) -> String {
    format!("https://openweathermap.org/img/wn/{icon}@2x.png")
}

/// Format a unix timestamp in the location's own UTC offset.
///
/// Falls back to UTC when the offset is missing or out of range.
pub fn format_unix(ts: i64, tz_offset_secs: Option<i32>, pattern: &str) -> String {
    let Some(utc) = DateTime::from_timestamp(ts, 0) else {
        return PLACEHOLDER.to_string();
    };

    match tz_offset_secs.and_then(FixedOffset::east_opt) {
        Some(offset) => utc.with_timezone(&offset).format(pattern).to_string(),
        None => utc.format(pattern).to_string(),
    }
}

/// Like [`format_unix`], for an optional timestamp.
pub fn format_opt_unix(ts: Option<i64>, tz_offset_secs: Option<i32>, pattern: &str) -> String {
    ts.map(|ts| format_unix(ts, tz_offset_secs, pattern))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn or_placeholder<T: ToString>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Whole-degree temperature with its unit suffix, `N/A` when absent.
///
/// The fraction is dropped toward zero, so 14.6 shows as 14 and -3.7 as -3.
pub fn temperature(value: Option<f64>, suffix: &str) -> String {
    value
        .map(|t| format!("{}{suffix}", t.trunc() as i64))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Eight-point compass name for a wind direction in degrees.
pub fn compass(deg: u16) -> &'static str {
    const POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    POINTS[(((deg % 360) as usize * 2 + 45) / 90) % 8]
}
