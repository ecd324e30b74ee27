//! Date/time utilities for filedock.
//!
//! Timestamps are stored in SQLite as TEXT in `datetime('now')` format
//! (UTC, `YYYY-MM-DD HH:MM:SS`) and converted to RFC 3339 at the API
//! boundary.

use chrono::NaiveDateTime;

/// Convert a stored UTC timestamp to RFC 3339 format.
///
/// Returns the input unchanged if it does not parse as a SQLite datetime.
pub fn to_rfc3339(datetime_str: &str) -> String {
    match NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%d %H:%M:%S") {
        Ok(naive) => naive
            .and_utc()
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        Err(_) => datetime_str.to_string(),
    }
}
