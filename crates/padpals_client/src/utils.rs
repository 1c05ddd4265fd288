//! Utility functions for date normalization at the API boundary.

use chrono::NaiveDate;

/// Parse a calendar date as sent by the storefront API or typed by a user.
///
/// Accepts:
/// - YYYY-MM-DD
/// - RFC3339 datetime (the date in the timestamp's own offset is kept)
/// - Naive datetime YYYY-MM-DDTHH:MM:SS
pub fn parse_api_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(ndt.date());
    }
    None
}
