use chrono::{DateTime, Duration, Local, NaiveDate};

/// `100 * part / whole`, or `None` when there is nothing to divide by
pub fn percent(part: u64, whole: u64) -> Option<f64> {
    match whole {
        0 => None,
        w => Some(part as f64 * 100.0 / w as f64),
    }
}

pub fn epoch_ms(at: DateTime<Local>) -> i64 {
    at.timestamp_millis()
}

pub fn days_ago_ms(now: DateTime<Local>, days: i64) -> i64 {
    epoch_ms(now - Duration::days(days))
}

/// Calendar-day string as written to the store
pub fn format_day(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Parse a stored calendar day. Older records used the browser's
/// `Date.toDateString()` form, e.g. `Mon Oct 19 2026`.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%a %b %d %Y"))
        .ok()
}
