//! # Date Normalizer
//!
//! Job dates arrive in whatever shape the writer used: epoch-millisecond
//! numbers from old builds, `"1700000000000"` strings, ISO timestamps,
//! plain `YYYY-MM-DD`, or garbage. Everything is folded into one canonical
//! calendar date.
//!
//! ## Normalization Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  input                       │ rule                  │ output           │
//! │  ────────────────────────────┼───────────────────────┼─────────────────│
//! │  "" / null / whitespace      │ empty                 │ today            │
//! │  1700000000000 (number)      │ epoch milliseconds    │ 2023-11-14       │
//! │  "1700000000000"             │ numeric, no '-'       │ 2023-11-14       │
//! │  "2024-03-05"                │ calendar date         │ 2024-03-05       │
//! │  "2024-03-05T23:30:00+05:30" │ instant, taken in UTC │ 2024-03-05       │
//! │  "not-a-date"                │ parse failure         │ today            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The function is total and idempotent: canonical output parses back to
//! itself. Instants are converted to UTC before the date is taken, and only
//! years 0000-9999 are accepted so the output always has four year digits.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Canonical on-the-wire format for every job date.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d";

/// Largest epoch-millisecond magnitude a date can carry (±100,000,000 days).
const MAX_EPOCH_MILLIS: f64 = 8.64e15;

/// Calendar-date formats tried after RFC 3339, in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d %b %Y", "%b %d, %Y"];

/// Date-time formats without an offset. These are read as UTC.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Today's calendar date in UTC.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Formats a date canonically (`YYYY-MM-DD`).
pub fn canonical(date: NaiveDate) -> String {
    date.format(CANONICAL_FORMAT).to_string()
}

/// Normalizes a raw date string against the current UTC date.
pub fn normalize_date(value: &str) -> NaiveDate {
    normalize_date_at(value, today())
}

/// Normalizes a raw date string, substituting `today` for anything that
/// cannot be read as a date.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use garage_core::date::normalize_date_at;
///
/// let today = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
/// assert_eq!(normalize_date_at("1700000000000", today).to_string(), "2023-11-14");
/// assert_eq!(normalize_date_at("not-a-date", today), today);
/// ```
pub fn normalize_date_at(value: &str, today: NaiveDate) -> NaiveDate {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return today;
    }

    if !trimmed.contains('-') {
        if let Ok(millis) = trimmed.parse::<f64>() {
            return from_epoch_millis(millis).unwrap_or(today);
        }
    }

    parse_calendar(trimmed).unwrap_or(today)
}

/// Normalizes a JSON value as found in a remote row or cache snapshot.
///
/// Numbers are epoch milliseconds; strings go through
/// [`normalize_date_at`]; anything else is today.
pub fn normalize_json_at(value: &Value, today: NaiveDate) -> NaiveDate {
    match value {
        Value::Number(n) => n
            .as_f64()
            .and_then(from_epoch_millis)
            .unwrap_or(today),
        Value::String(s) => normalize_date_at(s, today),
        _ => today,
    }
}

fn from_epoch_millis(millis: f64) -> Option<NaiveDate> {
    if !millis.is_finite() || millis.abs() > MAX_EPOCH_MILLIS {
        return None;
    }
    DateTime::from_timestamp_millis(millis.trunc() as i64)
        .map(|instant| instant.date_naive())
        .filter(in_canonical_range)
}

fn parse_calendar(value: &str) -> Option<NaiveDate> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&Utc).date_naive()).filter(in_canonical_range);
    }
    if let Ok(instant) = DateTime::parse_from_rfc2822(value) {
        return Some(instant.with_timezone(&Utc).date_naive()).filter(in_canonical_range);
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
        .filter(in_canonical_range)
}

fn in_canonical_range(date: &NaiveDate) -> bool {
    (0..=9999).contains(&date.year())
}

// =============================================================================
// Serde Helpers
// =============================================================================

/// `#[serde(with = "garage_core::date::canonical_date")]` for record fields.
///
/// Deserialization never fails: unreadable input becomes today.
pub mod canonical_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::canonical(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(super::normalize_json_at(&raw, super::today()))
    }
}

/// Serde default for date fields missing from a row.
pub fn default_today() -> NaiveDate {
    today()
}

// =============================================================================
// Unit Tests
// =============================================================================
