//! Time helpers for countdown and schedule displays
//!
//! Everything here is pure. Unparseable input is never an error: it turns
//! into `None` or a fallback string the caller can show as-is.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Philippine Standard Time, UTC+08:00 with no daylight saving
pub const DISPLAY_OFFSET_SECS: i32 = 8 * 3600;

/// Shown when a schedule has no date yet
pub const UNSCHEDULED: &str = "TBD";

const MILLIS_PER_MINUTE: u64 = 60_000;
const MINUTES_PER_DAY: u64 = 24 * 60;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
];

/// Time left until (or elapsed since) a target instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Countdown {
    /// Signed milliseconds from now to the target; negative once it has passed
    pub raw: i64,
    pub is_past: bool,
    /// `raw` rendered by [`format_duration`]
    pub text: String,
}

fn display_offset() -> Option<FixedOffset> {
    FixedOffset::east_opt(DISPLAY_OFFSET_SECS)
}

/// Parse a date-like string into epoch milliseconds.
///
/// Accepts RFC 3339, RFC 2822, ISO date-times with an offset or `Z` (seconds
/// optional), the date-only forms `YYYY`, `YYYY-MM` and `YYYY-MM-DD`
/// (midnight UTC) and date-times without an offset, which are read as
/// Philippine time.
pub fn to_millis(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp_millis());
    }
    if let Some(dt) = OFFSET_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(value, fmt).ok())
    {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.timestamp_millis());
    }
    if let Some(date) = parse_date_only(value) {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
    }
    if let Some(utc) = value.strip_suffix('Z') {
        let naive = parse_naive_datetime(utc)?;
        return Some(naive.and_utc().timestamp_millis());
    }

    let naive = parse_naive_datetime(value)?;
    let local = display_offset()?.from_local_datetime(&naive).single()?;
    Some(local.timestamp_millis())
}

fn parse_naive_datetime(value: &str) -> Option<NaiveDateTime> {
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

// `YYYY`, `YYYY-MM` or `YYYY-MM-DD`
fn parse_date_only(value: &str) -> Option<NaiveDate> {
    let mut fields = value.split('-');
    let year = fields.next()?;
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match (fields.next(), fields.next(), fields.next()) {
        (None, None, None) => NaiveDate::from_ymd_opt(year.parse().ok()?, 1, 1),
        (Some(month), None, None) if month.len() == 2 => {
            NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d").ok()
        }
        (Some(_), Some(_), None) => NaiveDate::parse_from_str(value, "%Y-%m-%d").ok(),
        _ => None,
    }
}

/// Render a duration as `"{d}d {h}h {m}m"`.
///
/// The sign is ignored and seconds are dropped. The day segment only
/// appears when non-zero, the hour segment when days or hours are non-zero.
pub fn format_duration(millis: i64) -> String {
    let minutes_total = millis.unsigned_abs() / MILLIS_PER_MINUTE;
    let days = minutes_total / MINUTES_PER_DAY;
    let hours = (minutes_total % MINUTES_PER_DAY) / 60;
    let minutes = minutes_total % 60;

    let mut parts = Vec::with_capacity(3);
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if days > 0 || hours > 0 {
        parts.push(format!("{hours}h"));
    }
    parts.push(format!("{minutes}m"));
    parts.join(" ")
}

/// [`format_duration`] for fractional input, truncated toward zero.
///
/// NaN and infinities render as `"0m"`.
pub fn format_duration_f64(millis: f64) -> String {
    if !millis.is_finite() {
        return format_duration(0);
    }
    // `as` saturates at the i64 bounds
    #[allow(clippy::cast_possible_truncation)]
    let millis = millis.trunc() as i64;
    format_duration(millis)
}

/// Build a countdown from `target` to `now`, both in epoch milliseconds.
///
/// An unknown target yields `None`.
pub fn countdown_to(target: Option<i64>, now: i64) -> Option<Countdown> {
    let diff = target?.saturating_sub(now);
    Some(Countdown {
        raw: diff,
        is_past: diff < 0,
        text: format_duration(diff),
    })
}

/// [`countdown_to`] measured from the current time
pub fn countdown_to_now(target: Option<i64>) -> Option<Countdown> {
    countdown_to(target, Utc::now().timestamp_millis())
}

/// Medium date and short time in Philippine English, e.g.
/// `"Jan 5, 2024, 3:04 PM"`, shown in Philippine time
pub fn format_millis(millis: i64) -> Option<String> {
    let instant = DateTime::from_timestamp_millis(millis)?;
    let local = instant.with_timezone(&display_offset()?);
    Some(local.format("%b %-d, %Y, %-I:%M %p").to_string())
}

/// Display-friendly date string.
///
/// Missing or empty input shows [`UNSCHEDULED`]; input that does not parse
/// is returned unchanged.
pub fn format_date_time(value: Option<&str>) -> String {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return UNSCHEDULED.to_string();
    };
    to_millis(value)
        .and_then(format_millis)
        .unwrap_or_else(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEW_YEAR_2024_MS: i64 = 1_704_067_200_000;

    #[test]
    fn parses_iso_timestamps() {
        assert_eq!(to_millis("2024-01-01T00:00:00Z"), Some(NEW_YEAR_2024_MS));
        assert_eq!(
            to_millis("2024-01-01T08:00:00+08:00"),
            Some(NEW_YEAR_2024_MS)
        );
        assert_eq!(
            to_millis("2024-01-01T00:00:00.250Z"),
            Some(NEW_YEAR_2024_MS + 250)
        );
    }

    #[test]
    fn parses_iso_timestamps_without_seconds() {
        assert_eq!(to_millis("2024-01-01T08:00+08:00"), Some(NEW_YEAR_2024_MS));
        assert_eq!(to_millis("2024-01-01T08:00+0800"), Some(NEW_YEAR_2024_MS));
        assert_eq!(to_millis("2023-12-31T20:00-04:00"), Some(NEW_YEAR_2024_MS));
        assert_eq!(to_millis("2024-01-01T00:00Z"), Some(NEW_YEAR_2024_MS));
        assert_eq!(
            format_date_time(Some("2024-01-01T08:00+08:00")),
            "Jan 1, 2024, 8:00 AM"
        );
    }

    #[test]
    fn parses_other_date_shapes() {
        assert_eq!(to_millis("2024-01-01"), Some(NEW_YEAR_2024_MS));
        assert_eq!(to_millis("2024-01"), Some(NEW_YEAR_2024_MS));
        assert_eq!(to_millis("2024"), Some(NEW_YEAR_2024_MS));
        assert_eq!(to_millis("2024-02"), Some(1_706_745_600_000));
        assert_eq!(
            to_millis("Mon, 01 Jan 2024 00:00:00 +0000"),
            Some(NEW_YEAR_2024_MS)
        );
        // no offset: Philippine time
        assert_eq!(to_millis("2024-01-01T08:00:00"), Some(NEW_YEAR_2024_MS));
        assert_eq!(to_millis("2024-01-01 08:00"), Some(NEW_YEAR_2024_MS));
    }

    #[test]
    fn rejects_garbage_without_failing() {
        assert_eq!(to_millis("not a date"), None);
        assert_eq!(to_millis(""), None);
        assert_eq!(to_millis("2024-13-40"), None);
        assert_eq!(to_millis("2024-13"), None);
        assert_eq!(to_millis("202"), None);
        assert_eq!(to_millis("2024-01-01T25:00Z"), None);
    }

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(0), "0m");
        assert_eq!(format_duration(59_999), "0m");
        assert_eq!(format_duration(90_000), "1m");
        assert_eq!(format_duration(3_661_000), "1h 1m");
        assert_eq!(format_duration(90_000_000), "1d 1h 0m");
        assert_eq!(format_duration(86_400_000), "1d 0h 0m");
    }

    #[test]
    fn negative_durations_use_magnitude() {
        assert_eq!(format_duration(-3_661_000), "1h 1m");
        assert_eq!(format_duration(i64::MIN), format_duration(i64::MAX));
    }

    #[test]
    fn fractional_durations_truncate() {
        assert_eq!(format_duration_f64(119_999.9), "1m");
        assert_eq!(format_duration_f64(-60_000.5), "1m");
        assert_eq!(format_duration_f64(f64::NAN), "0m");
        assert_eq!(format_duration_f64(f64::INFINITY), "0m");
    }

    #[test]
    fn countdown_needs_a_target() {
        assert_eq!(countdown_to(None, NEW_YEAR_2024_MS), None);
        assert_eq!(countdown_to_now(None), None);
    }

    #[test]
    fn countdown_before_and_after_target() {
        let ahead = countdown_to(Some(NEW_YEAR_2024_MS + 3_661_000), NEW_YEAR_2024_MS).unwrap();
        assert_eq!(
            ahead,
            Countdown {
                raw: 3_661_000,
                is_past: false,
                text: "1h 1m".to_string(),
            }
        );

        let behind = countdown_to(Some(NEW_YEAR_2024_MS), NEW_YEAR_2024_MS + 90_000).unwrap();
        assert!(behind.is_past);
        assert_eq!(behind.raw, -90_000);
        assert_eq!(behind.text, "1m");

        let now = countdown_to(Some(NEW_YEAR_2024_MS), NEW_YEAR_2024_MS).unwrap();
        assert!(!now.is_past);
        assert_eq!(now.text, "0m");
    }

    #[test]
    fn countdown_serializes_for_the_ui() {
        let countdown = countdown_to(Some(0), 60_000).unwrap();
        let json = serde_json::to_value(&countdown).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"raw": -60_000, "isPast": true, "text": "1m"})
        );
    }

    #[test]
    fn formats_date_times() {
        assert_eq!(format_date_time(None), "TBD");
        assert_eq!(format_date_time(Some("")), "TBD");
        assert_eq!(
            format_date_time(Some("2024-01-05T07:04:00Z")),
            "Jan 5, 2024, 3:04 PM"
        );
        assert_eq!(
            format_date_time(Some("2024-01-01T00:00:00Z")),
            "Jan 1, 2024, 8:00 AM"
        );
        assert_eq!(format_date_time(Some("next week")), "next week");
    }

    #[test]
    fn formats_raw_millis() {
        assert_eq!(
            format_millis(NEW_YEAR_2024_MS).as_deref(),
            Some("Jan 1, 2024, 8:00 AM")
        );
        assert_eq!(format_millis(i64::MAX), None);
    }
}
