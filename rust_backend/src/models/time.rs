//! Instants and calendar-day arithmetic shared by the projector and the loaders.
//!
//! All instants are UTC. A "day" is always a fixed 24-hour step from the
//! current cursor, and the weekday of a cursor uses ISO numbering
//! (Monday = 1 ... Sunday = 7).

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Deserializer};

use crate::error::{ScheduleError, ScheduleResult};

/// Point in time used for task starts, ends, due dates and unavailability.
pub type Timestamp = DateTime<Utc>;

pub const MINUTES_PER_HOUR: i64 = 60;
pub const MINUTES_PER_DAY: i64 = 24 * MINUTES_PER_HOUR;
const MILLIS_PER_DAY: i64 = 86_400_000;

/// ISO-8601 weekday number of an instant (Monday = 1 ... Sunday = 7).
pub fn iso_weekday(ts: &Timestamp) -> u8 {
    ts.weekday().number_from_monday() as u8
}

/// One calendar step forward, `None` past the representable range.
pub fn next_day(ts: Timestamp) -> Option<Timestamp> {
    ts.checked_add_signed(Duration::days(1))
}

/// `weeks` whole weeks forward, `None` past the representable range.
pub fn advance_weeks(ts: Timestamp, weeks: i64) -> Option<Timestamp> {
    ts.checked_add_signed(Duration::try_weeks(weeks)?)
}

/// Maps `consumed` out of `available` working minutes onto a share of a
/// 24-hour day.
///
/// A resource working 480 minutes a day that consumes 240 of them has used
/// half of that day, i.e. 12 hours of calendar time. `consumed` is expected
/// to be within `0..=available` and `available` to be positive; a
/// non-positive `available` yields a whole day.
pub fn day_fraction(consumed: i64, available: i64) -> Duration {
    if available <= 0 {
        return Duration::days(1);
    }
    let consumed = i128::from(consumed.clamp(0, available));
    let millis = i128::from(MILLIS_PER_DAY) * consumed / i128::from(available);
    Duration::milliseconds(millis as i64)
}

/// Convert to Unix timestamp (seconds since 1970-01-01 00:00:00 UTC).
pub fn to_unix_timestamp(ts: &Timestamp) -> i64 {
    ts.timestamp()
}

/// Create from Unix timestamp (seconds since 1970-01-01 00:00:00 UTC).
pub fn from_unix_timestamp(secs: i64) -> Option<Timestamp> {
    DateTime::from_timestamp(secs, 0)
}

/// Parses an RFC 3339 instant, or a string of integer Unix seconds.
///
/// # Errors
/// Returns `ScheduleError::ParseError` naming the rejected input.
pub fn parse_timestamp(input: &str) -> ScheduleResult<Timestamp> {
    let input = input.trim();
    if let Ok(secs) = input.parse::<i64>() {
        return from_unix_timestamp(secs)
            .ok_or_else(|| ScheduleError::ParseError(format!("timestamp out of range: {secs}")));
    }
    DateTime::parse_from_rfc3339(input)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| ScheduleError::ParseError(format!("invalid timestamp '{input}': {err}")))
}

/// Deserializes an optional instant given either as an RFC 3339 string or as
/// integer Unix seconds. `null` and empty strings become `None`.
///
/// Issue trackers commonly export due dates as Unix seconds, while hand
/// written fixtures prefer readable strings, so both are accepted.
pub fn deserialize_optional_timestamp<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrSeconds {
        String(String),
        Seconds(i64),
    }

    match Option::<StringOrSeconds>::deserialize(deserializer)? {
        None => Ok(None),
        Some(StringOrSeconds::String(s)) if s.trim().is_empty() => Ok(None),
        Some(StringOrSeconds::String(s)) => parse_timestamp(&s).map(Some).map_err(D::Error::custom),
        Some(StringOrSeconds::Seconds(secs)) => from_unix_timestamp(secs)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {secs}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_iso_weekday_numbering() {
        assert_eq!(iso_weekday(&at(2026, 3, 2, 0)), 1); // Monday
        assert_eq!(iso_weekday(&at(2026, 3, 6, 23)), 5); // Friday
        assert_eq!(iso_weekday(&at(2026, 3, 8, 12)), 7); // Sunday
    }

    #[test]
    fn test_day_fraction_scales_to_24_hours() {
        assert_eq!(day_fraction(240, 480), Duration::hours(12));
        assert_eq!(day_fraction(480, 480), Duration::days(1));
        assert_eq!(day_fraction(120, 480), Duration::hours(6));
    }

    #[test]
    fn test_day_fraction_clamps_consumption() {
        assert_eq!(day_fraction(900, 480), Duration::days(1));
        assert_eq!(day_fraction(-5, 480), Duration::zero());
        assert_eq!(day_fraction(10, 0), Duration::days(1));
    }

    #[test]
    fn test_day_fraction_with_huge_capacity() {
        assert_eq!(day_fraction(200_000_000_000, 400_000_000_000), Duration::hours(12));
        assert_eq!(day_fraction(i64::MAX, i64::MAX), Duration::days(1));
    }

    #[test]
    fn test_steps_stop_at_range_end() {
        assert_eq!(next_day(at(2026, 3, 2, 9)), Some(at(2026, 3, 3, 9)));
        assert_eq!(next_day(DateTime::<Utc>::MAX_UTC), None);
        assert_eq!(advance_weeks(at(2026, 3, 2, 9), 2), Some(at(2026, 3, 16, 9)));
        assert_eq!(advance_weeks(at(2026, 3, 2, 9), i64::MAX / 2), None);
    }

    #[test]
    fn test_unix_roundtrip() {
        let ts = at(2026, 3, 2, 9);
        let secs = to_unix_timestamp(&ts);
        assert_eq!(from_unix_timestamp(secs), Some(ts));
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("2026-03-02T09:00:00Z").unwrap(), at(2026, 3, 2, 9));
        assert_eq!(parse_timestamp(" 2026-03-02T10:00:00+01:00 ").unwrap(), at(2026, 3, 2, 9));
        let secs = to_unix_timestamp(&at(2026, 3, 2, 9)).to_string();
        assert_eq!(parse_timestamp(&secs).unwrap(), at(2026, 3, 2, 9));
        assert!(matches!(parse_timestamp("monday"), Err(ScheduleError::ParseError(_))));
    }

    #[test]
    fn test_deserialize_optional_timestamp_formats() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
            due: Option<Timestamp>,
        }

        let from_str: Holder = serde_json::from_str(r#"{"due": "2026-03-02T09:00:00Z"}"#).unwrap();
        assert_eq!(from_str.due, Some(at(2026, 3, 2, 9)));

        let secs = to_unix_timestamp(&at(2026, 3, 2, 9));
        let from_secs: Holder = serde_json::from_str(&format!(r#"{{"due": {secs}}}"#)).unwrap();
        assert_eq!(from_secs.due, Some(at(2026, 3, 2, 9)));

        let from_null: Holder = serde_json::from_str(r#"{"due": null}"#).unwrap();
        assert_eq!(from_null.due, None);

        let missing: Holder = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.due, None);

        assert!(serde_json::from_str::<Holder>(r#"{"due": "not a date"}"#).is_err());
    }
}
