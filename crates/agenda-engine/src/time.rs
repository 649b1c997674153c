//! Time-of-day parsing, date/time combination and date coercion.
//!
//! Every instant handled by the engine is a *wall-clock* value in the
//! business's own timezone, represented as [`NaiveDateTime`]. Converting to
//! and from absolute time is the caller's concern.
//!
//! Parsing is lenient: a malformed `"HH:MM"` string degrades to `00:00`
//! instead of failing. [`parse_time`] reports whether that happened.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

/// Result of parsing an `"HH:MM"` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedTime {
    /// Minutes since midnight. Missing or malformed parts count as 0.
    pub minutes: u32,
    /// `false` when any part had to be defaulted or was out of range.
    pub valid: bool,
}

/// Parse an `"HH:MM"` string into minutes since midnight.
///
/// `"24:00"` is accepted as a valid end-of-day marker. A trailing `:SS`
/// field is ignored.
pub fn parse_time(hhmm: &str) -> ParsedTime {
    let mut parts = hhmm.trim().split(':');
    let hours = parts.next().and_then(|h| h.trim().parse::<u32>().ok());
    let minutes = parts.next().and_then(|m| m.trim().parse::<u32>().ok());

    let h = hours.unwrap_or(0);
    let m = minutes.unwrap_or(0);

    let in_range = m < 60 && (h < 24 || (h == 24 && m == 0));
    ParsedTime {
        minutes: h.saturating_mul(60).saturating_add(m),
        valid: hours.is_some() && minutes.is_some() && in_range,
    }
}

/// Lenient `"HH:MM"` → minutes since midnight. Malformed parts become 0.
pub fn to_minutes(hhmm: &str) -> u32 {
    parse_time(hhmm).minutes
}

/// Minutes since midnight → zero-padded `"HH:MM"`.
pub fn minutes_to_time(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Set the time of day on `date`, with seconds and sub-seconds zeroed.
pub fn combine_date_and_time(date: NaiveDate, hhmm: &str) -> NaiveDateTime {
    combine_date_and_minutes(date, to_minutes(hhmm))
}

/// Like [`combine_date_and_time`] for an already-parsed minute offset.
///
/// Offsets of 24:00 or beyond roll over into the following day.
pub fn combine_date_and_minutes(date: NaiveDate, minutes: u32) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN) + Duration::minutes(i64::from(minutes))
}

/// Minutes since midnight of a wall-clock instant.
pub fn minutes_of_day(instant: NaiveDateTime) -> u32 {
    let since_midnight = instant - instant.date().and_time(NaiveTime::MIN);
    u32::try_from(since_midnight.num_minutes()).unwrap_or(0)
}

/// Coerce a loosely-typed stored date into a wall-clock instant.
///
/// Accepts:
/// - RFC 3339 strings (`"2025-03-10T14:00:00-03:00"`), kept at their own offset's wall clock
/// - naive ISO datetimes (`"2025-03-10T14:00:00"`, `"2025-03-10T14:00"`, `"2025-03-10 14:00:00"`)
/// - ISO dates (`"2025-03-10"`), at midnight
/// - numbers, as epoch milliseconds (UTC)
/// - timestamp wrapper objects: `{"seconds", "nanoseconds"}` or `{"_seconds", "_nanoseconds"}` (UTC)
///
/// Returns `None` for anything else; callers must handle the invalid case.
pub fn coerce_to_date(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(s) => parse_date_string(s),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.naive_utc()),
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0);
            DateTime::from_timestamp(seconds, nanos).map(|dt| dt.naive_utc())
        }
        _ => None,
    }
}

fn parse_date_string(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Half-open interval overlap: `[a_start, a_end)` vs `[b_start, b_end)`.
///
/// Touching endpoints do not overlap.
pub fn intervals_overlap<T: PartialOrd>(a_start: T, a_end: T, b_start: T, b_end: T) -> bool {
    a_start < b_end && a_end > b_start
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_time_flags_garbage() {
        assert_eq!(parse_time("09:30"), ParsedTime { minutes: 570, valid: true });
        assert_eq!(parse_time("00:00"), ParsedTime { minutes: 0, valid: true });
        assert_eq!(parse_time("abc"), ParsedTime { minutes: 0, valid: false });
        assert_eq!(parse_time(""), ParsedTime { minutes: 0, valid: false });
        assert_eq!(parse_time("9"), ParsedTime { minutes: 540, valid: false });
        assert_eq!(parse_time("10:xx"), ParsedTime { minutes: 600, valid: false });
        assert!(parse_time("24:00").valid);
        assert!(!parse_time("24:30").valid);
        assert!(!parse_time("12:75").valid);
        assert_eq!(parse_time("14:30:00"), ParsedTime { minutes: 870, valid: true });
        assert_eq!(parse_time("08:05:59"), ParsedTime { minutes: 485, valid: true });
    }

    #[test]
    fn minutes_round_trip() {
        assert_eq!(minutes_to_time(0), "00:00");
        assert_eq!(minutes_to_time(545), "09:05");
        assert_eq!(minutes_to_time(to_minutes("17:45")), "17:45");
    }

    #[test]
    fn combine_zeroes_seconds() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let dt = combine_date_and_time(date, "14:00");
        assert_eq!(dt.to_string(), "2025-03-10 14:00:00");
        assert_eq!(minutes_of_day(dt), 840);
    }

    #[test]
    fn coerce_accepts_known_shapes() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap();
        assert_eq!(coerce_to_date(&json!("2025-03-10T14:00:00")), Some(expected));
        assert_eq!(coerce_to_date(&json!("2025-03-10T14:00")), Some(expected));
        assert_eq!(coerce_to_date(&json!("2025-03-10T14:00:00-03:00")), Some(expected));
        assert_eq!(coerce_to_date(&json!({"seconds": 1_741_615_200, "nanoseconds": 0})), Some(expected));
        assert_eq!(coerce_to_date(&json!({"_seconds": 1_741_615_200})), Some(expected));
        assert_eq!(coerce_to_date(&json!(1_741_615_200_000_i64)), Some(expected));
        assert_eq!(
            coerce_to_date(&json!("2025-03-10")),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap().and_hms_opt(0, 0, 0)
        );
    }

    #[test]
    fn coerce_rejects_everything_else() {
        assert_eq!(coerce_to_date(&json!(null)), None);
        assert_eq!(coerce_to_date(&json!(true)), None);
        assert_eq!(coerce_to_date(&json!("not a date")), None);
        assert_eq!(coerce_to_date(&json!({"foo": 1})), None);
        assert_eq!(coerce_to_date(&json!([])), None);
    }

    #[test]
    fn touching_intervals_do_not_overlap() {
        assert!(!intervals_overlap(0, 10, 10, 20));
        assert!(intervals_overlap(0, 11, 10, 20));
        assert!(intervals_overlap(5, 6, 0, 20));
    }
}
