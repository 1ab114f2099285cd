//! FILENAME: core/engine/src/dates.rs
//! PURPOSE: Tolerant date parsing shared by filters, sorting and aggregation.
//! CONTEXT: Date columns hold loosely-formatted strings coming straight from the
//! data layer. Anything unparsable is reported as `None` and each caller decides
//! how permissive to be about it.

use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Placeholder some backends store for "no date".
pub const ZERO_DATE: &str = "0000-00-00";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses a date-like value. Numbers are epoch milliseconds.
pub fn parse_datetime(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Text(s) => parse_datetime_str(s),
        Value::Number(n) if n.is_finite() => {
            DateTime::from_timestamp_millis(*n as i64).map(|dt| dt.naive_utc())
        }
        _ => None,
    }
}

pub fn parse_datetime_str(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() || s.starts_with(ZERO_DATE) {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Start-of-day view of a date value.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    parse_datetime(value).map(|dt| dt.date())
}

pub fn parse_date_str(s: &str) -> Option<NaiveDate> {
    parse_datetime_str(s).map(|dt| dt.date())
}

/// Epoch milliseconds (UTC) for sorting.
pub fn epoch_millis(value: &Value) -> Option<i64> {
    parse_datetime(value).map(|dt| dt.and_utc().timestamp_millis())
}

/// `YYYY-MM-DD` rendering used as the day-level identity of a date.
pub fn day_string(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_common_shapes() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(parse_date(&Value::text("2024-03-09")), Some(d));
        assert_eq!(parse_date(&Value::text("2024-03-09 13:45:00")), Some(d));
        assert_eq!(parse_date(&Value::text("2024-03-09T13:45:00Z")), Some(d));
        assert_eq!(parse_date(&Value::text("2024-03-09T13:45:00.250")), Some(d));
    }

    #[test]
    fn test_zero_date_and_garbage_are_invalid() {
        assert_eq!(parse_date(&Value::text(ZERO_DATE)), None);
        assert_eq!(parse_date(&Value::text("0000-00-00 00:00:00")), None);
        assert_eq!(parse_date(&Value::text("soon")), None);
        assert_eq!(parse_date(&Value::Null), None);
    }

    #[test]
    fn test_epoch_millis_round_trip() {
        let ms = epoch_millis(&Value::text("1970-01-02")).unwrap();
        assert_eq!(ms, 86_400_000);
        assert_eq!(epoch_millis(&Value::Number(ms as f64)), Some(ms));
    }
}
