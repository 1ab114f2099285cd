//! FILENAME: core/persistence/src/dates.rs
//! PURPOSE: Normalises the date spellings found in uploaded spreadsheets.
//! CONTEXT: Uploads come from many locales and tools. Recognised forms are
//! rewritten to an ISO day (`YYYY-MM-DD`); anything else passes through
//! untouched so the user can still see and fix it.

use chrono::{Duration, NaiveDate};
use engine::dates::{day_string, parse_datetime_str};
use engine::Value;
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::RangeInclusive;

/// Spreadsheet serials accepted as dates (1927-05-18 to 2173-10-14).
pub const SERIAL_RANGE: RangeInclusive<f64> = 10_000.0..=100_000.0;

static DAY_MONTH_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{2}|\d{4})$").expect("static regex")
});

static ISO_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("static regex"));

/// Day 0 of the 1900 date system, with the leap-year bug folded in.
fn serial_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

/// Converts a spreadsheet serial to a day, ignoring the time fraction.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !SERIAL_RANGE.contains(&serial) {
        return None;
    }
    serial_epoch()?.checked_add_signed(Duration::days(serial.trunc() as i64))
}

/// Two-digit years follow the strptime pivot: 69-99 is 1900s, 00-68 is 2000s.
fn expand_year(raw: &str) -> Option<i32> {
    let year: i32 = raw.parse().ok()?;
    Some(match raw.len() {
        2 if year >= 69 => 1900 + year,
        2 => 2000 + year,
        _ => year,
    })
}

fn iso(date: NaiveDate) -> Value {
    Value::Text(day_string(date))
}

/// Day-first reading, falling back to month-first only when day-first is
/// impossible (e.g. `03/25/2024`).
fn parse_day_month_year(s: &str) -> Option<NaiveDate> {
    let caps = DAY_MONTH_YEAR.captures(s)?;
    let first: u32 = caps[1].parse().ok()?;
    let second: u32 = caps[2].parse().ok()?;
    let year = expand_year(&caps[3])?;
    NaiveDate::from_ymd_opt(year, second, first)
        .or_else(|| (second > 12).then(|| NaiveDate::from_ymd_opt(year, first, second)).flatten())
}

/// Rewrites a recognised date to `YYYY-MM-DD`; returns other values unchanged.
pub fn coerce_import_date(value: &Value) -> Value {
    match value {
        Value::Number(n) => serial_to_date(*n).map(iso).unwrap_or_else(|| value.clone()),
        Value::Text(raw) => {
            let s = raw.trim();
            if let Ok(n) = s.parse::<f64>() {
                return serial_to_date(n).map(iso).unwrap_or_else(|| value.clone());
            }
            if ISO_PREFIX.is_match(s) {
                if let Some(dt) = parse_datetime_str(s) {
                    return iso(dt.date());
                }
            }
            parse_day_month_year(s).map(iso).unwrap_or_else(|| value.clone())
        }
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coerce(s: &str) -> String {
        coerce_import_date(&Value::text(s)).display()
    }

    #[test]
    fn test_iso_and_timestamps() {
        assert_eq!(coerce("2024-03-09"), "2024-03-09");
        assert_eq!(coerce("2024-03-09T14:30:00Z"), "2024-03-09");
        assert_eq!(coerce("2024-03-09 14:30:00"), "2024-03-09");
    }

    #[test]
    fn test_day_first_family() {
        assert_eq!(coerce("09/03/2024"), "2024-03-09");
        assert_eq!(coerce("9.3.24"), "2024-03-09");
        assert_eq!(coerce("09-03-1975"), "1975-03-09");
        assert_eq!(coerce("01/02/70"), "1970-02-01");
    }

    #[test]
    fn test_month_first_only_when_day_first_is_impossible() {
        assert_eq!(coerce("03/25/2024"), "2024-03-25");
        assert_eq!(coerce("03/04/2024"), "2024-04-03");
    }

    #[test]
    fn test_serials() {
        assert_eq!(coerce_import_date(&Value::Number(45360.0)).display(), "2024-03-09");
        assert_eq!(coerce("45360"), "2024-03-09");
        // Outside the plausible range: left alone.
        assert_eq!(coerce_import_date(&Value::Number(42.0)), Value::Number(42.0));
    }

    #[test]
    fn test_unknown_passes_through() {
        assert_eq!(coerce("next tuesday"), "next tuesday");
        assert_eq!(coerce("31/31/2024"), "31/31/2024");
        assert_eq!(coerce_import_date(&Value::Null), Value::Null);
    }
}
