//! FILENAME: core/engine/src/format.rs
//! PURPOSE: Named display formatters for cell values.
//! CONTEXT: A column names its formatter with `formatter_key` and tunes it with
//! string `formatter_options`. Formatting can fail (a currency formatter on a
//! non-numeric value); the error is returned and the display layer decides to
//! fall back to the raw value.

use crate::dates::parse_datetime;
use crate::value::Value;
use chrono::format::{Item, StrftimeItems};
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;

/// Formatter keys understood by `format_value`.
pub const FORMATTER_KEYS: &[&str] = &[
    "number", "currency", "percent", "date", "datetime", "boolean", "uppercase", "lowercase",
    "truncate",
];

#[derive(Debug, Clone, PartialEq)]
pub enum FormatError {
    UnknownFormatter(String),
    NotANumber(String),
    NotADate(String),
    BadOption { key: String, value: String },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::UnknownFormatter(k) => write!(f, "unknown formatter '{}'", k),
            FormatError::NotANumber(v) => write!(f, "'{}' is not a number", v),
            FormatError::NotADate(v) => write!(f, "'{}' is not a date", v),
            FormatError::BadOption { key, value } => {
                write!(f, "invalid formatter option {}={}", key, value)
            }
        }
    }
}

impl std::error::Error for FormatError {}

type Options = BTreeMap<String, String>;

fn option<'a>(options: &'a Options, key: &str, default: &'a str) -> &'a str {
    options.get(key).map(String::as_str).unwrap_or(default)
}

fn decimals(options: &Options, default: usize) -> Result<usize, FormatError> {
    match options.get("decimals") {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| FormatError::BadOption {
            key: "decimals".to_string(),
            value: raw.clone(),
        }),
    }
}

fn require_number(value: &Value) -> Result<f64, FormatError> {
    value
        .as_number()
        .ok_or_else(|| FormatError::NotANumber(value.display()))
}

/// Formats `value` with the formatter named `key`. Null formats as "".
pub fn format_value(value: &Value, key: &str, options: &Options) -> Result<String, FormatError> {
    if value.is_null() {
        return Ok(String::new());
    }
    match key {
        "number" => {
            let n = require_number(value)?;
            let thousands = option(options, "thousands", "true") != "false";
            Ok(format_decimal(n, decimals(options, 0)?, thousands))
        }
        "currency" => {
            let n = require_number(value)?;
            let symbol = option(options, "symbol", "$");
            let after = option(options, "position", "before") == "after";
            Ok(format_currency(n, decimals(options, 2)?, symbol, after))
        }
        "percent" => {
            let n = require_number(value)?;
            Ok(format!("{:.prec$}%", n * 100.0, prec = decimals(options, 0)?))
        }
        "date" | "datetime" => {
            let default = if key == "date" { "%d/%m/%Y" } else { "%d/%m/%Y %H:%M" };
            let pattern = option(options, "pattern", default);
            if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
                return Err(FormatError::BadOption {
                    key: "pattern".to_string(),
                    value: pattern.to_string(),
                });
            }
            let dt = parse_datetime(value).ok_or_else(|| FormatError::NotADate(value.display()))?;
            // Offset specifiers (%z, %Z) parse fine but fail on a naive datetime.
            let mut out = String::new();
            write!(out, "{}", dt.format(pattern)).map_err(|_| FormatError::BadOption {
                key: "pattern".to_string(),
                value: pattern.to_string(),
            })?;
            Ok(out)
        }
        "boolean" => Ok(match value.as_bool() {
            Some(true) => option(options, "true_label", "Yes").to_string(),
            Some(false) => option(options, "false_label", "No").to_string(),
            None => value.display(),
        }),
        "uppercase" => Ok(value.display().to_uppercase()),
        "lowercase" => Ok(value.display().to_lowercase()),
        "truncate" => {
            let raw = option(options, "max", "50");
            let max: usize = raw.trim().parse().map_err(|_| FormatError::BadOption {
                key: "max".to_string(),
                value: raw.to_string(),
            })?;
            let text = value.display();
            if text.chars().count() <= max {
                Ok(text)
            } else {
                Ok(format!("{}…", text.chars().take(max).collect::<String>()))
            }
        }
        other => Err(FormatError::UnknownFormatter(other.to_string())),
    }
}

/// Format a number with specified decimal places and optional thousands separator.
fn format_decimal(value: f64, decimal_places: usize, use_thousands_separator: bool) -> String {
    let rounded = format!("{:.prec$}", value, prec = decimal_places);
    if use_thousands_separator {
        add_thousands_separator(&rounded)
    } else {
        rounded
    }
}

/// Negative amounts are wrapped in parentheses.
fn format_currency(value: f64, decimal_places: usize, symbol: &str, after: bool) -> String {
    let formatted = add_thousands_separator(&format!("{:.prec$}", value.abs(), prec = decimal_places));
    let with_symbol = if after {
        format!("{}{}", formatted, symbol)
    } else {
        format!("{}{}", symbol, formatted)
    };
    if value < 0.0 {
        format!("({})", with_symbol)
    } else {
        with_symbol
    }
}

fn add_thousands_separator(s: &str) -> String {
    let (integer_part, decimal_part) = match s.split_once('.') {
        Some((i, d)) => (i, Some(d)),
        None => (s, None),
    };
    let negative = integer_part.starts_with('-');
    let digits: Vec<char> = integer_part.chars().filter(|c| c.is_ascii_digit()).collect();

    let mut result = String::new();
    if negative {
        result.push('-');
    }
    let len = digits.len();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    if let Some(decimal) = decimal_part {
        result.push('.');
        result.push_str(decimal);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(pairs: &[(&str, &str)]) -> Options {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_number_and_currency() {
        let v = Value::Number(1234567.891);
        assert_eq!(format_value(&v, "number", &opts(&[("decimals", "2")])).unwrap(), "1,234,567.89");
        assert_eq!(format_value(&Value::Number(-1234.5), "currency", &Options::new()).unwrap(), "($1,234.50)");
        assert_eq!(
            format_value(&Value::text("12,5"), "currency", &opts(&[("symbol", " kr"), ("position", "after")])).unwrap(),
            "12.50 kr"
        );
    }

    #[test]
    fn test_percent_and_dates() {
        assert_eq!(format_value(&Value::Number(0.125), "percent", &opts(&[("decimals", "1")])).unwrap(), "12.5%");
        assert_eq!(format_value(&Value::text("2024-03-09"), "date", &Options::new()).unwrap(), "09/03/2024");
    }

    #[test]
    fn test_errors_are_reported() {
        assert_eq!(
            format_value(&Value::text("abc"), "currency", &Options::new()),
            Err(FormatError::NotANumber("abc".into()))
        );
        assert!(matches!(
            format_value(&Value::Number(1.0), "sparkline", &Options::new()),
            Err(FormatError::UnknownFormatter(_))
        ));
        assert!(format_value(&Value::Number(1.0), "number", &opts(&[("decimals", "x")])).is_err());
    }

    #[test]
    fn test_offset_pattern_on_naive_date_is_an_error() {
        for pattern in ["%Y-%m-%d %z", "%d/%m/%Y %Z", "%:z"] {
            let result = format_value(&Value::text("2024-03-09"), "date", &opts(&[("pattern", pattern)]));
            assert_eq!(
                result,
                Err(FormatError::BadOption { key: "pattern".into(), value: pattern.into() })
            );
        }
        assert_eq!(
            format_value(&Value::text("2024-03-09 14:30"), "datetime", &opts(&[("pattern", "%H:%M")])).unwrap(),
            "14:30"
        );
    }

    #[test]
    fn test_truncate_and_null() {
        assert_eq!(format_value(&Value::text("abcdef"), "truncate", &opts(&[("max", "3")])).unwrap(), "abc…");
        assert_eq!(format_value(&Value::Null, "currency", &Options::new()).unwrap(), "");
    }

    #[test]
    fn test_thousands_separator() {
        assert_eq!(add_thousands_separator("1234567"), "1,234,567");
        assert_eq!(add_thousands_separator("123"), "123");
        assert_eq!(add_thousands_separator("-1234.56"), "-1,234.56");
    }
}
