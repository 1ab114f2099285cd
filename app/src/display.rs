//! FILENAME: app/src/display.rs
//! PURPOSE: Turns cell and aggregate values into display strings.
//! CONTEXT: A column's formatter runs first. If it fails (bad option, value
//! of the wrong shape, unknown key) the failure is logged and the raw value is
//! shown instead, so one bad formatter never blanks a grid.

use crate::logging::log_warn;
use engine::{format_value, AggregateValue, ColumnDef, Row, Value};

fn raw_display(value: &Value, column: &ColumnDef) -> String {
    if value.is_null() {
        return String::new();
    }
    if column.options_map.is_empty() {
        return value.display();
    }
    let key = value.key();
    column.option_label(&key).to_string()
}

fn formatted(value: &Value, column: &ColumnDef) -> String {
    match column.formatter_key.as_deref().filter(|k| !k.is_empty()) {
        Some(key) => match format_value(value, key, &column.formatter_options) {
            Ok(text) => text,
            Err(e) => {
                log_warn!(
                    "DISPLAY",
                    "formatter '{}' failed on {}='{}': {}",
                    key,
                    column.field,
                    value.display(),
                    e
                );
                raw_display(value, column)
            }
        },
        None => raw_display(value, column),
    }
}

/// Display text of `row`'s value in `column`.
pub fn display_cell(row: &Row, column: &ColumnDef) -> String {
    formatted(row.get(&column.field), column)
}

/// Footer and group-header text. Numbers go through the column formatter;
/// dates and the `-` sentinel are shown as they are.
pub fn display_aggregate(value: &AggregateValue, column: &ColumnDef) -> String {
    match value {
        AggregateValue::Number(n) => formatted(&Value::Number(*n), column),
        other => other.to_string(),
    }
}
