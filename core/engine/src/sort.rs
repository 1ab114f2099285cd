//! FILENAME: core/engine/src/sort.rs
//! PURPOSE: Type-aware, stable multi-key row sorting.

use crate::column::{ColumnDef, ColumnType, SortDirection, SortKey};
use crate::dates::epoch_millis;
use crate::value::{parse_number, Row, Value};
use std::cmp::Ordering;

/// Comparable projection of a value for one column type.
#[derive(Debug, Clone, PartialEq)]
enum SortValue {
    Number(f64),
    Text(String),
}

impl SortValue {
    fn compare(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Number(a), SortValue::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            (SortValue::Number(_), SortValue::Text(_)) => Ordering::Less,
            (SortValue::Text(_), SortValue::Number(_)) => Ordering::Greater,
        }
    }
}

/// Null reads as `''` before coercion, so it lands on 0 for numeric types.
fn project(value: &Value, column_type: ColumnType) -> SortValue {
    let text = match value {
        Value::Null => String::new(),
        other => other.display(),
    };
    match column_type {
        ColumnType::Number | ColumnType::Fk => {
            SortValue::Number(parse_number(&text).unwrap_or(0.0))
        }
        ColumnType::Date => SortValue::Number(epoch_millis(value).unwrap_or(0) as f64),
        ColumnType::Boolean => SortValue::Number(match value.as_bool() {
            Some(true) => 1.0,
            _ => 0.0,
        }),
        ColumnType::String => SortValue::Text(text.to_lowercase()),
    }
}

/// Returns a new ordering of `rows`. Ties on every key keep input order.
/// Keys naming unknown columns compare as strings.
pub fn sort_rows<'a>(rows: &[&'a Row], sort_model: &[SortKey], columns: &[ColumnDef]) -> Vec<&'a Row> {
    if sort_model.is_empty() {
        return rows.to_vec();
    }
    let types: Vec<ColumnType> = sort_model
        .iter()
        .map(|key| {
            columns
                .iter()
                .find(|c| c.field == key.field)
                .map(|c| c.column_type)
                .unwrap_or_default()
        })
        .collect();

    // Project once per row rather than once per comparison.
    let mut keyed: Vec<(Vec<SortValue>, &'a Row)> = rows
        .iter()
        .map(|row| {
            let keys = sort_model
                .iter()
                .zip(&types)
                .map(|(key, ty)| project(row.get(&key.field), *ty))
                .collect();
            (keys, *row)
        })
        .collect();

    keyed.sort_by(|(a, _), (b, _)| {
        for ((va, vb), key) in a.iter().zip(b).zip(sort_model) {
            let ord = va.compare(vb);
            let ord = match key.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });

    keyed.into_iter().map(|(_, row)| row).collect()
}
