//! FILENAME: core/engine/src/aggregate.rs
//! PURPOSE: Per-column reducers for footer totals and group summaries.
//! CONTEXT: The same entry point serves the footer (over the whole filtered set)
//! and every group node (over that node's member rows). Ineligible
//! combinations, like summing a text column, produce the `-` sentinel instead
//! of an error.

use crate::column::{Aggregation, ColumnDef, ColumnType};
use crate::dates::{day_string, parse_date};
use crate::value::{format_plain_number, Row, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Text shown when an aggregation does not apply.
pub const NOT_APPLICABLE: &str = "-";

/// Result of one aggregation.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateValue {
    Number(f64),
    /// ISO day string, from min/max over a date column.
    Date(String),
    /// Whatever a custom reducer returned.
    Value(Value),
    NotApplicable,
}

impl AggregateValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AggregateValue::Number(n) => Some(*n),
            AggregateValue::Value(v) => v.as_number(),
            _ => None,
        }
    }
}

impl fmt::Display for AggregateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateValue::Number(n) => write!(f, "{}", format_plain_number(*n)),
            AggregateValue::Date(d) => write!(f, "{}", d),
            AggregateValue::Value(v) => write!(f, "{}", v.display()),
            AggregateValue::NotApplicable => write!(f, "{}", NOT_APPLICABLE),
        }
    }
}

// ============================================================================
// CUSTOM REDUCERS
// ============================================================================

/// `(column values, member rows) -> result`
pub type Reducer = Arc<dyn Fn(&[&Value], &[&Row]) -> Value + Send + Sync>;

/// Named custom reducers referenced by `Aggregation::Custom(name)`.
#[derive(Clone, Default)]
pub struct ReducerRegistry {
    reducers: HashMap<String, Reducer>,
}

impl ReducerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: &str, reducer: F)
    where
        F: Fn(&[&Value], &[&Row]) -> Value + Send + Sync + 'static,
    {
        self.reducers.insert(name.to_string(), Arc::new(reducer));
    }

    pub fn get(&self, name: &str) -> Option<&Reducer> {
        self.reducers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.reducers.contains_key(name)
    }
}

impl fmt::Debug for ReducerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.reducers.keys().collect();
        names.sort();
        f.debug_struct("ReducerRegistry").field("reducers", &names).finish()
    }
}

// ============================================================================
// EMPTINESS
// ============================================================================

/// Type-aware emptiness: zero or unparsable numbers, blank strings, invalid
/// or zero dates.
pub fn is_empty_value(value: &Value, column_type: ColumnType) -> bool {
    match column_type {
        ColumnType::Number => value.as_number().map_or(true, |n| n == 0.0),
        ColumnType::String => value.is_blank(),
        ColumnType::Date => parse_date(value).is_none(),
        ColumnType::Boolean | ColumnType::Fk => value.is_blank(),
    }
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Applies every column's `aggregation_fn` to `rows`.
/// Columns without one produce no entry.
pub fn aggregate(
    rows: &[&Row],
    columns: &[ColumnDef],
    reducers: &ReducerRegistry,
) -> BTreeMap<String, AggregateValue> {
    columns
        .iter()
        .filter_map(|col| {
            let aggregation = col.aggregation_fn.as_ref()?;
            Some((col.field.clone(), aggregate_column(rows, col, aggregation, reducers)))
        })
        .collect()
}

pub fn aggregate_column(
    rows: &[&Row],
    column: &ColumnDef,
    aggregation: &Aggregation,
    reducers: &ReducerRegistry,
) -> AggregateValue {
    let values: Vec<&Value> = rows.iter().map(|r| r.get(&column.field)).collect();
    let ty = column.column_type;

    match aggregation {
        Aggregation::Sum | Aggregation::Avg | Aggregation::Median if ty != ColumnType::Number => {
            AggregateValue::NotApplicable
        }
        Aggregation::Sum => AggregateValue::Number(numbers(&values).iter().sum()),
        Aggregation::Avg => {
            let nums = numbers(&values);
            if nums.is_empty() {
                AggregateValue::NotApplicable
            } else {
                AggregateValue::Number(nums.iter().sum::<f64>() / nums.len() as f64)
            }
        }
        Aggregation::Median => median(numbers(&values)),
        Aggregation::Min | Aggregation::Max => {
            let want_max = matches!(aggregation, Aggregation::Max);
            extreme(&values, ty, want_max)
        }
        Aggregation::Count => {
            AggregateValue::Number(values.iter().filter(|v| !v.is_null()).count() as f64)
        }
        Aggregation::CountDistinct => {
            let distinct: HashSet<String> = values
                .iter()
                .filter(|v| !v.is_null())
                .map(|v| match ty {
                    ColumnType::Date => parse_date(v).map(day_string).unwrap_or_else(|| v.key()),
                    _ => v.key(),
                })
                .collect();
            AggregateValue::Number(distinct.len() as f64)
        }
        Aggregation::Empty => AggregateValue::Number(
            values.iter().filter(|v| is_empty_value(v, ty)).count() as f64,
        ),
        Aggregation::NotEmpty => AggregateValue::Number(
            values.iter().filter(|v| !is_empty_value(v, ty)).count() as f64,
        ),
        Aggregation::Custom(name) => match reducers.get(name) {
            Some(reducer) => AggregateValue::Value((reducer.as_ref())(&values, rows)),
            None => AggregateValue::NotApplicable,
        },
    }
}

/// Numeric values only; text that does not parse and nulls are skipped.
fn numbers(values: &[&Value]) -> Vec<f64> {
    values.iter().filter_map(|v| v.as_number()).collect()
}

fn median(mut nums: Vec<f64>) -> AggregateValue {
    if nums.is_empty() {
        return AggregateValue::NotApplicable;
    }
    nums.sort_by(|a, b| a.total_cmp(b));
    let mid = nums.len() / 2;
    if nums.len() % 2 == 0 {
        AggregateValue::Number((nums[mid - 1] + nums[mid]) / 2.0)
    } else {
        AggregateValue::Number(nums[mid])
    }
}

fn extreme(values: &[&Value], ty: ColumnType, want_max: bool) -> AggregateValue {
    match ty {
        ColumnType::Number => {
            let nums = numbers(values);
            let picked = if want_max {
                nums.into_iter().reduce(f64::max)
            } else {
                nums.into_iter().reduce(f64::min)
            };
            picked.map_or(AggregateValue::NotApplicable, AggregateValue::Number)
        }
        ColumnType::Date => {
            let dates = values.iter().filter_map(|v| parse_date(v));
            let picked = if want_max { dates.max() } else { dates.min() };
            picked.map_or(AggregateValue::NotApplicable, |d| AggregateValue::Date(day_string(d)))
        }
        _ => AggregateValue::NotApplicable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows_with(field: &str, values: Vec<Value>) -> Vec<Row> {
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| Row::new(i as i64).with(field, v))
            .collect()
    }

    fn run(rows: &[Row], column: ColumnDef) -> AggregateValue {
        let refs: Vec<&Row> = rows.iter().collect();
        let agg = column.aggregation_fn.clone().unwrap();
        aggregate_column(&refs, &column, &agg, &ReducerRegistry::new())
    }

    #[test]
    fn test_sum_skips_garbage_and_coerces_numeric_strings() {
        let rows = rows_with("n", vec!["10".into(), "abc".into(), 5.into(), Value::Null]);
        let col = ColumnDef::new("n", ColumnType::Number).with_aggregation(Aggregation::Sum);
        assert_eq!(run(&rows, col), AggregateValue::Number(15.0));
    }

    #[test]
    fn test_numeric_aggregations_on_text_are_not_applicable() {
        let rows = rows_with("s", vec!["1".into()]);
        let col = ColumnDef::new("s", ColumnType::String).with_aggregation(Aggregation::Sum);
        assert_eq!(run(&rows, col).to_string(), "-");
    }

    #[test]
    fn test_median_even_and_odd() {
        let rows = rows_with("n", vec![3.into(), 1.into(), 2.into(), 10.into()]);
        let col = ColumnDef::new("n", ColumnType::Number).with_aggregation(Aggregation::Median);
        assert_eq!(run(&rows, col.clone()), AggregateValue::Number(2.5));
        assert_eq!(run(&rows[..3], col), AggregateValue::Number(2.0));
    }

    #[test]
    fn test_date_min_max_return_iso_days() {
        let rows = rows_with(
            "d",
            vec!["2024-05-01 10:00:00".into(), "2023-01-09".into(), "0000-00-00".into()],
        );
        let min = ColumnDef::new("d", ColumnType::Date).with_aggregation(Aggregation::Min);
        let max = ColumnDef::new("d", ColumnType::Date).with_aggregation(Aggregation::Max);
        assert_eq!(run(&rows, min), AggregateValue::Date("2023-01-09".into()));
        assert_eq!(run(&rows, max), AggregateValue::Date("2024-05-01".into()));
    }

    #[test]
    fn test_count_distinct_normalizes_dates_to_days() {
        let rows = rows_with(
            "d",
            vec!["2024-05-01 10:00:00".into(), "2024-05-01".into(), "2024-05-02".into(), Value::Null],
        );
        let col = ColumnDef::new("d", ColumnType::Date).with_aggregation(Aggregation::CountDistinct);
        assert_eq!(run(&rows, col), AggregateValue::Number(2.0));
    }

    #[test]
    fn test_empty_counts_are_type_aware() {
        let rows = rows_with("n", vec![0.into(), "x".into(), 4.into(), Value::Null]);
        let empty = ColumnDef::new("n", ColumnType::Number).with_aggregation(Aggregation::Empty);
        let not_empty = ColumnDef::new("n", ColumnType::Number).with_aggregation(Aggregation::NotEmpty);
        assert_eq!(run(&rows, empty), AggregateValue::Number(3.0));
        assert_eq!(run(&rows, not_empty), AggregateValue::Number(1.0));
    }

    #[test]
    fn test_custom_reducer_and_unknown_name() {
        let rows = rows_with("n", vec![1.into(), 2.into()]);
        let refs: Vec<&Row> = rows.iter().collect();
        let mut registry = ReducerRegistry::new();
        registry.register("rowCount", |_values, rows| Value::Number(rows.len() as f64 * 10.0));
        let col = ColumnDef::new("n", ColumnType::Number)
            .with_aggregation(Aggregation::Custom("rowCount".into()));
        let out = aggregate(&refs, &[col], &registry);
        assert_eq!(out["n"], AggregateValue::Value(Value::Number(20.0)));

        let missing = ColumnDef::new("n", ColumnType::Number)
            .with_aggregation(Aggregation::Custom("nope".into()));
        assert_eq!(aggregate(&refs, &[missing], &registry)["n"], AggregateValue::NotApplicable);
    }
}
