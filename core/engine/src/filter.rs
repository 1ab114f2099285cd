//! FILENAME: core/engine/src/filter.rs
//! PURPOSE: Column filters and the row filter evaluator.
//! CONTEXT: Filters are typed by column type: each type owns its operator enum,
//! so an operator that does not belong to a type cannot be expressed. The only
//! mismatch left is a filter whose family differs from its column's current
//! type (e.g. a preset saved before the column type changed), handled in
//! `matches`.

use crate::column::ColumnType;
use crate::dates::{parse_date, ZERO_DATE};
use crate::schema::ColumnSchema;
use crate::search::SearchQuery;
use crate::value::{Row, RowId, Value};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

// ============================================================================
// OPERATORS
// ============================================================================

/// Inclusive range; a `Null` bound is unbounded on that side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Range {
    #[serde(default)]
    pub min: Value,
    #[serde(default)]
    pub max: Value,
}

impl Range {
    pub fn new(min: impl Into<Value>, max: impl Into<Value>) -> Self {
        Range { min: min.into(), max: max.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "camelCase")]
pub enum TextOp {
    MultiSelect(Vec<String>),
    Contains(String),
    IsEmpty,
    NotEmpty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "camelCase")]
pub enum NumberOp {
    Equals(Value),
    NotEquals(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    Between(Range),
    IsEmpty,
    NotEmpty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "camelCase")]
pub enum DateOp {
    Between(Range),
    IsEmpty,
    NotEmpty,
    IsPast,
    IsFuture,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "camelCase")]
pub enum BoolOp {
    IsTrue,
    IsFalse,
    IsEmpty,
    NotEmpty,
}

/// Include/exclude sets of foreign keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FkSelection {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "camelCase")]
pub enum FkOp {
    Fk(FkSelection),
}

/// A typed predicate. The variant is the filter's type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FilterCondition {
    String(TextOp),
    Number(NumberOp),
    Date(DateOp),
    Boolean(BoolOp),
    Fk(FkOp),
}

impl FilterCondition {
    /// The type's first operator with its default value shape.
    pub fn default_for(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::String => FilterCondition::String(TextOp::MultiSelect(Vec::new())),
            ColumnType::Number => FilterCondition::Number(NumberOp::Equals(Value::Null)),
            ColumnType::Date => FilterCondition::Date(DateOp::Between(Range::default())),
            ColumnType::Boolean => FilterCondition::Boolean(BoolOp::IsTrue),
            ColumnType::Fk => FilterCondition::Fk(FkOp::Fk(FkSelection::default())),
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            FilterCondition::String(_) => ColumnType::String,
            FilterCondition::Number(_) => ColumnType::Number,
            FilterCondition::Date(_) => ColumnType::Date,
            FilterCondition::Boolean(_) => ColumnType::Boolean,
            FilterCondition::Fk(_) => ColumnType::Fk,
        }
    }
}

/// Operator names offered for a column type, in menu order.
pub fn operators_for(column_type: ColumnType) -> &'static [&'static str] {
    match column_type {
        ColumnType::String => &["multiSelect", "contains", "isEmpty", "notEmpty"],
        ColumnType::Number => &[
            "equals", "notEquals", "gt", "gte", "lt", "lte", "between", "isEmpty", "notEmpty",
        ],
        ColumnType::Date => &["between", "isEmpty", "notEmpty", "isPast", "isFuture"],
        ColumnType::Boolean => &["isTrue", "isFalse", "isEmpty", "notEmpty"],
        ColumnType::Fk => &["fk"],
    }
}

// ============================================================================
// FILTER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub id: String,
    pub field: String,
    pub condition: FilterCondition,
}

impl Filter {
    pub fn new(id: impl Into<String>, field: &str, condition: FilterCondition) -> Self {
        Filter { id: id.into(), field: field.to_string(), condition }
    }
}

/// How several column filters combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum FilterMode {
    /// Every filter narrows the previous result (AND).
    #[default]
    Cascade,
    /// Each filter selects independently; results are unioned (OR).
    Additive,
}

/// Ambient inputs of an evaluation.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext {
    pub today: NaiveDate,
}

impl FilterContext {
    pub fn at(today: NaiveDate) -> Self {
        FilterContext { today }
    }
}

impl Default for FilterContext {
    fn default() -> Self {
        FilterContext { today: Local::now().date_naive() }
    }
}

// ============================================================================
// SINGLE FILTER EVALUATION
// ============================================================================

/// Tests one row against one filter for a column of `column_type`.
pub fn matches(row: &Row, filter: &Filter, column_type: ColumnType, ctx: &FilterContext) -> bool {
    let value = row.get(&filter.field);
    match (column_type, &filter.condition) {
        (ColumnType::String, FilterCondition::String(op)) => text_matches(value, op),
        // Known wart: string columns reject a foreign operator family while
        // every other column type lets it through.
        (ColumnType::String, _) => false,
        (ColumnType::Number, FilterCondition::Number(op)) => number_matches(value, op),
        (ColumnType::Date, FilterCondition::Date(op)) => date_matches(value, op, ctx.today),
        (ColumnType::Boolean, FilterCondition::Boolean(op)) => bool_matches(value, op),
        (ColumnType::Fk, FilterCondition::Fk(FkOp::Fk(sel))) => fk_matches(value, sel),
        _ => true,
    }
}

pub(crate) fn text_matches(value: &Value, op: &TextOp) -> bool {
    match op {
        TextOp::MultiSelect(selected) => {
            selected.is_empty() || {
                let shown = value.display();
                selected.iter().any(|s| s.trim() == shown.trim())
            }
        }
        TextOp::Contains(needle) => {
            let needle = needle.trim().to_lowercase();
            needle.is_empty() || value.display().to_lowercase().contains(&needle)
        }
        TextOp::IsEmpty => value.is_blank(),
        TextOp::NotEmpty => !value.is_blank(),
    }
}

pub(crate) fn in_range(n: f64, range: &Range) -> bool {
    let above_min = range.min.as_number().map_or(true, |min| n >= min);
    let below_max = range.max.as_number().map_or(true, |max| n <= max);
    above_min && below_max
}

pub(crate) fn number_matches(value: &Value, op: &NumberOp) -> bool {
    // Dirty data stays visible: a non-numeric value passes every comparison,
    // and so does an operand the user has not finished typing.
    let numeric = value.as_number();
    let compare = |operand: &Value, cmp: fn(f64, f64) -> bool| match (numeric, operand.as_number()) {
        (Some(n), Some(target)) => cmp(n, target),
        _ => true,
    };
    match op {
        NumberOp::IsEmpty => value.is_blank(),
        NumberOp::NotEmpty => !value.is_blank(),
        NumberOp::Equals(v) => compare(v, |a, b| a == b),
        NumberOp::NotEquals(v) => compare(v, |a, b| a != b),
        NumberOp::Gt(v) => compare(v, |a, b| a > b),
        NumberOp::Gte(v) => compare(v, |a, b| a >= b),
        NumberOp::Lt(v) => compare(v, |a, b| a < b),
        NumberOp::Lte(v) => compare(v, |a, b| a <= b),
        NumberOp::Between(range) => numeric.map_or(true, |n| in_range(n, range)),
    }
}

pub(crate) fn date_is_empty(value: &Value) -> bool {
    value.is_blank() || value.display().trim().starts_with(ZERO_DATE)
}

pub(crate) fn date_in_range(date: NaiveDate, range: &Range) -> bool {
    let after_min = parse_date(&range.min).map_or(true, |min| date >= min);
    let before_max = parse_date(&range.max).map_or(true, |max| date <= max);
    after_min && before_max
}

pub(crate) fn date_matches(value: &Value, op: &DateOp, today: NaiveDate) -> bool {
    match op {
        DateOp::IsEmpty => date_is_empty(value),
        DateOp::NotEmpty => !date_is_empty(value),
        DateOp::Between(range) => match parse_date(value) {
            Some(date) => date_in_range(date, range),
            None => true,
        },
        DateOp::IsPast => parse_date(value).map_or(false, |d| d < today),
        DateOp::IsFuture => parse_date(value).map_or(false, |d| d > today),
    }
}

pub(crate) fn bool_matches(value: &Value, op: &BoolOp) -> bool {
    match op {
        BoolOp::IsTrue => value.as_bool() == Some(true),
        BoolOp::IsFalse => value.as_bool() == Some(false),
        BoolOp::IsEmpty => value.is_blank(),
        BoolOp::NotEmpty => !value.is_blank(),
    }
}

pub(crate) fn fk_matches(value: &Value, sel: &FkSelection) -> bool {
    let key = value.key();
    if !sel.include.is_empty() && !sel.include.iter().any(|k| k.trim() == key) {
        return false;
    }
    !sel.exclude.iter().any(|k| k.trim() == key)
}

// ============================================================================
// WHOLE-SCHEMA EVALUATION
// ============================================================================

/// Options for `apply_all`.
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions<'a> {
    /// Filter ids to skip (for cascading option lists).
    pub omit: &'a [String],
    /// Consulted only while the schema's `show_selected` is on.
    pub selected_ids: Option<&'a HashSet<RowId>>,
    pub mode: FilterMode,
    pub context: FilterContext,
}

/// Keeps the rows that pass selection gating, the global search and the
/// column filters, preserving input order.
pub fn apply_all<'a, I>(rows: I, schema: &ColumnSchema, opts: &ApplyOptions<'_>) -> Vec<&'a Row>
where
    I: IntoIterator<Item = &'a Row>,
{
    let query = SearchQuery::parse(&schema.global_search);
    let active: Vec<(ColumnType, &Filter)> = schema
        .columns
        .iter()
        .flat_map(|col| col.filters.iter().map(move |f| (col.column_type, f)))
        .filter(|(_, f)| !opts.omit.contains(&f.id))
        .collect();
    let gate = if schema.show_selected { opts.selected_ids } else { None };

    rows.into_iter()
        .filter(|row| gate.map_or(true, |ids| ids.contains(&row.id)))
        .filter(|row| query.matches_row(row, &schema.columns))
        .filter(|row| {
            let mut results = active
                .iter()
                .map(|(ty, f)| matches(row, f, *ty, &opts.context));
            match opts.mode {
                FilterMode::Cascade => results.all(|ok| ok),
                FilterMode::Additive => active.is_empty() || results.any(|ok| ok),
            }
        })
        .collect()
}

/// Distinct (value, label) pairs of `field` over the rows that survive every
/// filter except the omitted ones. Feeds cascading multi-select option lists.
pub fn distinct_values(
    rows: &[Row],
    schema: &ColumnSchema,
    field: &str,
    opts: &ApplyOptions<'_>,
) -> Vec<(String, String)> {
    let column = schema.column(field);
    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    for row in apply_all(rows, schema, opts) {
        let value = row.get(field);
        if value.is_blank() {
            continue;
        }
        let key = value.key();
        let label = column
            .map(|c| c.option_label(&key).to_string())
            .unwrap_or_else(|| key.clone());
        seen.entry(key).or_insert(label);
    }
    let mut pairs: Vec<(String, String)> = seen.into_iter().collect();
    pairs.sort_by_key(|(_, label)| label.to_lowercase());
    pairs
}
