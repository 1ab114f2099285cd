//! FILENAME: core/engine/src/merge.rs
//! PURPOSE: Three-way column merge and column auto-detection.
//! CONTEXT: On initialization the grid combines three layers into one column
//! list: columns detected from the data (or a prior base), developer overrides
//! declared with the entity, and user overrides restored from a preset. Action
//! columns (select boxes, delete buttons) are appended last. The result is
//! deterministic for fixed inputs.

use crate::column::{
    Aggregation, Align, ColumnDef, ColumnKind, ColumnType, SelectOption, SortDirection,
};
use crate::dates::parse_datetime_str;
use crate::filter::Filter;
use crate::schema::ColumnSchema;
use crate::value::{Row, Value, ID_FIELD};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};

// ============================================================================
// OVERRIDES
// ============================================================================

/// A partial column definition. `None` leaves the base attribute untouched.
///
/// `sort` is doubly optional so an override can clear a sort: a missing key
/// keeps the base direction, an explicit `null` removes it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnOverride {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_group: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub column_type: Option<ColumnType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sortable: Option<bool>,
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub sort: Option<Option<SortDirection>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Filter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregation_fn: Option<Aggregation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatter_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatter_options: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_by: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub computed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ColumnKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Distinguishes an explicit `null` from a missing key.
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl ColumnOverride {
    pub fn new(field: &str) -> Self {
        ColumnOverride { field: field.to_string(), ..Default::default() }
    }

    /// The user-overridable subset of a column, as stored in presets.
    pub fn snapshot(column: &ColumnDef) -> Self {
        ColumnOverride {
            field: column.field.clone(),
            header_name: Some(column.header_name.clone()),
            column_type: Some(column.column_type),
            width: Some(column.width),
            hidden: Some(column.hidden),
            order: Some(column.order),
            sort: Some(column.sort),
            sort_index: column.sort_index,
            filters: Some(column.filters.clone()),
            aggregation_fn: column.aggregation_fn.clone(),
            formatter_key: column.formatter_key.clone(),
            formatter_options: Some(column.formatter_options.clone()),
            group_by: Some(column.group_by),
            group_index: column.group_index,
            ..ColumnOverride::new(&column.field)
        }
    }

    /// Shallow-merges onto `base`. `input`, `render_key` and `style_key` are
    /// only replaced when supplied; `options`, `formatter_options`,
    /// `formatter_key` and `aggregation_fn` are only replaced by non-empty values.
    pub fn apply_to(&self, base: &mut ColumnDef) {
        if let Some(v) = &self.header_name {
            base.header_name = v.clone();
        }
        if let Some(v) = &self.field_group {
            base.field_group = Some(v.clone());
        }
        if let Some(v) = self.column_type {
            base.column_type = v;
        }
        if let Some(v) = self.width {
            base.width = v;
        }
        if let Some(v) = self.align {
            base.align = Some(v);
        }
        if let Some(v) = self.hidden {
            base.hidden = v;
        }
        if let Some(v) = self.order {
            base.order = v;
        }
        if let Some(v) = self.sortable {
            base.sortable = v;
        }
        if let Some(v) = self.sort {
            base.sort = v;
            base.sort_index = self.sort_index;
        }
        if let Some(v) = &self.filters {
            base.filters = v.clone();
        }
        if let Some(v) = &self.aggregation_fn {
            base.aggregation_fn = Some(v.clone());
        }
        if let Some(v) = self.formatter_key.as_ref().filter(|k| !k.is_empty()) {
            base.formatter_key = Some(v.clone());
        }
        if let Some(v) = self.formatter_options.as_ref().filter(|o| !o.is_empty()) {
            base.formatter_options = v.clone();
        }
        if let Some(v) = self.group_by {
            base.group_by = v;
            base.group_index = if v { self.group_index.or(base.group_index) } else { None };
        }
        if let Some(v) = self.options.as_ref().filter(|o| !o.is_empty()) {
            base.options_map = v.iter().map(|o| (o.value.clone(), o.label.clone())).collect();
            base.options = v.clone();
        }
        if let Some(v) = &self.input {
            base.input = Some(v.clone());
        }
        if let Some(v) = &self.render_key {
            base.render_key = Some(v.clone());
        }
        if let Some(v) = &self.style_key {
            base.style_key = Some(v.clone());
        }
        if let Some(v) = self.editable {
            base.editable = v;
        }
        if let Some(v) = self.computed {
            base.computed = v;
        }
        if let Some(v) = self.kind {
            base.kind = v;
        }
        if let Some(v) = &self.description {
            base.description = Some(v.clone());
        }
    }

    /// A full column built from this override alone.
    pub fn to_column(&self) -> ColumnDef {
        let mut column = ColumnDef::new(&self.field, self.column_type.unwrap_or_default());
        self.apply_to(&mut column);
        column
    }
}

// ============================================================================
// MERGE
// ============================================================================

fn next_order(columns: &[ColumnDef]) -> usize {
    columns.iter().map(|c| c.order + 1).max().unwrap_or(0)
}

/// Merges `dev` and then `stored` overrides onto `base` and appends `actions`.
///
/// Developer overrides may introduce columns; stored overrides for unknown
/// fields are ignored. Action columns whose field already exists are skipped.
/// The result is normalized: contiguous `order`, dense group and sort indices,
/// default alignment.
pub fn merge_columns(
    base: &[ColumnDef],
    dev: &[ColumnOverride],
    stored: &[ColumnOverride],
    actions: &[ColumnDef],
) -> Vec<ColumnDef> {
    let mut columns: Vec<ColumnDef> = base.to_vec();

    for ov in dev {
        match columns.iter_mut().find(|c| c.field == ov.field) {
            Some(existing) => ov.apply_to(existing),
            None => {
                let mut column = ov.to_column();
                if ov.order.is_none() {
                    column.order = next_order(&columns);
                }
                columns.push(column);
            }
        }
    }

    for ov in stored {
        if let Some(existing) = columns.iter_mut().find(|c| c.field == ov.field) {
            ov.apply_to(existing);
        }
    }

    let known: HashSet<String> = columns.iter().map(|c| c.field.clone()).collect();
    let mut order = next_order(&columns);
    for action in actions.iter().filter(|a| !known.contains(&a.field)) {
        let mut column = action.clone();
        column.order = order;
        order += 1;
        columns.push(column);
    }

    ColumnSchema::new(columns).columns
}

// ============================================================================
// AUTO-DETECTION
// ============================================================================

fn detect_type(value: &Value) -> ColumnType {
    match value {
        Value::Number(_) => ColumnType::Number,
        Value::Bool(_) => ColumnType::Boolean,
        Value::Text(s) if looks_like_date(s) => ColumnType::Date,
        _ => ColumnType::String,
    }
}

/// Date-shaped text only: plain numbers never count as dates.
fn looks_like_date(s: &str) -> bool {
    let s = s.trim();
    s.contains('-') && s.len() >= 10 && parse_datetime_str(s).is_some()
}

/// Infers one column per field of `sample`, `id` first, the rest by field
/// name. Types come from the sample values: numbers, booleans and date-shaped
/// strings are recognised, everything else is a string column.
pub fn detect_columns(sample: &Row) -> Vec<ColumnDef> {
    let mut fields: Vec<(&String, &Value)> = sample.values.iter().collect();
    fields.sort_by_key(|(field, _)| (field.as_str() != ID_FIELD, field.as_str()));
    fields
        .into_iter()
        .enumerate()
        .map(|(order, (field, value))| ColumnDef {
            order,
            ..ColumnDef::new(field, detect_type(value))
        })
        .collect()
}
