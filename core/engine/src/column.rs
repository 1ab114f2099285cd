//! FILENAME: core/engine/src/column.rs
//! PURPOSE: Column definitions - the unit of grid configuration.
//! CONTEXT: A column tells every other component how to treat one field:
//! which filter operators apply, how to compare and aggregate it, whether it
//! participates in grouping and where it sits in the display order.

use crate::filter::Filter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_COLUMN_WIDTH: f64 = 150.0;

// ============================================================================
// ENUMS
// ============================================================================

/// Data type of a column. Drives the filter operator set, the sort
/// comparator, aggregation eligibility and default alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ColumnType {
    #[default]
    String,
    Number,
    Date,
    Boolean,
    /// Foreign key: a reference into another entity, labelled via `options_map`.
    Fk,
}

impl ColumnType {
    pub fn default_align(self) -> Align {
        match self {
            ColumnType::Number => Align::Right,
            ColumnType::Boolean => Align::Center,
            _ => Align::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// One entry of a multi-key sort model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: &str) -> Self {
        SortKey { field: field.to_string(), direction: SortDirection::Asc }
    }

    pub fn desc(field: &str) -> Self {
        SortKey { field: field.to_string(), direction: SortDirection::Desc }
    }
}

/// Supported aggregation functions for footer totals and group summaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Aggregation {
    Sum,
    Avg,
    Median,
    Min,
    Max,
    Count,
    CountDistinct,
    Empty,
    NotEmpty,
    /// A reducer registered under this name in a `ReducerRegistry`.
    Custom(String),
}

/// Data columns hold row values; action columns render controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ColumnKind {
    #[default]
    Data,
    Select,
    MultiSelect,
    Delete,
}

impl ColumnKind {
    pub fn is_action(self) -> bool {
        !matches!(self, ColumnKind::Data)
    }
}

/// A selectable option for fk/select-like columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        SelectOption { value: value.into(), label: label.into() }
    }
}

// ============================================================================
// COLUMN DEFINITION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    /// Key into the row. Unique within a schema.
    pub field: String,
    pub header_name: String,
    /// Free-text label used to cluster columns in configurators.
    pub field_group: Option<String>,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub width: f64,
    pub align: Option<Align>,
    pub hidden: bool,
    /// Display position. Contiguous 0..N-1 across the schema.
    pub order: usize,
    pub sortable: bool,
    pub sort: Option<SortDirection>,
    /// Priority among sorted columns. Some iff `sort` is Some.
    pub sort_index: Option<usize>,
    pub filters: Vec<Filter>,
    pub aggregation_fn: Option<Aggregation>,
    pub formatter_key: Option<String>,
    pub formatter_options: BTreeMap<String, String>,
    pub group_by: bool,
    /// Grouping priority. Some iff `group_by`.
    pub group_index: Option<usize>,
    pub options: Vec<SelectOption>,
    /// value -> label lookup, used for display and search slugs.
    pub options_map: BTreeMap<String, String>,
    /// Editor kind for inline editing (e.g. "text", "select", "date").
    pub input: Option<String>,
    pub render_key: Option<String>,
    pub style_key: Option<String>,
    pub editable: bool,
    /// Derived field: shown but never written by imports.
    pub computed: bool,
    pub kind: ColumnKind,
    /// Shown by import templates under the field name.
    pub description: Option<String>,
}

impl ColumnDef {
    pub fn new(field: &str, column_type: ColumnType) -> Self {
        ColumnDef {
            field: field.to_string(),
            header_name: field.to_string(),
            field_group: None,
            column_type,
            width: DEFAULT_COLUMN_WIDTH,
            align: None,
            hidden: false,
            order: 0,
            sortable: true,
            sort: None,
            sort_index: None,
            filters: Vec::new(),
            aggregation_fn: None,
            formatter_key: None,
            formatter_options: BTreeMap::new(),
            group_by: false,
            group_index: None,
            options: Vec::new(),
            options_map: BTreeMap::new(),
            input: None,
            render_key: None,
            style_key: None,
            editable: true,
            computed: false,
            kind: ColumnKind::Data,
            description: None,
        }
    }

    /// A control column (select checkbox, delete button, ...).
    pub fn action(field: &str, kind: ColumnKind) -> Self {
        ColumnDef {
            header_name: String::new(),
            sortable: false,
            editable: false,
            width: 48.0,
            kind,
            ..ColumnDef::new(field, ColumnType::String)
        }
    }

    pub fn with_header(mut self, header: &str) -> Self {
        self.header_name = header.to_string();
        self
    }

    pub fn with_options(mut self, options: Vec<SelectOption>) -> Self {
        self.options_map = options
            .iter()
            .map(|o| (o.value.clone(), o.label.clone()))
            .collect();
        self.options = options;
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation_fn = Some(aggregation);
        self
    }

    pub fn is_action(&self) -> bool {
        self.kind.is_action()
    }

    /// Alignment after defaulting.
    pub fn effective_align(&self) -> Align {
        self.align.unwrap_or_else(|| self.column_type.default_align())
    }

    /// Label for a raw key, falling back to the key itself.
    pub fn option_label<'a>(&'a self, key: &'a str) -> &'a str {
        self.options_map.get(key).map(String::as_str).unwrap_or(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_alignment_by_type() {
        assert_eq!(ColumnDef::new("a", ColumnType::Number).effective_align(), Align::Right);
        assert_eq!(ColumnDef::new("a", ColumnType::Boolean).effective_align(), Align::Center);
        assert_eq!(ColumnDef::new("a", ColumnType::Date).effective_align(), Align::Left);
    }

    #[test]
    fn test_options_build_label_map() {
        let col = ColumnDef::new("owner", ColumnType::Fk)
            .with_options(vec![SelectOption::new("1", "Alice")]);
        assert_eq!(col.option_label("1"), "Alice");
        assert_eq!(col.option_label("2"), "2");
    }

    #[test]
    fn test_serializes_type_key() {
        let json = serde_json::to_value(ColumnDef::new("age", ColumnType::Number)).unwrap();
        assert_eq!(json["type"], "number");
        assert_eq!(json["headerName"], "age");
    }
}
