//! FILENAME: core/engine/src/schema.rs
//! PURPOSE: The column schema and its transition function.
//! CONTEXT: Every user interaction that reconfigures the grid (header clicks,
//! column drags, the filter sidebar, configurator dialogs) is expressed as a
//! `SchemaAction`. `ColumnSchema::apply` is a pure reducer: it returns the next
//! schema and re-establishes the ordering invariants before returning, so no
//! caller can observe a half-updated schema.
//!
//! Invariants held after every transition:
//! - `columns` is stored in display order and `order` equals the position.
//! - `group_index` is Some iff `group_by`, dense 0..K-1 in grouping priority.
//! - `sort_index` is Some iff `sort`, dense 0..S-1 in sort priority.
//! - hidden columns are never grouped.

use crate::column::{Aggregation, Align, ColumnDef, ColumnType, SelectOption, SortDirection, SortKey};
use crate::filter::{Filter, FilterCondition};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

// ============================================================================
// ACTIONS
// ============================================================================

/// A single-attribute update of one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnPatch {
    HeaderName(String),
    FieldGroup(Option<String>),
    Type(ColumnType),
    Width(f64),
    Align(Option<Align>),
    /// Routed through the hide transition (hiding also ungroups).
    Hidden(bool),
    Sortable(bool),
    Editable(bool),
    FormatterKey(Option<String>),
    FormatterOptions(BTreeMap<String, String>),
    /// Routed through the grouping transition.
    GroupBy(bool),
    Options(Vec<SelectOption>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaAction {
    UpdateField { field: String, patch: ColumnPatch },
    /// Positions in display order.
    ReorderColumn { from: usize, to: usize },
    ToggleColumnHidden(String),
    ToggleGroupBy(String),
    SetFilters { field: String, filters: Vec<Filter> },
    /// Adds the column type's default filter under the given id.
    AddFilter { field: String, id: String },
    /// Replaces the filter with the same id in place.
    UpdateFilter(Filter),
    RemoveFilter { field: String, id: String },
    ClearFilters(String),
    ClearAllFilters,
    /// none -> asc -> desc -> none. Without `multi` other sorts are cleared.
    ToggleSort { field: String, multi: bool },
    RemoveSort(String),
    ClearSort,
    SetAggregation { field: String, aggregation: Aggregation },
    RemoveAggregation(String),
    ClearAggregation,
    SetAllVisible(bool),
    SetGlobalSearch(String),
    SetShowSelected(bool),
    ReplaceColumns(Vec<ColumnDef>),
}

impl SchemaAction {
    /// Short name for logs and change notifications.
    pub fn name(&self) -> &'static str {
        match self {
            SchemaAction::UpdateField { .. } => "updateField",
            SchemaAction::ReorderColumn { .. } => "reorderColumn",
            SchemaAction::ToggleColumnHidden(_) => "toggleColumnHidden",
            SchemaAction::ToggleGroupBy(_) => "toggleGroupBy",
            SchemaAction::SetFilters { .. } => "setFilters",
            SchemaAction::AddFilter { .. } => "addFilter",
            SchemaAction::UpdateFilter(_) => "updateFilter",
            SchemaAction::RemoveFilter { .. } => "removeFilter",
            SchemaAction::ClearFilters(_) => "clearFilters",
            SchemaAction::ClearAllFilters => "clearAllFilters",
            SchemaAction::ToggleSort { .. } => "toggleSort",
            SchemaAction::RemoveSort(_) => "removeSort",
            SchemaAction::ClearSort => "clearSort",
            SchemaAction::SetAggregation { .. } => "setAggregation",
            SchemaAction::RemoveAggregation(_) => "removeAggregation",
            SchemaAction::ClearAggregation => "clearAggregation",
            SchemaAction::SetAllVisible(_) => "setAllVisible",
            SchemaAction::SetGlobalSearch(_) => "setGlobalSearch",
            SchemaAction::SetShowSelected(_) => "setShowSelected",
            SchemaAction::ReplaceColumns(_) => "replaceColumns",
        }
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSchema {
    pub columns: Vec<ColumnDef>,
    /// Free-text query applied across all fields.
    pub global_search: String,
    /// Restrict the working set to the selected row ids.
    pub show_selected: bool,
}

impl ColumnSchema {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        let mut schema = ColumnSchema { columns, ..Default::default() };
        schema.normalize();
        schema
    }

    /// Returns the schema that results from `action`.
    pub fn apply(&self, action: &SchemaAction) -> ColumnSchema {
        let mut next = self.clone();
        next.reduce(action);
        next.normalize();
        next
    }

    // ------------------------------------------------------------------------
    // Getters
    // ------------------------------------------------------------------------

    pub fn column(&self, field: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.field == field)
    }

    pub fn visible_columns(&self) -> Vec<&ColumnDef> {
        self.columns.iter().filter(|c| !c.hidden).collect()
    }

    /// Visible data columns, as exported.
    pub fn exportable_columns(&self) -> Vec<&ColumnDef> {
        self.columns.iter().filter(|c| !c.hidden && !c.is_action()).collect()
    }

    /// Grouped columns in grouping priority.
    pub fn grouped_columns(&self) -> Vec<&ColumnDef> {
        let mut grouped: Vec<&ColumnDef> = self.columns.iter().filter(|c| c.group_by).collect();
        grouped.sort_by_key(|c| c.group_index);
        grouped
    }

    pub fn sort_model(&self) -> Vec<SortKey> {
        let mut sorted: Vec<&ColumnDef> = self.columns.iter().filter(|c| c.sort.is_some()).collect();
        sorted.sort_by_key(|c| c.sort_index);
        sorted
            .into_iter()
            .filter_map(|c| c.sort.map(|direction| SortKey { field: c.field.clone(), direction }))
            .collect()
    }

    pub fn sort_direction(&self, field: &str) -> Option<SortDirection> {
        self.column(field).and_then(|c| c.sort)
    }

    pub fn has_filters(&self) -> bool {
        self.columns.iter().any(|c| !c.filters.is_empty())
    }

    pub fn column_has_filters(&self, field: &str) -> bool {
        self.column(field).map_or(false, |c| !c.filters.is_empty())
    }

    pub fn has_aggregation(&self) -> bool {
        self.columns.iter().any(|c| c.aggregation_fn.is_some())
    }

    pub fn column_has_aggregation(&self, field: &str) -> bool {
        self.column(field).map_or(false, |c| c.aggregation_fn.is_some())
    }

    pub fn has_formatter(&self, field: &str) -> bool {
        self.column(field)
            .and_then(|c| c.formatter_key.as_deref())
            .map_or(false, |k| !k.is_empty())
    }

    pub fn all_filters(&self) -> Vec<&Filter> {
        self.columns.iter().flat_map(|c| c.filters.iter()).collect()
    }

    /// Describes every broken invariant; empty when the schema is consistent.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for (i, c) in self.columns.iter().enumerate() {
            if c.order != i {
                problems.push(format!("{}: order {} at position {}", c.field, c.order, i));
            }
            if c.group_by != c.group_index.is_some() {
                problems.push(format!("{}: group_by/group_index disagree", c.field));
            }
            if c.sort.is_some() != c.sort_index.is_some() {
                problems.push(format!("{}: sort/sort_index disagree", c.field));
            }
            if c.hidden && c.group_by {
                problems.push(format!("{}: hidden column is grouped", c.field));
            }
        }
        let mut fields = HashSet::new();
        for c in &self.columns {
            if !fields.insert(c.field.as_str()) {
                problems.push(format!("{}: duplicate field", c.field));
            }
        }
        let check_dense = |label: &str, mut indices: Vec<usize>, problems: &mut Vec<String>| {
            indices.sort_unstable();
            if indices.iter().enumerate().any(|(i, idx)| i != *idx) {
                problems.push(format!("{} indices not dense: {:?}", label, indices));
            }
        };
        check_dense("group", self.columns.iter().filter_map(|c| c.group_index).collect(), &mut problems);
        check_dense("sort", self.columns.iter().filter_map(|c| c.sort_index).collect(), &mut problems);
        problems
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    fn column_mut(&mut self, field: &str) -> Option<&mut ColumnDef> {
        self.columns.iter_mut().find(|c| c.field == field)
    }

    fn reduce(&mut self, action: &SchemaAction) {
        match action {
            SchemaAction::UpdateField { field, patch } => self.update_field(field, patch),
            SchemaAction::ReorderColumn { from, to } => self.reorder(*from, *to),
            SchemaAction::ToggleColumnHidden(field) => {
                if let Some(hidden) = self.column(field).map(|c| c.hidden) {
                    self.set_hidden(field, !hidden);
                }
            }
            SchemaAction::ToggleGroupBy(field) => {
                if let Some(grouped) = self.column(field).map(|c| c.group_by) {
                    self.set_grouped(field, !grouped);
                }
            }
            SchemaAction::SetFilters { field, filters } => {
                if let Some(col) = self.column_mut(field) {
                    col.filters = filters
                        .iter()
                        .cloned()
                        .map(|mut f| {
                            f.field = field.clone();
                            f
                        })
                        .collect();
                }
            }
            SchemaAction::AddFilter { field, id } => {
                if let Some(col) = self.column_mut(field) {
                    let condition = FilterCondition::default_for(col.column_type);
                    col.filters.push(Filter::new(id.clone(), field, condition));
                }
            }
            SchemaAction::UpdateFilter(filter) => {
                if let Some(col) = self.column_mut(&filter.field) {
                    if let Some(existing) = col.filters.iter_mut().find(|f| f.id == filter.id) {
                        *existing = filter.clone();
                    }
                }
            }
            SchemaAction::RemoveFilter { field, id } => {
                if let Some(col) = self.column_mut(field) {
                    col.filters.retain(|f| &f.id != id);
                }
            }
            SchemaAction::ClearFilters(field) => {
                if let Some(col) = self.column_mut(field) {
                    col.filters.clear();
                }
            }
            SchemaAction::ClearAllFilters => {
                for col in &mut self.columns {
                    col.filters.clear();
                }
            }
            SchemaAction::ToggleSort { field, multi } => self.toggle_sort(field, *multi),
            SchemaAction::RemoveSort(field) => {
                if let Some(col) = self.column_mut(field) {
                    col.sort = None;
                    col.sort_index = None;
                }
            }
            SchemaAction::ClearSort => {
                for col in &mut self.columns {
                    col.sort = None;
                    col.sort_index = None;
                }
            }
            SchemaAction::SetAggregation { field, aggregation } => {
                if let Some(col) = self.column_mut(field) {
                    col.aggregation_fn = Some(aggregation.clone());
                }
            }
            SchemaAction::RemoveAggregation(field) => {
                if let Some(col) = self.column_mut(field) {
                    col.aggregation_fn = None;
                }
            }
            SchemaAction::ClearAggregation => {
                for col in &mut self.columns {
                    col.aggregation_fn = None;
                }
            }
            SchemaAction::SetAllVisible(visible) => {
                let fields: Vec<String> = self
                    .columns
                    .iter()
                    .filter(|c| !c.is_action())
                    .map(|c| c.field.clone())
                    .collect();
                for field in fields {
                    self.set_hidden(&field, !visible);
                }
            }
            SchemaAction::SetGlobalSearch(query) => self.global_search = query.clone(),
            SchemaAction::SetShowSelected(on) => self.show_selected = *on,
            SchemaAction::ReplaceColumns(columns) => self.columns = columns.clone(),
        }
    }

    fn update_field(&mut self, field: &str, patch: &ColumnPatch) {
        match patch {
            ColumnPatch::Hidden(hidden) => return self.set_hidden(field, *hidden),
            ColumnPatch::GroupBy(grouped) => return self.set_grouped(field, *grouped),
            _ => {}
        }
        let Some(col) = self.column_mut(field) else {
            return;
        };
        match patch {
            ColumnPatch::HeaderName(name) => col.header_name = name.clone(),
            ColumnPatch::FieldGroup(group) => col.field_group = group.clone(),
            ColumnPatch::Type(ty) => col.column_type = *ty,
            ColumnPatch::Width(width) => col.width = width.max(0.0),
            ColumnPatch::Align(align) => col.align = *align,
            ColumnPatch::Sortable(sortable) => {
                col.sortable = *sortable;
                if !sortable {
                    col.sort = None;
                    col.sort_index = None;
                }
            }
            ColumnPatch::Editable(editable) => col.editable = *editable,
            ColumnPatch::FormatterKey(key) => col.formatter_key = key.clone(),
            ColumnPatch::FormatterOptions(options) => col.formatter_options = options.clone(),
            ColumnPatch::Options(options) => {
                col.options_map = options.iter().map(|o| (o.value.clone(), o.label.clone())).collect();
                col.options = options.clone();
            }
            ColumnPatch::Hidden(_) | ColumnPatch::GroupBy(_) => {}
        }
    }

    /// The single place visibility changes: a hidden column cannot drive grouping.
    fn set_hidden(&mut self, field: &str, hidden: bool) {
        if let Some(col) = self.column_mut(field) {
            col.hidden = hidden;
            if hidden {
                col.group_by = false;
                col.group_index = None;
            }
        }
    }

    fn set_grouped(&mut self, field: &str, grouped: bool) {
        let next_index = self.columns.iter().filter(|c| c.group_by).count();
        if let Some(col) = self.column_mut(field) {
            if grouped == col.group_by || (grouped && col.hidden) {
                return;
            }
            col.group_by = grouped;
            col.group_index = if grouped { Some(next_index) } else { None };
        }
    }

    fn toggle_sort(&mut self, field: &str, multi: bool) {
        let next_index = self.columns.iter().filter(|c| c.sort.is_some()).count();
        let Some(current) = self.column(field).filter(|c| c.sortable).map(|c| c.sort) else {
            return;
        };
        let next = match current {
            None => Some(SortDirection::Asc),
            Some(SortDirection::Asc) => Some(SortDirection::Desc),
            Some(SortDirection::Desc) => None,
        };
        if !multi {
            for col in self.columns.iter_mut().filter(|c| c.field != field) {
                col.sort = None;
                col.sort_index = None;
            }
        }
        if let Some(col) = self.column_mut(field) {
            col.sort = next;
            col.sort_index = match (next, col.sort_index) {
                (None, _) => None,
                (Some(_), Some(existing)) => Some(existing),
                (Some(_), None) => Some(next_index),
            };
        }
    }

    /// Splice-move in display order, then positional rewrite of `order`.
    fn reorder(&mut self, from: usize, to: usize) {
        if from >= self.columns.len() {
            return;
        }
        let col = self.columns.remove(from);
        let to = to.min(self.columns.len());
        self.columns.insert(to, col);
        for (i, col) in self.columns.iter_mut().enumerate() {
            col.order = i;
        }
    }

    /// Re-establishes every invariant. Idempotent.
    pub fn normalize(&mut self) {
        // First occurrence of a field wins.
        let mut seen = HashSet::new();
        self.columns.retain(|c| seen.insert(c.field.clone()));
        self.columns.sort_by_key(|c| c.order);
        for (i, col) in self.columns.iter_mut().enumerate() {
            col.order = i;
            if col.align.is_none() {
                col.align = Some(col.column_type.default_align());
            }
            if col.hidden || !col.group_by {
                col.group_by = false;
                col.group_index = None;
            }
            if col.sort.is_none() {
                col.sort_index = None;
            }
        }
        reindex(&mut self.columns, |c| c.group_by.then_some(c.group_index), |c, i| c.group_index = i);
        reindex(&mut self.columns, |c| c.sort.map(|_| c.sort_index), |c, i| c.sort_index = i);
    }
}

/// Rewrites a sparse priority to a dense 0..K-1 sequence, keeping relative
/// priority. Members without a priority yet go last, in display order.
fn reindex(
    columns: &mut [ColumnDef],
    member: impl Fn(&ColumnDef) -> Option<Option<usize>>,
    assign: impl Fn(&mut ColumnDef, Option<usize>),
) {
    let mut ranked: Vec<(usize, usize)> = columns
        .iter()
        .enumerate()
        .filter_map(|(pos, c)| member(c).map(|idx| (idx.unwrap_or(usize::MAX), pos)))
        .collect();
    ranked.sort();
    for (dense, (_, pos)) in ranked.into_iter().enumerate() {
        assign(&mut columns[pos], Some(dense));
    }
}
