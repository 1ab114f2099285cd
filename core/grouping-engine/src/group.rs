//! FILENAME: core/grouping-engine/src/group.rs
//! Grouping - recursive partition of rows by the grouped columns.
//!
//! Algorithm:
//! 1. Take the columns with `group_by`, ordered by `group_index`
//! 2. Bucket the rows by the first column's key, in order of first appearance
//! 3. Recurse into each bucket with the remaining columns
//! 4. Attach aggregates over each bucket's rows for every aggregation column
//!
//! With no grouped columns the result is one `GroupEntry::Row` per input row.

use engine::{aggregate, parse_number, AggregateValue, ColumnDef, ColumnType, ReducerRegistry, Row, Value};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;

/// Label shown for the bucket collecting null, blank and zero values.
pub const NO_DATA_LABEL: &str = "no data";

// ============================================================================
// KEYS AND PATHS
// ============================================================================

/// Wrapper around f64 that implements Eq and Hash for use as HashMap keys.
/// NaN values are treated as equal to each other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            // All NaN values hash to the same thing
            u64::MAX.hash(state);
        } else {
            self.0.to_bits().hash(state);
        }
    }
}

/// The bucket a value falls into at one grouping level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum GroupKey {
    /// Null, blank text and numeric zero.
    NoData,
    Bool(bool),
    Number(OrderedFloat),
    Text(String),
}

impl GroupKey {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => GroupKey::NoData,
            Value::Number(n) if *n == 0.0 => GroupKey::NoData,
            Value::Number(n) => GroupKey::Number(OrderedFloat(*n)),
            Value::Bool(b) => GroupKey::Bool(*b),
            Value::Text(s) if s.trim().is_empty() => GroupKey::NoData,
            Value::Text(s) => GroupKey::Text(s.trim().to_string()),
        }
    }

    /// Key of `value` within a column of `column_type`. Number columns read
    /// numeric text as a number, so `1` and `"1"` share a bucket.
    pub fn for_column(value: &Value, column_type: ColumnType) -> Self {
        match (column_type, value) {
            (ColumnType::Number, Value::Text(s)) => match parse_number(s) {
                Some(n) => GroupKey::from_value(&Value::Number(n)),
                None => GroupKey::from_value(value),
            },
            _ => GroupKey::from_value(value),
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, GroupKey::NoData)
    }

    /// Display label, resolving option labels for fk/select columns.
    pub fn label(&self, column: &ColumnDef) -> String {
        let raw = self.to_string();
        match self {
            GroupKey::NoData => raw,
            _ if column.options_map.is_empty() => raw,
            _ => column.option_label(&raw).to_string(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::NoData => write!(f, "{}", NO_DATA_LABEL),
            GroupKey::Bool(b) => write!(f, "{}", b),
            GroupKey::Number(n) => write!(f, "{}", Value::Number(n.0).display()),
            GroupKey::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Structural identity of a group: the keys of the node and its ancestors,
/// outermost first. Keys are compared as values, so a group value containing
/// `/` cannot collide with a deeper path.
pub type GroupPath = SmallVec<[GroupKey; 4]>;

/// Slash-joined rendering of a path, for display only.
pub fn display_path(path: &GroupPath) -> String {
    path.iter().map(|k| k.to_string()).collect::<Vec<_>>().join("/")
}

// ============================================================================
// TREE STRUCTURES
// ============================================================================

/// One bucket of rows sharing a value of the grouped column at `depth`.
#[derive(Debug, Clone)]
pub struct GroupNode<'a> {
    pub key: GroupKey,
    pub label: String,
    /// The grouped column at this level.
    pub field: String,
    /// 0 = outermost grouping level.
    pub depth: usize,
    pub path: GroupPath,
    /// Every row under this node, in input order.
    pub rows: Vec<&'a Row>,
    pub children: Vec<GroupEntry<'a>>,
    /// Aggregates over `rows` for every column with an aggregation.
    pub aggregates: BTreeMap<String, AggregateValue>,
}

impl<'a> GroupNode<'a> {
    pub fn leaf_count(&self) -> usize {
        self.rows.len()
    }

    /// Child group nodes (empty at the deepest level).
    pub fn child_groups(&self) -> impl Iterator<Item = &GroupNode<'a>> {
        self.children.iter().filter_map(GroupEntry::as_group)
    }
}

#[derive(Debug, Clone)]
pub enum GroupEntry<'a> {
    Group(GroupNode<'a>),
    Row(&'a Row),
}

impl<'a> GroupEntry<'a> {
    pub fn as_group(&self) -> Option<&GroupNode<'a>> {
        match self {
            GroupEntry::Group(node) => Some(node),
            GroupEntry::Row(_) => None,
        }
    }
}

/// Grouped columns in grouping priority.
pub fn group_columns(columns: &[ColumnDef]) -> Vec<&ColumnDef> {
    let mut grouped: Vec<&ColumnDef> = columns.iter().filter(|c| c.group_by && !c.hidden).collect();
    grouped.sort_by_key(|c| c.group_index);
    grouped
}

// ============================================================================
// BUILD
// ============================================================================

/// Builds the group tree for `rows` under the grouping configured in `columns`.
pub fn build_group_tree<'a>(
    rows: &[&'a Row],
    columns: &[ColumnDef],
    reducers: &ReducerRegistry,
) -> Vec<GroupEntry<'a>> {
    let levels = group_columns(columns);
    build_level(rows, &levels, 0, &GroupPath::new(), columns, reducers)
}

fn build_level<'a>(
    rows: &[&'a Row],
    levels: &[&ColumnDef],
    depth: usize,
    parent_path: &GroupPath,
    columns: &[ColumnDef],
    reducers: &ReducerRegistry,
) -> Vec<GroupEntry<'a>> {
    let Some(column) = levels.get(depth) else {
        return rows.iter().map(|row| GroupEntry::Row(*row)).collect();
    };

    // Buckets in order of first appearance.
    let mut index: FxHashMap<GroupKey, usize> = FxHashMap::default();
    let mut buckets: Vec<(GroupKey, Vec<&'a Row>)> = Vec::new();
    for row in rows {
        let key = GroupKey::for_column(row.get(&column.field), column.column_type);
        match index.get(&key) {
            Some(&i) => buckets[i].1.push(*row),
            None => {
                index.insert(key.clone(), buckets.len());
                buckets.push((key, vec![*row]));
            }
        }
    }

    buckets
        .into_iter()
        .map(|(key, members)| {
            let mut path = parent_path.clone();
            path.push(key.clone());
            let children = build_level(&members, levels, depth + 1, &path, columns, reducers);
            GroupEntry::Group(GroupNode {
                label: key.label(column),
                field: column.field.clone(),
                depth,
                aggregates: aggregate(&members, columns, reducers),
                key,
                path,
                rows: members,
                children,
            })
        })
        .collect()
}

/// Depth-first walk over every group node.
pub fn walk_groups<'t, 'a>(entries: &'t [GroupEntry<'a>], visit: &mut impl FnMut(&'t GroupNode<'a>)) {
    for node in entries.iter().filter_map(GroupEntry::as_group) {
        visit(node);
        walk_groups(&node.children, visit);
    }
}
