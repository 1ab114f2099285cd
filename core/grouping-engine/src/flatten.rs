//! FILENAME: core/grouping-engine/src/flatten.rs
//! Flattening - turns the group tree into the ordered list the body renders.
//!
//! Depth-first. A group node is always emitted; its children follow only
//! when the node is expanded.

use crate::collapse::GroupCollapseState;
use crate::group::{display_path, GroupEntry, GroupKey, GroupPath};
use engine::{AggregateValue, Row};
use std::collections::BTreeMap;

/// One renderable line of a grouped body.
#[derive(Debug, Clone, PartialEq)]
pub enum FlatEntry<'a> {
    Group {
        key: GroupKey,
        label: String,
        field: String,
        depth: usize,
        path: GroupPath,
        /// Member rows under this node, regardless of collapse state.
        count: usize,
        aggregates: BTreeMap<String, AggregateValue>,
        collapsed: bool,
    },
    Row {
        row: &'a Row,
        /// Number of enclosing groups.
        depth: usize,
    },
}

impl<'a> FlatEntry<'a> {
    pub fn depth(&self) -> usize {
        match self {
            FlatEntry::Group { depth, .. } | FlatEntry::Row { depth, .. } => *depth,
        }
    }

    pub fn row(&self) -> Option<&'a Row> {
        match self {
            FlatEntry::Row { row, .. } => Some(*row),
            FlatEntry::Group { .. } => None,
        }
    }

    /// Slash-joined group path, empty for rows.
    pub fn path_string(&self) -> String {
        match self {
            FlatEntry::Group { path, .. } => display_path(path),
            FlatEntry::Row { .. } => String::new(),
        }
    }
}

pub fn flatten_groups<'a>(tree: &[GroupEntry<'a>], collapse: &GroupCollapseState) -> Vec<FlatEntry<'a>> {
    let mut out = Vec::new();
    flatten_into(tree, collapse, 0, &mut out);
    out
}

fn flatten_into<'a>(
    entries: &[GroupEntry<'a>],
    collapse: &GroupCollapseState,
    depth: usize,
    out: &mut Vec<FlatEntry<'a>>,
) {
    for entry in entries {
        match entry {
            GroupEntry::Row(row) => out.push(FlatEntry::Row { row: *row, depth }),
            GroupEntry::Group(node) => {
                let collapsed = collapse.is_collapsed(&node.path);
                out.push(FlatEntry::Group {
                    key: node.key.clone(),
                    label: node.label.clone(),
                    field: node.field.clone(),
                    depth: node.depth,
                    path: node.path.clone(),
                    count: node.leaf_count(),
                    aggregates: node.aggregates.clone(),
                    collapsed,
                });
                if !collapsed {
                    flatten_into(&node.children, collapse, node.depth + 1, out);
                }
            }
        }
    }
}
