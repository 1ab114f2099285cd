//! FILENAME: app/src/pipeline.rs
//! PURPOSE: The render pipeline: filter -> sort -> group | tree | identity.
//! CONTEXT: Runs synchronously over the full row set on every relevant state
//! change. The result borrows the rows; nothing here mutates them.

use crate::config::DisplayMode;
use crate::window::BodyKind;
use engine::{aggregate, apply_all, sort_rows, AggregateValue, ApplyOptions, ColumnSchema, ReducerRegistry, Row, RowId};
use grouping_engine::{
    build_forest, build_group_tree, flatten_forest, flatten_groups, group_columns, FlatEntry,
    GroupCollapseState, TreeCollapseState, TreeConfig, TreeEntry,
};
use std::collections::BTreeMap;

/// The laid-out body, one entry per rendered line.
#[derive(Debug, Clone)]
pub enum Body<'a> {
    Flat(Vec<&'a Row>),
    Grouped(Vec<FlatEntry<'a>>),
    Tree(Vec<TreeEntry<'a>>),
}

/// One line of any body variant.
#[derive(Debug, Clone, Copy)]
pub enum BodyLine<'b, 'a> {
    Row(&'a Row),
    Group(&'b FlatEntry<'a>),
    Tree(&'b TreeEntry<'a>),
}

impl<'b, 'a> BodyLine<'b, 'a> {
    /// The data row behind the line (None for group headers).
    pub fn row(&self) -> Option<&'a Row> {
        match self {
            BodyLine::Row(row) => Some(*row),
            BodyLine::Group(entry) => entry.row(),
            BodyLine::Tree(entry) => Some(entry.row),
        }
    }
}

impl<'a> Body<'a> {
    pub fn len(&self) -> usize {
        match self {
            Body::Flat(rows) => rows.len(),
            Body::Grouped(entries) => entries.len(),
            Body::Tree(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> BodyKind {
        match self {
            Body::Flat(_) => BodyKind::Flat,
            Body::Grouped(_) => BodyKind::Grouped,
            Body::Tree(_) => BodyKind::Tree,
        }
    }

    pub fn line(&self, index: usize) -> Option<BodyLine<'_, 'a>> {
        match self {
            Body::Flat(rows) => rows.get(index).map(|r| BodyLine::Row(*r)),
            Body::Grouped(entries) => entries.get(index).map(BodyLine::Group),
            Body::Tree(entries) => entries.get(index).map(BodyLine::Tree),
        }
    }

    /// Lines in `[start, end)`, clamped to the body.
    pub fn lines(&self, start: usize, end: usize) -> Vec<BodyLine<'_, 'a>> {
        let end = end.min(self.len());
        (start.min(end)..end).filter_map(|i| self.line(i)).collect()
    }
}

#[derive(Debug, Clone)]
pub struct View<'a> {
    pub body: Body<'a>,
    /// Rows that passed the filters, before grouping or collapsing.
    pub filtered_count: usize,
    pub total_count: usize,
    /// Aggregates over the filtered rows, for the footer.
    pub footer: BTreeMap<String, AggregateValue>,
    /// Tree mode only: ids detached from a parent cycle.
    pub broken_cycles: Vec<RowId>,
}

/// Filter then sort. Shared by the view, exports and bulk collapse.
pub fn filtered_sorted<'a>(rows: &'a [Row], schema: &ColumnSchema, opts: &ApplyOptions<'_>) -> Vec<&'a Row> {
    let kept = apply_all(rows, schema, opts);
    sort_rows(&kept, &schema.sort_model(), &schema.columns)
}

pub struct PipelineInput<'p> {
    pub schema: &'p ColumnSchema,
    pub opts: &'p ApplyOptions<'p>,
    pub display_mode: DisplayMode,
    pub tree: &'p TreeConfig,
    pub reducers: &'p ReducerRegistry,
}

/// Runs the whole pipeline. Group collapse state is reconciled against the
/// rebuilt group tree so new groups inherit a collapsed ancestor.
pub fn run<'a>(
    rows: &'a [Row],
    input: &PipelineInput<'_>,
    group_collapse: &mut GroupCollapseState,
    tree_collapse: &TreeCollapseState,
) -> View<'a> {
    let sorted = filtered_sorted(rows, input.schema, input.opts);
    let footer = aggregate(&sorted, &input.schema.columns, input.reducers);
    let mut broken_cycles = Vec::new();

    let body = if input.display_mode == DisplayMode::Tree {
        let forest = build_forest(&sorted, input.tree);
        broken_cycles = forest.broken_cycles.clone();
        Body::Tree(flatten_forest(&forest, tree_collapse))
    } else if !group_columns(&input.schema.columns).is_empty() {
        let tree = build_group_tree(&sorted, &input.schema.columns, input.reducers);
        group_collapse.reconcile(&tree);
        Body::Grouped(flatten_groups(&tree, group_collapse))
    } else {
        Body::Flat(sorted.clone())
    };

    View {
        body,
        filtered_count: sorted.len(),
        total_count: rows.len(),
        footer,
        broken_cycles,
    }
}
