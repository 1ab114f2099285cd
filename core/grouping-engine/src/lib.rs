//! FILENAME: core/grouping-engine/src/lib.rs
//! Grouping and tree subsystem for the table.
//!
//! This crate builds the hierarchical bodies of the grid as a standalone
//! module, separate from the core table engine. It depends on `engine`
//! only for shared types (Row, ColumnDef, aggregation).
//!
//! Layers:
//! - `group`: Recursive partition by grouped columns, with per-node aggregates
//! - `collapse`: Collapse state keyed by structural group path
//! - `flatten`: Depth-first list of group and row entries (WHAT we display)
//! - `tree`: Parent/child forest, its collapse state and flattening

pub mod collapse;
pub mod flatten;
pub mod group;
pub mod tree;

pub use collapse::GroupCollapseState;
pub use flatten::{flatten_groups, FlatEntry};
pub use group::{
    build_group_tree, display_path, group_columns, walk_groups, GroupEntry, GroupKey, GroupNode,
    GroupPath, OrderedFloat, NO_DATA_LABEL,
};
pub use tree::{
    build_forest, flatten_forest, Forest, TreeCollapseState, TreeConfig, TreeEntry, TreeNode,
};
