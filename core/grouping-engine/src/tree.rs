//! FILENAME: core/grouping-engine/src/tree.rs
//! Tree - parent/child display of self-referencing rows.
//!
//! Nodes live in an arena (`Forest::nodes`) and refer to each other by index.
//! Building never loses a row: a dangling parent reference makes the node a
//! root, and a parent chain that loops back on itself is cut at one member,
//! which becomes a root and is reported in `Forest::broken_cycles`.

use engine::{Row, RowId, Value, ID_FIELD};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TreeConfig {
    pub id_field: String,
    pub parent_field: String,
    /// Parent value marking a root, in addition to null.
    pub root_value: Value,
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig {
            id_field: ID_FIELD.to_string(),
            parent_field: "parent_id".to_string(),
            root_value: Value::Null,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TreeNode<'a> {
    pub row: &'a Row,
    pub parent: Option<usize>,
    /// Arena indices, in input order.
    pub children: Vec<usize>,
    pub depth: usize,
    /// All nodes below this one, independent of collapse state.
    pub descendant_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Forest<'a> {
    pub nodes: Vec<TreeNode<'a>>,
    /// Arena indices of the roots, in input order.
    pub roots: Vec<usize>,
    /// Ids of the nodes detached from their parent to break a cycle.
    pub broken_cycles: Vec<RowId>,
    index: FxHashMap<String, usize>,
}

impl<'a> Forest<'a> {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks a node up by the key of its id field.
    pub fn node(&self, id: &str) -> Option<&TreeNode<'a>> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn root_ids(&self) -> Vec<RowId> {
        self.roots.iter().map(|&i| self.nodes[i].row.id.clone()).collect()
    }

    pub fn children_of(&self, id: &str) -> Vec<&'a Row> {
        self.node(id)
            .map(|n| n.children.iter().map(|&c| self.nodes[c].row).collect())
            .unwrap_or_default()
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Visit {
    New,
    OnPath,
    Done,
}

fn is_root_marker(parent: &Value, config: &TreeConfig) -> bool {
    parent.is_blank() || (!config.root_value.is_null() && parent.key() == config.root_value.key())
}

/// Builds the forest. Rows keep their input order among siblings.
pub fn build_forest<'a>(rows: &[&'a Row], config: &TreeConfig) -> Forest<'a> {
    let mut index: FxHashMap<String, usize> = FxHashMap::default();
    for (i, row) in rows.iter().enumerate() {
        index.entry(row.get(&config.id_field).key()).or_insert(i);
    }

    let mut parents: Vec<Option<usize>> = rows
        .iter()
        .map(|row| {
            let parent = row.get(&config.parent_field);
            if is_root_marker(parent, config) {
                None
            } else {
                // Orphans (parent id absent from the data) become roots.
                index.get(&parent.key()).copied()
            }
        })
        .collect();

    let broken = break_cycles(&mut parents);

    let mut nodes: Vec<TreeNode<'a>> = rows
        .iter()
        .zip(&parents)
        .map(|(row, parent)| TreeNode {
            row: *row,
            parent: *parent,
            children: Vec::new(),
            depth: 0,
            descendant_count: 0,
        })
        .collect();
    let mut roots = Vec::new();
    for (i, parent) in parents.iter().enumerate() {
        match parent {
            Some(p) => nodes[*p].children.push(i),
            None => roots.push(i),
        }
    }

    // Pre-order for depths, reversed for post-order descendant counts.
    let mut preorder = Vec::with_capacity(nodes.len());
    let mut stack: Vec<(usize, usize)> = roots.iter().rev().map(|&r| (r, 0)).collect();
    while let Some((i, depth)) = stack.pop() {
        nodes[i].depth = depth;
        preorder.push(i);
        stack.extend(nodes[i].children.iter().rev().map(|&c| (c, depth + 1)));
    }
    for &i in preorder.iter().rev() {
        let below: usize = nodes[i].children.iter().map(|&c| nodes[c].descendant_count + 1).sum();
        nodes[i].descendant_count = below;
    }

    Forest {
        broken_cycles: broken.into_iter().map(|i| nodes[i].row.id.clone()).collect(),
        nodes,
        roots,
        index,
    }
}

/// Walks every parent chain with a visited set. When a chain re-enters a
/// node of the current walk, the loop member with the lowest index loses its
/// parent. Returns the detached indices.
fn break_cycles(parents: &mut [Option<usize>]) -> Vec<usize> {
    let mut state = vec![Visit::New; parents.len()];
    let mut broken = Vec::new();
    for start in 0..parents.len() {
        let mut path = Vec::new();
        let mut current = Some(start);
        while let Some(i) = current {
            match state[i] {
                Visit::Done => break,
                Visit::OnPath => {
                    let entry = path.iter().position(|&p| p == i).unwrap_or(0);
                    let victim = path[entry..].iter().copied().min().unwrap_or(i);
                    parents[victim] = None;
                    broken.push(victim);
                    break;
                }
                Visit::New => {
                    state[i] = Visit::OnPath;
                    path.push(i);
                    current = parents[i];
                }
            }
        }
        for i in path {
            state[i] = Visit::Done;
        }
    }
    broken.sort_unstable();
    broken
}

// ============================================================================
// COLLAPSE AND FLATTEN
// ============================================================================

/// Collapsed tree nodes, keyed by row id. Nodes start expanded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeCollapseState {
    collapsed: FxHashSet<RowId>,
}

impl TreeCollapseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_collapsed(&self, id: &RowId) -> bool {
        self.collapsed.contains(id)
    }

    pub fn toggle(&mut self, id: &RowId) -> bool {
        if !self.collapsed.remove(id) {
            self.collapsed.insert(id.clone());
            return true;
        }
        false
    }

    pub fn expand_all(&mut self) {
        self.collapsed.clear();
    }

    /// Collapses every node that has children.
    pub fn collapse_all(&mut self, forest: &Forest<'_>) {
        self.collapsed = forest
            .nodes
            .iter()
            .filter(|n| !n.children.is_empty())
            .map(|n| n.row.id.clone())
            .collect();
    }
}

/// One renderable line of a tree body.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEntry<'a> {
    pub row: &'a Row,
    pub level: usize,
    /// Ids from the root down to this row.
    pub path: Vec<RowId>,
    pub has_children: bool,
    pub collapsed: bool,
    pub descendant_count: usize,
}

impl<'a> TreeEntry<'a> {
    pub fn path_string(&self) -> String {
        self.path.iter().map(|id| id.to_string()).collect::<Vec<_>>().join("/")
    }
}

/// Depth-first; children are emitted only under expanded nodes.
pub fn flatten_forest<'a>(forest: &Forest<'a>, collapse: &TreeCollapseState) -> Vec<TreeEntry<'a>> {
    let mut out = Vec::new();
    let mut stack: Vec<(usize, Vec<RowId>)> =
        forest.roots.iter().rev().map(|&r| (r, Vec::new())).collect();
    while let Some((i, mut path)) = stack.pop() {
        let node = &forest.nodes[i];
        path.push(node.row.id.clone());
        let collapsed = collapse.is_collapsed(&node.row.id);
        if !collapsed {
            stack.extend(node.children.iter().rev().map(|&c| (c, path.clone())));
        }
        out.push(TreeEntry {
            row: node.row,
            level: node.depth,
            path,
            has_children: !node.children.is_empty(),
            collapsed,
            descendant_count: node.descendant_count,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(entries: &[TreeEntry<'_>]) -> Vec<String> {
        entries.iter().map(|e| e.row.id.to_string()).collect()
    }

    #[test]
    fn test_orphans_are_promoted_to_roots() {
        let rows = vec![
            Row::new(1).with("parent_id", Value::Null),
            Row::new(2).with("parent_id", 1),
            Row::new(3).with("parent_id", 99),
        ];
        let refs: Vec<&Row> = rows.iter().collect();
        let forest = build_forest(&refs, &TreeConfig::default());
        assert_eq!(forest.root_ids(), vec![RowId::Int(1), RowId::Int(3)]);
        assert_eq!(forest.children_of("1").len(), 1);
        assert_eq!(forest.node("1").unwrap().descendant_count, 1);
        assert!(forest.broken_cycles.is_empty());
    }

    #[test]
    fn test_cycles_are_broken_without_losing_rows() {
        let rows = vec![
            Row::new(1).with("parent_id", 3),
            Row::new(2).with("parent_id", 1),
            Row::new(3).with("parent_id", 2),
            Row::new(4).with("parent_id", 4),
            Row::new(5).with("parent_id", 2),
        ];
        let refs: Vec<&Row> = rows.iter().collect();
        let forest = build_forest(&refs, &TreeConfig::default());
        assert_eq!(forest.broken_cycles, vec![RowId::Int(1), RowId::Int(4)]);
        assert_eq!(forest.root_ids(), vec![RowId::Int(1), RowId::Int(4)]);

        let flat = flatten_forest(&forest, &TreeCollapseState::new());
        assert_eq!(ids(&flat), vec!["1", "2", "3", "5", "4"]);
        assert_eq!(forest.node("1").unwrap().descendant_count, 3);
    }

    #[test]
    fn test_flatten_respects_collapse_and_reports_paths() {
        let rows = vec![
            Row::new(1),
            Row::new(2).with("parent_id", 1),
            Row::new(3).with("parent_id", 2),
            Row::new(4),
        ];
        let refs: Vec<&Row> = rows.iter().collect();
        let forest = build_forest(&refs, &TreeConfig::default());
        let mut collapse = TreeCollapseState::new();

        let open = flatten_forest(&forest, &collapse);
        assert_eq!(ids(&open), vec!["1", "2", "3", "4"]);
        assert_eq!(open[2].path_string(), "1/2/3");
        assert_eq!(open[2].level, 2);

        collapse.toggle(&RowId::Int(2));
        let closed = flatten_forest(&forest, &collapse);
        assert_eq!(ids(&closed), vec!["1", "2", "4"]);
        assert!(closed[1].collapsed && closed[1].has_children);
        assert_eq!(closed[1].descendant_count, 1);
    }

    #[test]
    fn test_custom_root_value() {
        let rows = vec![Row::new(1).with("parent", 0), Row::new(2).with("parent", 1)];
        let refs: Vec<&Row> = rows.iter().collect();
        let config = TreeConfig {
            parent_field: "parent".into(),
            root_value: Value::Number(0.0),
            ..TreeConfig::default()
        };
        let forest = build_forest(&refs, &config);
        assert_eq!(forest.root_ids(), vec![RowId::Int(1)]);
    }
}
