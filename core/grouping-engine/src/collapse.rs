//! FILENAME: core/grouping-engine/src/collapse.rs
//! Collapse state for group nodes, keyed by structural group path.
//!
//! The state outlives any one tree: rows change, the tree is rebuilt, and
//! `reconcile` carries the user's choices over to the new tree.

use crate::group::{walk_groups, GroupEntry, GroupPath};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupCollapseState {
    /// path -> collapsed. Absent paths are expanded.
    known: FxHashMap<GroupPath, bool>,
}

impl GroupCollapseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_collapsed(&self, path: &GroupPath) -> bool {
        self.known.get(path).copied().unwrap_or(false)
    }

    pub fn set(&mut self, path: GroupPath, collapsed: bool) {
        self.known.insert(path, collapsed);
    }

    /// Flips one node. Returns the new collapsed flag.
    pub fn toggle(&mut self, path: &GroupPath) -> bool {
        let next = !self.is_collapsed(path);
        self.known.insert(path.clone(), next);
        next
    }

    /// Number of paths currently collapsed.
    pub fn collapsed_count(&self) -> usize {
        self.known.values().filter(|c| **c).count()
    }

    /// Registers every path of a rebuilt tree. Known paths keep their flag;
    /// a new path starts collapsed when any ancestor is collapsed. Paths
    /// missing from the tree are forgotten.
    pub fn reconcile(&mut self, tree: &[GroupEntry<'_>]) {
        let mut next: FxHashMap<GroupPath, bool> = FxHashMap::default();
        walk_groups(tree, &mut |node| {
            // Parents are walked before children, so ancestors are in `next`.
            let flag = match self.known.get(&node.path) {
                Some(known) => *known,
                None => (1..node.path.len()).any(|len| {
                    let ancestor: GroupPath = node.path[..len].iter().cloned().collect();
                    next.get(&ancestor).copied().unwrap_or(false)
                }),
            };
            next.insert(node.path.clone(), flag);
        });
        self.known = next;
    }

    /// Number of paths the state remembers.
    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    pub fn expand_all(&mut self, tree: &[GroupEntry<'_>]) {
        self.set_all(tree, false);
    }

    pub fn collapse_all(&mut self, tree: &[GroupEntry<'_>]) {
        self.set_all(tree, true);
    }

    fn set_all(&mut self, tree: &[GroupEntry<'_>], collapsed: bool) {
        walk_groups(tree, &mut |node| {
            self.known.insert(node.path.clone(), collapsed);
        });
    }

    /// Bulk toggle of every node at `level` and all of their descendant
    /// groups. Collapses when any node at the level is expanded, expands only
    /// when all of them are already collapsed. Returns the applied flag, or
    /// `None` when the tree has no node at that level.
    pub fn toggle_level(&mut self, tree: &[GroupEntry<'_>], level: usize) -> Option<bool> {
        let mut at_level = Vec::new();
        walk_groups(tree, &mut |node| {
            if node.depth == level {
                at_level.push(node);
            }
        });
        if at_level.is_empty() {
            return None;
        }
        let collapse = at_level.iter().any(|node| !self.is_collapsed(&node.path));
        for node in at_level {
            self.known.insert(node.path.clone(), collapse);
            walk_groups(&node.children, &mut |child| {
                self.known.insert(child.path.clone(), collapse);
            });
        }
        Some(collapse)
    }
}
