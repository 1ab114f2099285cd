//! FILENAME: app/src/selection.rs
//! PURPOSE: Single- and multi-selection of row ids, decoupled from rendering.
//! CONTEXT: Every mutation is synchronous and reports `{reason, prev, next}`
//! to an optional observer, so callers can audit or mirror the state.

use engine::RowId;
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionReason {
    ToggleSelect,
    ToggleMultiSelect,
    AddMany,
    RemoveMany,
    ClearSelect,
    ClearMultiSelect,
    ClearAll,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionSnapshot {
    /// The exclusive single selection.
    pub selected: Option<RowId>,
    pub multi_selected: BTreeSet<RowId>,
}

impl SelectionSnapshot {
    pub fn is_empty(&self) -> bool {
        self.selected.is_none() && self.multi_selected.is_empty()
    }
}

pub struct SelectionChange<'a> {
    pub reason: SelectionReason,
    pub prev: &'a SelectionSnapshot,
    pub next: &'a SelectionSnapshot,
}

pub type SelectionObserver = Box<dyn FnMut(&SelectionChange<'_>)>;

#[derive(Default)]
pub struct SelectionState {
    current: SelectionSnapshot,
    observer: Option<SelectionObserver>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_observer(observer: SelectionObserver) -> Self {
        SelectionState {
            current: SelectionSnapshot::default(),
            observer: Some(observer),
        }
    }

    pub fn set_observer(&mut self, observer: Option<SelectionObserver>) {
        self.observer = observer;
    }

    pub fn snapshot(&self) -> &SelectionSnapshot {
        &self.current
    }

    pub fn selected(&self) -> Option<&RowId> {
        self.current.selected.as_ref()
    }

    pub fn multi_selected(&self) -> &BTreeSet<RowId> {
        &self.current.multi_selected
    }

    pub fn is_selected(&self, id: &RowId) -> bool {
        self.current.selected.as_ref() == Some(id)
    }

    pub fn is_multi_selected(&self, id: &RowId) -> bool {
        self.current.multi_selected.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Ids the "show selected" gate lets through: both selections combined.
    pub fn gate_ids(&self) -> HashSet<RowId> {
        self.current
            .multi_selected
            .iter()
            .chain(self.current.selected.iter())
            .cloned()
            .collect()
    }

    fn commit(&mut self, reason: SelectionReason, next: SelectionSnapshot) {
        let prev = std::mem::replace(&mut self.current, next);
        if let Some(observer) = self.observer.as_mut() {
            observer(&SelectionChange {
                reason,
                prev: &prev,
                next: &self.current,
            });
        }
    }

    /// Selecting the already-selected id deselects it.
    pub fn toggle_select(&mut self, id: RowId) {
        let mut next = self.current.clone();
        next.selected = if next.selected.as_ref() == Some(&id) { None } else { Some(id) };
        self.commit(SelectionReason::ToggleSelect, next);
    }

    /// Flips membership of every id.
    pub fn toggle_multi_select(&mut self, ids: &[RowId]) {
        let mut next = self.current.clone();
        for id in ids {
            if !next.multi_selected.remove(id) {
                next.multi_selected.insert(id.clone());
            }
        }
        self.commit(SelectionReason::ToggleMultiSelect, next);
    }

    pub fn add_many(&mut self, ids: &[RowId]) {
        let mut next = self.current.clone();
        next.multi_selected.extend(ids.iter().cloned());
        self.commit(SelectionReason::AddMany, next);
    }

    pub fn remove_many(&mut self, ids: &[RowId]) {
        let mut next = self.current.clone();
        for id in ids {
            next.multi_selected.remove(id);
        }
        self.commit(SelectionReason::RemoveMany, next);
    }

    pub fn clear_select(&mut self) {
        let next = SelectionSnapshot {
            selected: None,
            ..self.current.clone()
        };
        self.commit(SelectionReason::ClearSelect, next);
    }

    pub fn clear_multi_select(&mut self) {
        let next = SelectionSnapshot {
            multi_selected: BTreeSet::new(),
            ..self.current.clone()
        };
        self.commit(SelectionReason::ClearMultiSelect, next);
    }

    pub fn clear_all(&mut self) {
        self.commit(SelectionReason::ClearAll, SelectionSnapshot::default());
    }

    /// Runs `delete` for `id`; on success drops the id from both selections.
    /// A failing callback leaves the selection untouched.
    pub fn delete_one<E>(
        &mut self,
        id: &RowId,
        delete: impl FnOnce(&RowId) -> Result<(), E>,
    ) -> Result<(), E> {
        delete(id)?;
        self.prune(std::slice::from_ref(id));
        Ok(())
    }

    /// Drops deleted ids from both selections.
    pub fn prune(&mut self, ids: &[RowId]) {
        let mut next = self.current.clone();
        if next.selected.as_ref().is_some_and(|s| ids.contains(s)) {
            next.selected = None;
        }
        for id in ids {
            next.multi_selected.remove(id);
        }
        if next != self.current {
            self.commit(SelectionReason::Deleted, next);
        }
    }
}
