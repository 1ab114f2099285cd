//! FILENAME: app/src/schema_store.rs
//! PURPOSE: Holds the live column schema of one grid and notifies observers.
//! CONTEXT: Every user interaction on headers, filters and configurators ends
//! up as a `SchemaAction` dispatched here. The store runs the pure reducer,
//! swaps in the result and tells subscribers what changed.

use crate::error::{TableError, TableResult};
use crate::logging::{log_debug, log_warn};
use engine::{ColumnDef, ColumnSchema, SchemaAction};
use uuid::Uuid;

/// Passed to observers after a schema transition.
pub struct SchemaChange<'a> {
    pub action: &'static str,
    pub prev: &'a ColumnSchema,
    pub next: &'a ColumnSchema,
}

pub type SchemaObserver = Box<dyn FnMut(&SchemaChange<'_>)>;

pub struct SchemaStore {
    schema: ColumnSchema,
    observers: Vec<(usize, SchemaObserver)>,
    next_observer_id: usize,
    /// Bumped on every applied transition.
    version: u64,
}

impl Default for SchemaStore {
    fn default() -> Self {
        Self::new(ColumnSchema::default())
    }
}

impl SchemaStore {
    pub fn new(schema: ColumnSchema) -> Self {
        SchemaStore {
            schema,
            observers: Vec::new(),
            next_observer_id: 0,
            version: 0,
        }
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.schema.columns
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Registers an observer; the returned handle unsubscribes it.
    pub fn subscribe(&mut self, observer: SchemaObserver) -> usize {
        let id = self.next_observer_id;
        self.next_observer_id += 1;
        self.observers.push((id, observer));
        id
    }

    pub fn unsubscribe(&mut self, handle: usize) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(id, _)| *id != handle);
        self.observers.len() != before
    }

    /// Applies `action`. Actions naming a column that does not exist are
    /// rejected; a transition that changes nothing notifies nobody.
    pub fn dispatch(&mut self, action: SchemaAction) -> TableResult<()> {
        if let Some(field) = target_field(&action) {
            if self.schema.column(field).is_none() {
                log_warn!("SCHEMA", "{} on unknown column '{}'", action.name(), field);
                return Err(TableError::UnknownColumn(field.to_string()));
            }
        }

        let next = self.schema.apply(&action);
        if next == self.schema {
            return Ok(());
        }
        log_debug!("SCHEMA", "{} -> v{}", action.name(), self.version + 1);

        let prev = std::mem::replace(&mut self.schema, next);
        self.version += 1;
        let change = SchemaChange {
            action: action.name(),
            prev: &prev,
            next: &self.schema,
        };
        for (_, observer) in self.observers.iter_mut() {
            observer(&change);
        }
        Ok(())
    }

    /// Adds the column type's default filter under a fresh id and returns it.
    pub fn add_filter(&mut self, field: &str) -> TableResult<String> {
        let id = Uuid::new_v4().to_string();
        self.dispatch(SchemaAction::AddFilter {
            field: field.to_string(),
            id: id.clone(),
        })?;
        Ok(id)
    }

    pub fn replace_columns(&mut self, columns: Vec<ColumnDef>) -> TableResult<()> {
        self.dispatch(SchemaAction::ReplaceColumns(columns))
    }
}

fn target_field(action: &SchemaAction) -> Option<&str> {
    match action {
        SchemaAction::UpdateField { field, .. }
        | SchemaAction::SetFilters { field, .. }
        | SchemaAction::AddFilter { field, .. }
        | SchemaAction::RemoveFilter { field, .. }
        | SchemaAction::ToggleSort { field, .. }
        | SchemaAction::SetAggregation { field, .. } => Some(field.as_str()),
        SchemaAction::ToggleColumnHidden(field)
        | SchemaAction::ToggleGroupBy(field)
        | SchemaAction::ClearFilters(field)
        | SchemaAction::RemoveSort(field)
        | SchemaAction::RemoveAggregation(field) => Some(field.as_str()),
        SchemaAction::UpdateFilter(filter) => Some(filter.field.as_str()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::ColumnType;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn store() -> SchemaStore {
        SchemaStore::new(ColumnSchema::new(vec![
            ColumnDef::new("name", ColumnType::String),
            ColumnDef::new("age", ColumnType::Number),
        ]))
    }

    #[test]
    fn test_observers_see_prev_and_next() {
        let mut store = store();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        store.subscribe(Box::new(move |change| {
            sink.borrow_mut().push((
                change.action,
                change.prev.sort_direction("age"),
                change.next.sort_direction("age"),
            ));
        }));

        store
            .dispatch(SchemaAction::ToggleSort { field: "age".into(), multi: false })
            .unwrap();
        assert_eq!(
            seen.borrow().as_slice(),
            &[("toggleSort", None, Some(engine::SortDirection::Asc))]
        );
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn test_no_op_does_not_notify() {
        let mut store = store();
        let count = Rc::new(RefCell::new(0));
        let sink = count.clone();
        store.subscribe(Box::new(move |_| *sink.borrow_mut() += 1));
        store.dispatch(SchemaAction::ClearSort).unwrap();
        assert_eq!(*count.borrow(), 0);
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn test_unknown_column_is_rejected() {
        let mut store = store();
        let err = store.dispatch(SchemaAction::ToggleGroupBy("nope".into())).unwrap_err();
        assert!(matches!(err, TableError::UnknownColumn(f) if f == "nope"));
    }

    #[test]
    fn test_add_filter_generates_unique_ids() {
        let mut store = store();
        let a = store.add_filter("age").unwrap();
        let b = store.add_filter("age").unwrap();
        assert_ne!(a, b);
        assert_eq!(store.schema().column("age").unwrap().filters.len(), 2);
    }

    #[test]
    fn test_unsubscribe() {
        let mut store = store();
        let handle = store.subscribe(Box::new(|_| {}));
        assert!(store.unsubscribe(handle));
        assert!(!store.unsubscribe(handle));
    }
}
