//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for PowerTable integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use power_table::{
    CrudCallbacks, DisplayMode, GridConfig, PowerTable, Record, Row, RowId, Value,
};
use std::cell::RefCell;
use std::rc::Rc;

/// The fixed "today" every harness table evaluates date filters against.
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

/// Test harness owning one grid instance.
pub struct TestHarness {
    pub table: PowerTable,
}

impl TestHarness {
    /// Create a harness with an empty table and default config.
    pub fn new() -> Self {
        Self::with_config(GridConfig::default())
    }

    pub fn with_config(config: GridConfig) -> Self {
        let table = PowerTable::new(config).unwrap().with_today(today());
        TestHarness { table }
    }

    /// Create a harness loaded with the employee fixture.
    pub fn with_employees() -> Self {
        let mut harness = Self::new();
        harness.table.set_rows(employees()).unwrap();
        harness
    }

    /// Create a harness in tree mode loaded with `rows`.
    pub fn with_tree(rows: Vec<Row>) -> Self {
        let config = GridConfig {
            display_mode: DisplayMode::Tree,
            ..GridConfig::default()
        };
        let mut harness = Self::with_config(config);
        harness.table.set_rows(rows).unwrap();
        harness
    }

    /// Create a harness with `count` rows of `{id, n}`.
    pub fn with_numbered_rows(count: i64) -> Self {
        let mut harness = Self::new();
        let rows = (1..=count).map(|i| Row::new(i).with("n", i)).collect();
        harness.table.set_rows(rows).unwrap();
        harness
    }

    /// Ids of the data rows in the current body, in order.
    pub fn body_ids(&self) -> Vec<RowId> {
        let view = self.table.view();
        (0..view.body.len())
            .filter_map(|i| view.body.line(i).and_then(|l| l.row()))
            .map(|r| r.id.clone())
            .collect()
    }
}

/// Shorthand for integer row ids.
pub fn ids(values: &[i64]) -> Vec<RowId> {
    values.iter().map(|&i| RowId::Int(i)).collect()
}

// ============================================================================
// FIXTURES
// ============================================================================

/// Six employees over two departments and three teams.
pub fn employees() -> Vec<Row> {
    vec![
        employee(1, "Alice", "Sales", "east", 5200.0, "2019-03-01", true),
        employee(2, "Bob", "Sales", "west", 4100.0, "2021-07-15", true),
        employee(3, "Charlie", "Ops", "east", 3900.0, "2018-11-30", false),
        employee(4, "Diana", "Sales", "east", 6100.0, "2024-09-01", true),
        employee(5, "Eve", "Ops", "north", 4500.0, "2020-01-20", true),
        employee(6, "Frank", "Ops", "east", 3000.0, "2023-05-05", false),
    ]
}

fn employee(id: i64, name: &str, dept: &str, team: &str, salary: f64, hired: &str, active: bool) -> Row {
    Row::new(id)
        .with("name", name)
        .with("department", dept)
        .with("team", team)
        .with("salary", salary)
        .with("hired", hired)
        .with("active", active)
}

/// `{id, parent_id, name}` rows for tree tests.
pub fn tree_row(id: i64, parent: Option<i64>, name: &str) -> Row {
    Row::new(id)
        .with("parent_id", parent.map_or(Value::Null, |p| Value::Number(p as f64)))
        .with("name", name)
}

// ============================================================================
// CALLBACK RECORDER
// ============================================================================

/// Shared log of callback invocations, one line per call.
#[derive(Clone, Default)]
pub struct Recorder {
    pub calls: Rc<RefCell<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, line: String) {
        self.calls.borrow_mut().push(line);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Callbacks for every CRUD operation that record their arguments and
    /// succeed.
    pub fn callbacks(&self) -> CrudCallbacks {
        let (a, b, c, d, e, f, g) = (
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
        );
        CrudCallbacks::new()
            .on_create(move |data: &Record| {
                a.push(format!("create {}", data.len()));
                Ok(())
            })
            .on_update_field(move |u| {
                b.push(format!("updateField {} {} {}", u.id, u.field, u.value.display()));
                Ok(())
            })
            .on_update(move |id, changes| {
                c.push(format!("update {} {}", id, changes.len()));
                Ok(())
            })
            .on_update_many(move |ids, changes| {
                d.push(format!("updateMany {} {}", ids.len(), changes.len()));
                Ok(())
            })
            .on_remove(move |id| {
                e.push(format!("remove {}", id));
                Ok(())
            })
            .on_remove_many(move |ids| {
                let joined: Vec<String> = ids.iter().map(|i| i.to_string()).collect();
                f.push(format!("removeMany {}", joined.join(",")));
                Ok(())
            })
            .on_upload(move |records| {
                g.push(format!("upload {}", records.len()));
                Ok(())
            })
    }
}
