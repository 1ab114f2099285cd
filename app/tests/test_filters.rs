//! FILENAME: tests/test_filters.rs
//! Integration tests for column filters, global search and the selection gate.

mod common;

use common::{ids, TestHarness};
use power_table::{
    Filter, FilterCondition, FilterMode, GridConfig, Row, RowId, SchemaAction, Value,
};
use engine::{DateOp, NumberOp, Range, TextOp};

fn set_filter(harness: &mut TestHarness, field: &str, condition: FilterCondition) {
    harness
        .table
        .dispatch(SchemaAction::SetFilters {
            field: field.to_string(),
            filters: vec![Filter::new(format!("{}-f", field), field, condition)],
        })
        .unwrap();
}

// ============================================================================
// PASS-THROUGH
// ============================================================================

#[test]
fn test_no_filters_keeps_every_row_in_order() {
    let harness = TestHarness::with_numbered_rows(100);
    let view = harness.table.view();

    assert_eq!(view.filtered_count, 100);
    assert_eq!(view.total_count, 100);
    let expected: Vec<RowId> = (1..=100).map(RowId::Int).collect();
    assert_eq!(harness.body_ids(), expected);
}

// ============================================================================
// TYPED FILTERS
// ============================================================================

#[test]
fn test_number_between_is_inclusive() {
    let mut harness = TestHarness::new();
    harness
        .table
        .set_rows(vec![
            Row::new(1).with("age", 17),
            Row::new(2).with("age", 25),
            Row::new(3).with("age", 30),
            Row::new(4).with("age", 31),
        ])
        .unwrap();

    set_filter(&mut harness, "age", FilterCondition::Number(NumberOp::Between(Range::new(18, 30))));

    assert_eq!(harness.body_ids(), ids(&[2, 3]));
}

#[test]
fn test_text_multi_select() {
    let mut harness = TestHarness::with_employees();
    set_filter(
        &mut harness,
        "department",
        FilterCondition::String(TextOp::MultiSelect(vec!["Ops".into()])),
    );
    assert_eq!(harness.body_ids(), ids(&[3, 5, 6]));
}

#[test]
fn test_date_filters_use_the_fixed_today() {
    let mut harness = TestHarness::with_employees();
    set_filter(&mut harness, "hired", FilterCondition::Date(DateOp::IsFuture));
    assert_eq!(harness.body_ids(), ids(&[4]));

    set_filter(
        &mut harness,
        "hired",
        FilterCondition::Date(DateOp::Between(Range::new("2020-01-01", "2021-12-31"))),
    );
    assert_eq!(harness.body_ids(), ids(&[2, 5]));
}

#[test]
fn test_foreign_filter_family_on_string_column_rejects_rows() {
    let mut harness = TestHarness::with_employees();
    set_filter(&mut harness, "name", FilterCondition::Number(NumberOp::Gt(Value::Number(1.0))));
    assert!(harness.body_ids().is_empty());
}

#[test]
fn test_cascade_versus_additive() {
    let filters = |harness: &mut TestHarness| {
        set_filter(
            harness,
            "department",
            FilterCondition::String(TextOp::MultiSelect(vec!["Ops".into()])),
        );
        set_filter(harness, "salary", FilterCondition::Number(NumberOp::Gte(Value::Number(5000.0))));
    };

    let mut cascade = TestHarness::with_employees();
    filters(&mut cascade);
    assert!(cascade.body_ids().is_empty());

    let mut additive = TestHarness::with_config(GridConfig {
        filter_mode: FilterMode::Additive,
        ..GridConfig::default()
    });
    additive.table.set_rows(common::employees()).unwrap();
    filters(&mut additive);
    assert_eq!(additive.body_ids(), ids(&[1, 3, 4, 5, 6]));
}

#[test]
fn test_added_filter_starts_inactive() {
    let mut harness = TestHarness::with_employees();
    let id = harness.table.add_filter("salary").unwrap();

    assert!(!id.is_empty());
    assert_eq!(harness.table.schema().column("salary").unwrap().filters.len(), 1);
    assert_eq!(harness.body_ids().len(), 6);
}

#[test]
fn test_filter_on_unknown_column_is_rejected() {
    let mut harness = TestHarness::with_employees();
    assert!(harness.table.add_filter("nope").is_err());
}

// ============================================================================
// GLOBAL SEARCH
// ============================================================================

#[test]
fn test_whitespace_separates_alternatives() {
    let mut harness = TestHarness::new();
    harness
        .table
        .set_rows(vec![
            Row::new(1).with("name", "John Smith"),
            Row::new(2).with("name", "Jane Doe"),
            Row::new(3).with("name", "Bob Lee"),
        ])
        .unwrap();

    harness.table.dispatch(SchemaAction::SetGlobalSearch("john doe".into())).unwrap();
    assert_eq!(harness.body_ids(), ids(&[1, 2]));

    harness.table.dispatch(SchemaAction::SetGlobalSearch("jane,doe".into())).unwrap();
    assert_eq!(harness.body_ids(), ids(&[2]));
}

// ============================================================================
// CASCADING OPTIONS
// ============================================================================

#[test]
fn test_filter_options_ignore_the_omitted_filter() {
    let mut harness = TestHarness::with_employees();
    set_filter(
        &mut harness,
        "department",
        FilterCondition::String(TextOp::MultiSelect(vec!["Ops".into()])),
    );

    let teams: Vec<String> = harness
        .table
        .filter_options("team", &[])
        .into_iter()
        .map(|(value, _)| value)
        .collect();
    assert_eq!(teams, vec!["east", "north"]);

    let departments: Vec<String> = harness
        .table
        .filter_options("department", &["department-f".to_string()])
        .into_iter()
        .map(|(value, _)| value)
        .collect();
    assert_eq!(departments, vec!["Ops", "Sales"]);
}

// ============================================================================
// SHOW SELECTED
// ============================================================================

#[test]
fn test_show_selected_restricts_to_selection() {
    let mut harness = TestHarness::with_employees();
    harness.table.add_many(&ids(&[2, 5])).unwrap();
    harness.table.toggle_select(RowId::Int(6)).unwrap();
    harness.table.dispatch(SchemaAction::SetShowSelected(true)).unwrap();

    assert_eq!(harness.body_ids(), ids(&[2, 5, 6]));
}

#[test]
fn test_show_selected_turns_off_when_selection_empties() {
    let mut harness = TestHarness::with_employees();

    harness.table.dispatch(SchemaAction::SetShowSelected(true)).unwrap();
    assert!(!harness.table.schema().show_selected);

    harness.table.add_many(&ids(&[1])).unwrap();
    harness.table.dispatch(SchemaAction::SetShowSelected(true)).unwrap();
    assert_eq!(harness.body_ids(), ids(&[1]));

    harness.table.clear_selection().unwrap();
    assert!(!harness.table.schema().show_selected);
    assert_eq!(harness.body_ids().len(), 6);
}
