//! FILENAME: tests/test_window.rs
//! Integration tests for body virtualization through the table.

mod common;

use common::TestHarness;
use power_table::{BodyLine, RowId, SchemaAction};

fn first_row_id(lines: &[BodyLine<'_, '_>]) -> Option<RowId> {
    lines.iter().find_map(|l| l.row()).map(|r| r.id.clone())
}

#[test]
fn test_window_at_top_includes_overscan() {
    let harness = TestHarness::with_numbered_rows(100);
    let window = harness.table.window(0.0);

    // 600px / 40px = 15 visible rows, plus 5 overscan, inclusive.
    assert_eq!((window.range.start, window.range.end), (0, 21));
    assert_eq!(window.range.padding_top, 0.0);
    assert_eq!(window.range.padding_bottom, 79.0 * 40.0);
    assert_eq!(window.lines().len(), 21);
}

#[test]
fn test_window_in_the_middle() {
    let harness = TestHarness::with_numbered_rows(100);
    let window = harness.table.window(2000.0);

    assert_eq!((window.range.start, window.range.end), (45, 71));
    assert_eq!(first_row_id(&window.lines()), Some(RowId::Int(46)));
}

#[test]
fn test_one_row_jitter_keeps_the_window() {
    let harness = TestHarness::with_numbered_rows(100);
    let settled = harness.table.window(2000.0).range;
    let jitter = harness.table.window(1999.0).range;
    assert_eq!(settled, jitter);

    let moved = harness.table.window(2400.0).range;
    assert_eq!(moved.start, 55);
}

#[test]
fn test_viewport_resize_changes_the_window() {
    let mut harness = TestHarness::with_numbered_rows(100);
    harness.table.set_viewport_height(200.0);

    let window = harness.table.window(0.0);
    assert_eq!(window.range.end, 11);
}

#[test]
fn test_short_grouped_body_fits_entirely() {
    let mut harness = TestHarness::with_employees();
    harness
        .table
        .dispatch(SchemaAction::ToggleGroupBy("department".into()))
        .unwrap();

    let window = harness.table.window(0.0);
    let lines = window.lines();
    assert_eq!(lines.len(), 8);
    assert!(matches!(lines[0], BodyLine::Group(_)));
    assert_eq!(window.range.padding_bottom, 0.0);
}

#[test]
fn test_empty_body_has_empty_window() {
    let harness = TestHarness::new();
    let window = harness.table.window(120.0);
    assert!(window.range.is_empty());
    assert!(window.lines().is_empty());
}
