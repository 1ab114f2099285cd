//! FILENAME: tests/test_presets.rs
//! Integration tests for named column presets.

mod common;

use common::{employees, TestHarness};
use power_table::{
    GridConfig, JsonFileStore, MemoryStore, PowerTable, SchemaAction, SortDirection, TableError,
};
use std::path::Path;

fn table_with_file_store(path: &Path, user: Option<&str>) -> PowerTable {
    let config = GridConfig {
        entity: "employees".into(),
        user_key: user.map(str::to_string),
        ..GridConfig::default()
    };
    let store = JsonFileStore::open(path).unwrap();
    let mut table = PowerTable::new(config).unwrap().with_preset_store(Box::new(store));
    table.set_rows(employees()).unwrap();
    table
}

fn table_with_memory_store() -> PowerTable {
    let mut table = PowerTable::new(GridConfig::default())
        .unwrap()
        .with_preset_store(Box::new(MemoryStore::new()));
    table.set_rows(employees()).unwrap();
    table
}

// ============================================================================
// LIFECYCLE
// ============================================================================

#[test]
fn test_presets_need_a_store() {
    let mut harness = TestHarness::with_employees();
    assert!(matches!(harness.table.list_presets(), Err(TableError::Unsupported("presets"))));
    assert!(matches!(harness.table.save_preset_as("x"), Err(TableError::Unsupported("presets"))));
}

#[test]
fn test_save_as_makes_the_preset_active() {
    let mut table = table_with_memory_store();
    table.dispatch(SchemaAction::ToggleColumnHidden("team".into())).unwrap();

    let preset = table.save_preset_as("compact").unwrap();
    assert_eq!(preset.name, "compact");
    assert!(preset.columns.iter().any(|c| c.field == "team" && c.hidden == Some(true)));
    assert_eq!(table.list_presets().unwrap(), vec!["compact"]);
    assert_eq!(table.active_preset().unwrap().as_deref(), Some("compact"));

    assert!(matches!(table.save_preset_as("compact"), Err(TableError::PresetExists(_))));
    assert!(matches!(table.save_preset_as("a:b"), Err(TableError::InvalidPresetName(_))));
}

#[test]
fn test_save_requires_an_active_preset() {
    let mut table = table_with_memory_store();
    assert!(matches!(table.save_preset(), Err(TableError::NoActivePreset)));

    table.save_preset_as("mine").unwrap();
    table
        .dispatch(SchemaAction::ToggleSort { field: "salary".into(), multi: false })
        .unwrap();
    let saved = table.save_preset().unwrap();
    let salary = saved.columns.iter().find(|c| c.field == "salary").unwrap();
    assert_eq!(salary.sort, Some(Some(SortDirection::Asc)));
}

#[test]
fn test_load_applies_stored_overrides() {
    let mut table = table_with_memory_store();
    table.dispatch(SchemaAction::ToggleColumnHidden("hired".into())).unwrap();
    table.save_preset_as("no-dates").unwrap();

    table.dispatch(SchemaAction::ToggleColumnHidden("hired".into())).unwrap();
    table.save_preset_as("everything").unwrap();
    assert!(!table.schema().column("hired").unwrap().hidden);

    table.load_preset("no-dates").unwrap();
    assert!(table.schema().column("hired").unwrap().hidden);
    assert_eq!(table.active_preset().unwrap().as_deref(), Some("no-dates"));

    assert!(matches!(table.load_preset("ghost"), Err(TableError::PresetNotFound(_))));
}

#[test]
fn test_rename_and_delete_track_the_active_pointer() {
    let mut table = table_with_memory_store();
    table.save_preset_as("draft").unwrap();

    table.rename_preset("draft", "final").unwrap();
    assert_eq!(table.list_presets().unwrap(), vec!["final"]);
    assert_eq!(table.active_preset().unwrap().as_deref(), Some("final"));

    table.delete_preset("final").unwrap();
    assert!(table.list_presets().unwrap().is_empty());
    assert_eq!(table.active_preset().unwrap(), None);
}

#[test]
fn test_reset_columns_forgets_the_active_preset() {
    let mut table = table_with_memory_store();
    table.dispatch(SchemaAction::ToggleColumnHidden("name".into())).unwrap();
    table.save_preset_as("hidden-name").unwrap();

    table.reset_columns().unwrap();
    assert!(!table.schema().column("name").unwrap().hidden);
    assert_eq!(table.active_preset().unwrap(), None);
    assert_eq!(table.list_presets().unwrap(), vec!["hidden-name"]);
}

// ============================================================================
// PERSISTENCE
// ============================================================================

#[test]
fn test_active_preset_is_restored_on_next_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("presets.json");

    {
        let mut table = table_with_file_store(&path, None);
        table
            .dispatch(SchemaAction::ToggleGroupBy("department".into()))
            .unwrap();
        table.save_preset_as("by-dept").unwrap();
    }

    let table = table_with_file_store(&path, None);
    let department = table.schema().column("department").unwrap();
    assert!(department.group_by);
    assert_eq!(table.active_preset().unwrap().as_deref(), Some("by-dept"));
}

#[test]
fn test_user_scopes_do_not_leak() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("presets.json");

    {
        let mut shared = table_with_file_store(&path, None);
        shared.save_preset_as("team-view").unwrap();
    }
    {
        let mut personal = table_with_file_store(&path, Some("ann"));
        personal.save_preset_as("my-view").unwrap();
    }

    let shared = table_with_file_store(&path, None);
    let personal = table_with_file_store(&path, Some("ann"));
    assert_eq!(shared.list_presets().unwrap(), vec!["team-view"]);
    assert_eq!(personal.list_presets().unwrap(), vec!["my-view"]);
}
