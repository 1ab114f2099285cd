//! FILENAME: tests/test_logging.rs
//! Integration test for the unified log file. Kept as the only test in this
//! binary because the log file is process-global.

mod common;

use common::employees;
use power_table::{
    close_log_file, init_log_file, CrudCallbacks, GridConfig, ImportSheet, PowerTable,
};

#[test]
fn test_upload_is_traced_and_failures_logged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs").join("grid.log");
    init_log_file(&path).unwrap();

    let mut table = PowerTable::new(GridConfig::default())
        .unwrap()
        .with_callbacks(CrudCallbacks::new().on_upload(|_| Err("disk full".to_string())));
    table.set_rows(employees()).unwrap();
    let sheet = ImportSheet::from_matrix(vec![vec!["name".into()], vec!["Ivy".into()]])
        .with_auto_mapping(&table.schema().columns);

    assert!(table.commit_upload(&sheet).is_err());
    close_log_file();

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert!(lines.iter().any(|l| l.ends_with("|D|IMPORT|ENTER commit_upload rows=1")));
    assert!(lines
        .iter()
        .any(|l| l.contains("|E|IMPORT|") && l.ends_with("failed: disk full")));
    assert!(!lines.iter().any(|l| l.contains("EXIT commit_upload")));

    // seq|level|category|message
    for line in &lines {
        assert_eq!(line.splitn(4, '|').count(), 4, "malformed line {:?}", line);
        assert!(line.split('|').next().unwrap().parse::<u64>().is_ok());
    }
}
