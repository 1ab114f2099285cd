//! FILENAME: core/persistence/src/import.rs
//! PURPOSE: Uploaded sheet contents and their conversion to records.
//! CONTEXT: `load_xlsx` produces an `ImportSheet` with the first row as
//! headers and an automatic mapping. The caller may adjust the mapping, then
//! `to_records` yields one field -> value map per data row, with date columns
//! coerced and unmapped or computed fields left out.

use crate::dates::coerce_import_date;
use crate::mapping::{auto_map, mappable_columns, HeaderMapping};
use engine::{ColumnDef, ColumnType, Value};
use std::collections::BTreeMap;

/// One imported row, keyed by target field.
pub type Record = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportSheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub mapping: HeaderMapping,
}

impl ImportSheet {
    /// Splits a raw matrix into headers and data rows. Blank rows are dropped.
    pub fn from_matrix(mut matrix: Vec<Vec<Value>>) -> Self {
        if matrix.is_empty() {
            return ImportSheet::default();
        }
        let headers: Vec<String> = matrix.remove(0).iter().map(|v| v.display().trim().to_string()).collect();
        let rows: Vec<Vec<Value>> = matrix
            .into_iter()
            .filter(|row| row.iter().any(|v| !v.is_blank()))
            .collect();
        ImportSheet {
            mapping: HeaderMapping { targets: vec![None; headers.len()] },
            headers,
            rows,
        }
    }

    /// Recomputes the automatic mapping against `columns`.
    pub fn with_auto_mapping(mut self, columns: &[ColumnDef]) -> Self {
        self.mapping = auto_map(&self.headers, columns);
        self
    }

    /// A filled-in import template repeats the column descriptions as its
    /// first data row; drop it when every mapped cell equals the description.
    pub fn strip_template_descriptions(&mut self, columns: &[ColumnDef]) {
        let Some(first) = self.rows.first() else {
            return;
        };
        let mut compared = 0;
        let all_match = self.mapping.targets.iter().enumerate().all(|(i, target)| {
            let Some(column) = target.as_deref().and_then(|f| columns.iter().find(|c| c.field == f)) else {
                return true;
            };
            compared += 1;
            let description = column.description.as_deref().unwrap_or(&column.header_name);
            first.get(i).map(|v| v.display().trim().to_string()).as_deref() == Some(description)
        });
        if all_match && compared > 0 {
            self.rows.remove(0);
        }
    }

    /// Converts the data rows through the mapping.
    pub fn to_records(&self, columns: &[ColumnDef]) -> Vec<Record> {
        let targets = mappable_columns(columns);
        let lookup: BTreeMap<&str, ColumnType> =
            targets.iter().map(|c| (c.field.as_str(), c.column_type)).collect();

        self.rows
            .iter()
            .map(|row| {
                let mut record = Record::new();
                for (i, value) in row.iter().enumerate() {
                    let Some(field) = self.mapping.field_for(i) else {
                        continue;
                    };
                    let Some(column_type) = lookup.get(field) else {
                        continue;
                    };
                    let value = match column_type {
                        ColumnType::Date => coerce_import_date(value),
                        _ => value.clone(),
                    };
                    record.insert(field.to_string(), value);
                }
                record
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<ColumnDef> {
        let mut total = ColumnDef::new("total", ColumnType::Number);
        total.computed = true;
        let mut born = ColumnDef::new("born", ColumnType::Date);
        born.description = Some("Date of birth".into());
        engine::ColumnSchema::new(vec![ColumnDef::new("name", ColumnType::String), born, total]).columns
    }

    fn matrix() -> Vec<Vec<Value>> {
        vec![
            vec!["Name".into(), "Born".into(), "Total".into()],
            vec!["name".into(), "Date of birth".into(), Value::Null],
            vec!["Ann".into(), "09/03/1990".into(), 99.into()],
            vec![Value::Null, "".into(), Value::Null],
            vec!["Bob".into(), 33000.into(), 1.into()],
        ]
    }

    #[test]
    fn test_records_coerce_dates_and_skip_computed() {
        let columns = columns();
        let mut sheet = ImportSheet::from_matrix(matrix()).with_auto_mapping(&columns);
        sheet.strip_template_descriptions(&columns);
        assert_eq!(sheet.rows.len(), 2);

        let records = sheet.to_records(&columns);
        assert_eq!(records[0]["name"], Value::text("Ann"));
        assert_eq!(records[0]["born"], Value::text("1990-03-09"));
        assert!(!records[0].contains_key("total"));
        assert_eq!(records[1]["born"], Value::text("1990-05-07"));
    }

    #[test]
    fn test_empty_matrix() {
        let sheet = ImportSheet::from_matrix(Vec::new());
        assert!(sheet.headers.is_empty());
        assert!(sheet.to_records(&columns()).is_empty());
    }
}
