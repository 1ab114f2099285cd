//! FILENAME: core/persistence/src/xlsx_reader.rs

use crate::{ImportSheet, PersistenceError};
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use engine::Value;
use std::io::Cursor;
use std::path::Path;

/// Reads the first worksheet of an uploaded file. The first row holds headers.
pub fn load_xlsx(path: &Path) -> Result<ImportSheet, PersistenceError> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    read_first_sheet(&mut workbook)
}

pub fn load_xlsx_from_bytes(bytes: &[u8]) -> Result<ImportSheet, PersistenceError> {
    let mut workbook = Xlsx::new(Cursor::new(bytes.to_vec()))?;
    read_first_sheet(&mut workbook)
}

fn read_first_sheet<RS>(workbook: &mut Xlsx<RS>) -> Result<ImportSheet, PersistenceError>
where
    RS: std::io::Read + std::io::Seek,
{
    let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
        return Err(PersistenceError::InvalidFormat(
            "Workbook contains no sheets".to_string(),
        ));
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| PersistenceError::InvalidFormat(e.to_string()))?;
    Ok(ImportSheet::from_matrix(range_to_matrix(&range)))
}

fn range_to_matrix(range: &Range<Data>) -> Vec<Vec<Value>> {
    range
        .rows()
        .map(|row| row.iter().map(cell_value).collect())
        .collect()
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => Value::Text(s.clone()),
        Data::Float(f) => Value::Number(*f),
        Data::Int(i) => Value::Number(*i as f64),
        Data::Bool(b) => Value::Bool(*b),
        Data::Error(e) => Value::Text(format!("{:?}", e)),
        // Date cells arrive as serials; date columns coerce them later.
        Data::DateTime(dt) => Value::Number(dt.as_f64()),
        Data::DateTimeIso(s) => Value::Text(s.clone()),
        Data::DurationIso(s) => Value::Text(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{save_xlsx, save_xlsx_to_buffer, SheetCell, SheetData};

    fn sample() -> SheetData {
        let mut sheet = SheetData::new("People");
        sheet.rows = vec![
            vec![SheetCell::text("Name"), SheetCell::text("Age"), SheetCell::text("Active")],
            vec![SheetCell::text("Ann"), SheetCell::Number(34.0), SheetCell::Boolean(true)],
            vec![SheetCell::text("Bob"), SheetCell::Empty, SheetCell::Boolean(false)],
        ];
        sheet
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.xlsx");
        save_xlsx(&sample(), &path).unwrap();

        let sheet = load_xlsx(&path).unwrap();
        assert_eq!(sheet.headers, vec!["Name", "Age", "Active"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0][0], Value::text("Ann"));
        assert_eq!(sheet.rows[0][1], Value::Number(34.0));
        assert_eq!(sheet.rows[1][2], Value::Bool(false));
    }

    #[test]
    fn test_round_trip_through_buffer() {
        let bytes = save_xlsx_to_buffer(&sample()).unwrap();
        let sheet = load_xlsx_from_bytes(&bytes).unwrap();
        assert_eq!(sheet.headers.len(), 3);
        assert_eq!(sheet.rows[1][0], Value::text("Bob"));
    }

    #[test]
    fn test_garbage_bytes_are_rejected() {
        assert!(matches!(
            load_xlsx_from_bytes(b"not a workbook"),
            Err(PersistenceError::XlsxRead(_))
        ));
    }
}
