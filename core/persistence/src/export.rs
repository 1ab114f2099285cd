//! FILENAME: core/persistence/src/export.rs
//! PURPOSE: Builds export and import-template sheets from rows and columns.
//! CONTEXT: Export writes the visible data columns in display order with a
//! header row of display names. Templates carry two header rows (field
//! names, then descriptions) so a filled template maps back field for field.

use crate::{SheetCell, SheetData, DEFAULT_SHEET_NAME};
use engine::{ColumnDef, Row, Value};

fn exported_columns(columns: &[ColumnDef]) -> Vec<&ColumnDef> {
    let mut exported: Vec<&ColumnDef> = columns.iter().filter(|c| !c.hidden && !c.is_action()).collect();
    exported.sort_by_key(|c| c.order);
    exported
}

/// Numeric-looking strings become numbers; everything else keeps its type.
/// Codes with a leading zero ("0012") stay text so the zeros survive.
pub fn export_value(value: &Value) -> SheetCell {
    match value {
        Value::Null => SheetCell::Empty,
        Value::Bool(b) => SheetCell::Boolean(*b),
        Value::Number(n) if n.is_finite() => SheetCell::Number(*n),
        Value::Number(_) => SheetCell::Empty,
        Value::Text(s) if has_leading_zero(s.trim()) => SheetCell::Text(s.clone()),
        Value::Text(s) => match s.trim().parse::<f64>() {
            Ok(n) if n.is_finite() && !s.trim().is_empty() => SheetCell::Number(n),
            _ => SheetCell::Text(s.clone()),
        },
    }
}

/// "0", "0.5" and "-0.5" are plain numbers; "007" and "-01" are not.
fn has_leading_zero(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let mut chars = digits.chars();
    matches!((chars.next(), chars.next()), (Some('0'), Some(c)) if c.is_ascii_digit())
}

/// Header row plus one row per input row, visible data columns only.
pub fn export_sheet(rows: &[&Row], columns: &[ColumnDef]) -> SheetData {
    let exported = exported_columns(columns);
    let mut sheet = SheetData::new(DEFAULT_SHEET_NAME);
    sheet.column_widths = exported.iter().map(|c| c.width).collect();
    sheet.rows.push(exported.iter().map(|c| SheetCell::text(&c.header_name)).collect());
    for row in rows {
        sheet
            .rows
            .push(exported.iter().map(|c| export_value(row.get(&c.field))).collect());
    }
    sheet
}

/// Two header rows for every importable column: field names, then
/// descriptions (falling back to the display name).
pub fn template_sheet(columns: &[ColumnDef]) -> SheetData {
    let mut targets: Vec<&ColumnDef> = columns.iter().filter(|c| !c.is_action() && !c.computed).collect();
    targets.sort_by_key(|c| c.order);
    let mut sheet = SheetData::new(DEFAULT_SHEET_NAME);
    sheet.header_rows = 2;
    sheet.column_widths = targets.iter().map(|c| c.width).collect();
    sheet.rows.push(targets.iter().map(|c| SheetCell::text(&c.field)).collect());
    sheet.rows.push(
        targets
            .iter()
            .map(|c| SheetCell::text(c.description.as_deref().unwrap_or(&c.header_name)))
            .collect(),
    );
    sheet
}
