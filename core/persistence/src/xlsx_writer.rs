//! FILENAME: core/persistence/src/xlsx_writer.rs

use crate::{PersistenceError, SheetCell, SheetData};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook};
use std::path::Path;

pub fn save_xlsx(sheet: &SheetData, path: &Path) -> Result<(), PersistenceError> {
    let mut xlsx = build_workbook(sheet)?;
    xlsx.save(path)?;
    Ok(())
}

/// Same as `save_xlsx`, returning the file bytes (for downloads).
pub fn save_xlsx_to_buffer(sheet: &SheetData) -> Result<Vec<u8>, PersistenceError> {
    let mut xlsx = build_workbook(sheet)?;
    Ok(xlsx.save_to_buffer()?)
}

fn build_workbook(sheet: &SheetData) -> Result<XlsxWorkbook, PersistenceError> {
    let mut xlsx = XlsxWorkbook::new();
    let worksheet = xlsx.add_worksheet();
    worksheet.set_name(&sheet.name)?;

    // Set column widths (Excel uses character width, roughly pixels / 7)
    for (col, width) in sheet.column_widths.iter().enumerate() {
        let excel_width = *width / 7.0;
        worksheet.set_column_width(col as u16, excel_width)?;
    }

    let header = Format::new().set_bold();

    for (row_idx, cells) in sheet.rows.iter().enumerate() {
        let row = row_idx as u32;
        let format = (row_idx < sheet.header_rows).then_some(&header);
        for (col_idx, cell) in cells.iter().enumerate() {
            let col = col_idx as u16;
            match (cell, format) {
                (SheetCell::Empty, _) => {}
                (SheetCell::Number(n), Some(fmt)) => {
                    worksheet.write_number_with_format(row, col, *n, fmt)?;
                }
                (SheetCell::Number(n), None) => {
                    worksheet.write_number(row, col, *n)?;
                }
                (SheetCell::Text(s), Some(fmt)) => {
                    worksheet.write_string_with_format(row, col, s, fmt)?;
                }
                (SheetCell::Text(s), None) => {
                    worksheet.write_string(row, col, s)?;
                }
                (SheetCell::Boolean(b), Some(fmt)) => {
                    worksheet.write_boolean_with_format(row, col, *b, fmt)?;
                }
                (SheetCell::Boolean(b), None) => {
                    worksheet.write_boolean(row, col, *b)?;
                }
            }
        }
    }

    Ok(xlsx)
}
