//! FILENAME: core/persistence/src/lib.rs
//! Table Persistence Module
//!
//! Handles spreadsheet export and import in XLSX format, the header
//! auto-mapping and date coercion applied to uploads, and the key-value
//! storage port used for column presets.

mod dates;
mod error;
mod export;
mod import;
mod mapping;
mod store;
mod xlsx_reader;
mod xlsx_writer;

pub use dates::{coerce_import_date, serial_to_date, SERIAL_RANGE};
pub use error::PersistenceError;
pub use export::{export_sheet, export_value, template_sheet};
pub use import::{ImportSheet, Record};
pub use mapping::{auto_map, fold_diacritics, mappable_columns, normalize_header, HeaderMapping};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use xlsx_reader::{load_xlsx, load_xlsx_from_bytes};
pub use xlsx_writer::{save_xlsx, save_xlsx_to_buffer};

use serde::{Deserialize, Serialize};

/// Default worksheet name for exports and templates.
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

// ============================================================================
// SHEET
// ============================================================================

/// A single worksheet as a dense matrix, header rows included.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetData {
    pub name: String,
    pub rows: Vec<Vec<SheetCell>>,
    /// Pixel widths per column; converted to character widths on save.
    pub column_widths: Vec<f64>,
    /// Leading rows written bold.
    pub header_rows: usize,
}

impl SheetData {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rows: Vec::new(),
            column_widths: Vec::new(),
            header_rows: 1,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

// ============================================================================
// SHEET CELL
// ============================================================================

/// A cell that can be written to or read from a worksheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SheetCell {
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
}

impl SheetCell {
    pub fn text(s: impl Into<String>) -> Self {
        SheetCell::Text(s.into())
    }
}
