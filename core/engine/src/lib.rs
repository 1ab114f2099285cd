//! FILENAME: core/engine/src/lib.rs
//! PURPOSE: Main library entry point for the table engine.
//! CONTEXT: Re-exports public types and modules for use by other crates.
//! Everything here is pure: functions take rows and a column schema and
//! return new values, never mutating their inputs.

pub mod aggregate;
pub mod column;
pub mod dates;
pub mod filter;
pub mod format;
pub mod merge;
pub mod schema;
pub mod search;
pub mod sort;
pub mod template;
pub mod value;

// Re-export commonly used types at the crate root
pub use aggregate::{aggregate, aggregate_column, is_empty_value, AggregateValue, Reducer, ReducerRegistry, NOT_APPLICABLE};
pub use column::{
    Aggregation, Align, ColumnDef, ColumnKind, ColumnType, SelectOption, SortDirection, SortKey,
    DEFAULT_COLUMN_WIDTH,
};
pub use dates::{parse_date, parse_datetime, ZERO_DATE};
pub use filter::{
    apply_all, distinct_values, matches, operators_for, ApplyOptions, BoolOp, DateOp, Filter,
    FilterCondition, FilterContext, FilterMode, FkOp, FkSelection, NumberOp, Range, TextOp,
};
pub use format::{format_value, FormatError, FORMATTER_KEYS};
pub use merge::{detect_columns, merge_columns, ColumnOverride};
pub use schema::{ColumnPatch, ColumnSchema, SchemaAction};
pub use search::{normalize_query, row_slug, SearchQuery};
pub use sort::sort_rows;
pub use template::{apply_template, matches_template, Comparison, FilterTemplate, TemplateFilter};
pub use value::{parse_number, Row, RowId, Value, ID_FIELD};
