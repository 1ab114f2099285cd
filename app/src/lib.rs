//! FILENAME: app/src/lib.rs
// PURPOSE: Main library entry point for the PowerTable grid.
// CONTEXT: Wires the pure engines (engine, grouping-engine) and persistence
// into a stateful grid instance. UI layers talk to `PowerTable` only.

pub mod comments;
pub mod config;
pub mod crud;
pub mod display;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod presets;
pub mod schema_store;
pub mod selection;
pub mod table;
pub mod window;

pub use comments::{Author, Comment, CommentBody, CommentIndicator, CommentMention, CommentReply, CommentStore};
pub use config::{DisplayMode, GridConfig};
pub use crud::{CallbackResult, Capabilities, CrudCallbacks, FieldUpdate};
pub use error::{TableError, TableResult};
pub use logging::{close_log_file, get_log_path, init_log_file, next_seq, write_log};
pub use pipeline::{Body, BodyLine, View};
pub use presets::{Preset, PresetManager};
pub use schema_store::{SchemaChange, SchemaObserver, SchemaStore};
pub use selection::{SelectionChange, SelectionObserver, SelectionReason, SelectionSnapshot, SelectionState};
pub use table::{PowerTable, WindowView};
pub use window::{compute_visible_range, BodyKind, VisibleRange, Virtualizer};

// The engines' vocabulary, so hosts need a single dependency.
pub use engine::{
    Aggregation, AggregateValue, ColumnDef, ColumnOverride, ColumnSchema, ColumnType, Filter,
    FilterCondition, FilterMode, Row, RowId, SchemaAction, SelectOption, SortDirection, Value,
};
pub use grouping_engine::{FlatEntry, GroupPath, TreeConfig, TreeEntry};
pub use persistence::{ImportSheet, JsonFileStore, KeyValueStore, MemoryStore, Record, SheetCell, SheetData};
