//! FILENAME: app/src/table.rs
//! PURPOSE: The grid instance that ties rows, schema and UI state together.
//! CONTEXT: `PowerTable` owns the row set (replaced wholesale by the host),
//! the schema store, selection, collapse states, the virtualizer, CRUD
//! callbacks, comments and presets. Reads (`view`, `window`, exports) never
//! need `&mut self`; collapse reconciliation and windowing keep their state in
//! `RefCell`s so a caller can hold a view while formatting its cells.

use crate::comments::CommentStore;
use crate::config::GridConfig;
use crate::crud::{Capabilities, CrudCallbacks, FieldUpdate};
use crate::display;
use crate::error::{TableError, TableResult};
use crate::logging::{log_debug, log_enter, log_error, log_exit, log_info, log_warn};
use crate::pipeline::{self, BodyLine, PipelineInput, View};
use crate::presets::{Preset, PresetManager};
use crate::schema_store::SchemaStore;
use crate::selection::{SelectionObserver, SelectionState};
use crate::window::{VisibleRange, Virtualizer};
use chrono::NaiveDate;
use engine::{
    detect_columns, distinct_values, merge_columns, AggregateValue, ApplyOptions, ColumnDef,
    ColumnOverride, ColumnSchema, FilterContext, ReducerRegistry, Row, RowId, SchemaAction, Value,
};
use grouping_engine::{build_forest, build_group_tree, GroupCollapseState, GroupEntry, GroupPath, TreeCollapseState};
use persistence::{
    export_sheet, load_xlsx, load_xlsx_from_bytes, save_xlsx, save_xlsx_to_buffer, template_sheet,
    ImportSheet, KeyValueStore, Record, SheetData,
};
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::Path;

/// The current view cut down to the virtualization window.
pub struct WindowView<'a> {
    pub view: View<'a>,
    pub range: VisibleRange,
}

impl<'a> WindowView<'a> {
    pub fn lines(&self) -> Vec<BodyLine<'_, 'a>> {
        self.view.body.lines(self.range.start, self.range.end)
    }
}

pub struct PowerTable {
    config: GridConfig,
    rows: Vec<Row>,
    schema: SchemaStore,
    dev_columns: Vec<ColumnOverride>,
    action_columns: Vec<ColumnDef>,
    selection: SelectionState,
    group_collapse: RefCell<GroupCollapseState>,
    tree_collapse: TreeCollapseState,
    virtualizer: RefCell<Virtualizer>,
    callbacks: CrudCallbacks,
    comments: CommentStore,
    reducers: ReducerRegistry,
    presets: Option<PresetManager>,
    /// Fixed "today" for date filters; the local date when unset.
    today: Option<NaiveDate>,
}

impl PowerTable {
    pub fn new(config: GridConfig) -> TableResult<Self> {
        config.validate()?;
        let virtualizer = Virtualizer::new(config.row_height, config.viewport_height, config.overscan);
        Ok(PowerTable {
            config,
            rows: Vec::new(),
            schema: SchemaStore::default(),
            dev_columns: Vec::new(),
            action_columns: Vec::new(),
            selection: SelectionState::new(),
            group_collapse: RefCell::new(GroupCollapseState::new()),
            tree_collapse: TreeCollapseState::new(),
            virtualizer: RefCell::new(virtualizer),
            callbacks: CrudCallbacks::new(),
            comments: CommentStore::new(),
            reducers: ReducerRegistry::new(),
            presets: None,
            today: None,
        })
    }

    // ------------------------------------------------------------------------
    // Setup
    // ------------------------------------------------------------------------

    /// Developer-declared column configuration; may introduce columns.
    pub fn with_dev_columns(mut self, dev: Vec<ColumnOverride>) -> Self {
        self.dev_columns = dev;
        self
    }

    /// Select / multiselect / delete controls appended after the data columns.
    pub fn with_action_columns(mut self, actions: Vec<ColumnDef>) -> Self {
        self.action_columns = actions;
        self
    }

    pub fn with_callbacks(mut self, callbacks: CrudCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn with_reducers(mut self, reducers: ReducerRegistry) -> Self {
        self.reducers = reducers;
        self
    }

    pub fn with_preset_store(mut self, store: Box<dyn KeyValueStore>) -> Self {
        self.presets = Some(PresetManager::new(store, &self.config.preset_scope()));
        self
    }

    pub fn with_selection_observer(mut self, observer: SelectionObserver) -> Self {
        self.selection.set_observer(Some(observer));
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Replaces the row set. The first non-empty load also derives the schema.
    pub fn set_rows(&mut self, rows: Vec<Row>) -> TableResult<()> {
        let first_load = self.schema.columns().is_empty();
        log_debug!("TABLE", "set_rows {} rows (first load: {})", rows.len(), first_load);
        self.rows = rows;
        self.virtualizer.borrow_mut().reset();
        if first_load && (!self.rows.is_empty() || !self.dev_columns.is_empty()) {
            self.init_schema()?;
        }
        Ok(())
    }

    /// Rebuilds the schema from detected columns, developer overrides, the
    /// active preset and the action columns.
    pub fn init_schema(&mut self) -> TableResult<()> {
        let width = self.config.default_column_width;
        let auto: Vec<ColumnDef> = self
            .rows
            .first()
            .map(detect_columns)
            .unwrap_or_default()
            .into_iter()
            .map(|c| ColumnDef { width, ..c })
            .collect();
        let stored = match self.presets.as_mut() {
            Some(presets) => presets.load_active()?.map(|p| p.columns).unwrap_or_default(),
            None => Vec::new(),
        };
        let columns = merge_columns(&auto, &self.dev_columns, &stored, &self.action_columns);
        log_info!(
            "TABLE",
            "schema: {} columns ({} detected, {} dev, {} stored)",
            columns.len(),
            auto.len(),
            self.dev_columns.len(),
            stored.len()
        );
        self.schema.replace_columns(columns)
    }

    // ------------------------------------------------------------------------
    // Schema
    // ------------------------------------------------------------------------

    pub fn schema(&self) -> &ColumnSchema {
        self.schema.schema()
    }

    pub fn schema_store_mut(&mut self) -> &mut SchemaStore {
        &mut self.schema
    }

    pub fn dispatch(&mut self, action: SchemaAction) -> TableResult<()> {
        self.schema.dispatch(action)?;
        self.sync_show_selected()
    }

    /// Adds the column type's default filter and returns its id.
    pub fn add_filter(&mut self, field: &str) -> TableResult<String> {
        self.schema.add_filter(field)
    }

    /// "Show selected" with nothing selected would hide every row.
    fn sync_show_selected(&mut self) -> TableResult<()> {
        if self.schema.schema().show_selected && self.selection.is_empty() {
            log_debug!("TABLE", "selection empty, turning off showSelected");
            self.schema.dispatch(SchemaAction::SetShowSelected(false))?;
        }
        Ok(())
    }

    fn filter_context(&self) -> FilterContext {
        self.today.map(FilterContext::at).unwrap_or_default()
    }

    /// Cascading option list of `field`, with the `omit` filter ids ignored.
    pub fn filter_options(&self, field: &str, omit: &[String]) -> Vec<(String, String)> {
        let gate = self.selection.gate_ids();
        let opts = self.apply_options(&gate, omit);
        distinct_values(&self.rows, self.schema.schema(), field, &opts)
    }

    fn apply_options<'o>(&self, gate: &'o HashSet<RowId>, omit: &'o [String]) -> ApplyOptions<'o> {
        ApplyOptions {
            omit,
            selected_ids: Some(gate),
            mode: self.config.filter_mode,
            context: self.filter_context(),
        }
    }

    // ------------------------------------------------------------------------
    // View & window
    // ------------------------------------------------------------------------

    /// Filter -> sort -> group | tree | identity over the current rows.
    pub fn view(&self) -> View<'_> {
        let gate = self.selection.gate_ids();
        let opts = self.apply_options(&gate, &[]);
        let input = PipelineInput {
            schema: self.schema.schema(),
            opts: &opts,
            display_mode: self.config.display_mode,
            tree: &self.config.tree,
            reducers: &self.reducers,
        };
        let mut group_collapse = self.group_collapse.borrow_mut();
        pipeline::run(&self.rows, &input, &mut group_collapse, &self.tree_collapse)
    }

    /// The view plus the window for `scroll_top`.
    pub fn window(&self, scroll_top: f64) -> WindowView<'_> {
        let view = self.view();
        let range = self
            .virtualizer
            .borrow_mut()
            .update(scroll_top, view.body.len(), view.body.kind());
        WindowView { view, range }
    }

    pub fn set_viewport_height(&mut self, height: f64) {
        self.config.viewport_height = height;
        self.virtualizer.borrow_mut().set_viewport_height(height);
    }

    fn with_group_tree<R>(&self, f: impl FnOnce(&[GroupEntry<'_>], &mut GroupCollapseState) -> R) -> R {
        let gate = self.selection.gate_ids();
        let opts = self.apply_options(&gate, &[]);
        let rows = pipeline::filtered_sorted(&self.rows, self.schema.schema(), &opts);
        let tree = build_group_tree(&rows, self.schema.columns(), &self.reducers);
        let mut collapse = self.group_collapse.borrow_mut();
        collapse.reconcile(&tree);
        f(&tree, &mut collapse)
    }

    pub fn toggle_group(&mut self, path: &GroupPath) -> bool {
        self.group_collapse.borrow_mut().toggle(path)
    }

    /// Collapses every group at `level` if any is expanded, else expands them.
    pub fn toggle_group_level(&mut self, level: usize) -> Option<bool> {
        self.with_group_tree(|tree, collapse| collapse.toggle_level(tree, level))
    }

    pub fn expand_all_groups(&mut self) {
        self.with_group_tree(|tree, collapse| collapse.expand_all(tree));
    }

    pub fn collapse_all_groups(&mut self) {
        self.with_group_tree(|tree, collapse| collapse.collapse_all(tree));
    }

    pub fn toggle_tree_node(&mut self, id: &RowId) -> bool {
        self.tree_collapse.toggle(id)
    }

    pub fn expand_all_tree(&mut self) {
        self.tree_collapse.expand_all();
    }

    pub fn collapse_all_tree(&mut self) {
        let refs: Vec<&Row> = self.rows.iter().collect();
        let forest = build_forest(&refs, &self.config.tree);
        self.tree_collapse.collapse_all(&forest);
    }

    // ------------------------------------------------------------------------
    // Display
    // ------------------------------------------------------------------------

    fn column(&self, field: &str) -> TableResult<&ColumnDef> {
        self.schema
            .schema()
            .column(field)
            .ok_or_else(|| TableError::UnknownColumn(field.to_string()))
    }

    pub fn display_cell(&self, row: &Row, field: &str) -> TableResult<String> {
        Ok(display::display_cell(row, self.column(field)?))
    }

    pub fn display_aggregate(&self, field: &str, value: &AggregateValue) -> TableResult<String> {
        Ok(display::display_aggregate(value, self.column(field)?))
    }

    // ------------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------------

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn toggle_select(&mut self, id: RowId) -> TableResult<()> {
        self.selection.toggle_select(id);
        self.sync_show_selected()
    }

    pub fn toggle_multi_select(&mut self, ids: &[RowId]) -> TableResult<()> {
        self.selection.toggle_multi_select(ids);
        self.sync_show_selected()
    }

    pub fn add_many(&mut self, ids: &[RowId]) -> TableResult<()> {
        self.selection.add_many(ids);
        self.sync_show_selected()
    }

    pub fn remove_many(&mut self, ids: &[RowId]) -> TableResult<()> {
        self.selection.remove_many(ids);
        self.sync_show_selected()
    }

    pub fn clear_select(&mut self) -> TableResult<()> {
        self.selection.clear_select();
        self.sync_show_selected()
    }

    pub fn clear_multi_select(&mut self) -> TableResult<()> {
        self.selection.clear_multi_select();
        self.sync_show_selected()
    }

    pub fn clear_selection(&mut self) -> TableResult<()> {
        self.selection.clear_all();
        self.sync_show_selected()
    }

    // ------------------------------------------------------------------------
    // CRUD
    // ------------------------------------------------------------------------

    pub fn capabilities(&self) -> Capabilities {
        self.callbacks.capabilities()
    }

    pub fn create(&mut self, data: &Record) -> TableResult<()> {
        self.callbacks.create(data)
    }

    pub fn update_field(&mut self, id: RowId, field: &str, value: Value) -> TableResult<()> {
        self.column(field)?;
        let update = FieldUpdate {
            id,
            field: field.to_string(),
            value,
        };
        self.callbacks.update_field(&update)
    }

    pub fn update(&mut self, id: &RowId, changes: &Record) -> TableResult<()> {
        self.callbacks.update(id, changes)
    }

    pub fn update_many(&mut self, ids: &[RowId], changes: &Record) -> TableResult<()> {
        self.callbacks.update_many(ids, changes)
    }

    /// Deletes one row through the host, then forgets its selection and comments.
    pub fn delete_one(&mut self, id: &RowId) -> TableResult<()> {
        let callbacks = &mut self.callbacks;
        self.selection.delete_one(id, |id| callbacks.remove(id))?;
        self.comments.clear_row(id);
        log_info!("CRUD", "deleted row {}", id);
        self.sync_show_selected()
    }

    /// Deletes the multi-selection in one host call. Returns how many ids
    /// were sent.
    pub fn delete_selected(&mut self) -> TableResult<usize> {
        let ids: Vec<RowId> = self.selection.multi_selected().iter().cloned().collect();
        if ids.is_empty() {
            return Ok(0);
        }
        log_enter!("CRUD", "delete_selected", "ids={}", ids.len());
        if let Err(e) = self.callbacks.remove_many(&ids) {
            log_error!("CRUD", "bulk delete of {} rows failed: {}", ids.len(), e);
            return Err(e);
        }
        self.selection.prune(&ids);
        for id in &ids {
            self.comments.clear_row(id);
        }
        log_exit!("CRUD", "delete_selected", "deleted={}", ids.len());
        self.sync_show_selected()?;
        Ok(ids.len())
    }

    // ------------------------------------------------------------------------
    // Export / import
    // ------------------------------------------------------------------------

    /// Filtered, sorted rows of the visible data columns.
    pub fn export_sheet(&self) -> SheetData {
        let gate = self.selection.gate_ids();
        let opts = self.apply_options(&gate, &[]);
        let rows = pipeline::filtered_sorted(&self.rows, self.schema.schema(), &opts);
        export_sheet(&rows, self.schema.columns())
    }

    pub fn export_xlsx(&self, path: &Path) -> TableResult<()> {
        let sheet = self.export_sheet();
        save_xlsx(&sheet, path)?;
        log_info!("EXPORT", "{} rows -> {:?}", sheet.row_count().saturating_sub(1), path);
        Ok(())
    }

    pub fn export_xlsx_bytes(&self) -> TableResult<Vec<u8>> {
        Ok(save_xlsx_to_buffer(&self.export_sheet())?)
    }

    pub fn import_template(&self) -> SheetData {
        template_sheet(self.schema.columns())
    }

    pub fn import_template_bytes(&self) -> TableResult<Vec<u8>> {
        Ok(save_xlsx_to_buffer(&self.import_template())?)
    }

    fn prepare_upload(&self, sheet: ImportSheet) -> ImportSheet {
        let columns = self.schema.columns();
        let mut sheet = sheet.with_auto_mapping(columns);
        sheet.strip_template_descriptions(columns);
        log_info!(
            "IMPORT",
            "{} rows, {}/{} headers mapped",
            sheet.rows.len(),
            sheet.mapping.mapped_count(),
            sheet.headers.len()
        );
        sheet
    }

    /// Reads an uploaded workbook and proposes a header mapping.
    pub fn read_upload(&self, path: &Path) -> TableResult<ImportSheet> {
        Ok(self.prepare_upload(load_xlsx(path)?))
    }

    pub fn read_upload_bytes(&self, bytes: &[u8]) -> TableResult<ImportSheet> {
        Ok(self.prepare_upload(load_xlsx_from_bytes(bytes)?))
    }

    /// Sends the mapped records to the upload callback. Returns the count.
    pub fn commit_upload(&mut self, sheet: &ImportSheet) -> TableResult<usize> {
        if !self.callbacks.capabilities().can_import {
            return Err(TableError::Unsupported("upload"));
        }
        log_enter!("IMPORT", "commit_upload", "rows={}", sheet.rows.len());
        let records = sheet.to_records(self.schema.columns());
        if sheet.mapping.mapped_count() == 0 {
            log_warn!("IMPORT", "no header is mapped; uploading {} empty records", records.len());
        }
        if let Err(e) = self.callbacks.upload(&records) {
            log_error!("IMPORT", "upload of {} records failed: {}", records.len(), e);
            return Err(e);
        }
        log_exit!("IMPORT", "commit_upload", "sent={}", records.len());
        Ok(records.len())
    }

    // ------------------------------------------------------------------------
    // Presets
    // ------------------------------------------------------------------------

    fn presets(&self) -> TableResult<&PresetManager> {
        self.presets.as_ref().ok_or(TableError::Unsupported("presets"))
    }

    pub fn list_presets(&self) -> TableResult<Vec<String>> {
        self.presets()?.list()
    }

    pub fn active_preset(&self) -> TableResult<Option<String>> {
        self.presets()?.active()
    }

    pub fn save_preset(&mut self) -> TableResult<Preset> {
        let presets = self.presets.as_mut().ok_or(TableError::Unsupported("presets"))?;
        presets.save(self.schema.schema())
    }

    pub fn save_preset_as(&mut self, name: &str) -> TableResult<Preset> {
        let presets = self.presets.as_mut().ok_or(TableError::Unsupported("presets"))?;
        presets.save_as(name, self.schema.schema())
    }

    /// Applies a stored preset on top of the current columns.
    pub fn load_preset(&mut self, name: &str) -> TableResult<()> {
        let presets = self.presets.as_mut().ok_or(TableError::Unsupported("presets"))?;
        let preset = presets.load(name)?;
        let columns = merge_columns(self.schema.columns(), &[], &preset.columns, &[]);
        self.schema.replace_columns(columns)
    }

    pub fn rename_preset(&mut self, from: &str, to: &str) -> TableResult<()> {
        let presets = self.presets.as_mut().ok_or(TableError::Unsupported("presets"))?;
        presets.rename(from, to)
    }

    pub fn delete_preset(&mut self, name: &str) -> TableResult<()> {
        let presets = self.presets.as_mut().ok_or(TableError::Unsupported("presets"))?;
        presets.delete(name)
    }

    /// Drops the active preset and rebuilds the schema without it.
    pub fn reset_columns(&mut self) -> TableResult<()> {
        if let Some(presets) = self.presets.as_mut() {
            presets.clear_active()?;
        }
        self.init_schema()
    }

    // ------------------------------------------------------------------------
    // Comments
    // ------------------------------------------------------------------------

    pub fn comments(&self) -> &CommentStore {
        &self.comments
    }

    pub fn comments_mut(&mut self) -> &mut CommentStore {
        &mut self.comments
    }
}
