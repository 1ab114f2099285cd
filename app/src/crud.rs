//! FILENAME: app/src/crud.rs
//! PURPOSE: Optional create/update/delete/upload callbacks supplied by the host.
//! CONTEXT: The grid never persists anything itself. Each affordance (add,
//! inline edit, bulk edit, delete, bulk delete, import) is enabled only when
//! the matching callback exists. Failures come back as the host's message,
//! unchanged.

use crate::error::{TableError, TableResult};
use engine::{RowId, Value};
use persistence::Record;
use serde::{Deserialize, Serialize};

pub type CallbackResult = Result<(), String>;

/// A single-cell edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldUpdate {
    pub id: RowId,
    pub field: String,
    pub value: Value,
}

type CreateFn = Box<dyn FnMut(&Record) -> CallbackResult>;
type UpdateFieldFn = Box<dyn FnMut(&FieldUpdate) -> CallbackResult>;
type UpdateFn = Box<dyn FnMut(&RowId, &Record) -> CallbackResult>;
type UpdateManyFn = Box<dyn FnMut(&[RowId], &Record) -> CallbackResult>;
type RemoveFn = Box<dyn FnMut(&RowId) -> CallbackResult>;
type RemoveManyFn = Box<dyn FnMut(&[RowId]) -> CallbackResult>;
type UploadFn = Box<dyn FnMut(&[Record]) -> CallbackResult>;

#[derive(Default)]
pub struct CrudCallbacks {
    pub create: Option<CreateFn>,
    pub update_field: Option<UpdateFieldFn>,
    pub update: Option<UpdateFn>,
    pub update_many: Option<UpdateManyFn>,
    pub remove: Option<RemoveFn>,
    pub remove_many: Option<RemoveManyFn>,
    pub upload: Option<UploadFn>,
}

/// Which UI affordances the supplied callbacks enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub can_create: bool,
    pub can_edit_inline: bool,
    pub can_edit: bool,
    pub can_bulk_edit: bool,
    pub can_delete: bool,
    pub can_bulk_delete: bool,
    pub can_import: bool,
}

fn failed(message: String) -> TableError {
    TableError::Callback(message)
}

impl CrudCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_create(mut self, f: impl FnMut(&Record) -> CallbackResult + 'static) -> Self {
        self.create = Some(Box::new(f));
        self
    }

    pub fn on_update_field(mut self, f: impl FnMut(&FieldUpdate) -> CallbackResult + 'static) -> Self {
        self.update_field = Some(Box::new(f));
        self
    }

    pub fn on_update(mut self, f: impl FnMut(&RowId, &Record) -> CallbackResult + 'static) -> Self {
        self.update = Some(Box::new(f));
        self
    }

    pub fn on_update_many(mut self, f: impl FnMut(&[RowId], &Record) -> CallbackResult + 'static) -> Self {
        self.update_many = Some(Box::new(f));
        self
    }

    pub fn on_remove(mut self, f: impl FnMut(&RowId) -> CallbackResult + 'static) -> Self {
        self.remove = Some(Box::new(f));
        self
    }

    pub fn on_remove_many(mut self, f: impl FnMut(&[RowId]) -> CallbackResult + 'static) -> Self {
        self.remove_many = Some(Box::new(f));
        self
    }

    pub fn on_upload(mut self, f: impl FnMut(&[Record]) -> CallbackResult + 'static) -> Self {
        self.upload = Some(Box::new(f));
        self
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            can_create: self.create.is_some(),
            can_edit_inline: self.update_field.is_some(),
            can_edit: self.update.is_some(),
            can_bulk_edit: self.update_many.is_some(),
            can_delete: self.remove.is_some(),
            can_bulk_delete: self.remove_many.is_some(),
            can_import: self.upload.is_some(),
        }
    }

    pub fn create(&mut self, data: &Record) -> TableResult<()> {
        let f = self.create.as_mut().ok_or(TableError::Unsupported("create"))?;
        f(data).map_err(failed)
    }

    pub fn update_field(&mut self, update: &FieldUpdate) -> TableResult<()> {
        let f = self.update_field.as_mut().ok_or(TableError::Unsupported("updateField"))?;
        f(update).map_err(failed)
    }

    pub fn update(&mut self, id: &RowId, changes: &Record) -> TableResult<()> {
        let f = self.update.as_mut().ok_or(TableError::Unsupported("update"))?;
        f(id, changes).map_err(failed)
    }

    pub fn update_many(&mut self, ids: &[RowId], changes: &Record) -> TableResult<()> {
        let f = self.update_many.as_mut().ok_or(TableError::Unsupported("updateMany"))?;
        f(ids, changes).map_err(failed)
    }

    pub fn remove(&mut self, id: &RowId) -> TableResult<()> {
        let f = self.remove.as_mut().ok_or(TableError::Unsupported("remove"))?;
        f(id).map_err(failed)
    }

    pub fn remove_many(&mut self, ids: &[RowId]) -> TableResult<()> {
        let f = self.remove_many.as_mut().ok_or(TableError::Unsupported("removeMany"))?;
        f(ids).map_err(failed)
    }

    pub fn upload(&mut self, records: &[Record]) -> TableResult<()> {
        let f = self.upload.as_mut().ok_or(TableError::Unsupported("upload"))?;
        f(records).map_err(failed)
    }
}
