//! FILENAME: app/src/error.rs

use persistence::PersistenceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TableError {
    /// The callback behind this affordance was not supplied.
    #[error("Action not supported: {0}")]
    Unsupported(&'static str),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Preset not found: {0}")]
    PresetNotFound(String),

    #[error("Preset already exists: {0}")]
    PresetExists(String),

    #[error("Invalid preset name: {0:?}")]
    InvalidPresetName(String),

    #[error("No active preset")]
    NoActivePreset,

    #[error("Comment not found: {0}")]
    CommentNotFound(String),

    #[error("Reply not found: {0}")]
    ReplyNotFound(String),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// The host's own message, as it reported it.
    #[error("{0}")]
    Callback(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for TableError {
    fn from(e: serde_json::Error) -> Self {
        TableError::Persistence(PersistenceError::Json(e))
    }
}

pub type TableResult<T> = Result<T, TableError>;
