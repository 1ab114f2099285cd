//! FILENAME: app/src/config.rs
//! PURPOSE: Grid instance configuration.
//! CONTEXT: Every field has a default, so a config file only needs to name
//! what it changes. Loaded once when a `PowerTable` is created.

use crate::error::{TableError, TableResult};
use engine::{FilterMode, DEFAULT_COLUMN_WIDTH};
use grouping_engine::TreeConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the body is laid out when no column is grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum DisplayMode {
    #[default]
    Flat,
    /// Parent/child hierarchy from `tree.parent_field`. Takes precedence
    /// over column grouping.
    Tree,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridConfig {
    /// Fixed body row height in pixels.
    pub row_height: f64,
    /// Extra rows rendered above and below the viewport.
    pub overscan: usize,
    pub viewport_height: f64,
    pub filter_mode: FilterMode,
    pub display_mode: DisplayMode,
    pub tree: TreeConfig,
    pub default_column_width: f64,
    /// Entity the grid shows; scopes preset keys.
    pub entity: String,
    /// Distinguishes users sharing one preset store.
    pub user_key: Option<String>,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            row_height: 40.0,
            overscan: 5,
            viewport_height: 600.0,
            filter_mode: FilterMode::Cascade,
            display_mode: DisplayMode::Flat,
            tree: TreeConfig::default(),
            default_column_width: DEFAULT_COLUMN_WIDTH,
            entity: "default".to_string(),
            user_key: None,
        }
    }
}

impl GridConfig {
    pub fn from_json_str(json: &str) -> TableResult<Self> {
        let config: GridConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> TableResult<Self> {
        let text = std::fs::read_to_string(path).map_err(persistence::PersistenceError::from)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> TableResult<()> {
        if !(self.row_height > 0.0) {
            return Err(TableError::Config(format!("rowHeight must be positive, got {}", self.row_height)));
        }
        if !(self.viewport_height >= 0.0) {
            return Err(TableError::Config(format!(
                "viewportHeight must not be negative, got {}",
                self.viewport_height
            )));
        }
        if self.entity.trim().is_empty() {
            return Err(TableError::Config("entity must not be empty".to_string()));
        }
        Ok(())
    }

    /// Preset scope: the entity, narrowed by the user key when present.
    pub fn preset_scope(&self) -> String {
        match &self.user_key {
            Some(user) if !user.is_empty() => format!("{}:{}", self.entity, user),
            _ => self.entity.clone(),
        }
    }
}
