//! FILENAME: app/src/presets.rs
//! PURPOSE: Named column presets on top of an injected key-value store.
//! CONTEXT: A preset is the user-overridable subset of every column
//! (`ColumnOverride::snapshot`), stored as JSON under
//! `preset:<scope>:<name>`. The scope is the entity, optionally narrowed by
//! a user key. One preset per scope is active; its name lives under
//! `preset-active:<scope>`.

use crate::error::{TableError, TableResult};
use crate::logging::{log_info, log_warn};
use chrono::Utc;
use engine::{ColumnOverride, ColumnSchema};
use persistence::KeyValueStore;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub name: String,
    pub columns: Vec<ColumnOverride>,
    /// RFC 3339 timestamp of the last save.
    pub saved_at: String,
}

impl Preset {
    pub fn capture(name: &str, schema: &ColumnSchema) -> Self {
        Preset {
            name: name.to_string(),
            columns: schema
                .columns
                .iter()
                .filter(|c| !c.is_action())
                .map(ColumnOverride::snapshot)
                .collect(),
            saved_at: Utc::now().to_rfc3339(),
        }
    }
}

pub struct PresetManager {
    store: Box<dyn KeyValueStore>,
    scope: String,
}

impl PresetManager {
    pub fn new(store: Box<dyn KeyValueStore>, scope: &str) -> Self {
        PresetManager {
            store,
            scope: scope.to_string(),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    fn prefix(&self) -> String {
        format!("preset:{}:", self.scope)
    }

    fn key(&self, name: &str) -> String {
        format!("{}{}", self.prefix(), name)
    }

    fn active_key(&self) -> String {
        format!("preset-active:{}", self.scope)
    }

    fn validate_name(name: &str) -> TableResult<&str> {
        let trimmed = name.trim();
        // ':' separates scope segments in keys.
        if trimmed.is_empty() || trimmed.contains(':') {
            return Err(TableError::InvalidPresetName(name.to_string()));
        }
        Ok(trimmed)
    }

    fn exists(&self, name: &str) -> TableResult<bool> {
        Ok(self.store.get(&self.key(name))?.is_some())
    }

    fn write(&mut self, preset: &Preset) -> TableResult<()> {
        let json = serde_json::to_string(preset)?;
        let key = self.key(&preset.name);
        self.store.set(&key, &json)?;
        Ok(())
    }

    fn set_active(&mut self, name: Option<&str>) -> TableResult<()> {
        let key = self.active_key();
        match name {
            Some(name) => self.store.set(&key, name)?,
            None => self.store.remove(&key)?,
        }
        Ok(())
    }

    /// Preset names in this scope, ascending.
    pub fn list(&self) -> TableResult<Vec<String>> {
        let prefix = self.prefix();
        Ok(self
            .store
            .list_keys(&prefix)?
            .into_iter()
            .map(|key| key[prefix.len()..].to_string())
            .filter(|name| !name.contains(':'))
            .collect())
    }

    pub fn active(&self) -> TableResult<Option<String>> {
        Ok(self.store.get(&self.active_key())?)
    }

    pub fn get(&self, name: &str) -> TableResult<Preset> {
        let json = self
            .store
            .get(&self.key(name))?
            .ok_or_else(|| TableError::PresetNotFound(name.to_string()))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Overwrites the active preset with `schema`.
    pub fn save(&mut self, schema: &ColumnSchema) -> TableResult<Preset> {
        let name = self.active()?.ok_or(TableError::NoActivePreset)?;
        let preset = Preset::capture(&name, schema);
        self.write(&preset)?;
        log_info!("PRESET", "saved '{}' in {}", name, self.scope);
        Ok(preset)
    }

    /// Stores `schema` under a new name and makes it active.
    pub fn save_as(&mut self, name: &str, schema: &ColumnSchema) -> TableResult<Preset> {
        let name = Self::validate_name(name)?;
        if self.exists(name)? {
            return Err(TableError::PresetExists(name.to_string()));
        }
        let preset = Preset::capture(name, schema);
        self.write(&preset)?;
        self.set_active(Some(name))?;
        log_info!("PRESET", "created '{}' in {}", name, self.scope);
        Ok(preset)
    }

    /// Returns the stored overrides of `name` and makes it active.
    pub fn load(&mut self, name: &str) -> TableResult<Preset> {
        let preset = self.get(name)?;
        self.set_active(Some(name))?;
        log_info!("PRESET", "loaded '{}' ({} columns)", name, preset.columns.len());
        Ok(preset)
    }

    /// Loads the active preset, if any. A dangling pointer is cleared.
    pub fn load_active(&mut self) -> TableResult<Option<Preset>> {
        let Some(name) = self.active()? else {
            return Ok(None);
        };
        match self.get(&name) {
            Ok(preset) => Ok(Some(preset)),
            Err(TableError::PresetNotFound(_)) => {
                log_warn!("PRESET", "active preset '{}' is missing, clearing pointer", name);
                self.set_active(None)?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub fn rename(&mut self, from: &str, to: &str) -> TableResult<()> {
        let to = Self::validate_name(to)?;
        let mut preset = self.get(from)?;
        if from == to {
            return Ok(());
        }
        if self.exists(to)? {
            return Err(TableError::PresetExists(to.to_string()));
        }
        preset.name = to.to_string();
        self.write(&preset)?;
        let old_key = self.key(from);
        self.store.remove(&old_key)?;
        if self.active()?.as_deref() == Some(from) {
            self.set_active(Some(to))?;
        }
        log_info!("PRESET", "renamed '{}' -> '{}'", from, to);
        Ok(())
    }

    pub fn delete(&mut self, name: &str) -> TableResult<()> {
        if !self.exists(name)? {
            return Err(TableError::PresetNotFound(name.to_string()));
        }
        let key = self.key(name);
        self.store.remove(&key)?;
        if self.active()?.as_deref() == Some(name) {
            self.set_active(None)?;
        }
        log_info!("PRESET", "deleted '{}'", name);
        Ok(())
    }

    /// Forgets which preset is active without deleting any.
    pub fn clear_active(&mut self) -> TableResult<()> {
        self.set_active(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::{ColumnDef, ColumnType, SchemaAction};
    use persistence::MemoryStore;

    fn schema() -> ColumnSchema {
        ColumnSchema::new(vec![
            ColumnDef::new("name", ColumnType::String),
            ColumnDef::new("age", ColumnType::Number),
        ])
    }

    fn manager() -> PresetManager {
        PresetManager::new(Box::new(MemoryStore::new()), "people")
    }

    #[test]
    fn test_save_requires_an_active_preset() {
        let mut presets = manager();
        assert!(matches!(presets.save(&schema()), Err(TableError::NoActivePreset)));
        presets.save_as("Mine", &schema()).unwrap();
        assert_eq!(presets.active().unwrap().as_deref(), Some("Mine"));
        assert!(presets.save(&schema()).is_ok());
    }

    #[test]
    fn test_save_as_rejects_duplicates_and_blank_names() {
        let mut presets = manager();
        presets.save_as("A", &schema()).unwrap();
        assert!(matches!(presets.save_as("A", &schema()), Err(TableError::PresetExists(_))));
        assert!(matches!(presets.save_as("  ", &schema()), Err(TableError::InvalidPresetName(_))));
    }

    #[test]
    fn test_snapshot_carries_overridable_state() {
        let mut presets = manager();
        let hidden = schema().apply(&SchemaAction::ToggleColumnHidden("age".into()));
        presets.save_as("Compact", &hidden).unwrap();
        let preset = presets.load("Compact").unwrap();
        let age = preset.columns.iter().find(|c| c.field == "age").unwrap();
        assert_eq!(age.hidden, Some(true));
    }

    #[test]
    fn test_rename_moves_active_pointer() {
        let mut presets = manager();
        presets.save_as("Old", &schema()).unwrap();
        presets.rename("Old", "New").unwrap();
        assert_eq!(presets.list().unwrap(), vec!["New"]);
        assert_eq!(presets.active().unwrap().as_deref(), Some("New"));
        assert!(matches!(presets.get("Old"), Err(TableError::PresetNotFound(_))));
    }

    #[test]
    fn test_delete_clears_active() {
        let mut presets = manager();
        presets.save_as("A", &schema()).unwrap();
        presets.save_as("B", &schema()).unwrap();
        presets.delete("B").unwrap();
        assert_eq!(presets.active().unwrap(), None);
        assert_eq!(presets.list().unwrap(), vec!["A"]);
        assert!(matches!(presets.delete("B"), Err(TableError::PresetNotFound(_))));
    }

    #[test]
    fn test_user_scope_does_not_leak_into_entity_scope() {
        let mut user = PresetManager::new(Box::new(MemoryStore::new()), "people:u1");
        user.save_as("A", &schema()).unwrap();
        assert!(matches!(user.save_as("a:b", &schema()), Err(TableError::InvalidPresetName(_))));
        // Same underlying keys, read through the wider scope.
        let entity = PresetManager { scope: "people".to_string(), ..user };
        assert!(entity.list().unwrap().is_empty());
        assert_eq!(entity.active().unwrap(), None);
    }
}
