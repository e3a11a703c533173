//! Staged changes of one push
//!
//! [`SyncOperations`] is the accumulator the appliers write into. Nothing
//! in here touches the remote store; [`crate::SyncEngine::apply`] turns the
//! staged changes into write calls.

use crate::remote::Record;
use serde::Serialize;
use serde_json::Value;
use shop_config::{Scope, ThemeConfigValue};
use std::collections::BTreeMap;

/// Pending record changes of one entity type
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntityBatch {
    pub creates: Vec<Record>,
    pub updates: Vec<EntityUpdate>,
    pub deletes: Vec<String>,
}

impl EntityBatch {
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.creates.len() + self.updates.len() + self.deletes.len()
    }
}

/// A patch for an existing remote record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityUpdate {
    pub id: String,
    pub payload: Record,
}

/// Record changes keyed by entity type
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Operations {
    batches: BTreeMap<String, EntityBatch>,
}

impl Operations {
    pub fn create(&mut self, entity: &str, record: Record) {
        self.batch_mut(entity).creates.push(record);
    }

    pub fn update(&mut self, entity: &str, id: impl Into<String>, payload: Record) {
        self.batch_mut(entity).updates.push(EntityUpdate {
            id: id.into(),
            payload,
        });
    }

    pub fn delete(&mut self, entity: &str, id: impl Into<String>) {
        self.batch_mut(entity).deletes.push(id.into());
    }

    pub fn get(&self, entity: &str) -> Option<&EntityBatch> {
        self.batches.get(entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EntityBatch)> {
        self.batches.iter().map(|(entity, batch)| (entity.as_str(), batch))
    }

    pub fn is_empty(&self) -> bool {
        self.batches.values().all(EntityBatch::is_empty)
    }

    /// Total number of record changes across all entity types
    pub fn len(&self) -> usize {
        self.batches.values().map(EntityBatch::len).sum()
    }

    fn batch_mut(&mut self, entity: &str) -> &mut EntityBatch {
        self.batches.entry(entity.to_string()).or_default()
    }
}

/// One system setting to write; `id == None` creates it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingChange {
    pub id: Option<String>,
    pub value: Value,
}

impl SettingChange {
    pub fn create(value: Value) -> Self {
        Self { id: None, value }
    }

    pub fn update(id: impl Into<String>, value: Value) -> Self {
        Self {
            id: Some(id.into()),
            value,
        }
    }

    pub fn is_create(&self) -> bool {
        self.id.is_none()
    }
}

/// System setting changes grouped by scope
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemSettings {
    scopes: BTreeMap<Scope, BTreeMap<String, SettingChange>>,
}

impl SystemSettings {
    pub fn stage(&mut self, scope: &Scope, key: impl Into<String>, change: SettingChange) {
        self.scopes
            .entry(scope.clone())
            .or_default()
            .insert(key.into(), change);
    }

    pub fn get(&self, scope: &Scope) -> Option<&BTreeMap<String, SettingChange>> {
        self.scopes.get(scope)
    }

    /// Scopes with their changes, `Global` first
    pub fn iter(&self) -> impl Iterator<Item = (&Scope, &BTreeMap<String, SettingChange>)> {
        self.scopes.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.values().all(BTreeMap::is_empty)
    }

    pub fn len(&self) -> usize {
        self.scopes.values().map(BTreeMap::len).sum()
    }

    /// Render the staged values as a JSON object keyed by scope
    ///
    /// Global settings appear under the key `"null"`. Scopes without changes
    /// are left out; with nothing staged the result is `{}`.
    ///
    /// ```
    /// use serde_json::json;
    /// use shop_config::Scope;
    /// use shop_sync::{SettingChange, SystemSettings};
    ///
    /// let mut settings = SystemSettings::default();
    /// assert_eq!(settings.to_json(), "{}");
    ///
    /// settings.stage(&Scope::Global, "core.mail.from", SettingChange::create(json!("a@x.com")));
    /// assert_eq!(settings.to_json(), r#"{"null": {"core.mail.from":"a@x.com"}}"#);
    /// ```
    pub fn to_json(&self) -> String {
        let mut text = String::new();

        for (scope, changes) in &self.scopes {
            if changes.is_empty() {
                continue;
            }

            let values: serde_json::Map<String, Value> = changes
                .iter()
                .map(|(key, change)| (key.clone(), change.value.clone()))
                .collect();
            let content = Value::Object(values).to_string();

            let key = match scope {
                Scope::Global => "\"null\"".to_string(),
                Scope::SalesChannel(id) => Value::String(id.clone()).to_string(),
            };

            text.push_str(&format!("{key}: {content},"));
        }

        if text.is_empty() {
            return "{}".to_string();
        }
        text.pop();
        format!("{{{text}}}")
    }
}

/// Theme settings to write for one remote theme
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThemeSyncOperation {
    pub id: String,
    pub name: String,
    pub settings: BTreeMap<String, ThemeConfigValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ThemeSettings {
    themes: Vec<ThemeSyncOperation>,
}

impl ThemeSettings {
    pub fn push(&mut self, operation: ThemeSyncOperation) {
        self.themes.push(operation);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ThemeSyncOperation> {
        self.themes.iter()
    }

    /// Staged themes that carry at least one setting
    pub fn pending(&self) -> impl Iterator<Item = &ThemeSyncOperation> {
        self.themes.iter().filter(|t| !t.settings.is_empty())
    }

    /// Whether any staged theme has a setting to write
    pub fn has_changes(&self) -> bool {
        self.pending().next().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.themes.len()
    }
}

/// Everything one push staged, across all domains
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncOperations {
    pub operations: Operations,
    pub system_settings: SystemSettings,
    pub theme_settings: ThemeSettings,
}

impl SyncOperations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any domain staged a change
    pub fn has_changes(&self) -> bool {
        !self.operations.is_empty()
            || !self.system_settings.is_empty()
            || self.theme_settings.has_changes()
    }

    pub fn change_count(&self) -> usize {
        self.operations.len() + self.system_settings.len() + self.theme_settings.pending().count()
    }

    /// Human-readable list of the writes an apply would issue
    pub fn describe(&self) -> Vec<String> {
        let mut lines = Vec::new();

        for (scope, changes) in self.system_settings.iter() {
            for (key, change) in changes {
                let verb = if change.is_create() { "Create" } else { "Update" };
                lines.push(format!(
                    "{verb} system setting {key} ({scope}) = {}",
                    change.value
                ));
            }
        }

        for theme in self.theme_settings.pending() {
            let keys: Vec<&str> = theme.settings.keys().map(String::as_str).collect();
            lines.push(format!(
                "Update theme {} settings: {}",
                theme.name,
                keys.join(", ")
            ));
        }

        for (entity, batch) in self.operations.iter() {
            for record in &batch.creates {
                match record.get("id").and_then(Value::as_str) {
                    Some(id) => lines.push(format!("Create {entity} {id}")),
                    None => lines.push(format!("Create {entity}")),
                }
            }
            for update in &batch.updates {
                let mut fields: Vec<&str> = update.payload.keys().map(String::as_str).collect();
                fields.retain(|f| *f != "id");
                lines.push(format!(
                    "Update {entity} {}: {}",
                    update.id,
                    fields.join(", ")
                ));
            }
            for id in &batch.deletes {
                lines.push(format!("Delete {entity} {id}"));
            }
        }

        lines
    }
}
