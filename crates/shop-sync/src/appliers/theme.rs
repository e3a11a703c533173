use super::ConfigSyncApplier;
use crate::context::SyncContext;
use crate::operation::{SyncOperations, ThemeSyncOperation};
use crate::remote::{Criteria, Record, entities, str_field};
use crate::{Error, Result};
use serde_json::Value;
use shop_config::{Config, Filter, ThemeConfigValue, ThemeEntry};
use std::collections::BTreeMap;

/// Theme settings, addressed by theme name
pub struct ThemeSync;

impl ConfigSyncApplier for ThemeSync {
    fn domain(&self) -> &'static str {
        "theme"
    }

    fn push(
        &self,
        ctx: &SyncContext<'_>,
        config: &Config,
        operations: &mut SyncOperations,
    ) -> Result<()> {
        let Some(sync) = &config.sync else {
            return Ok(());
        };

        for theme in sync.theme.iter().filter(|t| !t.settings.is_empty()) {
            let criteria = Criteria::new()
                .filter(Filter::equals("name", theme.name.as_str()))
                .include(&["id", "name", "configValues"]);

            let remote = ctx
                .search(entities::THEME, &criteria)?
                .into_iter()
                .next()
                .ok_or_else(|| Error::ThemeNotFound {
                    name: theme.name.clone(),
                })?;

            let id = str_field(&remote, "id")
                .ok_or_else(|| Error::MissingId {
                    entity: entities::THEME.to_string(),
                })?
                .to_string();
            let current = config_values(&remote);

            let changed: BTreeMap<String, ThemeConfigValue> = theme
                .settings
                .iter()
                .filter(|(name, desired)| current.get(*name) != Some(*desired))
                .map(|(name, desired)| (name.clone(), desired.clone()))
                .collect();

            if changed.is_empty() {
                continue;
            }

            tracing::debug!(
                theme = theme.name.as_str(),
                count = changed.len(),
                "Staged theme settings"
            );
            operations.theme_settings.push(ThemeSyncOperation {
                id,
                name: theme.name.clone(),
                settings: changed,
            });
        }

        Ok(())
    }

    fn pull(&self, ctx: &SyncContext<'_>, config: &mut Config) -> Result<()> {
        let criteria = Criteria::new().include(&["id", "name", "configValues"]);

        let themes = ctx
            .search(entities::THEME, &criteria)?
            .iter()
            .filter_map(|record| {
                let name = str_field(record, "name")?;
                Some(ThemeEntry {
                    name: name.to_string(),
                    settings: config_values(record),
                })
            })
            .collect();

        config.sync_mut().theme = themes;
        Ok(())
    }
}

/// Read a theme record's `configValues` map
///
/// Entries are `{ "value": ... }` objects; anything else is taken as the
/// bare value.
fn config_values(record: &Record) -> BTreeMap<String, ThemeConfigValue> {
    let Some(Value::Object(values)) = record.get("configValues") else {
        return BTreeMap::new();
    };

    values
        .iter()
        .map(|(name, entry)| {
            let value = match entry {
                Value::Object(map) => map.get("value").cloned().unwrap_or(Value::Null),
                other => other.clone(),
            };
            (name.clone(), ThemeConfigValue { value })
        })
        .collect()
}
