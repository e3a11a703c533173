use super::ConfigSyncApplier;
use crate::context::SyncContext;
use crate::operation::{SettingChange, SyncOperations};
use crate::remote::{Criteria, Record, entities, str_field};
use crate::{Error, Result};
use serde_json::Value;
use shop_config::{Config, Filter, Scope, SystemConfigEntry};
use std::collections::BTreeMap;

/// System settings, one read per declared scope
pub struct SystemConfigSync;

/// Remote value of a setting and the id of the record holding it
struct RemoteSetting {
    id: String,
    value: Value,
}

impl SystemConfigSync {
    fn fetch_scope(
        &self,
        ctx: &SyncContext<'_>,
        scope: &Scope,
    ) -> Result<BTreeMap<String, RemoteSetting>> {
        let criteria = Criteria::new()
            .filter(Filter::equals("salesChannelId", scope.to_value()))
            .include(&["id", "configurationKey", "configurationValue"]);

        let mut settings = BTreeMap::new();
        for record in ctx.search(entities::SYSTEM_CONFIG, &criteria)? {
            let Some(key) = str_field(&record, "configurationKey") else {
                continue;
            };
            let id = record_id(&record)?;
            settings.insert(
                key.to_string(),
                RemoteSetting {
                    id,
                    value: record.get("configurationValue").cloned().unwrap_or(Value::Null),
                },
            );
        }
        Ok(settings)
    }
}

impl ConfigSyncApplier for SystemConfigSync {
    fn domain(&self) -> &'static str {
        "system_config"
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

        // Composition keeps scopes unique, but group anyway so each scope is
        // read exactly once
        let mut desired: BTreeMap<&Scope, Vec<&SystemConfigEntry>> = BTreeMap::new();
        for entry in &sync.config {
            desired.entry(&entry.sales_channel).or_default().push(entry);
        }

        for (scope, entries) in desired {
            let remote = self.fetch_scope(ctx, scope)?;

            for (key, value) in entries.iter().copied().flat_map(|e| &e.settings) {
                let change = match remote.get(key) {
                    None => SettingChange::create(value.clone()),
                    Some(current) if current.value != *value => {
                        SettingChange::update(current.id.clone(), value.clone())
                    }
                    Some(_) => continue,
                };
                tracing::debug!(
                    %scope,
                    key = key.as_str(),
                    create = change.is_create(),
                    "Staged system setting"
                );
                operations.system_settings.stage(scope, key.clone(), change);
            }
        }

        Ok(())
    }

    fn pull(&self, ctx: &SyncContext<'_>, config: &mut Config) -> Result<()> {
        let criteria = Criteria::new().include(&[
            "id",
            "configurationKey",
            "configurationValue",
            "salesChannelId",
        ]);

        let mut scopes: BTreeMap<Scope, BTreeMap<String, Value>> = BTreeMap::new();
        for record in ctx.search(entities::SYSTEM_CONFIG, &criteria)? {
            let Some(key) = str_field(&record, "configurationKey") else {
                continue;
            };
            let scope = match str_field(&record, "salesChannelId") {
                Some(id) if !id.is_empty() => Scope::sales_channel(id),
                _ => Scope::Global,
            };
            scopes.entry(scope).or_default().insert(
                key.to_string(),
                record.get("configurationValue").cloned().unwrap_or(Value::Null),
            );
        }

        config.sync_mut().config = scopes
            .into_iter()
            .map(|(sales_channel, settings)| SystemConfigEntry {
                sales_channel,
                settings,
            })
            .collect();

        Ok(())
    }
}

fn record_id(record: &Record) -> Result<String> {
    str_field(record, "id")
        .map(str::to_string)
        .ok_or_else(|| Error::MissingId {
            entity: entities::SYSTEM_CONFIG.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryStore;
    use serde_json::json;

    fn seed(store: &MemoryStore, id: &str, key: &str, value: Value, channel: Value) {
        let record = json!({
            "id": id,
            "configurationKey": key,
            "configurationValue": value,
            "salesChannelId": channel,
        });
        store.insert(entities::SYSTEM_CONFIG, record.as_object().cloned().unwrap());
    }

    #[test]
    fn global_and_channel_scopes_stay_separate() {
        let store = MemoryStore::new();
        seed(&store, "g1", "core.cart.maxQuantity", json!(10), Value::Null);
        seed(&store, "c1", "core.cart.maxQuantity", json!(5), json!("sc-1"));

        let config = Config::parse(
            r#"
sync:
  config:
    - settings:
        core.cart.maxQuantity: 10
    - sales_channel: sc-1
      settings:
        core.cart.maxQuantity: 7
"#,
        )
        .unwrap();

        let mut ops = SyncOperations::new();
        SystemConfigSync
            .push(&SyncContext::new(&store), &config, &mut ops)
            .unwrap();

        assert!(ops.system_settings.get(&Scope::Global).is_none());
        let channel = ops.system_settings.get(&Scope::sales_channel("sc-1")).unwrap();
        assert_eq!(
            channel["core.cart.maxQuantity"],
            SettingChange::update("c1", json!(7))
        );
    }

    #[test]
    fn record_without_id_is_an_error() {
        let record = json!({"configurationKey": "a"}).as_object().cloned().unwrap();
        assert!(matches!(record_id(&record), Err(Error::MissingId { .. })));
    }

    #[test]
    fn pull_groups_by_scope_global_first() {
        let store = MemoryStore::new();
        seed(&store, "1", "b.key", json!("chan"), json!("sc-1"));
        seed(&store, "2", "a.key", json!(true), Value::Null);

        let mut config = Config::default();
        SystemConfigSync
            .pull(&SyncContext::new(&store), &mut config)
            .unwrap();

        let entries = &config.sync.unwrap().config;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].sales_channel, Scope::Global);
        assert_eq!(entries[0].settings["a.key"], json!(true));
        assert_eq!(entries[1].sales_channel, Scope::sales_channel("sc-1"));
    }
}
