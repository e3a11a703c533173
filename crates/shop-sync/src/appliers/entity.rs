use super::ConfigSyncApplier;
use crate::context::SyncContext;
use crate::operation::SyncOperations;
use crate::remote::{Criteria, str_field};
use crate::{Error, Result};
use serde_json::Value;
use shop_config::{Config, EntitySync as EntityEntry, new_uuid};

/// Create-or-update intents for arbitrary entity types
///
/// An entry whose `exists` filters match a remote record updates it;
/// anything else is created. Nothing is ever deleted.
pub struct EntitySync;

impl ConfigSyncApplier for EntitySync {
    fn domain(&self) -> &'static str {
        "entity"
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

        for entry in &sync.entity {
            match find_existing(ctx, entry)? {
                Some(id) => {
                    let mut payload = entry.payload.clone();
                    payload.remove("id");
                    tracing::debug!(
                        entity = entry.entity.as_str(),
                        id = id.as_str(),
                        "Staged entity update"
                    );
                    operations.operations.update(&entry.entity, id, payload);
                }
                None => {
                    let mut payload = entry.payload.clone();
                    if !payload.contains_key("id") {
                        payload.insert("id".to_string(), Value::String(new_uuid()));
                    }
                    tracing::debug!(entity = entry.entity.as_str(), "Staged entity create");
                    operations.operations.create(&entry.entity, payload);
                }
            }
        }

        Ok(())
    }

    fn pull(&self, _ctx: &SyncContext<'_>, _config: &mut Config) -> Result<()> {
        // Entries are intents without a remote listing to snapshot
        tracing::debug!("Entity entries are left as declared");
        Ok(())
    }
}

/// Id of the first remote record matching the entry's `exists` filters
fn find_existing(ctx: &SyncContext<'_>, entry: &EntityEntry) -> Result<Option<String>> {
    let filters = match &entry.exists {
        Some(filters) if !filters.is_empty() => filters,
        _ => return Ok(None),
    };

    let criteria = Criteria::new().filters(filters.iter().cloned()).limit(1);
    let Some(record) = ctx.search(&entry.entity, &criteria)?.into_iter().next() else {
        return Ok(None);
    };

    str_field(&record, "id")
        .map(|id| Some(id.to_string()))
        .ok_or_else(|| Error::MissingId {
            entity: entry.entity.clone(),
        })
}
