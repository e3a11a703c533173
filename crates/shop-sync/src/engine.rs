//! SyncEngine implementation
//!
//! The SyncEngine runs the domain appliers against one configuration and one
//! remote store, and turns staged operations into remote writes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shop_config::{Config, Filter, ThemeConfigValue, new_uuid, write_config};
use std::collections::BTreeMap;
use std::path::Path;

use crate::appliers::{ConfigSyncApplier, sync_appliers};
use crate::context::{CancellationToken, SyncContext};
use crate::operation::SyncOperations;
use crate::remote::{Criteria, Record, RemoteConfigStore, entities};
use crate::{Error, Result};

/// Report from an apply run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyReport {
    /// Whether every write succeeded
    pub success: bool,
    /// Writes issued (or, in a dry run, that would be issued)
    pub actions: Vec<String>,
    /// Writes that failed, in the order they were attempted
    pub errors: Vec<String>,
}

impl ApplyReport {
    pub fn success() -> Self {
        Self {
            success: true,
            actions: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn record_error(&mut self, action: &str, error: &Error) {
        tracing::warn!(%error, action, "Remote write failed");
        self.success = false;
        self.errors.push(format!("{action}: {error}"));
    }
}

/// Options for [`SyncEngine::apply`]
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// If true, list the writes without issuing them.
    /// Actions will be prefixed with "[dry-run]"
    pub dry_run: bool,
}

/// Engine reconciling a configuration with a remote shop
///
/// - **push**: diff the configuration against the shop, staging changes
/// - **pull**: overwrite the configuration with the shop's state
/// - **apply**: issue the writes for staged changes
pub struct SyncEngine<'a> {
    store: &'a dyn RemoteConfigStore,
    appliers: Vec<Box<dyn ConfigSyncApplier>>,
    cancel: CancellationToken,
}

impl<'a> SyncEngine<'a> {
    /// Create an engine running every applier, in order, against `store`
    pub fn new(store: &'a dyn RemoteConfigStore) -> Self {
        Self {
            store,
            appliers: sync_appliers(),
            cancel: CancellationToken::new(),
        }
    }

    /// Use `token` to cancel runs of this engine from elsewhere
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn context(&self) -> SyncContext<'a> {
        SyncContext::with_cancellation(self.store, self.cancel.clone())
    }

    /// Compute the changes needed to bring the shop to `config`
    ///
    /// Only read calls reach the store.
    ///
    /// # Errors
    ///
    /// The first applier failure aborts the push; the error names its
    /// domain. No partially staged operations are returned.
    pub fn push(&self, config: &Config) -> Result<SyncOperations> {
        let ctx = self.context();
        let mut operations = SyncOperations::new();

        for applier in &self.appliers {
            tracing::debug!(domain = applier.domain(), "Pushing");
            applier
                .push(&ctx, config, &mut operations)
                .map_err(|e| Error::domain(applier.domain(), e))?;
        }

        tracing::info!(
            changes = operations.change_count(),
            "Computed remote changes"
        );
        Ok(operations)
    }

    /// Replace the sync sections of `config` with remote state
    ///
    /// # Errors
    ///
    /// Stops at the first failing applier and leaves `config` untouched.
    pub fn pull(&self, config: &mut Config) -> Result<()> {
        let ctx = self.context();
        let mut pulled = config.clone();

        for applier in &self.appliers {
            tracing::debug!(domain = applier.domain(), "Pulling");
            applier
                .pull(&ctx, &mut pulled)
                .map_err(|e| Error::domain(applier.domain(), e))?;
        }

        *config = pulled;
        tracing::info!("Pulled remote configuration");
        Ok(())
    }

    /// Pull into `config`, then write it to `path` as a flattened document
    pub fn pull_to_file(&self, config: &mut Config, path: &Path) -> Result<()> {
        self.pull(config)?;
        write_config(path, config)?;
        tracing::info!(?path, "Wrote pulled configuration");
        Ok(())
    }

    /// Issue the writes for `operations`
    ///
    /// System settings go first, then themes, then entity batches (creates,
    /// updates, deletes per entity type). Writes are not transactional: a
    /// failed write is recorded and the rest still run. Cancellation stops
    /// the run and is recorded as an error.
    pub fn apply(&self, operations: &SyncOperations, options: ApplyOptions) -> ApplyReport {
        let mut report = ApplyReport::success();

        if options.dry_run {
            report.actions = operations
                .describe()
                .into_iter()
                .map(|line| format!("[dry-run] {line}"))
                .collect();
            return report;
        }

        let ctx = self.context();
        for (action, write) in planned_writes(operations) {
            let result = match &write {
                Write::Create { entity, record } => ctx.create(entity, record),
                Write::Update { entity, id, payload } => ctx.update(entity, id, payload),
                Write::Theme { id, settings } => update_theme(&ctx, id, settings),
                Write::Delete { entity, id } => ctx.delete(entity, id),
            };

            match result {
                Ok(()) => report.actions.push(action),
                Err(e) if e.is_cancelled() => {
                    report.record_error(&action, &e);
                    break;
                }
                Err(e) => report.record_error(&action, &e),
            }
        }

        tracing::info!(
            applied = report.actions.len(),
            failed = report.errors.len(),
            "Applied remote changes"
        );
        report
    }
}

/// One remote write derived from staged operations
enum Write<'o> {
    Create { entity: &'o str, record: Record },
    Update { entity: &'o str, id: &'o str, payload: Record },
    Delete { entity: &'o str, id: &'o str },
    Theme {
        id: &'o str,
        settings: &'o BTreeMap<String, ThemeConfigValue>,
    },
}

/// Write changed theme settings over the theme's current `configValues`
///
/// The store replaces `configValues` as a whole, so keys that did not
/// change are read back and sent along.
fn update_theme(
    ctx: &SyncContext<'_>,
    id: &str,
    settings: &BTreeMap<String, ThemeConfigValue>,
) -> Result<()> {
    let criteria = Criteria::new()
        .filter(Filter::equals("id", id))
        .include(&["id", "configValues"])
        .limit(1);

    let mut values = match ctx.search(entities::THEME, &criteria)?.into_iter().next() {
        Some(mut record) => match record.remove("configValues") {
            Some(Value::Object(values)) => values,
            _ => Map::new(),
        },
        None => Map::new(),
    };

    for (name, setting) in settings {
        match values.get_mut(name) {
            Some(Value::Object(entry)) => {
                entry.insert("value".into(), setting.value.clone());
            }
            _ => {
                let mut entry = Map::new();
                entry.insert("value".into(), setting.value.clone());
                values.insert(name.clone(), Value::Object(entry));
            }
        }
    }

    let mut payload = Map::new();
    payload.insert("configValues".into(), Value::Object(values));
    ctx.update(entities::THEME, id, &payload)
}

/// Writes for `operations` in apply order, each with its report line
fn planned_writes(operations: &SyncOperations) -> Vec<(String, Write<'_>)> {
    let mut writes = Vec::new();

    for (scope, changes) in operations.system_settings.iter() {
        for (key, change) in changes {
            match &change.id {
                None => {
                    let mut record = Map::new();
                    record.insert("id".into(), Value::String(new_uuid()));
                    record.insert("configurationKey".into(), Value::String(key.clone()));
                    record.insert("configurationValue".into(), change.value.clone());
                    record.insert("salesChannelId".into(), scope.to_value());
                    writes.push((
                        format!("Created system setting {key} ({scope})"),
                        Write::Create {
                            entity: entities::SYSTEM_CONFIG,
                            record,
                        },
                    ));
                }
                Some(id) => {
                    let mut payload = Map::new();
                    payload.insert("configurationValue".into(), change.value.clone());
                    writes.push((
                        format!("Updated system setting {key} ({scope})"),
                        Write::Update {
                            entity: entities::SYSTEM_CONFIG,
                            id,
                            payload,
                        },
                    ));
                }
            }
        }
    }

    for theme in operations.theme_settings.pending() {
        writes.push((
            format!("Updated theme {}", theme.name),
            Write::Theme {
                id: &theme.id,
                settings: &theme.settings,
            },
        ));
    }

    for (entity, batch) in operations.operations.iter() {
        for record in &batch.creates {
            writes.push((
                format!("Created {entity}"),
                Write::Create {
                    entity,
                    record: record.clone(),
                },
            ));
        }
        for update in &batch.updates {
            writes.push((
                format!("Updated {entity} {}", update.id),
                Write::Update {
                    entity,
                    id: &update.id,
                    payload: update.payload.clone(),
                },
            ));
        }
        for id in &batch.deletes {
            writes.push((format!("Deleted {entity} {id}"), Write::Delete { entity, id }));
        }
    }

    writes
}
