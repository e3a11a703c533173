//! Reconciliation engine for Shop Config Sync
//!
//! Compares a composed [`shop_config::Config`] with a remote shop reached
//! through a [`RemoteConfigStore`]:
//!
//! - [`SyncEngine::push`] stages the changes the shop needs as
//!   [`SyncOperations`] without writing anything
//! - [`SyncEngine::apply`] issues the staged writes
//! - [`SyncEngine::pull`] overwrites the configuration with remote state
//!
//! # Example
//!
//! ```
//! use shop_config::Config;
//! use shop_sync::{ApplyOptions, MemoryStore, SyncEngine};
//!
//! let config = Config::parse(r#"
//! sync:
//!   config:
//!     - settings:
//!         core.mail.from: a@x.com
//! "#).unwrap();
//!
//! let store = MemoryStore::new();
//! let engine = SyncEngine::new(&store);
//!
//! let operations = engine.push(&config).unwrap();
//! assert!(operations.has_changes());
//!
//! let report = engine.apply(&operations, ApplyOptions::default());
//! assert!(report.success);
//! assert!(!engine.push(&config).unwrap().has_changes());
//! ```

pub mod appliers;
mod context;
mod engine;
mod error;
pub mod logging;
mod operation;
pub mod remote;

pub use appliers::{
    ConfigSyncApplier, EntitySync, MailTemplateSync, SystemConfigSync, ThemeSync, sync_appliers,
};
pub use context::{CancellationToken, SyncContext};
pub use engine::{ApplyOptions, ApplyReport, SyncEngine};
pub use error::{Error, Result};
pub use operation::{
    EntityBatch, EntityUpdate, Operations, SettingChange, SyncOperations, SystemSettings,
    ThemeSettings, ThemeSyncOperation,
};
pub use remote::{Criteria, MemoryStore, Record, RemoteConfigStore, RemoteError, StoreCall};
