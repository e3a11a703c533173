//! Declarative sync configuration for Shop Config Sync
//!
//! This crate owns everything about the configuration *document*:
//!
//! - **Model**: the YAML schema with its four sync sections (system config,
//!   themes, mail templates, entities) plus project settings
//! - **Composition**: recursive `include` resolution with override merging
//! - **Persistence**: atomic YAML writes for pulled configurations
//!
//! The sync engine in `shop-sync` consumes the composed [`Config`].
//!
//! # Example
//!
//! ```ignore
//! use shop_config::read_config;
//! use std::path::Path;
//!
//! let config = read_config(Path::new(".shop-sync.yml"), false)?;
//! if let Some(sync) = &config.sync {
//!     println!("{} scopes declared", sync.config.len());
//! }
//! ```

mod composer;
pub mod criteria;
mod error;
pub mod io;
pub mod merge;
mod model;
mod scope;

pub use composer::{ConfigComposer, read_config};
pub use criteria::{Filter, FilterOperator};
pub use error::{Error, Result};
pub use io::write_config;
pub use merge::{Merge, deep_merge_value};
pub use model::{
    AdminApiSection, BuildSection, Config, DumpSection, EntitySync, MailTemplate,
    MailTemplateTranslation, SyncSection, SystemConfigEntry, ThemeConfigValue, ThemeEntry,
};
pub use scope::Scope;

/// Generate an entity id in the remote platform's format
///
/// A random UUID v4 rendered as 32 lowercase hex characters without dashes.
pub fn new_uuid() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
