//! Domain appliers
//!
//! Each applier owns one section of the sync configuration. `push` diffs the
//! declared state against the remote shop and stages the delta, `pull`
//! overwrites the section with what the shop currently holds.

mod entity;
mod mail_template;
mod system_config;
mod theme;

pub use entity::EntitySync;
pub use mail_template::MailTemplateSync;
pub use system_config::SystemConfigSync;
pub use theme::ThemeSync;

use crate::Result;
use crate::context::SyncContext;
use crate::operation::SyncOperations;
use shop_config::Config;

/// Reconciles one configuration domain against the remote shop
pub trait ConfigSyncApplier {
    /// Short name used in logs and error messages
    fn domain(&self) -> &'static str;

    /// Stage the changes needed to bring the remote shop to `config`
    ///
    /// Only reads from the store. Staged changes accumulate in `operations`.
    fn push(
        &self,
        ctx: &SyncContext<'_>,
        config: &Config,
        operations: &mut SyncOperations,
    ) -> Result<()>;

    /// Replace this domain's section of `config` with remote state
    fn pull(&self, ctx: &SyncContext<'_>, config: &mut Config) -> Result<()>;
}

/// All appliers in the order they run
pub fn sync_appliers() -> Vec<Box<dyn ConfigSyncApplier>> {
    vec![
        Box::new(SystemConfigSync),
        Box::new(ThemeSync),
        Box::new(MailTemplateSync),
        Box::new(EntitySync),
    ]
}
