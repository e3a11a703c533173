//! Shared test utilities for the shop-config-sync workspace.
//!
//! Used from `tests/` directories only; never published.
//!
//! # Modules
//!
//! - [`project`]: [`TestProject`] for on-disk configuration documents
//! - [`store`]: seeding helpers for [`shop_sync::MemoryStore`]

pub mod project;
pub mod store;

pub use project::TestProject;
