//! Remote store contract
//!
//! The engine never talks HTTP itself. It reads through a
//! [`RemoteConfigStore`] and hands the caller staged operations; the apply
//! step is the only place write calls are issued.

mod memory;

pub use memory::{MemoryStore, StoreCall};

use serde_json::{Map, Value};
use shop_config::Filter;

/// A remote entity record as a JSON object
pub type Record = Map<String, Value>;

/// Entity and field names of the remote platform
pub mod entities {
    pub const SYSTEM_CONFIG: &str = "system_config";
    pub const THEME: &str = "theme";
    pub const MAIL_TEMPLATE_TRANSLATION: &str = "mail_template_translation";
}

/// Errors reported by a remote store
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RemoteError {
    #[error("Request for {entity} failed: {message}")]
    Request { entity: String, message: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: String },

    #[error("{entity} {id} already exists")]
    Conflict { entity: String, id: String },
}

impl RemoteError {
    pub fn request(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Request {
            entity: entity.into(),
            message: message.into(),
        }
    }
}

/// Search criteria: filters are AND-ed, `includes` limits returned fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    pub filters: Vec<Filter>,
    pub includes: Vec<String>,
    pub limit: Option<usize>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn include(mut self, fields: &[&str]) -> Self {
        self.includes.extend(fields.iter().map(|f| f.to_string()));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Capability to read and write entities of a remote shop
///
/// Implementations perform blocking calls. `update` replaces each top-level
/// field present in the payload and leaves the other fields alone; nested
/// objects are not merged.
pub trait RemoteConfigStore {
    /// Return every record of `entity` matching `criteria`
    fn search(&self, entity: &str, criteria: &Criteria) -> Result<Vec<Record>, RemoteError>;

    /// Create a record; the payload carries the new id
    fn create(&self, entity: &str, payload: &Record) -> Result<(), RemoteError>;

    /// Overwrite the payload's fields on the record `id`
    fn update(&self, entity: &str, id: &str, payload: &Record) -> Result<(), RemoteError>;

    fn delete(&self, entity: &str, id: &str) -> Result<(), RemoteError>;
}

/// Read a string field of a record
pub(crate) fn str_field<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}
