//! Sales-channel scope of a system setting

use serde::{Deserialize, Serialize};
use std::fmt;

/// The scope a system setting applies to.
///
/// `Global` is serialized as `null` (the remote platform stores global
/// settings with a null sales-channel id) and is never coalesced with a
/// channel id. Ordering puts `Global` before every channel.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Scope {
    #[default]
    Global,
    SalesChannel(String),
}

impl Scope {
    pub fn sales_channel(id: impl Into<String>) -> Self {
        Self::SalesChannel(id.into())
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }

    /// The sales-channel id, `None` for the global scope
    pub fn channel_id(&self) -> Option<&str> {
        match self {
            Self::Global => None,
            Self::SalesChannel(id) => Some(id),
        }
    }

    /// JSON form used in remote filters and records
    pub fn to_value(&self) -> serde_json::Value {
        match self {
            Self::Global => serde_json::Value::Null,
            Self::SalesChannel(id) => serde_json::Value::String(id.clone()),
        }
    }
}

impl From<Option<String>> for Scope {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(id) => Self::SalesChannel(id),
            None => Self::Global,
        }
    }
}

impl From<Scope> for Option<String> {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::Global => None,
            Scope::SalesChannel(id) => Some(id),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::SalesChannel(id) => write!(f, "{}", id),
        }
    }
}
