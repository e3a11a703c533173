//! Declarative document model
//!
//! A [`Config`] represents one parsed YAML document. The composer merges a
//! primary document with everything it includes into the effective
//! configuration the sync engine works against.

use crate::criteria::Filter;
use crate::scope::Scope;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// A project configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Other documents this one is layered on top of
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,

    /// Base URL of the shop
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildSection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_api: Option<AdminApiSection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dump: Option<DumpSection>,

    /// Declarative state reconciled against the remote shop
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncSection>,

    #[serde(skip)]
    pub(crate) found: bool,
}

/// Asset build settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    pub disable_asset_copy: bool,
    pub remove_extension_assets: bool,
    pub keep_extension_source: bool,
    pub keep_source_maps: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cleanup_paths: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub browserslist: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_extensions: Vec<String>,
}

/// Admin API credentials
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminApiSection {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_secret: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    pub disable_ssl_check: bool,
}

/// Database dump settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpSection {
    /// Column rewrites keyed by table
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub rewrite: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodata: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ignore: Vec<String>,
    #[serde(rename = "where", skip_serializing_if = "BTreeMap::is_empty")]
    pub where_clauses: BTreeMap<String, String>,
}

/// The four reconciled domains
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSection {
    pub config: Vec<SystemConfigEntry>,
    pub theme: Vec<ThemeEntry>,
    pub mail_template: Vec<MailTemplate>,
    pub entity: Vec<EntitySync>,
}

/// System settings for one scope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemConfigEntry {
    #[serde(default)]
    pub sales_channel: Scope,
    #[serde(default)]
    pub settings: BTreeMap<String, Value>,
}

/// A single theme setting value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeConfigValue {
    #[serde(default)]
    pub value: Value,
}

impl ThemeConfigValue {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// Settings for one theme, addressed by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeEntry {
    pub name: String,
    #[serde(default)]
    pub settings: BTreeMap<String, ThemeConfigValue>,
}

/// Translations of one transactional mail template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MailTemplate {
    pub id: String,
    #[serde(default)]
    pub translations: Vec<MailTemplateTranslation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailTemplateTranslation {
    /// Remote language id
    pub language: String,
    pub sender_name: String,
    pub subject: String,
    pub html: String,
    pub plain: String,
    pub custom_fields: Value,
}

/// A create-or-update intent for an arbitrary entity type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitySync {
    pub entity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exists: Option<Vec<Filter>>,
    #[serde(default)]
    pub payload: Map<String, Value>,
}

impl Config {
    /// Parse a single document from YAML
    ///
    /// Includes are not resolved; use [`crate::ConfigComposer`] for that.
    ///
    /// # Example
    ///
    /// ```
    /// use shop_config::{Config, Scope};
    ///
    /// let config = Config::parse(r#"
    /// sync:
    ///   config:
    ///     - settings:
    ///         core.mail.from: a@x.com
    /// "#).unwrap();
    ///
    /// let sync = config.sync.unwrap();
    /// assert_eq!(sync.config[0].sales_channel, Scope::Global);
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        Self::parse_at(content, Path::new("<inline>"))
    }

    pub(crate) fn parse_at(content: &str, path: &Path) -> Result<Self> {
        // An empty document is a valid, empty configuration
        let mut config: Config = if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| Error::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        };
        config.found = true;
        config.validate(path)?;
        Ok(config)
    }

    /// The configuration used when no document exists and fallback is allowed
    pub fn fallback() -> Self {
        Self::default()
    }

    /// Whether this configuration was produced without reading a document
    pub fn is_fallback(&self) -> bool {
        !self.found
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::Serialize {
            path: Path::new("<inline>").to_path_buf(),
            message: e.to_string(),
        })
    }

    /// The sync section, created empty if absent
    pub fn sync_mut(&mut self) -> &mut SyncSection {
        self.sync.get_or_insert_with(SyncSection::default)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let Some(sync) = &self.sync else {
            return Ok(());
        };

        let mut scopes = HashSet::new();
        for entry in &sync.config {
            if entry.sales_channel.channel_id() == Some("") {
                return Err(Error::invalid(
                    path,
                    "sales_channel must be null for global settings, not an empty string",
                ));
            }
            if !scopes.insert(&entry.sales_channel) {
                return Err(Error::invalid(
                    path,
                    format!("duplicate config entry for scope {}", entry.sales_channel),
                ));
            }
        }

        for theme in &sync.theme {
            if theme.name.is_empty() {
                return Err(Error::invalid(path, "theme entry without a name"));
            }
        }

        for template in &sync.mail_template {
            if template.id.is_empty() {
                return Err(Error::invalid(path, "mail_template entry without an id"));
            }
            let mut languages = HashSet::new();
            for translation in &template.translations {
                if !languages.insert(translation.language.as_str()) {
                    return Err(Error::invalid(
                        path,
                        format!(
                            "mail_template {} declares language {} twice",
                            template.id, translation.language
                        ),
                    ));
                }
            }
        }

        for entity in &sync.entity {
            if entity.entity.is_empty() {
                return Err(Error::invalid(path, "entity entry without an entity name"));
            }
        }

        Ok(())
    }
}
