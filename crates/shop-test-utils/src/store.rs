//! Seeding helpers that put remote-shaped records into a [`MemoryStore`].

use serde_json::{Value, json};
use shop_config::Scope;
use shop_sync::remote::entities;
use shop_sync::{MemoryStore, Record};

/// Turn a `json!` object into a [`Record`].
///
/// # Panics
/// Panics if `value` is not an object.
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("Expected a JSON object, got {other}"),
    }
}

/// Seed one system setting; returns its id.
pub fn seed_system_config(store: &MemoryStore, scope: &Scope, key: &str, value: Value) -> String {
    store.insert(
        entities::SYSTEM_CONFIG,
        record(json!({
            "configurationKey": key,
            "configurationValue": value,
            "salesChannelId": scope.to_value(),
        })),
    )
}

/// Seed a theme with `settings` as its config values; returns its id.
pub fn seed_theme(store: &MemoryStore, name: &str, settings: &[(&str, Value)]) -> String {
    let values: serde_json::Map<String, Value> = settings
        .iter()
        .map(|(key, value)| (key.to_string(), json!({ "value": value })))
        .collect();

    store.insert(
        entities::THEME,
        record(json!({
            "name": name,
            "configValues": values,
        })),
    )
}

/// Seed a mail template translation; returns its id.
pub fn seed_mail_translation(
    store: &MemoryStore,
    template_id: &str,
    language: &str,
    subject: &str,
    content: &str,
) -> String {
    store.insert(
        entities::MAIL_TEMPLATE_TRANSLATION,
        record(json!({
            "mailTemplateId": template_id,
            "languageId": language,
            "senderName": "Shop",
            "subject": subject,
            "contentHtml": content,
            "contentPlain": content,
            "customFields": null,
        })),
    )
}
