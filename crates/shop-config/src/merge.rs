//! Override merge of configuration documents
//!
//! `base.merge(&overlay)` layers `overlay` on top of `base`:
//! - scalars: a non-empty overlay value replaces the base value
//! - booleans: OR-ed, an overlay can switch a flag on but not off
//! - optional sections: merged recursively, or copied when the base has none
//! - maps: merged key-wise, JSON values deep-merged
//! - keyed lists (config scopes, themes, mail templates, translations):
//!   matched by key and merged, unmatched overlay items appended
//! - plain string lists: replaced when the overlay list is non-empty
//!
//! Everything taken from the overlay is cloned, so the result never shares
//! data with either input.

use crate::model::{
    AdminApiSection, BuildSection, Config, DumpSection, EntitySync, MailTemplate,
    MailTemplateTranslation, SyncSection, SystemConfigEntry, ThemeEntry,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// Layer another value of the same type on top of this one
pub trait Merge {
    fn merge(&mut self, overlay: &Self);
}

impl Merge for Config {
    fn merge(&mut self, overlay: &Config) {
        merge_string(&mut self.url, &overlay.url);
        merge_option(&mut self.build, &overlay.build);
        merge_option(&mut self.admin_api, &overlay.admin_api);
        merge_option(&mut self.dump, &overlay.dump);
        merge_option(&mut self.sync, &overlay.sync);
        self.found |= overlay.found;
    }
}

impl Merge for BuildSection {
    fn merge(&mut self, overlay: &BuildSection) {
        self.disable_asset_copy |= overlay.disable_asset_copy;
        self.remove_extension_assets |= overlay.remove_extension_assets;
        self.keep_extension_source |= overlay.keep_extension_source;
        self.keep_source_maps |= overlay.keep_source_maps;
        merge_list(&mut self.cleanup_paths, &overlay.cleanup_paths);
        merge_string(&mut self.browserslist, &overlay.browserslist);
        merge_list(&mut self.exclude_extensions, &overlay.exclude_extensions);
    }
}

impl Merge for AdminApiSection {
    fn merge(&mut self, overlay: &AdminApiSection) {
        merge_string(&mut self.client_id, &overlay.client_id);
        merge_string(&mut self.client_secret, &overlay.client_secret);
        merge_string(&mut self.username, &overlay.username);
        merge_string(&mut self.password, &overlay.password);
        self.disable_ssl_check |= overlay.disable_ssl_check;
    }
}

impl Merge for DumpSection {
    fn merge(&mut self, overlay: &DumpSection) {
        merge_value_map(&mut self.rewrite, &overlay.rewrite);
        merge_list(&mut self.nodata, &overlay.nodata);
        merge_list(&mut self.ignore, &overlay.ignore);
        for (table, clause) in &overlay.where_clauses {
            self.where_clauses.insert(table.clone(), clause.clone());
        }
    }
}

impl Merge for SyncSection {
    fn merge(&mut self, overlay: &SyncSection) {
        merge_keyed(&mut self.config, &overlay.config, |e| &e.sales_channel);
        merge_keyed(&mut self.theme, &overlay.theme, |t| &t.name);
        merge_keyed(&mut self.mail_template, &overlay.mail_template, |m| &m.id);

        for entity in &overlay.entity {
            match self
                .entity
                .iter_mut()
                .find(|e| e.entity == entity.entity && e.exists == entity.exists)
            {
                Some(existing) => existing.merge(entity),
                None => self.entity.push(entity.clone()),
            }
        }
    }
}

impl Merge for SystemConfigEntry {
    fn merge(&mut self, overlay: &SystemConfigEntry) {
        merge_value_map(&mut self.settings, &overlay.settings);
    }
}

impl Merge for ThemeEntry {
    fn merge(&mut self, overlay: &ThemeEntry) {
        for (name, value) in &overlay.settings {
            self.settings.insert(name.clone(), value.clone());
        }
    }
}

impl Merge for MailTemplate {
    fn merge(&mut self, overlay: &MailTemplate) {
        merge_keyed(&mut self.translations, &overlay.translations, |t| &t.language);
    }
}

impl Merge for MailTemplateTranslation {
    fn merge(&mut self, overlay: &MailTemplateTranslation) {
        merge_string(&mut self.sender_name, &overlay.sender_name);
        merge_string(&mut self.subject, &overlay.subject);
        merge_string(&mut self.html, &overlay.html);
        merge_string(&mut self.plain, &overlay.plain);
        if !overlay.custom_fields.is_null() {
            deep_merge_value(&mut self.custom_fields, &overlay.custom_fields);
        }
    }
}

impl Merge for EntitySync {
    fn merge(&mut self, overlay: &EntitySync) {
        for (key, other_val) in &overlay.payload {
            match self.payload.get_mut(key) {
                Some(base_val) => deep_merge_value(base_val, other_val),
                None => {
                    self.payload.insert(key.clone(), other_val.clone());
                }
            }
        }
    }
}

fn merge_string(base: &mut String, overlay: &str) {
    if !overlay.is_empty() {
        *base = overlay.to_string();
    }
}

fn merge_list(base: &mut Vec<String>, overlay: &[String]) {
    if !overlay.is_empty() {
        *base = overlay.to_vec();
    }
}

fn merge_option<T: Merge + Clone>(base: &mut Option<T>, overlay: &Option<T>) {
    if let Some(o) = overlay {
        match base {
            Some(b) => b.merge(o),
            None => *base = Some(o.clone()),
        }
    }
}

fn merge_keyed<T, K, F>(base: &mut Vec<T>, overlay: &[T], key: F)
where
    T: Merge + Clone,
    K: PartialEq + ?Sized,
    F: Fn(&T) -> &K,
{
    for item in overlay {
        match base.iter_mut().find(|b| key(&**b) == key(item)) {
            Some(existing) => existing.merge(item),
            None => base.push(item.clone()),
        }
    }
}

fn merge_value_map(base: &mut BTreeMap<String, Value>, overlay: &BTreeMap<String, Value>) {
    for (key, other_val) in overlay {
        match base.get_mut(key) {
            Some(base_val) => deep_merge_value(base_val, other_val),
            None => {
                base.insert(key.clone(), other_val.clone());
            }
        }
    }
}

/// Deep merge two JSON values
///
/// If both values are objects, merge them recursively with `other` taking precedence.
/// Otherwise, `other` replaces `base`.
pub fn deep_merge_value(base: &mut Value, other: &Value) {
    match (base, other) {
        (Value::Object(base_map), Value::Object(other_map)) => {
            for (key, other_val) in other_map {
                if let Some(base_val) = base_map.get_mut(key) {
                    deep_merge_value(base_val, other_val);
                } else {
                    base_map.insert(key.clone(), other_val.clone());
                }
            }
        }
        (base, other) => {
            *base = other.clone();
        }
    }
}
