use super::ConfigSyncApplier;
use crate::context::SyncContext;
use crate::operation::SyncOperations;
use crate::remote::{Criteria, Record, entities, str_field};
use crate::{Error, Result};
use serde_json::Value;
use shop_config::{Config, Filter, MailTemplate, MailTemplateTranslation, new_uuid};
use std::collections::BTreeMap;

/// Translations of transactional mail templates
pub struct MailTemplateSync;

/// Remote field names of the compared translation fields
const SENDER_NAME: &str = "senderName";
const SUBJECT: &str = "subject";
const CONTENT_HTML: &str = "contentHtml";
const CONTENT_PLAIN: &str = "contentPlain";
const CUSTOM_FIELDS: &str = "customFields";

/// The compared fields of a declared translation, in remote form
fn desired_fields(translation: &MailTemplateTranslation) -> Record {
    let mut fields = Record::new();
    fields.insert(SENDER_NAME.into(), Value::String(translation.sender_name.clone()));
    fields.insert(SUBJECT.into(), Value::String(translation.subject.clone()));
    fields.insert(CONTENT_HTML.into(), Value::String(translation.html.clone()));
    fields.insert(CONTENT_PLAIN.into(), Value::String(translation.plain.clone()));
    fields.insert(CUSTOM_FIELDS.into(), translation.custom_fields.clone());
    fields
}

/// Fields of `desired` that differ from `remote`
///
/// A missing remote field reads as null, and a null text field equals the
/// empty string.
fn changed_fields(desired: &Record, remote: &Record) -> Record {
    desired
        .iter()
        .filter(|(field, wanted)| {
            let current = remote.get(*field).unwrap_or(&Value::Null);
            match (wanted, current) {
                (Value::String(w), Value::Null) => !w.is_empty(),
                _ => *wanted != current,
            }
        })
        .map(|(field, wanted)| (field.clone(), wanted.clone()))
        .collect()
}

fn text(record: &Record, field: &str) -> String {
    str_field(record, field).unwrap_or_default().to_string()
}

impl ConfigSyncApplier for MailTemplateSync {
    fn domain(&self) -> &'static str {
        "mail_template"
    }

    fn push(
        &self,
        ctx: &SyncContext<'_>,
        config: &Config,
        operations: &mut SyncOperations,
    ) -> Result<()> {
        let Some(sync) = &config.sync else {
            return Ok(());
        };

        for template in sync.mail_template.iter().filter(|t| !t.translations.is_empty()) {
            let criteria = Criteria::new().filter(Filter::equals(
                "mailTemplateId",
                template.id.as_str(),
            ));
            let remote = ctx.search(entities::MAIL_TEMPLATE_TRANSLATION, &criteria)?;

            let by_language: BTreeMap<&str, &Record> = remote
                .iter()
                .filter_map(|r| Some((str_field(r, "languageId")?, r)))
                .collect();

            for translation in &template.translations {
                let desired = desired_fields(translation);

                let Some(current) = by_language.get(translation.language.as_str()) else {
                    let mut record = desired;
                    record.insert("id".into(), Value::String(new_uuid()));
                    record.insert("mailTemplateId".into(), Value::String(template.id.clone()));
                    record.insert(
                        "languageId".into(),
                        Value::String(translation.language.clone()),
                    );
                    tracing::debug!(
                        template = template.id.as_str(),
                        language = translation.language.as_str(),
                        "Staged mail template translation create"
                    );
                    operations
                        .operations
                        .create(entities::MAIL_TEMPLATE_TRANSLATION, record);
                    continue;
                };

                let changed = changed_fields(&desired, current);
                if changed.is_empty() {
                    continue;
                }

                let id = str_field(current, "id").ok_or_else(|| Error::MissingId {
                    entity: entities::MAIL_TEMPLATE_TRANSLATION.to_string(),
                })?;
                tracing::debug!(
                    template = template.id.as_str(),
                    language = translation.language.as_str(),
                    fields = changed.len(),
                    "Staged mail template translation update"
                );
                operations
                    .operations
                    .update(entities::MAIL_TEMPLATE_TRANSLATION, id, changed);
            }
        }

        Ok(())
    }

    fn pull(&self, ctx: &SyncContext<'_>, config: &mut Config) -> Result<()> {
        let records = ctx.search(entities::MAIL_TEMPLATE_TRANSLATION, &Criteria::new())?;

        let mut templates: BTreeMap<String, Vec<MailTemplateTranslation>> = BTreeMap::new();
        for record in &records {
            let Some(template_id) = str_field(record, "mailTemplateId") else {
                continue;
            };
            templates
                .entry(template_id.to_string())
                .or_default()
                .push(MailTemplateTranslation {
                    language: text(record, "languageId"),
                    sender_name: text(record, SENDER_NAME),
                    subject: text(record, SUBJECT),
                    html: text(record, CONTENT_HTML),
                    plain: text(record, CONTENT_PLAIN),
                    custom_fields: record.get(CUSTOM_FIELDS).cloned().unwrap_or(Value::Null),
                });
        }

        config.sync_mut().mail_template = templates
            .into_iter()
            .map(|(id, mut translations)| {
                translations.sort_by(|a, b| a.language.cmp(&b.language));
                MailTemplate { id, translations }
            })
            .collect();

        Ok(())
    }
}
