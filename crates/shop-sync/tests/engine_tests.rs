//! End-to-end push/apply/pull runs against the in-memory store

use pretty_assertions::assert_eq;
use serde_json::json;
use shop_config::{Config, Scope, ThemeConfigValue};
use shop_sync::remote::entities;
use shop_sync::{
    ApplyOptions, CancellationToken, Error, MemoryStore, RemoteConfigStore, StoreCall, SyncEngine,
};
use shop_test_utils::store::{record, seed_mail_translation, seed_system_config, seed_theme};

const MAIL_FROM: &str = r#"
sync:
  config:
    - settings:
        core.mail.from: a@x.com
"#;

#[test]
fn test_new_global_setting_is_created_then_settled() {
    let store = MemoryStore::new();
    let engine = SyncEngine::new(&store);
    let config = Config::parse(MAIL_FROM).unwrap();

    let operations = engine.push(&config).unwrap();

    let global = operations.system_settings.get(&Scope::Global).unwrap();
    assert_eq!(global.len(), 1);
    assert!(global["core.mail.from"].is_create());
    assert_eq!(
        operations.system_settings.to_json(),
        r#"{"null": {"core.mail.from":"a@x.com"}}"#
    );

    let report = engine.apply(&operations, ApplyOptions::default());
    assert!(report.success, "{:?}", report.errors);

    let again = engine.push(&config).unwrap();
    assert!(!again.has_changes());
}

#[test]
fn test_identical_scope_stages_nothing() {
    let store = MemoryStore::new();
    seed_system_config(&store, &Scope::Global, "core.mail.from", json!("a@x.com"));
    seed_system_config(&store, &Scope::Global, "core.other", json!(1));

    let config = Config::parse(MAIL_FROM).unwrap();
    let operations = SyncEngine::new(&store).push(&config).unwrap();

    assert!(operations.system_settings.is_empty());
    assert!(!operations.has_changes());
}

#[test]
fn test_changed_theme_color_is_the_only_staged_key() {
    let store = MemoryStore::new();
    let id = seed_theme(
        &store,
        "Storefront",
        &[
            ("sw-color-brand-primary", json!("#111")),
            ("sw-border-radius-default", json!("3px")),
        ],
    );
    let config = Config::parse(
        r##"
sync:
  theme:
    - name: Storefront
      settings:
        sw-color-brand-primary:
          value: "#000"
        sw-border-radius-default:
          value: 3px
"##,
    )
    .unwrap();

    let operations = SyncEngine::new(&store).push(&config).unwrap();

    let themes: Vec<_> = operations.theme_settings.iter().collect();
    assert_eq!(themes.len(), 1);
    assert_eq!(themes[0].id, id);
    assert_eq!(
        themes[0].settings.keys().collect::<Vec<_>>(),
        vec!["sw-color-brand-primary"]
    );
    assert_eq!(
        themes[0].settings["sw-color-brand-primary"],
        ThemeConfigValue::new("#000")
    );
}

#[test]
fn test_theme_subset_with_equal_values_stages_nothing() {
    let store = MemoryStore::new();
    seed_theme(
        &store,
        "Storefront",
        &[
            ("sw-color-brand-primary", json!("#000")),
            ("sw-border-radius-default", json!("3px")),
        ],
    );
    let config = Config::parse(
        "sync:\n  theme:\n    - name: Storefront\n      settings:\n        sw-border-radius-default:\n          value: 3px\n",
    )
    .unwrap();

    let operations = SyncEngine::new(&store).push(&config).unwrap();

    assert!(operations.theme_settings.is_empty());
}

#[test]
fn test_entity_without_match_is_created_never_updated() {
    let store = MemoryStore::new();
    store.insert(
        "tax",
        shop_test_utils::store::record(json!({"id": "t1", "name": "Standard"})),
    );
    let config = Config::parse(
        r#"
sync:
  entity:
    - entity: tax
      exists:
        - type: equals
          field: name
          value: Reduced
      payload:
        name: Reduced
        taxRate: 7
"#,
    )
    .unwrap();

    let operations = SyncEngine::new(&store).push(&config).unwrap();

    let batch = operations.operations.get("tax").unwrap();
    assert_eq!(batch.creates.len(), 1);
    assert!(batch.updates.is_empty());
    assert!(operations.has_changes());
}

#[test]
fn test_push_never_writes() {
    let store = MemoryStore::new();
    seed_theme(&store, "Storefront", &[("a", json!(1))]);
    seed_mail_translation(&store, "tpl", "en", "Old", "Body");
    let config = Config::parse(
        r#"
sync:
  config:
    - settings:
        core.mail.from: a@x.com
  theme:
    - name: Storefront
      settings:
        a:
          value: 2
  mail_template:
    - id: tpl
      translations:
        - language: en
          sender_name: Shop
          subject: New
          html: Body
          plain: Body
        - language: de
          subject: Neu
  entity:
    - entity: tax
      payload:
        name: Reduced
"#,
    )
    .unwrap();

    let operations = SyncEngine::new(&store).push(&config).unwrap();

    assert_eq!(store.write_count(), 0);
    assert!(
        store
            .calls()
            .iter()
            .all(|c| matches!(c, StoreCall::Search { .. }))
    );

    // system + theme + mail update + mail create + entity create
    assert_eq!(operations.change_count(), 5);
    let mail = operations
        .operations
        .get(entities::MAIL_TEMPLATE_TRANSLATION)
        .unwrap();
    assert_eq!(mail.creates.len(), 1);
    assert_eq!(mail.updates[0].payload.len(), 1);
    assert_eq!(mail.updates[0].payload["subject"], json!("New"));
}

#[test]
fn test_missing_theme_fails_with_domain() {
    let store = MemoryStore::new();
    let config = Config::parse(
        "sync:\n  theme:\n    - name: Storefront\n      settings:\n        a:\n          value: 1\n",
    )
    .unwrap();

    let err = SyncEngine::new(&store).push(&config).unwrap_err();

    assert_eq!(err.to_string(), "theme sync failed: Theme not found: Storefront");
}

#[test]
fn test_remote_failure_is_wrapped_with_domain() {
    let store = MemoryStore::new();
    store.fail_on(entities::SYSTEM_CONFIG, "connection reset");
    let config = Config::parse(MAIL_FROM).unwrap();

    let err = SyncEngine::new(&store).push(&config).unwrap_err();

    match err {
        Error::Domain { domain, source } => {
            assert_eq!(domain, "system_config");
            assert!(matches!(*source, Error::Remote(_)));
        }
        other => panic!("expected domain error, got {other}"),
    }
}

#[test]
fn test_cancelled_push_stops_before_any_call() {
    let store = MemoryStore::new();
    let token = CancellationToken::new();
    let engine = SyncEngine::new(&store).with_cancellation(token.clone());
    token.cancel();

    let err = engine.push(&Config::parse(MAIL_FROM).unwrap()).unwrap_err();

    assert!(err.is_cancelled());
    assert!(store.calls().is_empty());
}

#[test]
fn test_pull_replaces_sections_and_keeps_entities() {
    let store = MemoryStore::new();
    seed_system_config(&store, &Scope::Global, "core.mail.from", json!("remote@x.com"));
    seed_theme(&store, "Storefront", &[("sw-color-brand-primary", json!("#111"))]);
    seed_mail_translation(&store, "tpl", "en", "Remote", "Body");

    let mut config = Config::parse(
        r#"
sync:
  config:
    - sales_channel: sc-stale
      settings:
        stale.key: 1
  entity:
    - entity: tax
      payload:
        name: Reduced
"#,
    )
    .unwrap();

    SyncEngine::new(&store).pull(&mut config).unwrap();
    let sync = config.sync.unwrap();

    assert_eq!(sync.config.len(), 1);
    assert_eq!(sync.config[0].sales_channel, Scope::Global);
    assert_eq!(sync.config[0].settings["core.mail.from"], json!("remote@x.com"));
    assert_eq!(sync.theme[0].name, "Storefront");
    assert_eq!(sync.mail_template[0].translations[0].subject, "Remote");
    assert_eq!(sync.entity.len(), 1);
}

#[test]
fn test_pulled_state_pushes_clean() {
    let store = MemoryStore::new();
    seed_system_config(
        &store,
        &Scope::sales_channel("sc-1"),
        "core.cart.maxQuantity",
        json!(5),
    );
    seed_theme(&store, "Storefront", &[("sw-color-brand-primary", json!("#111"))]);
    seed_mail_translation(&store, "tpl", "en", "Subject", "Body");

    let engine = SyncEngine::new(&store);
    let mut config = Config::default();
    engine.pull(&mut config).unwrap();

    assert!(!engine.push(&config).unwrap().has_changes());
}

#[test]
fn test_object_setting_converges_after_apply() {
    let store = MemoryStore::new();
    let id = seed_system_config(
        &store,
        &Scope::Global,
        "core.listing.filters",
        json!({"a": 1, "b": 2}),
    );
    let config = Config::parse(
        "sync:\n  config:\n    - settings:\n        core.listing.filters:\n          a: 1\n",
    )
    .unwrap();
    let engine = SyncEngine::new(&store);

    let operations = engine.push(&config).unwrap();
    let report = engine.apply(&operations, ApplyOptions::default());
    assert!(report.success, "{:?}", report.errors);

    let stored = store.get(entities::SYSTEM_CONFIG, &id).unwrap();
    assert_eq!(stored["configurationValue"], json!({"a": 1}));
    assert!(!engine.push(&config).unwrap().has_changes());
}

#[test]
fn test_custom_fields_converge_after_apply() {
    let store = MemoryStore::new();
    let id = seed_mail_translation(&store, "tpl", "en", "Subject", "Body");
    store
        .update(
            entities::MAIL_TEMPLATE_TRANSLATION,
            &id,
            &record(json!({"customFields": {"tag": 1, "legacy": true}})),
        )
        .unwrap();
    let config = Config::parse(
        r#"
sync:
  mail_template:
    - id: tpl
      translations:
        - language: en
          sender_name: Shop
          subject: Subject
          html: Body
          plain: Body
          custom_fields:
            tag: 1
"#,
    )
    .unwrap();
    let engine = SyncEngine::new(&store);

    let operations = engine.push(&config).unwrap();
    assert_eq!(operations.change_count(), 1);
    let report = engine.apply(&operations, ApplyOptions::default());
    assert!(report.success, "{:?}", report.errors);

    let stored = store.get(entities::MAIL_TEMPLATE_TRANSLATION, &id).unwrap();
    assert_eq!(stored["customFields"], json!({"tag": 1}));
    assert!(!engine.push(&config).unwrap().has_changes());
}

#[test]
fn test_theme_apply_keeps_untouched_keys_and_settles() {
    let store = MemoryStore::new();
    let id = seed_theme(
        &store,
        "Storefront",
        &[
            ("sw-color-brand-primary", json!("#111")),
            ("sw-border-radius-default", json!("3px")),
        ],
    );
    let config = Config::parse(
        r##"
sync:
  theme:
    - name: Storefront
      settings:
        sw-color-brand-primary:
          value: "#000"
"##,
    )
    .unwrap();
    let engine = SyncEngine::new(&store);

    let operations = engine.push(&config).unwrap();
    let report = engine.apply(&operations, ApplyOptions::default());
    assert!(report.success, "{:?}", report.errors);

    let stored = store.get(entities::THEME, &id).unwrap();
    assert_eq!(
        stored["configValues"],
        json!({
            "sw-border-radius-default": {"value": "3px"},
            "sw-color-brand-primary": {"value": "#000"},
        })
    );
    assert!(!engine.push(&config).unwrap().has_changes());
}

#[test]
fn test_failed_pull_leaves_config_as_loaded() {
    let store = MemoryStore::new();
    seed_system_config(&store, &Scope::Global, "core.mail.from", json!("remote@x.com"));
    store.fail_on(entities::MAIL_TEMPLATE_TRANSLATION, "503 Service Unavailable");
    let mut config = Config::parse(MAIL_FROM).unwrap();
    config.sync_mut().config[0]
        .settings
        .insert("core.mail.from".to_string(), json!("local@x.com"));
    let before = config.clone();

    let err = SyncEngine::new(&store).pull(&mut config).unwrap_err();

    assert!(matches!(err, Error::Domain { domain: "mail_template", .. }));
    assert_eq!(config, before);
}

