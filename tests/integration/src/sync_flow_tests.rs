//! Full runs: compose documents from disk, push, apply, pull, write back

use pretty_assertions::assert_eq;
use serde_json::json;
use shop_config::{Config, Scope};
use shop_sync::remote::entities;
use shop_sync::{ApplyOptions, MemoryStore, SyncEngine};
use shop_test_utils::TestProject;
use shop_test_utils::store::{seed_mail_translation, seed_system_config, seed_theme};

const BASE: &str = r##"
url: https://base.example
sync:
  config:
    - settings:
        core.mail.from: base@x.com
        core.basicInformation.shopName: Demo
    - sales_channel: sc-1
      settings:
        core.cart.maxQuantity: 5
  theme:
    - name: Storefront
      settings:
        sw-border-radius-default:
          value: 3px
"##;

const MAIN: &str = r##"
include:
  - shared/base.yml
url: https://shop.example
sync:
  config:
    - settings:
        core.mail.from: a@x.com
  theme:
    - name: Storefront
      settings:
        sw-color-brand-primary:
          value: "#000"
  mail_template:
    - id: order-confirmation
      translations:
        - language: en
          sender_name: Demo Shop
          subject: Your order
          html: <p>Thanks</p>
          plain: Thanks
  entity:
    - entity: tax
      exists:
        - type: equals
          field: name
          value: Reduced
      payload:
        name: Reduced
        taxRate: 7
"##;

fn project() -> TestProject {
    TestProject::new()
        .with_file("shared/base.yml", BASE)
        .with_file(".shop-sync.yml", MAIN)
}

fn remote() -> MemoryStore {
    let store = MemoryStore::new();
    seed_system_config(&store, &Scope::Global, "core.mail.from", json!("old@x.com"));
    seed_theme(
        &store,
        "Storefront",
        &[
            ("sw-color-brand-primary", json!("#111")),
            ("sw-border-radius-default", json!("3px")),
        ],
    );
    seed_mail_translation(&store, "order-confirmation", "en", "Order", "Thanks");
    store
}

#[test]
fn test_composed_project_converges_after_apply() {
    let project = project();
    let store = remote();
    let engine = SyncEngine::new(&store);
    let config = project.compose(".shop-sync.yml");

    let operations = engine.push(&config).unwrap();

    // Global: mail.from update + shopName create; sc-1: maxQuantity create
    assert_eq!(operations.system_settings.len(), 3);
    assert_eq!(operations.theme_settings.len(), 1);
    assert_eq!(operations.operations.get("tax").unwrap().creates.len(), 1);
    assert_eq!(
        operations
            .operations
            .get(entities::MAIL_TEMPLATE_TRANSLATION)
            .unwrap()
            .updates
            .len(),
        1
    );

    let report = engine.apply(&operations, ApplyOptions::default());
    assert!(report.success, "{:?}", report.errors);
    assert_eq!(report.actions.len(), operations.change_count());

    // Matched entities are re-sent as updates; every other domain is settled
    let again = engine.push(&config).unwrap();
    assert!(again.system_settings.is_empty(), "{}", again.system_settings.to_json());
    assert!(again.theme_settings.is_empty());
    assert!(again.operations.get(entities::MAIL_TEMPLATE_TRANSLATION).is_none());
    let tax = again.operations.get("tax").unwrap();
    assert!(tax.creates.is_empty());
    assert_eq!(tax.updates.len(), 1);
}

#[test]
fn test_dry_run_leaves_remote_untouched() {
    let project = project();
    let store = remote();
    let engine = SyncEngine::new(&store);
    let config = project.compose(".shop-sync.yml");

    let operations = engine.push(&config).unwrap();
    let report = engine.apply(&operations, ApplyOptions { dry_run: true });

    assert_eq!(report.actions.len(), operations.change_count());
    assert!(report.actions.iter().all(|a| a.starts_with("[dry-run] ")));
    assert_eq!(store.write_count(), 0);
    assert!(engine.push(&config).unwrap().has_changes());
}

#[test]
fn test_pulled_config_round_trips_through_disk() {
    let project = TestProject::new();
    let store = remote();
    seed_system_config(
        &store,
        &Scope::sales_channel("sc-1"),
        "core.cart.maxQuantity",
        json!(5),
    );
    let engine = SyncEngine::new(&store);

    let mut config = Config::default();
    config.url = "https://shop.example".to_string();
    engine
        .pull_to_file(&mut config, &project.path(".shop-sync.yml"))
        .unwrap();

    project.assert_file_contains(".shop-sync.yml", "sales_channel: sc-1");
    let reloaded = project.compose(".shop-sync.yml");

    assert_eq!(reloaded.url, config.url);
    assert_eq!(reloaded.sync, config.sync);
    assert!(!engine.push(&reloaded).unwrap().has_changes());
}
