use super::consent_harness::{GTM_SNIPPET, Site, config, storefront};

use std::sync::Arc;

use boltconsent::config::EngineConfig;
use boltconsent::engine::{Initialization, Phase};
use boltconsent::error::{ConfigError, ConsentError};
use boltconsent::observability::ConsentEvent;
use boltconsent::page::tag_manager::event_name;
use boltconsent::page::{CookieJar, Page};
use boltconsent::ui::{BANNER_ELEMENT_ID, MANAGE_ELEMENT_ID};
use serde_json::json;

#[tokio::test]
async fn missing_api_key_installs_nothing() {
    let site = Site::new();
    let result = site
        .boot_with(EngineConfig {
            script_id: Some("script_1".into()),
            ..EngineConfig::default()
        })
        .await;

    match result {
        Err(ConsentError::Configuration(ConfigError::MissingField(fields))) => {
            assert_eq!(fields, vec!["apiKey"]);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("initialization should abort"),
    }
    assert_eq!(site.script_srcs().len(), 3);
    assert!(site.cookie_names().contains(&"_ga".to_string()));
    assert_eq!(site.nodes_with_id(BANNER_ELEMENT_ID), 0);
    assert_eq!(
        site.observer.events(),
        vec![ConsentEvent::ConfigurationRejected {
            missing: vec!["apiKey".into()]
        }]
    );
}

#[tokio::test]
async fn empty_script_id_counts_as_missing() {
    let site = Site::new();
    let result = site
        .boot_with(EngineConfig {
            script_id: Some("  ".into()),
            api_key: Some("key_1".into()),
            ..EngineConfig::default()
        })
        .await;
    assert!(matches!(result, Err(ConsentError::Configuration(_))));
    assert!(!site.page.globals().is_initialized());
}

#[tokio::test]
async fn fresh_visit_is_blocked_with_banner() {
    let site = Site::new();
    let engine = site.boot().await;

    assert_eq!(engine.phase(), Phase::Ready);
    assert_eq!(site.script_srcs(), vec!["/assets/app.js".to_string()]);
    assert_eq!(site.page.read_cookies(), "cart=3");
    assert!(site.banner.is_visible());
    assert_eq!(site.nodes_with_id(MANAGE_ELEMENT_ID), 1);
    assert_eq!(
        site.observer
            .count(|event| matches!(event, ConsentEvent::InterceptionEngaged { failures: 0 })),
        1
    );
}

#[tokio::test]
async fn double_initialization_wraps_once() {
    let site = Site::new();
    let _engine = site.boot().await;
    let wrapped = site.page.registry().cookies().get();

    let second = site.boot_with(config()).await.unwrap();
    assert!(matches!(second, Initialization::Skipped));
    assert!(Arc::ptr_eq(&site.page.registry().cookies().get(), &wrapped));
    assert_eq!(site.nodes_with_id(BANNER_ELEMENT_ID), 1);
    assert_eq!(
        site.observer
            .count(|event| matches!(event, ConsentEvent::InterceptionEngaged { .. })),
        1
    );
    assert_eq!(
        site.observer
            .count(|event| matches!(event, ConsentEvent::InitSkipped { .. })),
        1
    );
}

#[tokio::test]
async fn page_config_object_overrides_file_config() {
    let page = Page::builder("shop.example.com")
        .consent_config(json!({
            "scriptId": "page_script",
            "apiKey": "page_key",
            "apiUrl": "https://consent.example.net/api/"
        }))
        .build();
    let site = Site::on(page);
    let engine = site.boot().await;

    assert_eq!(engine.config().script_id(), "page_script");
    assert_eq!(engine.config().api_base(), "https://consent.example.net/api");
}

#[tokio::test]
async fn locked_cookie_property_fails_closed() {
    let page = Page::builder("shop.example.com")
        .cookies(Arc::new(CookieJar::with_cookies(&[("_ga", "GA1.1.1")])))
        .lock_cookies()
        .build();
    let site = Site::on(page);
    let engine = site.boot().await;

    assert_eq!(engine.phase(), Phase::Ready);
    assert!(engine.interception().is_active());
    assert!(site.observer.count(|event| matches!(
        event,
        ConsentEvent::Error { component, .. } if component == "interception"
    )) >= 1);
    // Existing tracking cookies are still expired through the original writer.
    assert!(!site.cookie_names().contains(&"_ga".to_string()));
}

#[tokio::test]
async fn accept_uses_ids_discovered_on_the_page() {
    let page = storefront();
    let queue = page.registry().data_layer().get();
    let site = Site::on(page);
    let engine = site.boot().await;

    engine.accept_all().await.unwrap();

    assert!(site.script_srcs().contains(&GTM_SNIPPET.to_string()));
    let entries = queue.entries();
    assert!(entries.contains(&json!(["config", "G-SHOP"])));
    let first_update = entries
        .iter()
        .position(|entry| event_name(entry) == Some("consent_update"))
        .unwrap();
    let bootstrap = entries
        .iter()
        .position(|entry| event_name(entry) == Some("gtm.js"))
        .unwrap();
    assert!(first_update < bootstrap);
}

#[tokio::test]
async fn observer_sees_only_one_apply_on_load() {
    let site = Site::new();
    let _engine = site.boot().await;
    assert_eq!(
        site.observer.count(|event| matches!(event, ConsentEvent::ConsentApplied { statistics: false, .. })),
        1
    );
}
