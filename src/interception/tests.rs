use super::*;
use crate::observability::NoopObserver;
use crate::page::document::{Element, Region};
use crate::page::{CookieJar, Document, InMemoryDocument};
use serde_json::json;

const GTM_SRC: &str = "https://www.googletagmanager.com/gtm.js?id=GTM-SEEDED";
const GTAG_SRC: &str = "https://www.googletagmanager.com/gtag/js?id=G-SEEDED";

fn layer_for(page: &Arc<Page>) -> InterceptionLayer {
    InterceptionLayer::new(
        Arc::clone(page),
        Arc::new(DenyList::default()),
        Arc::new(NoopObserver),
    )
}

fn seeded_page() -> Arc<Page> {
    let document = Arc::new(InMemoryDocument::new());
    document.append(Region::Head, Element::new("script").with_attribute("src", GTM_SRC));
    document.append(Region::Head, Element::new("script").with_attribute("src", GTAG_SRC));
    document.append(
        Region::Body,
        Element::new("script").with_attribute("src", "/assets/site.js"),
    );
    Page::builder("shop.example.com")
        .document(document)
        .cookies(Arc::new(CookieJar::with_cookies(&[
            ("_ga", "GA1.1.1"),
            ("_gid", "GA1.1.2"),
            ("session", "s1"),
        ])))
        .build()
}

#[test]
fn install_removes_existing_tracking_scripts_and_discovers_ids() {
    let page = seeded_page();
    let layer = layer_for(&page);

    let report = layer.install();
    assert!(report.newly_engaged);
    assert!(report.failures.is_empty());
    assert_eq!(report.removed_scripts, 2);
    assert_eq!(page.document().scripts().len(), 1);
    assert_eq!(
        layer.discovered_tags(),
        DiscoveredTags {
            container_id: Some("GTM-SEEDED".into()),
            measurement_id: Some("G-SEEDED".into()),
        }
    );
}

#[test]
fn install_is_idempotent() {
    let page = seeded_page();
    let layer = layer_for(&page);
    assert!(layer.install().newly_engaged);
    let wrapped = page.registry().element_factory().get();

    let second = layer.install();
    assert!(!second.newly_engaged);
    assert!(Arc::ptr_eq(&page.registry().element_factory().get(), &wrapped));
}

#[test]
fn uninstall_restores_exact_originals() {
    let page = seeded_page();
    let factory = page.registry().element_factory().get();
    let cookies = page.registry().cookies().get();
    let queue = page.registry().data_layer().get();
    let layer = layer_for(&page);

    layer.install();
    assert!(!Arc::ptr_eq(&page.registry().cookies().get(), &cookies));

    assert!(layer.uninstall());
    assert!(!layer.uninstall());
    assert!(Arc::ptr_eq(&page.registry().element_factory().get(), &factory));
    assert!(Arc::ptr_eq(&page.registry().cookies().get(), &cookies));
    assert!(Arc::ptr_eq(&page.registry().data_layer().get(), &queue));
    assert!(page.registry().gtag().get().is_none());
}

#[test]
fn originals_survive_repeated_cycles() {
    let page = seeded_page();
    let cookies = page.registry().cookies().get();
    let layer = layer_for(&page);
    for _ in 0..3 {
        layer.install();
        layer.uninstall();
    }
    assert!(Arc::ptr_eq(&page.registry().cookies().get(), &cookies));
}

#[test]
fn blocking_then_release_round_trip() {
    let page = seeded_page();
    let layer = layer_for(&page);
    layer.install();

    page.write_cookie("_fbp=fb.1.1; path=/");
    assert!(!page.read_cookies().contains("_fbp"));

    let id = page.document().append(
        Region::Body,
        Element::new("script").with_attribute("src", "https://www.google-analytics.com/analytics.js"),
    );
    page.tick();
    assert!(page.document().node(id).is_none());

    layer.uninstall();

    page.write_cookie("_fbp=fb.1.1; path=/");
    assert!(page.read_cookies().contains("_fbp"));

    let mut script = page.create_element("script");
    assert!(script.set_attribute("src", "https://www.google-analytics.com/analytics.js"));
    let id = page.document().append(Region::Body, script);
    page.tick();
    assert!(page.document().node(id).is_some());
}

#[test]
fn locked_cookie_property_fails_closed() {
    let page = Page::builder("example.com").lock_cookies().build();
    let layer = layer_for(&page);

    let report = layer.install();
    assert!(report.newly_engaged);
    assert_eq!(
        report.failures,
        vec![InterceptionError::NotConfigurable {
            capability: "document.cookie"
        }]
    );
    assert!(layer.is_active());

    let mut script = page.create_element("script");
    assert!(!script.set_attribute("src", "https://www.googletagmanager.com/gtm.js?id=GTM-X"));

    assert!(layer.uninstall());
}

#[test]
fn tag_globals_are_neutralised_and_consent_is_replayed() {
    let page = seeded_page();
    page.registry()
        .tag_manager()
        .replace(Some(Arc::new(json!({"GTM-SEEDED": {}}))));
    let queue = page.registry().data_layer().get();
    let layer = layer_for(&page);

    layer.install();
    assert!(page.registry().tag_manager().get().is_none());
    assert!(page.call_gtag(&[json!("event"), json!("page_view")]).is_none());
    page.push_data_layer(json!({"event": "page_view"}));
    page.push_data_layer(json!({"event": "consent_update", "consent_state": {}}));
    assert!(queue.entries().is_empty());

    layer.uninstall();
    assert_eq!(
        queue.entries(),
        vec![json!({"event": "consent_update", "consent_state": {}})]
    );
    assert!(page.registry().tag_manager().get().is_some());
}

#[test]
fn purge_expires_tracking_cookies_through_original_writer() {
    let page = seeded_page();
    let layer = layer_for(&page);
    layer.install();

    assert_eq!(layer.purge_tracking_cookies(), 2);
    assert_eq!(page.read_cookies(), "session=s1");
    assert_eq!(layer.purge_tracking_cookies(), 0);
}

#[test]
fn query_id_handles_relative_and_absolute_urls() {
    assert_eq!(query_id(GTM_SRC).as_deref(), Some("GTM-SEEDED"));
    assert_eq!(
        query_id("//www.googletagmanager.com/gtm.js?id=GTM-REL&l=dataLayer").as_deref(),
        Some("GTM-REL")
    );
    assert_eq!(query_id("https://www.googletagmanager.com/gtm.js"), None);
}
