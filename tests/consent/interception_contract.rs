use super::consent_harness::{RecordingObserver, storefront};

use std::sync::Arc;

use boltconsent::interception::{DenyList, InterceptionLayer};
use boltconsent::observability::{BlockPath, ConsentEvent};
use boltconsent::page::cookies::cookie_names;
use boltconsent::page::document::Region;
use boltconsent::page::{Element, Page};

const PIXEL: &str = "https://connect.facebook.net/en_US/fbevents.js";

fn layer_on(page: &Arc<Page>) -> (InterceptionLayer, Arc<RecordingObserver>) {
    let observer = Arc::new(RecordingObserver::default());
    let layer = InterceptionLayer::new(
        Arc::clone(page),
        Arc::new(DenyList::default()),
        observer.clone(),
    );
    (layer, observer)
}

fn has_script(page: &Page, src: &str) -> bool {
    page.document()
        .scripts()
        .iter()
        .any(|script| script.src() == Some(src))
}

#[test]
fn uninstall_restores_pristine_behavior() {
    let page = storefront();
    let factory = page.registry().element_factory().get();
    let cookies = page.registry().cookies().get();
    let (layer, _) = layer_on(&page);

    layer.install();
    layer.uninstall();

    assert!(Arc::ptr_eq(&page.registry().element_factory().get(), &factory));
    assert!(Arc::ptr_eq(&page.registry().cookies().get(), &cookies));

    page.write_cookie("_ga=GA1.1.9; path=/");
    assert!(cookie_names(&page.read_cookies()).contains(&"_ga".to_string()));

    let mut script = page.create_element("script");
    assert!(script.set_attribute("src", PIXEL));
    page.document().append(Region::Body, script);
    page.tick();
    assert!(has_script(&page, PIXEL));
}

#[test]
fn blocked_src_assignment_keeps_element_usable() {
    let page = storefront();
    let (layer, observer) = layer_on(&page);
    layer.install();

    let mut script = page.create_element("script");
    assert!(!script.set_attribute("src", PIXEL));
    assert!(script.set_attribute("async", "true"));
    page.document().append(Region::Body, script);
    page.tick();

    assert!(!has_script(&page, PIXEL));
    assert_eq!(
        observer.count(|event| matches!(
            event,
            ConsentEvent::ScriptBlocked { path: BlockPath::Attribute, .. }
        )),
        1
    );
}

#[test]
fn markup_injected_tracker_is_removed_within_one_tick() {
    let page = storefront();
    let (layer, observer) = layer_on(&page);
    layer.install();

    // Parsed markup never goes through the element factory.
    page.document().append(
        Region::Body,
        Element::new("script").with_attribute("src", PIXEL),
    );
    assert!(has_script(&page, PIXEL));
    page.tick();
    assert!(!has_script(&page, PIXEL));
    assert_eq!(
        observer.count(|event| matches!(
            event,
            ConsentEvent::ScriptBlocked { path: BlockPath::Observer, .. }
        )),
        1
    );
}

#[test]
fn third_party_tracking_cookie_never_lands() {
    let page = storefront();
    let (layer, observer) = layer_on(&page);
    layer.install();
    layer.purge_tracking_cookies();

    page.write_cookie("_ga=GA1.1.77; path=/; max-age=63072000");
    page.write_cookie("theme=dark; path=/");
    page.tick();

    let names = cookie_names(&page.read_cookies());
    assert!(!names.contains(&"_ga".to_string()));
    assert!(names.contains(&"theme".to_string()));
    assert_eq!(
        observer.count(|event| matches!(event, ConsentEvent::CookieBlocked { name } if name == "_ga")),
        1
    );
}

#[test]
fn install_and_uninstall_are_idempotent_in_any_order() {
    let page = storefront();
    let factory = page.registry().element_factory().get();
    let (layer, _) = layer_on(&page);

    assert!(!layer.uninstall());
    assert!(layer.install().newly_engaged);
    assert!(!layer.install().newly_engaged);
    assert!(layer.uninstall());
    assert!(!layer.uninstall());
    for _ in 0..3 {
        layer.install();
        layer.uninstall();
    }

    assert!(!layer.is_active());
    assert!(Arc::ptr_eq(&page.registry().element_factory().get(), &factory));
}

#[test]
fn tag_calls_are_swallowed_while_blocked() {
    let page = storefront();
    let queue = page.registry().data_layer().get();
    let (layer, _) = layer_on(&page);
    layer.install();

    page.push_data_layer(serde_json::json!({"event": "page_view"}));
    assert!(page.call_gtag(&[serde_json::json!("event"), serde_json::json!("purchase")]).is_none());
    assert!(page.registry().tag_manager().get().is_none());

    layer.uninstall();
    assert!(queue.entries().is_empty());
    assert!(page.registry().gtag().get().is_none());
}
