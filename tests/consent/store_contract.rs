use super::consent_harness::{Site, storefront};

use std::collections::BTreeMap;

use boltconsent::consent::ConsentDecision;
use boltconsent::consent::store::{COOKIE_ID_KEY, COOKIE_NAME, ConsentStore, STORAGE_KEY};
use boltconsent::page::Page;
use std::sync::Arc;

fn statistics_granted() -> ConsentDecision {
    ConsentDecision::from_map(BTreeMap::from([
        ("necessary".to_string(), true),
        ("statistics".to_string(), true),
    ]))
}

fn saved_store() -> (Arc<Page>, ConsentStore) {
    let page = storefront();
    let store = ConsentStore::new(Arc::clone(&page));
    store.save(&statistics_granted(), Some("ck_7")).unwrap();
    (page, store)
}

#[test]
fn complete_state_exists() {
    let (_, store) = saved_store();
    assert!(store.exists());
    assert_eq!(store.load().unwrap(), Some(statistics_granted()));
}

#[test]
fn missing_cookie_means_absent() {
    let (page, store) = saved_store();
    page.write_cookie(&format!("{COOKIE_NAME}=; max-age=0; path=/"));
    assert!(!store.exists());
    assert_eq!(store.load().unwrap(), None);
    // The local copy alone still answers isTrackingAllowed.
    assert!(store.is_tracking_allowed());
}

#[test]
fn missing_storage_value_means_absent() {
    let (page, store) = saved_store();
    page.storage().remove_item(STORAGE_KEY);
    assert!(!store.exists());
    assert!(!store.is_tracking_allowed());
}

#[test]
fn missing_cookie_id_means_absent() {
    let (page, store) = saved_store();
    page.storage().remove_item(COOKIE_ID_KEY);
    assert!(!store.exists());
}

#[tokio::test]
async fn partial_state_brings_the_banner_back() {
    let first = Site::new();
    first.boot().await.accept_all().await.unwrap();
    first.page.storage().remove_item(COOKIE_ID_KEY);

    let page = Page::builder("shop.example.com")
        .storage(Arc::clone(first.page.storage()))
        .cookies(first.page.registry().cookies().get())
        .build();
    let second = Site::on(page);
    let engine = second.boot().await;

    assert!(engine.interception().is_active());
    assert!(second.banner.is_visible());
}

#[test]
fn category_mirror_cookies_are_written() {
    let (page, _) = saved_store();
    let read = page.read_cookies();
    assert!(read.contains("bolt_consent_statistics=true"));
    assert!(read.contains("bolt_consent_necessary=true"));
}
