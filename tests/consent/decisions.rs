use super::consent_harness::Site;

use std::collections::BTreeMap;

use boltconsent::consent::{ApplyOutcome, ConsentDecision, SignalChannel};
use boltconsent::engine::SAVE_FAILED_ALERT;
use boltconsent::interception::DenyList;
use boltconsent::ui::MANAGE_ELEMENT_ID;

fn essentials_only() -> BTreeMap<String, bool> {
    BTreeMap::from([
        ("necessary".to_string(), true),
        ("statistics".to_string(), false),
        ("marketing".to_string(), false),
        ("preferences".to_string(), false),
    ])
}

#[tokio::test]
async fn essentials_only_keeps_tag_manager_out() {
    let site = Site::new();
    let engine = site.boot().await;
    engine.save_custom(&essentials_only()).await.unwrap();

    // Third-party code keeps trying after the decision.
    site.page.write_cookie("_ga=GA1.1.123; path=/");
    site.page.tick();

    assert!(
        site.script_srcs()
            .iter()
            .all(|src| !src.contains("googletagmanager.com"))
    );
    assert!(
        site.cookie_names()
            .iter()
            .all(|name| !name.starts_with("_ga"))
    );
}

#[tokio::test]
async fn reject_all_leaves_no_tracking_cookies() {
    let site = Site::new();
    let engine = site.boot().await;
    engine.accept_all().await.unwrap();
    site.page.write_cookie("_ga=GA1.1.1; path=/");
    site.page.write_cookie("_gid=GA1.1.2; path=/");
    site.page.write_cookie("_fbp=fb.1.1; path=/");

    engine.reject_all().await.unwrap();

    let deny_list = DenyList::default();
    let names = site.cookie_names();
    assert!(
        names.iter().all(|name| !deny_list.matches_cookie_name(name)),
        "{names:?}"
    );
    assert!(names.contains(&"cart".to_string()));
}

#[tokio::test]
async fn accept_all_grants_everything_and_disengages() {
    let site = Site::new();
    let engine = site.boot().await;
    engine.accept_all().await.unwrap();

    let signals = engine.signal_state();
    for channel in SignalChannel::ALL {
        assert!(signals.is_granted(channel), "{channel} should be granted");
    }
    assert!(!engine.interception().is_active());
    assert!(!site.banner.is_visible());
    assert_eq!(site.nodes_with_id(MANAGE_ELEMENT_ID), 1);
}

#[tokio::test]
async fn repeating_a_decision_has_no_side_effects() {
    let site = Site::new();
    let engine = site.boot().await;
    let decision = ConsentDecision::from_map(BTreeMap::from([
        ("necessary".to_string(), true),
        ("statistics".to_string(), true),
    ]));

    let first = engine.save_consent(decision.clone()).await.unwrap();
    let scripts_after_first = site.script_srcs();
    let signals_after_first = engine.signal_state();

    let second = engine.save_consent(decision).await.unwrap();
    assert!(matches!(first.outcome, ApplyOutcome::Restored { .. }));
    assert_eq!(second.outcome, ApplyOutcome::Unchanged);
    assert_eq!(site.script_srcs(), scripts_after_first);
    assert_eq!(engine.signal_state(), signals_after_first);
}

#[tokio::test]
async fn racing_decisions_settle_on_the_last_save() {
    let site = Site::new();
    let engine = site.boot().await;

    let (accepted, rejected) = tokio::join!(engine.accept_all(), engine.reject_all());
    accepted.unwrap();
    rejected.unwrap();

    let stored_statistics = engine
        .store()
        .load()
        .unwrap()
        .is_some_and(|decision| decision.is_granted("statistics"));
    assert_eq!(engine.interception().is_active(), !stored_statistics);
    assert_eq!(engine.is_tracking_allowed(), stored_statistics);
}

#[tokio::test]
async fn failed_save_alerts_and_stays_blocked() {
    let site = Site::new();
    let engine = site.boot().await;
    site.backend.set_fail_saves(true);

    assert!(engine.accept_all().await.is_err());
    assert_eq!(site.banner.alerts(), vec![SAVE_FAILED_ALERT.to_string()]);
    assert!(engine.interception().is_active());
    assert!(site.banner.is_visible());

    site.backend.set_fail_saves(false);
    let receipt = engine.accept_all().await.unwrap();
    assert!(receipt.cookie_id.is_some());
    assert!(!engine.interception().is_active());
}

#[tokio::test]
async fn custom_save_cannot_drop_necessary() {
    let site = Site::new();
    let engine = site.boot().await;
    let receipt = engine
        .save_custom(&BTreeMap::from([("necessary".to_string(), false)]))
        .await
        .unwrap();

    assert!(receipt.decision.is_granted("necessary"));
    let saved = site.backend.saved();
    assert_eq!(saved.last().unwrap().categories, vec!["necessary".to_string()]);
}

#[tokio::test]
async fn show_and_hide_toggle_banner_and_manage_control() {
    let site = Site::new();
    let engine = site.boot().await;
    engine.hide_banner();
    assert!(!site.banner.is_visible());
    engine.show_banner();
    assert!(site.banner.is_visible());
}
