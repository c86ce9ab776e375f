#![allow(dead_code)]

use std::sync::{Arc, Mutex, PoisonError};

use boltconsent::backend::MemoryBackend;
use boltconsent::config::EngineConfig;
use boltconsent::engine::{Collaborators, ConsentEngine, Initialization};
use boltconsent::error::ConsentError;
use boltconsent::observability::{ConsentEvent, Observer};
use boltconsent::page::cookies::cookie_names;
use boltconsent::page::document::Region;
use boltconsent::page::{CookieJar, Element, Page};
use boltconsent::ui::DocumentBanner;

pub const HOSTNAME: &str = "shop.example.com";
pub const GTM_SNIPPET: &str = "https://www.googletagmanager.com/gtm.js?id=GTM-SHOP";
pub const GA4_SNIPPET: &str = "https://www.googletagmanager.com/gtag/js?id=G-SHOP";

/// Observer that keeps every event for later assertions.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ConsentEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<ConsentEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, predicate: impl Fn(&ConsentEvent) -> bool) -> usize {
        self.events().iter().filter(|event| predicate(event)).count()
    }
}

impl Observer for RecordingObserver {
    fn record_event(&self, event: &ConsentEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// A storefront page with tag snippets and analytics cookies already set.
pub fn storefront() -> Arc<Page> {
    let page = Page::builder(HOSTNAME)
        .cookies(Arc::new(CookieJar::with_cookies(&[
            ("_ga", "GA1.1.1"),
            ("_gid", "GA1.1.2"),
            ("_fbp", "fb.1.1"),
            ("cart", "3"),
        ])))
        .build();
    for src in [GTM_SNIPPET, GA4_SNIPPET, "/assets/app.js"] {
        page.document()
            .append(Region::Head, Element::new("script").with_attribute("src", src));
    }
    page
}

pub fn config() -> EngineConfig {
    EngineConfig {
        script_id: Some("script_1".into()),
        api_key: Some("key_1".into()),
        ..EngineConfig::default()
    }
}

pub struct Site {
    pub page: Arc<Page>,
    pub backend: Arc<MemoryBackend>,
    pub banner: Arc<DocumentBanner>,
    pub observer: Arc<RecordingObserver>,
}

impl Site {
    pub fn new() -> Self {
        Self::on(storefront())
    }

    pub fn on(page: Arc<Page>) -> Self {
        Self {
            banner: Arc::new(DocumentBanner::new(Arc::clone(&page))),
            page,
            backend: Arc::new(MemoryBackend::new()),
            observer: Arc::new(RecordingObserver::default()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            backend: self.backend.clone(),
            presenter: self.banner.clone(),
            observer: self.observer.clone(),
        }
    }

    pub async fn boot_with(&self, config: EngineConfig) -> Result<Initialization, ConsentError> {
        ConsentEngine::initialize(Arc::clone(&self.page), config, self.collaborators()).await
    }

    pub async fn boot(&self) -> Arc<ConsentEngine> {
        self.boot_with(config())
            .await
            .expect("engine initializes")
            .engine()
            .expect("first initialization is not skipped")
    }

    pub fn cookie_names(&self) -> Vec<String> {
        cookie_names(&self.page.read_cookies())
    }

    pub fn script_srcs(&self) -> Vec<String> {
        self.page
            .document()
            .scripts()
            .iter()
            .filter_map(|script| script.src().map(str::to_string))
            .collect()
    }

    pub fn nodes_with_id(&self, id: &str) -> usize {
        self.page
            .document()
            .nodes()
            .iter()
            .filter(|node| node.element_id() == Some(id))
            .count()
    }
}
