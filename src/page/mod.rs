//! The host page as the consent engine sees it.
//!
//! Everything the engine touches on the page goes through this module: the
//! capability registry for interceptable natives, the document, local
//! storage, the script loader and a handful of window globals. In-memory
//! implementations are provided so the engine runs without a browser.

pub mod cookies;
pub mod document;
pub mod loader;
pub mod navigator;
pub mod registry;
pub mod storage;
pub mod tag_manager;

pub use cookies::{CookieAccess, CookieJar};
pub use document::{
    AttachedNode, Document, Element, ElementFactory, InMemoryDocument, MutationListener,
    NativeElementFactory, NodeId, Region,
};
pub use loader::{ScriptLoader, StaticScriptLoader};
pub use navigator::{DeviceType, Navigator};
pub use registry::{CapabilityRegistry, CapabilitySlot, OptionalSlot};
pub use storage::{LocalStorage, MemoryStorage};
pub use tag_manager::{ArrayDataLayer, DataLayer, TagFunction};

use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Window-level globals shared by every copy of the snippet on the page.
pub struct WindowGlobals {
    initialized: AtomicBool,
    consent_config: Option<Value>,
}

impl WindowGlobals {
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Set the initialization flag. Returns `false` if another engine
    /// already set it.
    pub fn mark_initialized(&self) -> bool {
        self.initialized
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// The embedder's configuration object, if any.
    pub fn consent_config(&self) -> Option<&Value> {
        self.consent_config.as_ref()
    }
}

pub struct Page {
    registry: CapabilityRegistry,
    document: Arc<dyn Document>,
    storage: Arc<dyn LocalStorage>,
    loader: Arc<dyn ScriptLoader>,
    navigator: Navigator,
    globals: WindowGlobals,
}

impl Page {
    pub fn builder(hostname: &str) -> PageBuilder {
        PageBuilder::new(hostname)
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn document(&self) -> &Arc<dyn Document> {
        &self.document
    }

    pub fn storage(&self) -> &Arc<dyn LocalStorage> {
        &self.storage
    }

    pub fn loader(&self) -> &Arc<dyn ScriptLoader> {
        &self.loader
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn globals(&self) -> &WindowGlobals {
        &self.globals
    }

    /// `document.createElement(tag)` through whatever factory is installed.
    pub fn create_element(&self, tag: &str) -> Element {
        self.registry.element_factory().get().create_element(tag)
    }

    /// `document.cookie = raw`.
    pub fn write_cookie(&self, raw: &str) {
        self.registry.cookies().get().write(raw);
    }

    /// `document.cookie`.
    pub fn read_cookies(&self) -> String {
        self.registry.cookies().get().read()
    }

    /// `window.dataLayer.push(entry)`.
    pub fn push_data_layer(&self, entry: Value) {
        self.registry.data_layer().get().push(entry);
    }

    /// `window.gtag(...args)`; `None` when `gtag` is undefined.
    pub fn call_gtag(&self, args: &[Value]) -> Option<Value> {
        self.registry.gtag().get().and_then(|gtag| gtag.call(args))
    }

    /// Let pending mutation observers run.
    pub fn tick(&self) {
        self.document.deliver_mutations();
    }
}

pub struct PageBuilder {
    navigator: Navigator,
    document: Option<Arc<dyn Document>>,
    cookies: Option<Arc<dyn CookieAccess>>,
    cookies_locked: bool,
    storage: Option<Arc<dyn LocalStorage>>,
    loader: Option<Arc<dyn ScriptLoader>>,
    data_layer: Option<Arc<dyn DataLayer>>,
    gtag: Option<Arc<dyn TagFunction>>,
    consent_config: Option<Value>,
}

impl PageBuilder {
    pub fn new(hostname: &str) -> Self {
        Self {
            navigator: Navigator::new(hostname),
            document: None,
            cookies: None,
            cookies_locked: false,
            storage: None,
            loader: None,
            data_layer: None,
            gtag: None,
            consent_config: None,
        }
    }

    pub fn navigator(mut self, navigator: Navigator) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.navigator.user_agent = user_agent.to_string();
        self
    }

    pub fn document(mut self, document: Arc<dyn Document>) -> Self {
        self.document = Some(document);
        self
    }

    pub fn cookies(mut self, cookies: Arc<dyn CookieAccess>) -> Self {
        self.cookies = Some(cookies);
        self
    }

    /// Make the cookie property non-configurable.
    pub fn lock_cookies(mut self) -> Self {
        self.cookies_locked = true;
        self
    }

    pub fn storage(mut self, storage: Arc<dyn LocalStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn loader(mut self, loader: Arc<dyn ScriptLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn data_layer(mut self, data_layer: Arc<dyn DataLayer>) -> Self {
        self.data_layer = Some(data_layer);
        self
    }

    pub fn gtag(mut self, gtag: Arc<dyn TagFunction>) -> Self {
        self.gtag = Some(gtag);
        self
    }

    /// `window.BOLT_CONSENT_CONFIG = {...}`.
    pub fn consent_config(mut self, config: Value) -> Self {
        self.consent_config = Some(config);
        self
    }

    pub fn build(self) -> Arc<Page> {
        let cookies = self
            .cookies
            .unwrap_or_else(|| Arc::new(CookieJar::new()) as Arc<dyn CookieAccess>);
        let cookie_slot = if self.cookies_locked {
            CapabilitySlot::locked("document.cookie", cookies)
        } else {
            CapabilitySlot::new("document.cookie", cookies)
        };
        let registry = CapabilityRegistry::new(
            CapabilitySlot::new(
                "document.createElement",
                Arc::new(NativeElementFactory) as Arc<dyn ElementFactory>,
            ),
            cookie_slot,
            CapabilitySlot::new(
                "window.dataLayer",
                self.data_layer
                    .unwrap_or_else(|| Arc::new(ArrayDataLayer::new()) as Arc<dyn DataLayer>),
            ),
        );
        registry.gtag().replace(self.gtag);

        Arc::new(Page {
            registry,
            document: self
                .document
                .unwrap_or_else(|| Arc::new(InMemoryDocument::new()) as Arc<dyn Document>),
            storage: self
                .storage
                .unwrap_or_else(|| Arc::new(MemoryStorage::new()) as Arc<dyn LocalStorage>),
            loader: self
                .loader
                .unwrap_or_else(|| Arc::new(StaticScriptLoader::succeeding()) as Arc<dyn ScriptLoader>),
            navigator: self.navigator,
            globals: WindowGlobals {
                initialized: AtomicBool::new(false),
                consent_config: self.consent_config,
            },
        })
    }
}
