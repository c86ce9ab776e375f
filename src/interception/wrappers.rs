//! Wrapped capabilities installed while tracking is blocked.

use super::deny_list::DenyList;
use crate::observability::{BlockPath, ConsentEvent, Observer};
use crate::page::cookies::{CookieAccess, cookie_write_name};
use crate::page::document::{AttributeGuard, Element, ElementFactory};
use crate::page::tag_manager::{CONSENT_UPDATE_EVENT, DataLayer, TagFunction, event_name};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Drops `src` writes that point at a tracking origin.
///
/// Elements keep their guard after the layer is released, so the guard
/// consults the shared `active` flag instead of blocking unconditionally.
pub struct ScriptSourceGuard {
    deny_list: Arc<DenyList>,
    observer: Arc<dyn Observer>,
    active: Arc<AtomicBool>,
}

impl ScriptSourceGuard {
    pub fn new(
        deny_list: Arc<DenyList>,
        observer: Arc<dyn Observer>,
        active: Arc<AtomicBool>,
    ) -> Self {
        Self {
            deny_list,
            observer,
            active,
        }
    }
}

impl AttributeGuard for ScriptSourceGuard {
    fn permits(&self, tag: &str, name: &str, value: &str) -> bool {
        if !self.active.load(Ordering::SeqCst)
            || tag != "script"
            || !name.eq_ignore_ascii_case("src")
            || !self.deny_list.matches_script(value)
        {
            return true;
        }
        self.observer.record_event(&ConsentEvent::ScriptBlocked {
            src: value.to_string(),
            path: BlockPath::Attribute,
        });
        false
    }
}

/// `document.createElement` wrapper: script elements come back guarded.
pub struct BlockingElementFactory {
    inner: Arc<dyn ElementFactory>,
    guard: Arc<ScriptSourceGuard>,
}

impl BlockingElementFactory {
    pub fn new(inner: Arc<dyn ElementFactory>, guard: Arc<ScriptSourceGuard>) -> Self {
        Self { inner, guard }
    }
}

impl ElementFactory for BlockingElementFactory {
    fn create_element(&self, tag: &str) -> Element {
        let element = self.inner.create_element(tag);
        if element.is_script() {
            element.guarded(self.guard.clone())
        } else {
            element
        }
    }
}

/// `document.cookie` wrapper: tracking writes vanish, reads pass through.
pub struct FilteringCookieAccess {
    inner: Arc<dyn CookieAccess>,
    deny_list: Arc<DenyList>,
    observer: Arc<dyn Observer>,
}

impl FilteringCookieAccess {
    pub fn new(
        inner: Arc<dyn CookieAccess>,
        deny_list: Arc<DenyList>,
        observer: Arc<dyn Observer>,
    ) -> Self {
        Self {
            inner,
            deny_list,
            observer,
        }
    }
}

impl CookieAccess for FilteringCookieAccess {
    fn read(&self) -> String {
        self.inner.read()
    }

    fn write(&self, raw: &str) {
        if self.deny_list.matches_cookie_write(raw) {
            self.observer.record_event(&ConsentEvent::CookieBlocked {
                name: cookie_write_name(raw).to_string(),
            });
            return;
        }
        self.inner.write(raw);
    }
}

/// Stand-in `dataLayer`: accepts every push, keeps nothing visible.
///
/// The latest `consent_update` is parked so it can be handed to the real
/// queue when the layer is released.
#[derive(Default)]
pub struct SinkDataLayer {
    parked: Mutex<Option<Value>>,
}

impl SinkDataLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_parked(&self) -> Option<Value> {
        self.parked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl DataLayer for SinkDataLayer {
    fn push(&self, entry: Value) {
        if event_name(&entry) == Some(CONSENT_UPDATE_EVENT) {
            *self.parked.lock().unwrap_or_else(PoisonError::into_inner) = Some(entry);
            return;
        }
        tracing::debug!("dataLayer push swallowed while blocked");
    }

    fn entries(&self) -> Vec<Value> {
        Vec::new()
    }
}

/// `gtag` / `ga` replacement.
pub struct NoopTagFunction;

impl TagFunction for NoopTagFunction {
    fn call(&self, _args: &[Value]) -> Option<Value> {
        None
    }
}
