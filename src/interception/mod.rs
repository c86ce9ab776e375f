//! Interception layer: substitutes wrapped capabilities through the page's
//! capability registry so tracking side effects cannot take effect while
//! blocking is engaged.
//!
//! Native originals (element creation, the cookie property) are captured the
//! first time the layer installs and are restored by identity on every
//! release. Tag-manager globals are page-owned and are re-captured on each
//! install.

pub mod deny_list;
pub mod observer;
pub mod wrappers;

pub use deny_list::DenyList;

use crate::error::{ConsentError, InterceptionError};
use crate::observability::{BlockPath, ConsentEvent, Observer};
use crate::page::document::{ElementFactory, ObserverId};
use crate::page::{CookieAccess, DataLayer, Page, TagFunction, cookies::cookie_names};
use observer::ScriptRemovalListener;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use url::Url;
use wrappers::{
    BlockingElementFactory, FilteringCookieAccess, NoopTagFunction, ScriptSourceGuard,
    SinkDataLayer,
};

const GTM_BOOTSTRAP_PATH: &str = "googletagmanager.com/gtm.js";
const GTAG_LOADER_PATH: &str = "googletagmanager.com/gtag/js";

struct NativeOriginals {
    element_factory: Arc<dyn ElementFactory>,
    cookies: Arc<dyn CookieAccess>,
}

struct GlobalOriginals {
    data_layer: Arc<dyn DataLayer>,
    gtag: Option<Arc<dyn TagFunction>>,
    ga: Option<Arc<dyn TagFunction>>,
    tag_manager: Option<Arc<Value>>,
}

/// Tag ids found on tracking scripts before they were removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredTags {
    pub container_id: Option<String>,
    pub measurement_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// `false` when the layer was already engaged.
    pub newly_engaged: bool,
    pub failures: Vec<InterceptionError>,
    pub removed_scripts: usize,
}

#[derive(Default)]
struct InterceptionState {
    natives: Option<NativeOriginals>,
    globals: Option<GlobalOriginals>,
    mutation_observer: Option<ObserverId>,
    sink: Option<Arc<SinkDataLayer>>,
    discovered: DiscoveredTags,
}

pub struct InterceptionLayer {
    page: Arc<Page>,
    deny_list: Arc<DenyList>,
    observer: Arc<dyn Observer>,
    active: Arc<AtomicBool>,
    state: Mutex<InterceptionState>,
}

impl InterceptionLayer {
    pub fn new(page: Arc<Page>, deny_list: Arc<DenyList>, observer: Arc<dyn Observer>) -> Self {
        Self {
            page,
            deny_list,
            observer,
            active: Arc::new(AtomicBool::new(false)),
            state: Mutex::new(InterceptionState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, InterceptionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn deny_list(&self) -> &DenyList {
        &self.deny_list
    }

    pub fn discovered_tags(&self) -> DiscoveredTags {
        self.lock().discovered.clone()
    }

    /// Engage blocking. Idempotent. A capability that cannot be wrapped is
    /// reported in [`InstallReport::failures`]; the layer still counts as
    /// engaged and every other wrap stays in place.
    pub fn install(&self) -> InstallReport {
        let mut state = self.lock();
        if self.active.load(Ordering::SeqCst) {
            return InstallReport::default();
        }

        let registry = self.page.registry();
        let natives = state.natives.get_or_insert_with(|| NativeOriginals {
            element_factory: registry.element_factory().get(),
            cookies: registry.cookies().get(),
        });
        let element_original = Arc::clone(&natives.element_factory);
        let cookie_original = Arc::clone(&natives.cookies);
        state.globals = Some(GlobalOriginals {
            data_layer: registry.data_layer().get(),
            gtag: registry.gtag().get(),
            ga: registry.ga().get(),
            tag_manager: registry.tag_manager().get(),
        });

        self.active.store(true, Ordering::SeqCst);
        let mut failures = Vec::new();

        let guard = Arc::new(ScriptSourceGuard::new(
            Arc::clone(&self.deny_list),
            Arc::clone(&self.observer),
            Arc::clone(&self.active),
        ));
        if let Err(err) = registry
            .element_factory()
            .replace(Arc::new(BlockingElementFactory::new(element_original, guard)))
        {
            failures.push(err);
        }
        if let Err(err) = registry.cookies().replace(Arc::new(FilteringCookieAccess::new(
            cookie_original,
            Arc::clone(&self.deny_list),
            Arc::clone(&self.observer),
        ))) {
            failures.push(err);
        }

        let sink = Arc::new(SinkDataLayer::new());
        if let Err(err) = registry.data_layer().replace(sink.clone()) {
            failures.push(err);
        }
        state.sink = Some(sink);
        let noop: Arc<dyn TagFunction> = Arc::new(NoopTagFunction);
        registry.gtag().replace(Some(Arc::clone(&noop)));
        registry.ga().replace(Some(noop));
        registry.tag_manager().replace(None);

        let listener = Arc::new(ScriptRemovalListener::new(
            Arc::clone(&self.deny_list),
            Arc::clone(&self.observer),
        ));
        state.mutation_observer = Some(self.page.document().observe_subtree(listener));

        Self::discover_tags(&self.page, &mut state.discovered);
        drop(state);

        for failure in &failures {
            let err = ConsentError::from(failure.clone());
            tracing::error!(error = %err, "interception wrap failed; remaining blocked");
            self.observer.record_event(&ConsentEvent::Error {
                component: "interception".into(),
                message: err.to_string(),
            });
        }

        let removed_scripts = self.remove_tracking_scripts();
        self.observer.record_event(&ConsentEvent::InterceptionEngaged {
            failures: failures.len(),
        });
        InstallReport {
            newly_engaged: true,
            failures,
            removed_scripts,
        }
    }

    /// Restore the captured originals. Idempotent; returns `false` when the
    /// layer was not engaged. Never fails: restore errors are logged.
    pub fn uninstall(&self) -> bool {
        let mut state = self.lock();
        if !self.active.swap(false, Ordering::SeqCst) {
            return false;
        }

        if let Some(observer_id) = state.mutation_observer.take()
            && !self.page.document().disconnect(observer_id)
        {
            tracing::warn!(observer_id, "subtree observer was already disconnected");
        }

        let registry = self.page.registry();
        if let Some(natives) = &state.natives {
            if !Arc::ptr_eq(&registry.element_factory().get(), &natives.element_factory)
                && let Err(err) = registry
                    .element_factory()
                    .replace(Arc::clone(&natives.element_factory))
            {
                tracing::warn!(error = %err, "failed to restore element factory");
            }
            if !Arc::ptr_eq(&registry.cookies().get(), &natives.cookies)
                && let Err(err) = registry.cookies().replace(Arc::clone(&natives.cookies))
            {
                tracing::warn!(error = %err, "failed to restore cookie access");
            }
        }

        let sink = state.sink.take();
        if let Some(globals) = state.globals.take() {
            if let Err(err) = registry
                .data_layer()
                .replace(Arc::clone(&globals.data_layer))
            {
                tracing::warn!(error = %err, "failed to restore dataLayer");
            }
            registry.gtag().replace(globals.gtag);
            registry.ga().replace(globals.ga);
            registry.tag_manager().replace(globals.tag_manager);

            if let Some(parked) = sink.and_then(|sink| sink.take_parked()) {
                globals.data_layer.push(parked);
            }
        }
        drop(state);

        self.observer.record_event(&ConsentEvent::InterceptionReleased);
        true
    }

    /// Remove every attached script whose source is deny-listed.
    pub fn remove_tracking_scripts(&self) -> usize {
        let document = self.page.document();
        let mut removed = 0;
        for script in document.scripts() {
            let Some(src) = script.src() else {
                continue;
            };
            if self.deny_list.matches_script(src) && document.remove(script.id) {
                removed += 1;
                self.observer.record_event(&ConsentEvent::ScriptBlocked {
                    src: src.to_string(),
                    path: BlockPath::Install,
                });
            }
        }
        removed
    }

    /// Expire every deny-listed cookie for the host and its dotted domain,
    /// writing through the original cookie property so the purge itself is
    /// not filtered. Returns the number of distinct cookie names purged.
    pub fn purge_tracking_cookies(&self) -> usize {
        let writer = self
            .lock()
            .natives
            .as_ref()
            .map(|natives| Arc::clone(&natives.cookies))
            .unwrap_or_else(|| self.page.registry().cookies().get());

        let hostname = &self.page.navigator().hostname;
        let mut purged = Vec::new();
        for name in cookie_names(&writer.read()) {
            if !self.deny_list.matches_cookie_name(&name) || purged.contains(&name) {
                continue;
            }
            let expiry = format!("{name}=; expires=Thu, 01 Jan 1970 00:00:00 GMT; max-age=0; path=/");
            writer.write(&expiry);
            writer.write(&format!("{expiry}; domain={hostname}"));
            writer.write(&format!("{expiry}; domain=.{hostname}"));
            purged.push(name);
        }

        if !purged.is_empty() {
            tracing::debug!(cookies = ?purged, "purged tracking cookies");
            self.observer.record_event(&ConsentEvent::CookiesPurged {
                count: purged.len(),
            });
        }
        purged.len()
    }

    fn discover_tags(page: &Page, discovered: &mut DiscoveredTags) {
        for script in page.document().scripts() {
            let Some(src) = script.src() else {
                continue;
            };
            if discovered.container_id.is_none() && src.contains(GTM_BOOTSTRAP_PATH) {
                discovered.container_id = query_id(src);
            } else if discovered.measurement_id.is_none() && src.contains(GTAG_LOADER_PATH) {
                discovered.measurement_id = query_id(src);
            }
        }
    }
}

/// The `id` query parameter of a script URL, absolute or not.
fn query_id(src: &str) -> Option<String> {
    let base = Url::parse("https://page.invalid/").ok()?;
    let url = base.join(src).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests;
