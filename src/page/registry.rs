//! Capability registry: the single indirection point through which page code
//! reaches native capabilities (element creation, cookies, tag-manager globals).
//!
//! Each slot holds the implementation currently visible to the page. The
//! interception layer swaps wrapped implementations in and restores the exact
//! captured originals out; identity is preserved because slots hand out the
//! same `Arc` they were given.

use super::cookies::CookieAccess;
use super::document::ElementFactory;
use super::tag_manager::{DataLayer, TagFunction};
use crate::error::InterceptionError;
use arc_swap::{ArcSwap, ArcSwapOption};
use serde_json::Value;
use std::sync::Arc;

/// A swappable, always-present capability.
pub struct CapabilitySlot<T: ?Sized> {
    name: &'static str,
    configurable: bool,
    current: ArcSwap<Arc<T>>,
}

impl<T: ?Sized> CapabilitySlot<T> {
    pub fn new(name: &'static str, imp: Arc<T>) -> Self {
        Self {
            name,
            configurable: true,
            current: ArcSwap::from_pointee(imp),
        }
    }

    /// A slot whose implementation cannot be redefined (a non-configurable
    /// property descriptor in browser terms).
    pub fn locked(name: &'static str, imp: Arc<T>) -> Self {
        Self {
            configurable: false,
            ..Self::new(name, imp)
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_configurable(&self) -> bool {
        self.configurable
    }

    pub fn get(&self) -> Arc<T> {
        Arc::clone(&**self.current.load())
    }

    /// Install `imp`, returning the implementation it replaced.
    pub fn replace(&self, imp: Arc<T>) -> Result<Arc<T>, InterceptionError> {
        if !self.configurable {
            return Err(InterceptionError::NotConfigurable {
                capability: self.name,
            });
        }
        let previous = self.current.swap(Arc::new(imp));
        Ok(Arc::clone(&*previous))
    }
}

/// A swappable capability that may be absent (a page global such as `gtag`).
pub struct OptionalSlot<T: ?Sized> {
    name: &'static str,
    current: ArcSwapOption<Arc<T>>,
}

impl<T: ?Sized> OptionalSlot<T> {
    pub fn new(name: &'static str, imp: Option<Arc<T>>) -> Self {
        Self {
            name,
            current: ArcSwapOption::new(imp.map(Arc::new)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.current.load_full().map(|outer| Arc::clone(&*outer))
    }

    pub fn is_set(&self) -> bool {
        self.current.load().is_some()
    }

    pub fn replace(&self, imp: Option<Arc<T>>) -> Option<Arc<T>> {
        self.current
            .swap(imp.map(Arc::new))
            .map(|outer| Arc::clone(&*outer))
    }
}

/// Every capability the consent engine may intercept.
pub struct CapabilityRegistry {
    element_factory: CapabilitySlot<dyn ElementFactory>,
    cookies: CapabilitySlot<dyn CookieAccess>,
    data_layer: CapabilitySlot<dyn DataLayer>,
    gtag: OptionalSlot<dyn TagFunction>,
    ga: OptionalSlot<dyn TagFunction>,
    tag_manager: OptionalSlot<Value>,
}

impl CapabilityRegistry {
    pub fn new(
        element_factory: CapabilitySlot<dyn ElementFactory>,
        cookies: CapabilitySlot<dyn CookieAccess>,
        data_layer: CapabilitySlot<dyn DataLayer>,
    ) -> Self {
        Self {
            element_factory,
            cookies,
            data_layer,
            gtag: OptionalSlot::new("window.gtag", None),
            ga: OptionalSlot::new("window.ga", None),
            tag_manager: OptionalSlot::new("window.google_tag_manager", None),
        }
    }

    pub fn element_factory(&self) -> &CapabilitySlot<dyn ElementFactory> {
        &self.element_factory
    }

    pub fn cookies(&self) -> &CapabilitySlot<dyn CookieAccess> {
        &self.cookies
    }

    pub fn data_layer(&self) -> &CapabilitySlot<dyn DataLayer> {
        &self.data_layer
    }

    pub fn gtag(&self) -> &OptionalSlot<dyn TagFunction> {
        &self.gtag
    }

    pub fn ga(&self) -> &OptionalSlot<dyn TagFunction> {
        &self.ga
    }

    pub fn tag_manager(&self) -> &OptionalSlot<Value> {
        &self.tag_manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::cookies::CookieJar;

    #[test]
    fn replace_returns_previous_identity() {
        let first: Arc<dyn CookieAccess> = Arc::new(CookieJar::new());
        let second: Arc<dyn CookieAccess> = Arc::new(CookieJar::new());
        let slot = CapabilitySlot::new("document.cookie", Arc::clone(&first));

        let previous = slot.replace(Arc::clone(&second)).unwrap();
        assert!(Arc::ptr_eq(&previous, &first));
        assert!(Arc::ptr_eq(&slot.get(), &second));
    }

    #[test]
    fn locked_slot_refuses_replacement() {
        let jar: Arc<dyn CookieAccess> = Arc::new(CookieJar::new());
        let slot = CapabilitySlot::locked("document.cookie", Arc::clone(&jar));
        let Err(err) = slot.replace(Arc::new(CookieJar::new())) else {
            panic!("locked slot accepted a replacement");
        };
        assert_eq!(
            err,
            InterceptionError::NotConfigurable {
                capability: "document.cookie"
            }
        );
        assert!(Arc::ptr_eq(&slot.get(), &jar));
    }

    #[test]
    fn optional_slot_round_trips_absence() {
        let slot: OptionalSlot<Value> = OptionalSlot::new("window.google_tag_manager", None);
        assert!(!slot.is_set());
        let previous = slot.replace(Some(Arc::new(Value::Bool(true))));
        assert!(previous.is_none());
        assert_eq!(slot.get().as_deref(), Some(&Value::Bool(true)));
    }
}
