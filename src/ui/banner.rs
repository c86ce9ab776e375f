use crate::backend::BannerSettings;
use crate::page::document::Region;
use crate::page::Page;
use std::sync::{Arc, Mutex, PoisonError};

pub const BANNER_ELEMENT_ID: &str = "bolt-consent-banner";
/// The floating control that reopens the banner once a decision exists.
pub const MANAGE_ELEMENT_ID: &str = "bolt-consent-manage";

const SHOWN: &str = "display: block";
const HIDDEN: &str = "display: none";

/// Banner and modal presentation. Drawing is out of the engine's hands; it
/// only says when the banner exists and whether it is visible.
pub trait BannerPresenter: Send + Sync {
    /// Replace any existing banner with one built from `settings`.
    fn create_banner(&self, settings: &BannerSettings, visible: bool);

    fn show_banner(&self);

    fn hide_banner(&self);

    /// User-visible failure notice.
    fn alert(&self, message: &str);
}

/// Presenter that keeps one banner node and one manage node in the page
/// document and toggles their `style`.
pub struct DocumentBanner {
    page: Arc<Page>,
    alerts: Mutex<Vec<String>>,
}

impl DocumentBanner {
    pub fn new(page: Arc<Page>) -> Self {
        Self {
            page,
            alerts: Mutex::new(Vec::new()),
        }
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_visible(&self) -> bool {
        self.page
            .document()
            .find_by_element_id(BANNER_ELEMENT_ID)
            .is_some_and(|node| node.attribute("style") == Some(SHOWN))
    }

    fn remove_all(&self, element_id: &str) {
        let document = self.page.document();
        for node in document.nodes() {
            if node.element_id() == Some(element_id) {
                document.remove(node.id);
            }
        }
    }

    fn set_display(&self, element_id: &str, style: &str) {
        let document = self.page.document();
        if let Some(node) = document.find_by_element_id(element_id) {
            document.set_attribute(node.id, "style", style);
        }
    }
}

impl BannerPresenter for DocumentBanner {
    fn create_banner(&self, settings: &BannerSettings, visible: bool) {
        self.remove_all(BANNER_ELEMENT_ID);
        self.remove_all(MANAGE_ELEMENT_ID);

        let mut banner = self.page.create_element("div");
        banner.set_attribute("id", BANNER_ELEMENT_ID);
        banner.set_attribute("role", "dialog");
        banner.set_attribute("aria-label", &settings.title);
        banner.set_attribute("style", if visible { SHOWN } else { HIDDEN });
        if let Some(position) = &settings.button_position {
            banner.set_attribute("data-button-position", position);
        }

        let mut manage = self.page.create_element("div");
        manage.set_attribute("id", MANAGE_ELEMENT_ID);
        manage.set_attribute("style", if visible { HIDDEN } else { SHOWN });

        let document = self.page.document();
        document.append(Region::Body, banner);
        document.append(Region::Body, manage);
        tracing::debug!(visible, title = %settings.title, "banner created");
    }

    fn show_banner(&self) {
        self.set_display(BANNER_ELEMENT_ID, SHOWN);
        self.set_display(MANAGE_ELEMENT_ID, HIDDEN);
    }

    fn hide_banner(&self) {
        self.set_display(BANNER_ELEMENT_ID, HIDDEN);
        self.set_display(MANAGE_ELEMENT_ID, SHOWN);
    }

    fn alert(&self, message: &str) {
        tracing::warn!(message = %message, "alert shown to visitor");
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}
