use super::traits::ConsentBackend;
use super::types::{BannerSettings, BannerStyle, SaveAck, SaveConsentRequest};
use crate::consent::CategoryDefinition;
use crate::error::NetworkError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Backend served from memory. Backs `simulate --offline` and tests.
pub struct MemoryBackend {
    categories: Vec<CategoryDefinition>,
    banner: Option<BannerSettings>,
    issue_cookie_ids: bool,
    fail_saves: AtomicBool,
    next_id: AtomicU64,
    saved: Mutex<Vec<SaveConsentRequest>>,
    category_fetches: AtomicU64,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            banner: Some(default_banner()),
            issue_cookie_ids: true,
            fail_saves: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
            saved: Mutex::new(Vec::new()),
            category_fetches: AtomicU64::new(0),
        }
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_categories(mut self, categories: Vec<CategoryDefinition>) -> Self {
        self.categories = categories;
        self
    }

    /// Serve no banner settings for any hostname.
    pub fn without_banner(mut self) -> Self {
        self.banner = None;
        self
    }

    /// Acknowledge saves without a `cookie_id`.
    pub fn without_cookie_ids(mut self) -> Self {
        self.issue_cookie_ids = false;
        self
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn saved(&self) -> Vec<SaveConsentRequest> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn category_fetches(&self) -> u64 {
        self.category_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConsentBackend for MemoryBackend {
    async fn banner_settings(&self, hostname: &str) -> Result<BannerSettings, NetworkError> {
        tokio::task::yield_now().await;
        self.banner.clone().ok_or_else(|| NetworkError::Rejected {
            endpoint: format!("banner-settings/{hostname}"),
            message: "Domain not found".into(),
        })
    }

    async fn categories(&self) -> Result<Vec<CategoryDefinition>, NetworkError> {
        tokio::task::yield_now().await;
        self.category_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.categories.clone())
    }

    async fn save_consent(&self, request: &SaveConsentRequest) -> Result<SaveAck, NetworkError> {
        tokio::task::yield_now().await;
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(NetworkError::Status {
                endpoint: "consent/save".into(),
                status: 500,
                message: "HTTP error! status: 500".into(),
            });
        }
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        let cookie_id = self
            .issue_cookie_ids
            .then(|| format!("ck_{}", self.next_id.fetch_add(1, Ordering::SeqCst)));
        Ok(SaveAck { cookie_id })
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// The four categories every tenant starts with.
pub fn default_categories() -> Vec<CategoryDefinition> {
    vec![
        CategoryDefinition {
            description: Some("Required for the site to work.".into()),
            ..CategoryDefinition::new("necessary", "Necessary", true)
        },
        CategoryDefinition {
            description: Some("Anonymous usage measurement.".into()),
            ..CategoryDefinition::new("statistics", "Statistics", false)
        },
        CategoryDefinition {
            description: Some("Advertising and remarketing.".into()),
            ..CategoryDefinition::new("marketing", "Marketing", false)
        },
        CategoryDefinition {
            description: Some("Remembered choices such as language.".into()),
            ..CategoryDefinition::new("preferences", "Preferences", false)
        },
    ]
}

fn default_banner() -> BannerSettings {
    BannerSettings {
        title: "Cookie Consent".into(),
        description: "We use cookies to enhance your browsing experience and analyze our traffic."
            .into(),
        accept_button_text: "Accept All".into(),
        reject_button_text: "Reject All".into(),
        manage_button_text: "Manage Settings".into(),
        save_button_text: "Save Preferences".into(),
        cancel_button_text: "Cancel".into(),
        show_reject_button: true,
        show_manage_button: true,
        show_statistics: true,
        show_marketing: true,
        show_preferences: true,
        button_position: Some("right".into()),
        style: Some(BannerStyle {
            background_color: "#ffffff".into(),
            text_color: "#000000".into(),
            primary_color: "#4CAF50".into(),
            secondary_color: "#f1f1f1".into(),
            font_family: "Arial, sans-serif".into(),
            font_size: "14px".into(),
        }),
    }
}
