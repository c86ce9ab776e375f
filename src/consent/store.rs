//! Consent state store: the decision's durable copies in local storage and
//! cookies.

use super::decision::{ConsentDecision, STATISTICS};
use crate::error::ConsentError;
use crate::page::Page;
use crate::page::cookies::cookie_names;
use std::sync::Arc;

/// Local storage key (and mirror cookie name) holding the decision JSON.
pub const STORAGE_KEY: &str = "bolt_consent";
/// Local storage key holding the backend-issued decision id.
pub const COOKIE_ID_KEY: &str = "bolt_consent_cookie_id";
pub const COOKIE_NAME: &str = "bolt_consent";
/// One year.
pub const COOKIE_MAX_AGE_SECS: u64 = 31_536_000;

pub struct ConsentStore {
    page: Arc<Page>,
}

impl ConsentStore {
    pub fn new(page: Arc<Page>) -> Self {
        Self { page }
    }

    /// The valid decision, or `None` when any durable copy is missing.
    pub fn load(&self) -> Result<Option<ConsentDecision>, ConsentError> {
        if !self.exists() {
            return Ok(None);
        }
        self.stored_decision()
    }

    /// The locally persisted decision, whether or not it is complete.
    pub fn stored_decision(&self) -> Result<Option<ConsentDecision>, ConsentError> {
        let Some(raw) = self.page.storage().get_item(STORAGE_KEY) else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| ConsentError::Storage(format!("malformed {STORAGE_KEY}: {e}")))
    }

    /// True only when the stored decision, the stored id and the mirror
    /// cookie are all present.
    pub fn exists(&self) -> bool {
        let storage = self.page.storage();
        let present = |key: &str| {
            storage
                .get_item(key)
                .is_some_and(|value| !value.trim().is_empty())
        };
        present(STORAGE_KEY)
            && present(COOKIE_ID_KEY)
            && cookie_names(&self.page.read_cookies())
                .iter()
                .any(|name| name == COOKIE_NAME)
    }

    /// Persist `decision`, replacing any earlier one. Without a `cookie_id`
    /// the earlier id is dropped, leaving the new decision incomplete.
    pub fn save(
        &self,
        decision: &ConsentDecision,
        cookie_id: Option<&str>,
    ) -> Result<(), ConsentError> {
        let json = serde_json::to_string(decision)
            .map_err(|e| ConsentError::Storage(format!("failed to encode decision: {e}")))?;
        let storage = self.page.storage();
        storage.set_item(STORAGE_KEY, &json);
        match cookie_id.filter(|id| !id.is_empty()) {
            Some(id) => storage.set_item(COOKIE_ID_KEY, id),
            None => storage.remove_item(COOKIE_ID_KEY),
        }

        self.page.write_cookie(&format!(
            "{COOKIE_NAME}={json};path=/;max-age={COOKIE_MAX_AGE_SECS};SameSite=Strict"
        ));
        for (key, granted) in decision.categories() {
            self.page.write_cookie(&format!(
                "{COOKIE_NAME}_{key}={granted};path=/;max-age={COOKIE_MAX_AGE_SECS};SameSite=Strict"
            ));
        }
        tracing::debug!(categories = %json, has_id = cookie_id.is_some(), "consent persisted");
        Ok(())
    }

    pub fn cookie_id(&self) -> Option<String> {
        self.page.storage().get_item(COOKIE_ID_KEY)
    }

    /// Whether the stored decision grants `statistics`. Malformed state
    /// counts as not allowed.
    pub fn is_tracking_allowed(&self) -> bool {
        match self.stored_decision() {
            Ok(Some(decision)) => decision.is_granted(STATISTICS),
            Ok(None) => false,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring unreadable consent state");
                false
            }
        }
    }
}
