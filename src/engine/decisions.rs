//! Decision API: accept-all, reject-all, custom selections and raw saves.

use super::ConsentEngine;
use crate::backend::SaveConsentRequest;
use crate::consent::{ApplyOutcome, CategoryDefinition, ConsentDecision};
use crate::error::ConsentError;
use crate::observability::ConsentEvent;
use std::collections::BTreeMap;

pub const SAVE_FAILED_ALERT: &str = "Failed to save consent preferences. Please try again.";

/// What a successful decision call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionReceipt {
    pub decision: ConsentDecision,
    pub cookie_id: Option<String>,
    pub outcome: ApplyOutcome,
}

impl ConsentEngine {
    /// Category definitions, fetched once and cached after the first success.
    pub async fn categories(&self) -> Result<Vec<CategoryDefinition>, ConsentError> {
        let categories = self
            .categories
            .get_or_try_init(|| async {
                let categories = self.backend.categories().await?;
                tracing::debug!(count = categories.len(), "categories fetched");
                Ok::<_, ConsentError>(categories)
            })
            .await?;
        Ok(categories.clone())
    }

    /// Categories for paths that can proceed without them; required keys
    /// are still forced through `necessary`.
    async fn categories_or_empty(&self) -> Vec<CategoryDefinition> {
        self.categories().await.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "categories unavailable; using built-in required set");
            Vec::new()
        })
    }

    /// Grant every known category.
    pub async fn accept_all(&self) -> Result<DecisionReceipt, ConsentError> {
        let known = self.categories().await?;
        self.commit(ConsentDecision::accept_all(&known)).await
    }

    /// Grant only required categories. Tracking cookies are purged before
    /// the save round-trip.
    pub async fn reject_all(&self) -> Result<DecisionReceipt, ConsentError> {
        let known = self.categories_or_empty().await;
        self.layer.purge_tracking_cookies();
        self.commit(ConsentDecision::reject_all(&known)).await
    }

    /// Caller selections; required categories are forced on.
    pub async fn save_custom(
        &self,
        selections: &BTreeMap<String, bool>,
    ) -> Result<DecisionReceipt, ConsentError> {
        let known = self.categories_or_empty().await;
        self.commit(ConsentDecision::custom(&known, selections)).await
    }

    /// `saveConsent(decision)` from the page namespace.
    pub async fn save_consent(
        &self,
        mut decision: ConsentDecision,
    ) -> Result<DecisionReceipt, ConsentError> {
        let known = self.categories_or_empty().await;
        decision.enforce_required(&known);
        self.commit(decision).await
    }

    fn save_request(&self, decision: &ConsentDecision) -> SaveConsentRequest {
        let navigator = self.page.navigator();
        SaveConsentRequest {
            script_id: self.config.script_id().to_string(),
            api_key: self.config.api_key().to_string(),
            consent_data: serde_json::to_value(decision.categories()).unwrap_or_default(),
            domain: navigator.hostname.clone(),
            ip_address: None,
            user_agent: navigator.user_agent.clone(),
            device_type: navigator.device_type(),
            language: navigator.language.clone(),
            categories: decision.granted_keys(),
        }
    }

    /// Save with the backend, persist, then reconcile. A failed save alerts
    /// the visitor and leaves page state untouched.
    async fn commit(&self, decision: ConsentDecision) -> Result<DecisionReceipt, ConsentError> {
        let request = self.save_request(&decision);
        let ack = match self.backend.save_consent(&request).await {
            Ok(ack) => ack,
            Err(err) => {
                let err = ConsentError::from(err);
                tracing::error!(error = %err, "consent save failed");
                self.presenter.alert(SAVE_FAILED_ALERT);
                self.observer.record_event(&ConsentEvent::Error {
                    component: "backend".into(),
                    message: err.to_string(),
                });
                return Err(err);
            }
        };

        if ack.cookie_id.is_none() {
            tracing::warn!("save acknowledged without cookie_id; decision will not persist across loads");
        }
        self.store.save(&decision, ack.cookie_id.as_deref())?;
        self.observer.record_event(&ConsentEvent::DecisionSaved {
            cookie_id: ack.cookie_id.clone(),
        });
        self.presenter.hide_banner();

        let outcome = self.apply(&decision).await;
        Ok(DecisionReceipt {
            decision,
            cookie_id: ack.cookie_id,
            outcome,
        })
    }
}
