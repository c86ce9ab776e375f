//! Reconciliation: the single place where a decision becomes page behaviour.
//!
//! `apply` runs four steps in fixed order: derive the signal state, push it
//! onto the tag-manager queue, then either release interception and load the
//! tag-manager bootstrap (statistics granted) or engage interception and
//! purge tracking cookies (statistics denied or no decision). Each call
//! recomputes everything from its own decision, so the end state does not
//! depend on what was applied before.

use super::decision::{ConsentDecision, STATISTICS};
use super::signals::{ConsentSignalState, consent_update_event};
use crate::error::ConsentError;
use crate::interception::InterceptionLayer;
use crate::observability::{ConsentEvent, Observer};
use crate::page::document::Region;
use crate::page::tag_manager::{QueueingGtag, TagFunction};
use crate::page::Page;
use serde_json::{Value, json};
use std::sync::{Arc, PoisonError};
use tokio::sync::Mutex;

/// Element id of the bootstrap script the engine injects.
pub const BOOTSTRAP_ELEMENT_ID: &str = "bolt-consent-gtm";
const GTM_BOOTSTRAP_URL: &str = "https://www.googletagmanager.com/gtm.js";

#[derive(Debug, Clone, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ApplyOutcome {
    /// Same decision as the last apply and the posture still matches.
    Unchanged,
    Blocked { purged_cookies: usize },
    Restored { container_id: String },
    /// Tracking was released but the bootstrap did not load. Blocking is
    /// not re-engaged.
    RestoreFailed { reason: String },
}

#[derive(Debug, Clone, Default)]
pub struct TagIds {
    pub container_id: Option<String>,
    pub measurement_id: Option<String>,
}

#[derive(Default)]
struct ReconcileState {
    last: Option<Option<ConsentDecision>>,
}

pub struct Reconciler {
    page: Arc<Page>,
    layer: Arc<InterceptionLayer>,
    observer: Arc<dyn Observer>,
    tags: TagIds,
    state: Mutex<ReconcileState>,
    /// Decision of the last completed apply, readable without awaiting.
    applied: std::sync::Mutex<Option<ConsentDecision>>,
}

impl Reconciler {
    pub fn new(
        page: Arc<Page>,
        layer: Arc<InterceptionLayer>,
        observer: Arc<dyn Observer>,
        tags: TagIds,
    ) -> Self {
        Self {
            page,
            layer,
            observer,
            tags,
            state: Mutex::new(ReconcileState::default()),
            applied: std::sync::Mutex::new(None),
        }
    }

    pub fn layer(&self) -> &Arc<InterceptionLayer> {
        &self.layer
    }

    /// The decision the page currently reflects; `None` before any apply or
    /// after applying an absent decision.
    pub fn applied_decision(&self) -> Option<ConsentDecision> {
        self.applied
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Make `decision` observable on the page. `None` means no decision yet.
    pub async fn apply(&self, decision: Option<&ConsentDecision>) -> ApplyOutcome {
        let mut state = self.state.lock().await;
        let statistics = decision.is_some_and(|decision| decision.is_granted(STATISTICS));

        let posture_matches = self.layer.is_active() != statistics;
        if posture_matches && state.last.as_ref() == Some(&decision.cloned()) {
            tracing::debug!(statistics, "consent unchanged; skipping apply");
            return ApplyOutcome::Unchanged;
        }

        let signals = ConsentSignalState::from_decision(decision);
        self.page
            .push_data_layer(consent_update_event(&signals, decision));

        let outcome = if statistics {
            self.restore_tracking().await
        } else {
            self.block_tracking()
        };

        state.last = Some(decision.cloned());
        *self.applied.lock().unwrap_or_else(PoisonError::into_inner) = decision.cloned();
        self.observer.record_event(&ConsentEvent::ConsentApplied {
            statistics,
            outcome: outcome.to_string(),
        });
        outcome
    }

    fn block_tracking(&self) -> ApplyOutcome {
        self.layer.install();
        self.layer.remove_tracking_scripts();
        let purged_cookies = self.layer.purge_tracking_cookies();
        ApplyOutcome::Blocked { purged_cookies }
    }

    async fn restore_tracking(&self) -> ApplyOutcome {
        self.layer.uninstall();
        self.remove_previous_bootstrap();

        let discovered = self.layer.discovered_tags();
        let Some(container_id) = self
            .tags
            .container_id
            .clone()
            .or(discovered.container_id)
        else {
            let reason = "no tag manager container id configured or discovered".to_string();
            tracing::warn!("{reason}");
            self.observer.record_event(&ConsentEvent::TagManagerFailed {
                container_id: None,
                reason: reason.clone(),
            });
            return ApplyOutcome::RestoreFailed { reason };
        };

        self.page.push_data_layer(json!({
            "gtm.start": chrono::Utc::now().timestamp_millis(),
            "event": "gtm.js",
        }));

        let src = format!("{GTM_BOOTSTRAP_URL}?id={container_id}");
        let mut script = self.page.create_element("script");
        script.set_attribute("id", BOOTSTRAP_ELEMENT_ID);
        script.set_attribute("async", "true");
        script.set_attribute("src", &src);
        self.page.document().append(Region::Head, script);

        if let Err(reason) = self.page.loader().load(&src).await {
            let err = ConsentError::Load(reason.clone());
            tracing::error!(error = %err, container_id = %container_id, "tag manager bootstrap failed");
            self.observer.record_event(&ConsentEvent::TagManagerFailed {
                container_id: Some(container_id),
                reason: reason.clone(),
            });
            return ApplyOutcome::RestoreFailed { reason };
        }

        self.start_gtag(discovered.measurement_id);
        self.observer.record_event(&ConsentEvent::TagManagerLoaded {
            container_id: container_id.clone(),
        });
        ApplyOutcome::Restored { container_id }
    }

    fn remove_previous_bootstrap(&self) {
        let document = self.page.document();
        for script in document.scripts() {
            let injected = script.element_id() == Some(BOOTSTRAP_ELEMENT_ID)
                || script
                    .src()
                    .is_some_and(|src| src.starts_with(GTM_BOOTSTRAP_URL));
            if injected {
                document.remove(script.id);
            }
        }
    }

    fn start_gtag(&self, discovered_measurement_id: Option<String>) {
        let registry = self.page.registry();
        if !registry.gtag().is_set() {
            let shim: Arc<dyn TagFunction> =
                Arc::new(QueueingGtag::new(registry.data_layer().get()));
            registry.gtag().replace(Some(shim));
        }
        let timestamp = Value::String(chrono::Utc::now().to_rfc3339());
        self.page.call_gtag(&[json!("js"), timestamp]);
        if let Some(measurement_id) = self
            .tags
            .measurement_id
            .clone()
            .or(discovered_measurement_id)
        {
            self.page.call_gtag(&[json!("config"), json!(measurement_id)]);
        }
    }
}
