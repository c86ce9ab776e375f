//! Initialization controller and the engine state it owns.
//!
//! One `ConsentEngine` exists per page. `initialize` runs the
//! `Uninitialized → Installing → Ready` sequence once; a second call on the
//! same page is skipped with a diagnostic.

mod decisions;

pub use decisions::{DecisionReceipt, SAVE_FAILED_ALERT};

use crate::backend::{ConsentBackend, HttpBackend};
use crate::config::{ConfigOverrides, EngineConfig};
use crate::consent::{
    ApplyOutcome, CategoryDefinition, ConsentSignalState, ConsentStore, Reconciler, TagIds,
};
use crate::error::{ConfigError, ConsentError};
use crate::interception::{DenyList, InterceptionLayer};
use crate::observability::{ConsentEvent, Observer, create_observer};
use crate::page::Page;
use crate::ui::{BannerPresenter, DocumentBanner};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    Uninitialized,
    Installing,
    Ready,
}

/// External collaborators the engine talks to.
pub struct Collaborators {
    pub backend: Arc<dyn ConsentBackend>,
    pub presenter: Arc<dyn BannerPresenter>,
    pub observer: Arc<dyn Observer>,
}

impl Collaborators {
    /// HTTP backend, document banner and the configured observer.
    pub fn for_page(page: &Arc<Page>, config: &EngineConfig) -> Self {
        Self {
            backend: Arc::new(HttpBackend::new(config)),
            presenter: Arc::new(DocumentBanner::new(Arc::clone(page))),
            observer: create_observer(&config.observability),
        }
    }
}

pub enum Initialization {
    Ready(Arc<ConsentEngine>),
    /// Another engine already initialized this page.
    Skipped,
}

impl Initialization {
    pub fn engine(self) -> Option<Arc<ConsentEngine>> {
        match self {
            Self::Ready(engine) => Some(engine),
            Self::Skipped => None,
        }
    }
}

pub struct ConsentEngine {
    page: Arc<Page>,
    config: EngineConfig,
    phase: Mutex<Phase>,
    layer: Arc<InterceptionLayer>,
    store: ConsentStore,
    reconciler: Reconciler,
    backend: Arc<dyn ConsentBackend>,
    presenter: Arc<dyn BannerPresenter>,
    observer: Arc<dyn Observer>,
    categories: OnceCell<Vec<CategoryDefinition>>,
}

impl ConsentEngine {
    /// Bootstrap the engine on `page`.
    ///
    /// The page's own configuration object is merged over `config`. Missing
    /// `scriptId`/`apiKey` aborts with [`ConsentError::Configuration`] before
    /// anything is installed. Network failures while fetching the banner are
    /// logged and leave the engine blocked.
    pub async fn initialize(
        page: Arc<Page>,
        mut config: EngineConfig,
        collaborators: Collaborators,
    ) -> Result<Initialization, ConsentError> {
        let observer = Arc::clone(&collaborators.observer);
        if page.globals().is_initialized() {
            return Ok(Self::skip(observer.as_ref()));
        }

        if let Some(raw) = page.globals().consent_config() {
            config.merge(ConfigOverrides::from_value(raw)?);
        }
        if let Err(err) = config.validate() {
            if let ConfigError::MissingField(fields) = &err {
                observer.record_event(&ConsentEvent::ConfigurationRejected {
                    missing: fields.iter().map(|field| (*field).to_string()).collect(),
                });
            }
            tracing::error!(error = %err, "consent engine not started");
            return Err(err.into());
        }

        if !page.globals().mark_initialized() {
            return Ok(Self::skip(observer.as_ref()));
        }

        let engine = Arc::new(Self::assemble(page, config, collaborators));
        engine.transition(Phase::Installing);

        let report = engine.layer.install();
        if !report.failures.is_empty() {
            tracing::warn!(
                failures = report.failures.len(),
                "interception partially installed; treating page as blocked"
            );
        }

        let decision = if engine.store.exists() {
            engine.store.load().unwrap_or_else(|err| {
                tracing::warn!(error = %err, "stored consent unreadable; staying blocked");
                None
            })
        } else {
            None
        };
        let has_decision = decision.is_some();
        let outcome = engine.reconciler.apply(decision.as_ref()).await;
        tracing::info!(has_decision, outcome = %outcome, "initial consent applied");

        engine.mount_banner(!has_decision).await;
        engine.transition(Phase::Ready);
        Ok(Initialization::Ready(engine))
    }

    fn skip(observer: &dyn Observer) -> Initialization {
        observer.record_event(&ConsentEvent::InitSkipped {
            reason: "consent engine already initialized on this page".into(),
        });
        Initialization::Skipped
    }

    fn assemble(page: Arc<Page>, config: EngineConfig, collaborators: Collaborators) -> Self {
        let deny_list = Arc::new(DenyList::with_extra(
            &config.deny_list.scripts,
            &config.deny_list.cookies,
        ));
        let layer = Arc::new(InterceptionLayer::new(
            Arc::clone(&page),
            deny_list,
            Arc::clone(&collaborators.observer),
        ));
        let reconciler = Reconciler::new(
            Arc::clone(&page),
            Arc::clone(&layer),
            Arc::clone(&collaborators.observer),
            TagIds {
                container_id: config.gtm_id.clone(),
                measurement_id: config.ga4_id.clone(),
            },
        );
        Self {
            store: ConsentStore::new(Arc::clone(&page)),
            page,
            config,
            phase: Mutex::new(Phase::Uninitialized),
            layer,
            reconciler,
            backend: collaborators.backend,
            presenter: collaborators.presenter,
            observer: collaborators.observer,
            categories: OnceCell::new(),
        }
    }

    fn transition(&self, to: Phase) {
        let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(from = %*phase, to = %to, "engine phase");
        *phase = to;
    }

    async fn mount_banner(&self, visible: bool) {
        let hostname = &self.page.navigator().hostname;
        match self.backend.banner_settings(hostname).await {
            Ok(settings) => self.presenter.create_banner(&settings, visible),
            Err(err) => {
                let err = ConsentError::from(err);
                tracing::warn!(error = %err, hostname = %hostname, "no banner for this page");
                self.observer.record_event(&ConsentEvent::Error {
                    component: "banner".into(),
                    message: err.to_string(),
                });
            }
        }
    }

    pub fn phase(&self) -> Phase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn page(&self) -> &Arc<Page> {
        &self.page
    }

    pub fn interception(&self) -> &Arc<InterceptionLayer> {
        &self.layer
    }

    pub fn store(&self) -> &ConsentStore {
        &self.store
    }

    /// Signal state for the decision the page currently reflects. Follows
    /// the last apply, not the durable-copy check, so it always agrees with
    /// the interception posture.
    pub fn signal_state(&self) -> ConsentSignalState {
        ConsentSignalState::from_decision(self.reconciler.applied_decision().as_ref())
    }

    pub fn show_banner(&self) {
        self.presenter.show_banner();
    }

    pub fn hide_banner(&self) {
        self.presenter.hide_banner();
    }

    pub fn is_tracking_allowed(&self) -> bool {
        self.store.is_tracking_allowed()
    }

    async fn apply(&self, decision: &crate::consent::ConsentDecision) -> ApplyOutcome {
        self.reconciler.apply(Some(decision)).await
    }
}
