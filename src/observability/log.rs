use super::traits::{ConsentEvent, Observer};
use tracing::{info, warn};

/// Log-based observer: uses tracing, zero external deps
pub struct LogObserver;

impl LogObserver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for LogObserver {
    fn record_event(&self, event: &ConsentEvent) {
        match event {
            ConsentEvent::InitSkipped { reason } => {
                warn!(reason = %reason, "init.skipped");
            }
            ConsentEvent::ConfigurationRejected { missing } => {
                warn!(missing = ?missing, "config.rejected");
            }
            ConsentEvent::InterceptionEngaged { failures } => {
                info!(failures = failures, "interception.engaged");
            }
            ConsentEvent::InterceptionReleased => {
                info!("interception.released");
            }
            ConsentEvent::ScriptBlocked { src, path } => {
                info!(src = %src, path = %path, "interception.script_blocked");
            }
            ConsentEvent::CookieBlocked { name } => {
                info!(cookie = %name, "interception.cookie_blocked");
            }
            ConsentEvent::CookiesPurged { count } => {
                info!(count = count, "interception.cookies_purged");
            }
            ConsentEvent::ConsentApplied {
                statistics,
                outcome,
            } => {
                info!(statistics = statistics, outcome = %outcome, "consent.applied");
            }
            ConsentEvent::TagManagerLoaded { container_id } => {
                info!(container_id = %container_id, "tag_manager.loaded");
            }
            ConsentEvent::TagManagerFailed {
                container_id,
                reason,
            } => {
                warn!(container_id = ?container_id, reason = %reason, "tag_manager.failed");
            }
            ConsentEvent::DecisionSaved { cookie_id } => {
                info!(cookie_id = ?cookie_id, "consent.saved");
            }
            ConsentEvent::Error { component, message } => {
                warn!(component = %component, error = %message, "error");
            }
        }
    }

    fn name(&self) -> &str {
        "log"
    }
}
