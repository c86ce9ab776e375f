use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for the consent engine.
///
/// Each failure class of the engine maps to one variant. Callers of the
/// decision API match on these to decide whether to retry; application glue
/// (CLI, config files) continues to use `anyhow::Result` for context chains.
#[derive(Debug, Error)]
pub enum ConsentError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("configuration: {0}")]
    Configuration(#[from] ConfigError),

    // ── Backend collaborator ────────────────────────────────────────────
    #[error("network: {0}")]
    Network(#[from] NetworkError),

    // ── Interception ────────────────────────────────────────────────────
    #[error("interception: {0}")]
    InterceptionInstall(#[from] InterceptionError),

    // ── Tag-manager bootstrap ───────────────────────────────────────────
    #[error("script load failed: {0}")]
    Load(String),

    // ── Persisted state ─────────────────────────────────────────────────
    #[error("storage: {0}")]
    Storage(String),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required option(s): {}", .0.join(", "))]
    MissingField(Vec<&'static str>),

    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),
}

// ─── Network errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("request to {endpoint} failed: {message}")]
    Request { endpoint: String, message: String },

    #[error("{endpoint} returned HTTP {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("{endpoint} reported failure: {message}")]
    Rejected { endpoint: String, message: String },

    #[error("{endpoint} returned an invalid payload: {message}")]
    InvalidPayload { endpoint: String, message: String },
}

// ─── Interception errors ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterceptionError {
    #[error("capability {capability} is not configurable")]
    NotConfigurable { capability: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_are_listed() {
        let err = ConsentError::Configuration(ConfigError::MissingField(vec!["scriptId", "apiKey"]));
        let text = err.to_string();
        assert!(text.contains("scriptId"));
        assert!(text.contains("apiKey"));
    }

    #[test]
    fn status_error_displays_code() {
        let err = ConsentError::Network(NetworkError::Status {
            endpoint: "consent/save".into(),
            status: 422,
            message: "Invalid API key".into(),
        });
        assert!(err.to_string().contains("422"));
        assert!(err.to_string().contains("Invalid API key"));
    }

    #[test]
    fn interception_error_names_capability() {
        let err = ConsentError::from(InterceptionError::NotConfigurable {
            capability: "document.cookie",
        });
        assert!(err.to_string().contains("document.cookie"));
    }
}
