//! Script load/error events for injected script elements.

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

#[async_trait]
pub trait ScriptLoader: Send + Sync {
    /// Resolves when the script at `src` fires `load`; `Err` carries the
    /// `error` event description.
    async fn load(&self, src: &str) -> Result<(), String>;
}

/// Loader with a fixed outcome per URL pattern.
#[derive(Default)]
pub struct StaticScriptLoader {
    failing_patterns: Vec<String>,
    requested: Mutex<Vec<String>>,
}

impl StaticScriptLoader {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn failing_for(pattern: &str) -> Self {
        Self {
            failing_patterns: vec![pattern.to_string()],
            ..Self::default()
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ScriptLoader for StaticScriptLoader {
    async fn load(&self, src: &str) -> Result<(), String> {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(src.to_string());
        tokio::task::yield_now().await;
        if self
            .failing_patterns
            .iter()
            .any(|pattern| src.contains(pattern.as_str()))
        {
            return Err(format!("failed to load {src}"));
        }
        Ok(())
    }
}
