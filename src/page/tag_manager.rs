//! Tag-manager globals: the `dataLayer` queue and the `gtag` / `ga` entry
//! points.

use serde_json::Value;
use std::sync::{Mutex, PoisonError};

/// `window.dataLayer`.
pub trait DataLayer: Send + Sync {
    fn push(&self, entry: Value);

    /// Entries visible to a tag-manager container reading this queue.
    fn entries(&self) -> Vec<Value>;
}

/// A plain array queue, what a page gets from `window.dataLayer = []`.
#[derive(Default)]
pub struct ArrayDataLayer {
    entries: Mutex<Vec<Value>>,
}

impl ArrayDataLayer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DataLayer for ArrayDataLayer {
    fn push(&self, entry: Value) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    fn entries(&self) -> Vec<Value> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// A callable page global such as `gtag(...)` or `ga(...)`.
pub trait TagFunction: Send + Sync {
    fn call(&self, args: &[Value]) -> Option<Value>;
}

/// The standard `gtag` definition: `function gtag(){dataLayer.push(arguments);}`.
pub struct QueueingGtag {
    queue: std::sync::Arc<dyn DataLayer>,
}

impl QueueingGtag {
    pub fn new(queue: std::sync::Arc<dyn DataLayer>) -> Self {
        Self { queue }
    }
}

impl TagFunction for QueueingGtag {
    fn call(&self, args: &[Value]) -> Option<Value> {
        self.queue.push(Value::Array(args.to_vec()));
        None
    }
}

/// Consent event names the engine itself pushes.
pub const CONSENT_UPDATE_EVENT: &str = "consent_update";

pub fn event_name(entry: &Value) -> Option<&str> {
    entry.get("event").and_then(Value::as_str)
}
