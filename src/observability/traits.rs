/// Which interception path caught a tracking script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum BlockPath {
    /// `src` assignment on a factory-created element was dropped.
    Attribute,
    /// The subtree observer removed a newly attached node.
    Observer,
    /// Removed from the document while installing.
    Install,
}

/// Events the observer can record
#[derive(Debug, Clone, PartialEq)]
pub enum ConsentEvent {
    InitSkipped {
        reason: String,
    },
    ConfigurationRejected {
        missing: Vec<String>,
    },
    InterceptionEngaged {
        failures: usize,
    },
    InterceptionReleased,
    ScriptBlocked {
        src: String,
        path: BlockPath,
    },
    CookieBlocked {
        name: String,
    },
    CookiesPurged {
        count: usize,
    },
    ConsentApplied {
        statistics: bool,
        outcome: String,
    },
    TagManagerLoaded {
        container_id: String,
    },
    TagManagerFailed {
        container_id: Option<String>,
        reason: String,
    },
    DecisionSaved {
        cookie_id: Option<String>,
    },
    Error {
        component: String,
        message: String,
    },
}

/// Core observability trait: implement for any backend
pub trait Observer: Send + Sync {
    /// Record a discrete event
    fn record_event(&self, event: &ConsentEvent);

    /// Flush any buffered data (no-op for most backends)
    fn flush(&self) {}

    /// Human-readable name of this observer
    fn name(&self) -> &str;
}
