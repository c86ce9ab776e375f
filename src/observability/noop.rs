use super::traits::{ConsentEvent, Observer};

/// Zero-overhead observer: all methods compile to nothing
pub struct NoopObserver;

impl Observer for NoopObserver {
    #[inline(always)]
    fn record_event(&self, _event: &ConsentEvent) {}

    fn name(&self) -> &str {
        "noop"
    }
}
