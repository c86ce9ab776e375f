//! Consent data model, the durable store and reconciliation.

pub mod decision;
pub mod reconcile;
pub mod signals;
pub mod store;

pub use decision::{CategoryDefinition, ConsentDecision, NECESSARY, STATISTICS};
pub use reconcile::{ApplyOutcome, Reconciler, TagIds};
pub use signals::{ConsentSignalState, ConsentStatus, SignalChannel, SignalValue};
pub use store::ConsentStore;
