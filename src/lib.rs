#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod backend;
pub mod config;
pub mod consent;
pub mod engine;
pub mod error;
pub mod interception;
pub mod observability;
pub mod page;
pub mod ui;
#[doc(hidden)]
pub mod util;

pub use config::EngineConfig;
pub use consent::{ConsentDecision, ConsentSignalState};
pub use engine::{Collaborators, ConsentEngine, Initialization};
pub use error::ConsentError;
