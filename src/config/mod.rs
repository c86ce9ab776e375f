mod env_overrides;
mod loader;
pub mod schema;
#[cfg(test)]
mod test_env;

pub use schema::{
    ConfigOverrides, DEFAULT_API_URL, DenyListConfig, EngineConfig, HttpConfig,
    ObservabilityConfig,
};
