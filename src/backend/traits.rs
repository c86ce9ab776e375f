use super::types::{BannerSettings, SaveAck, SaveConsentRequest};
use crate::consent::CategoryDefinition;
use crate::error::NetworkError;
use async_trait::async_trait;

/// The consent backend: banner copy, category definitions and the durable
/// record of each decision.
#[async_trait]
pub trait ConsentBackend: Send + Sync {
    /// Banner settings for `hostname`. A payload without a `style` block is
    /// an error; no banner can be drawn from it.
    async fn banner_settings(&self, hostname: &str) -> Result<BannerSettings, NetworkError>;

    async fn categories(&self) -> Result<Vec<CategoryDefinition>, NetworkError>;

    async fn save_consent(&self, request: &SaveConsentRequest) -> Result<SaveAck, NetworkError>;

    fn name(&self) -> &str {
        "backend"
    }
}
