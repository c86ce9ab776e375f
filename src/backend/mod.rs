//! Backend collaborator: banner settings, categories and decision records.

pub mod http;
pub mod http_client;
pub mod memory;
pub mod scrub;
pub mod traits;
pub mod types;

pub use http::HttpBackend;
pub use memory::MemoryBackend;
pub use traits::ConsentBackend;
pub use types::{BannerSettings, BannerStyle, SaveAck, SaveConsentRequest};
