use super::http_client::build_backend_client;
use super::scrub::sanitize_api_error;
use super::traits::ConsentBackend;
use super::types::{
    BannerSettings, BannerSettingsData, Envelope, SaveAck, SaveConsentRequest,
};
use crate::config::EngineConfig;
use crate::consent::CategoryDefinition;
use crate::error::NetworkError;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub struct HttpBackend {
    base_url: String,
    api_key: String,
    client: Client,
}

impl HttpBackend {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            base_url: config.api_base().to_string(),
            api_key: config.api_key().to_string(),
            client: build_backend_client(&config.http),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_error(&self, endpoint: &str, err: &reqwest::Error) -> NetworkError {
        NetworkError::Request {
            endpoint: endpoint.to_string(),
            message: sanitize_api_error(&err.to_string(), &self.api_key),
        }
    }

    /// Decode a `{ success, data, message }` body, mapping transport status
    /// and `success: false` to errors.
    async fn read_envelope<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        response: Response,
    ) -> Result<Option<T>, NetworkError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.request_error(endpoint, &e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
            return Err(NetworkError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                message: sanitize_api_error(&message, &self.api_key),
            });
        }

        let envelope: Envelope<T> =
            serde_json::from_str(&body).map_err(|e| NetworkError::InvalidPayload {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;
        if !envelope.success {
            return Err(NetworkError::Rejected {
                endpoint: endpoint.to_string(),
                message: sanitize_api_error(
                    envelope.message.as_deref().unwrap_or("request failed"),
                    &self.api_key,
                ),
            });
        }
        Ok(envelope.data)
    }
}

#[async_trait]
impl ConsentBackend for HttpBackend {
    async fn banner_settings(&self, hostname: &str) -> Result<BannerSettings, NetworkError> {
        let endpoint = format!("banner-settings/{hostname}");
        let url = format!("{}/{endpoint}", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| self.request_error(&endpoint, &e))?;

        let data: Option<BannerSettingsData> = self.read_envelope(&endpoint, response).await?;
        match data.and_then(|data| data.settings) {
            Some(settings) if settings.style.is_some() => Ok(settings),
            _ => Err(NetworkError::InvalidPayload {
                endpoint,
                message: "banner settings without style".into(),
            }),
        }
    }

    async fn categories(&self) -> Result<Vec<CategoryDefinition>, NetworkError> {
        let endpoint = "categories";
        let url = format!("{}/{endpoint}", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| self.request_error(endpoint, &e))?;

        let data: Option<Vec<CategoryDefinition>> =
            self.read_envelope(endpoint, response).await?;
        Ok(data.unwrap_or_default())
    }

    async fn save_consent(&self, request: &SaveConsentRequest) -> Result<SaveAck, NetworkError> {
        let endpoint = "consent/save";
        let url = format!("{}/{endpoint}", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| self.request_error(endpoint, &e))?;

        let ack: Option<SaveAck> = self.read_envelope(endpoint, response).await?;
        Ok(ack.unwrap_or_default())
    }

    fn name(&self) -> &str {
        "http"
    }
}
