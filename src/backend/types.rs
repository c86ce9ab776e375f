//! Wire types for the consent backend.

use crate::page::DeviceType;
use crate::util::{flexible_bool, string_or_number};
use serde::{Deserialize, Serialize};

/// `{ success, data, message }` wrapper used by every endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default, deserialize_with = "flexible_bool")]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BannerSettingsData {
    pub settings: Option<BannerSettings>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BannerSettings {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub accept_button_text: String,
    #[serde(default)]
    pub reject_button_text: String,
    #[serde(default)]
    pub manage_button_text: String,
    #[serde(default)]
    pub save_button_text: String,
    #[serde(default)]
    pub cancel_button_text: String,
    #[serde(default = "default_true", deserialize_with = "flexible_bool")]
    pub show_reject_button: bool,
    #[serde(default = "default_true", deserialize_with = "flexible_bool")]
    pub show_manage_button: bool,
    #[serde(default = "default_true", deserialize_with = "flexible_bool")]
    pub show_statistics: bool,
    #[serde(default = "default_true", deserialize_with = "flexible_bool")]
    pub show_marketing: bool,
    #[serde(default = "default_true", deserialize_with = "flexible_bool")]
    pub show_preferences: bool,
    #[serde(default)]
    pub button_position: Option<String>,
    /// Required for a banner to be shown.
    pub style: Option<BannerStyle>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BannerStyle {
    pub background_color: String,
    pub text_color: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub font_family: String,
    pub font_size: String,
}

/// Body of `POST /consent/save`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveConsentRequest {
    pub script_id: String,
    pub api_key: String,
    /// Category key → granted.
    pub consent_data: serde_json::Value,
    pub domain: String,
    pub ip_address: Option<String>,
    pub user_agent: String,
    pub device_type: DeviceType,
    pub language: Option<String>,
    /// Granted category keys.
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SaveAck {
    #[serde(default, deserialize_with = "string_or_number")]
    pub cookie_id: Option<String>,
}
