use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_API_URL: &str = "http://cokkiesconsent.local/api";

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

/// Engine configuration as read from TOML and the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tenant script identifier (required).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_id: Option<String>,
    /// Tenant API key (required).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Tag-manager container id, e.g. `GTM-XXXX`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gtm_id: Option<String>,
    /// Measurement id, e.g. `G-XXXX`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ga4_id: Option<String>,
    pub deny_list: DenyListConfig,
    pub observability: ObservabilityConfig,
    pub http: HttpConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            script_id: None,
            api_key: None,
            api_url: default_api_url(),
            gtm_id: None,
            ga4_id: None,
            deny_list: DenyListConfig::default(),
            observability: ObservabilityConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Lay the page's configuration object over this config. Present
    /// fields win; absent ones keep the current value.
    pub fn merge(&mut self, overrides: ConfigOverrides) {
        if let Some(script_id) = overrides.script_id {
            self.script_id = Some(script_id);
        }
        if let Some(api_key) = overrides.api_key {
            self.api_key = Some(api_key);
        }
        if let Some(api_url) = overrides.api_url
            && !api_url.trim().is_empty()
        {
            self.api_url = api_url;
        }
        if let Some(gtm_id) = overrides.gtm_id {
            self.gtm_id = Some(gtm_id);
        }
        if let Some(ga4_id) = overrides.ga4_id {
            self.ga4_id = Some(ga4_id);
        }
        if let Some(deny_list) = overrides.deny_list {
            self.deny_list.extend(deny_list);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let blank = |value: &Option<String>| value.as_deref().is_none_or(|v| v.trim().is_empty());
        let mut missing = Vec::new();
        if blank(&self.script_id) {
            missing.push("scriptId");
        }
        if blank(&self.api_key) {
            missing.push("apiKey");
        }
        if !missing.is_empty() {
            return Err(ConfigError::MissingField(missing));
        }

        url::Url::parse(self.api_base())
            .map_err(|e| ConfigError::Validation(format!("apiUrl {:?}: {e}", self.api_url)))?;
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "http.timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// `api_url` without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    pub fn script_id(&self) -> &str {
        self.script_id.as_deref().unwrap_or_default()
    }

    pub fn api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }
}

/// The embedder's `window.BOLT_CONSENT_CONFIG` object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverrides {
    pub script_id: Option<String>,
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub gtm_id: Option<String>,
    pub ga4_id: Option<String>,
    /// Added to any entries the file or environment already configured.
    pub deny_list: Option<DenyListConfig>,
}

impl ConfigOverrides {
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        serde_json::from_value(value.clone())
            .map_err(|e| ConfigError::Validation(format!("invalid page configuration: {e}")))
    }
}

/// Extra deny-list entries appended to the built-in lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenyListConfig {
    /// Substrings matched against script sources.
    pub scripts: Vec<String>,
    /// Cookie name prefixes.
    pub cookies: Vec<String>,
}

impl DenyListConfig {
    /// Append entries not already present.
    pub fn extend(&mut self, other: DenyListConfig) {
        for script in other.scripts {
            if !self.scripts.contains(&script) {
                self.scripts.push(script);
            }
        }
        for cookie in other.cookies {
            if !self.cookies.contains(&cookie) {
                self.cookies.push(cookie);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// "none" | "log"
    pub backend: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            backend: "log".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}
