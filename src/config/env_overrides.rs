use super::EngineConfig;

impl EngineConfig {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(script_id) = std::env::var("BOLT_CONSENT_SCRIPT_ID")
            && !script_id.is_empty()
        {
            self.script_id = Some(script_id);
        }

        if let Ok(key) = std::env::var("BOLT_CONSENT_API_KEY")
            && !key.is_empty()
        {
            self.api_key = Some(key);
        }

        if let Ok(url) = std::env::var("BOLT_CONSENT_API_URL")
            && !url.is_empty()
        {
            self.api_url = url;
        }

        if let Ok(gtm_id) = std::env::var("BOLT_CONSENT_GTM_ID")
            && !gtm_id.is_empty()
        {
            self.gtm_id = Some(gtm_id);
        }
    }
}
