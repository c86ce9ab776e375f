//! Navigator and location facts the engine reports to the backend.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static TABLET_UA: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)tablet|ipad|playbook|silk").ok());

static MOBILE_UA: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"Mobile|Android|iP(hone|od)|IEMobile|BlackBerry|Kindle|Silk-Accelerated|(hpw|web)OS|Opera M(obi|ini)",
    )
    .ok()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceType {
    Tablet,
    Mobile,
    Desktop,
}

impl DeviceType {
    pub fn from_user_agent(user_agent: &str) -> Self {
        let lower = user_agent.to_ascii_lowercase();
        // Android without a later "mobi" token is a tablet.
        let android_tablet = lower
            .rfind("android")
            .is_some_and(|at| !lower[at..].contains("mobi"));
        let tablet = TABLET_UA
            .as_ref()
            .is_some_and(|re| re.is_match(user_agent));
        if tablet || android_tablet {
            return Self::Tablet;
        }
        if MOBILE_UA
            .as_ref()
            .is_some_and(|re| re.is_match(user_agent))
        {
            return Self::Mobile;
        }
        Self::Desktop
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    pub user_agent: String,
    pub language: Option<String>,
    pub hostname: String,
    pub pathname: String,
}

impl Navigator {
    pub fn new(hostname: &str) -> Self {
        Self {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko)"
                .to_string(),
            language: Some("en-US".to_string()),
            hostname: hostname.to_string(),
            pathname: "/".to_string(),
        }
    }

    pub fn device_type(&self) -> DeviceType {
        DeviceType::from_user_agent(&self.user_agent)
    }
}
