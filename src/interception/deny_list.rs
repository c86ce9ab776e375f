//! Tracking deny-lists for script sources and cookie names.

use crate::page::cookies::cookie_write_name;

/// Substrings of script `src` URLs that identify tracking origins.
pub const DEFAULT_SCRIPT_PATTERNS: &[&str] = &[
    "googletagmanager.com",
    "google-analytics.com",
    "analytics",
    "gtag",
    "gtm",
    "facebook.com/tr",
    "connect.facebook.net",
    "twitter.com",
    "doubleclick.net",
    "googleadservices.com",
    "googlesyndication.com",
];

/// Cookie name prefixes for analytics, ad and click-id families.
pub const DEFAULT_COOKIE_PREFIXES: &[&str] = &[
    "_ga",
    "_gid",
    "_gat",
    "_gac_",
    "_gcl_",
    "_dc_gtm",
    "_fbp",
    "_fbc",
    "_utm_",
    "collect",
    "AMP_TOKEN",
    "ads/ga-audiences",
];

/// Cookie names matched exactly.
pub const DEFAULT_COOKIE_NAMES: &[&str] = &["IDE", "test_cookie", "fr", "tr"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenyList {
    scripts: Vec<String>,
    cookie_prefixes: Vec<String>,
    cookie_names: Vec<String>,
}

impl Default for DenyList {
    fn default() -> Self {
        let lower = |items: &[&str]| -> Vec<String> {
            items.iter().map(|item| item.to_ascii_lowercase()).collect()
        };
        Self {
            scripts: lower(DEFAULT_SCRIPT_PATTERNS),
            cookie_prefixes: lower(DEFAULT_COOKIE_PREFIXES),
            cookie_names: lower(DEFAULT_COOKIE_NAMES),
        }
    }
}

impl DenyList {
    /// Built-in lists plus embedder-supplied entries. Extra cookie entries
    /// are treated as prefixes.
    pub fn with_extra(scripts: &[String], cookies: &[String]) -> Self {
        let mut list = Self::default();
        for pattern in scripts {
            let pattern = pattern.trim().to_ascii_lowercase();
            if !pattern.is_empty() && !list.scripts.contains(&pattern) {
                list.scripts.push(pattern);
            }
        }
        for prefix in cookies {
            let prefix = prefix.trim().to_ascii_lowercase();
            if !prefix.is_empty() && !list.cookie_prefixes.contains(&prefix) {
                list.cookie_prefixes.push(prefix);
            }
        }
        list
    }

    pub fn matches_script(&self, src: &str) -> bool {
        let src = src.to_ascii_lowercase();
        self.scripts
            .iter()
            .any(|pattern| src.contains(pattern.as_str()))
    }

    pub fn matches_cookie_name(&self, name: &str) -> bool {
        let name = name.trim().to_ascii_lowercase();
        if name.is_empty() {
            return false;
        }
        self.cookie_names.contains(&name)
            || self
                .cookie_prefixes
                .iter()
                .any(|prefix| name.starts_with(prefix.as_str()))
    }

    /// Whether a raw `document.cookie = ...` assignment targets a tracking cookie.
    pub fn matches_cookie_write(&self, raw: &str) -> bool {
        self.matches_cookie_name(cookie_write_name(raw))
    }
}
