//! `document.cookie`: the cookie capability and an in-memory jar with the
//! same read/write string semantics.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::sync::{Mutex, PoisonError};

/// Read/write access to the page cookie string.
pub trait CookieAccess: Send + Sync {
    /// `name=value; name2=value2`, as `document.cookie` returns it.
    fn read(&self) -> String;

    /// One raw `Set-Cookie`-style assignment, e.g. `a=1; path=/; max-age=60`.
    fn write(&self, raw: &str);
}

/// A parsed cookie assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieWrite {
    pub name: String,
    pub value: String,
    pub expired: bool,
}

/// Name of the cookie a raw assignment targets.
pub fn cookie_write_name(raw: &str) -> &str {
    let pair = raw.split(';').next().unwrap_or_default();
    pair.split('=').next().unwrap_or_default().trim()
}

pub fn parse_cookie_write(raw: &str) -> Option<CookieWrite> {
    let mut parts = raw.split(';');
    let pair = parts.next()?;
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let mut expired = false;
    for attr in parts {
        let Some((key, val)) = attr.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "max-age" => {
                if val.trim().parse::<i64>().is_ok_and(|secs| secs <= 0) {
                    expired = true;
                }
            }
            "expires" => {
                if parse_expiry(val.trim()).is_some_and(|at| at <= Utc::now()) {
                    expired = true;
                }
            }
            _ => {}
        }
    }

    Some(CookieWrite {
        name: name.to_string(),
        value: value.trim().to_string(),
        expired,
    })
}

fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc2822(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%a, %d %b %Y %H:%M:%S GMT")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Cookie names present in a `document.cookie` read.
pub fn cookie_names(read: &str) -> Vec<String> {
    read.split(';')
        .map(|pair| cookie_write_name(pair).to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

pub fn cookie_value(read: &str, name: &str) -> Option<String> {
    read.split(';').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key.trim() == name).then(|| value.trim().to_string())
    })
}

/// In-memory cookie jar. Insertion order is kept, as browsers do for reads.
#[derive(Default)]
pub struct CookieJar {
    cookies: Mutex<Vec<(String, String)>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cookies(pairs: &[(&str, &str)]) -> Self {
        let jar = Self::new();
        for (name, value) in pairs {
            jar.write(&format!("{name}={value}; path=/"));
        }
        jar
    }

    pub fn names(&self) -> Vec<String> {
        self.cookies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl CookieAccess for CookieJar {
    fn read(&self) -> String {
        self.cookies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn write(&self, raw: &str) {
        let Some(write) = parse_cookie_write(raw) else {
            tracing::debug!(raw = %raw, "ignoring malformed cookie write");
            return;
        };
        let mut cookies = self.cookies.lock().unwrap_or_else(PoisonError::into_inner);
        let existing = cookies.iter().position(|(name, _)| *name == write.name);
        match (existing, write.expired) {
            (Some(index), true) => {
                cookies.remove(index);
            }
            (None, true) => {}
            (Some(index), false) => cookies[index].1 = write.value,
            (None, false) => cookies.push((write.name, write.value)),
        }
    }
}
