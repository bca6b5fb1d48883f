use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use serde::{Deserialize, Serialize};

pub const CSRF_COOKIE: &str = "ct0";

pub type CookieSet = BTreeMap<String, String>;

/// State carried from one login step to the next. Each step consumes the
/// session and hands back the updated one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSession {
    pub guest_token: String,
    pub flow_token: String,
    pub cookies: CookieSet,
}

impl FlowSession {
    pub fn new(guest_token: String) -> Self {
        Self {
            guest_token,
            flow_token: String::new(),
            cookies: CookieSet::new(),
        }
    }

    pub fn with_flow_token(mut self, flow_token: String) -> Self {
        self.flow_token = flow_token;
        self
    }

    pub fn with_cookies<'a>(mut self, set_cookies: impl IntoIterator<Item = &'a String>) -> Self {
        absorb_set_cookies(&mut self.cookies, set_cookies);
        self
    }

    pub fn into_authenticated(self, csrf_token: String, user_handle: Option<String>) -> AuthSession {
        AuthSession {
            user_handle,
            guest_token: self.guest_token,
            csrf_token,
            cookies: self.cookies,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

/// A logged-in session as saved to disk between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user_handle: Option<String>,
    pub guest_token: String,
    pub csrf_token: String,
    pub cookies: CookieSet,
    pub created_at: String,
}

impl AuthSession {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!(
                "no saved session at {}; run `tweetvault login` first",
                path.display()
            );
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read session file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse session file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create session directory {}", parent.display())
            })?;
        }
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw)
            .with_context(|| format!("failed to write session file {}", path.display()))
    }

    /// Merges response cookies and follows a rotated `ct0`.
    pub fn with_cookies<'a>(mut self, set_cookies: impl IntoIterator<Item = &'a String>) -> Self {
        absorb_set_cookies(&mut self.cookies, set_cookies);
        if let Some(csrf) = self.cookies.get(CSRF_COOKIE) {
            self.csrf_token = csrf.clone();
        }
        self
    }
}

pub fn cookie_header(cookies: &CookieSet) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }
    Some(
        cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

pub(crate) fn absorb_set_cookies<'a>(
    cookies: &mut CookieSet,
    set_cookies: impl IntoIterator<Item = &'a String>,
) {
    for raw in set_cookies {
        match parse_set_cookie(raw) {
            Some(ParsedCookie::Set(name, value)) => {
                cookies.insert(name, value);
            }
            Some(ParsedCookie::Expire(name)) => {
                cookies.remove(&name);
            }
            None => tracing::debug!("ignoring malformed set-cookie header"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ParsedCookie {
    Set(String, String),
    Expire(String),
}

pub(crate) fn parse_set_cookie(raw: &str) -> Option<ParsedCookie> {
    let mut parts = raw.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let value = value.trim().trim_matches('"');

    let expired = parts.any(|attr| {
        let Some((key, val)) = attr.split_once('=') else {
            return false;
        };
        key.trim().eq_ignore_ascii_case("max-age")
            && val.trim().parse::<i64>().is_ok_and(|age| age <= 0)
    });

    if expired {
        Some(ParsedCookie::Expire(name.to_string()))
    } else {
        Some(ParsedCookie::Set(name.to_string(), value.to_string()))
    }
}
