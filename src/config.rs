use std::fmt;
use std::path::PathBuf;

use crate::cli::{Cli, LoginArgs};

pub const GUEST_ACTIVATE_URL: &str = "https://api.twitter.com/1.1/guest/activate.json";
pub const TASK_URL: &str = "https://twitter.com/i/api/1.1/onboarding/task.json";
pub const LIKES_URL: &str = "https://twitter.com/i/api/graphql/2Z6LYO4UTM4BnWjaNCod6g/Likes";
pub const DM_INBOX_URL: &str = "https://twitter.com/i/api/1.1/dm/inbox_initial_state.json";

/// Fingerprint blob recorded from a browser session. The server only checks
/// that something plausible is submitted for the instrumentation subtask.
pub const DEFAULT_JS_INSTRUMENTATION: &str = r#"{"rf":{"a560cdc18ff70ce7662311eac0f2441dd3d3ed27c354f082f587e7a30d1a7d5f":72,"a8e890b5fec154e7af62d8f529fbec5942dfdd7ad41597245b71a3fbdc9a180d":176,"a3c24597ad4c862773c74b9194e675e96a7607708f6bbd0babcfdf8b109ed86d":-161,"af9847e2cd4e9a0ca23853da4b46bf00a2e801f98dc819ee0dd6ecc1032273fa":-8},"s":"hOai7h2KQi4RBGKSYLUhH0Y0fBm5KHIJgxD5AmNKtwP7N8gpVuAqP8o9n2FpCnNeR1d6XbB0QWkGAHiXkKao5PhaeXEZgPJU1neLcVgTnGuFzpjDnGutCUgYaxNiwUPfDX0eQkgr_q7GWmbB7yyYPt32dqSd5yt-KCpSt7MOG4aFmGf11xWE4MTpXfkefbnX4CwZeEFKQQYzJptOvmUWa7qI0A69BSOs7HZ_4Wry2TwB9k03Q_S-MDZAZ3yB_L7WoosVVb1e84YWgaLWWzqhz4C77jDy6isT8EKSWKWnVctsIcaqM_wMV8AiYa5lr0_WkN5TwK9h0vDOTS1obOZuhAAAAYTZan_3"}"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub guest_activate: String,
    pub task: String,
    pub likes: String,
    pub dm_inbox: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            guest_activate: GUEST_ACTIVATE_URL.to_string(),
            task: TASK_URL.to_string(),
            likes: LIKES_URL.to_string(),
            dm_inbox: DM_INBOX_URL.to_string(),
        }
    }
}

/// Knobs on which the hand-run login scripts used to disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowOptions {
    pub forward_cookies: bool,
    pub send_subtask_versions: bool,
    pub client_language: Option<String>,
    pub js_instrumentation: String,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            forward_cookies: true,
            send_subtask_versions: false,
            client_language: Some("en".to_string()),
            js_instrumentation: DEFAULT_JS_INSTRUMENTATION.to_string(),
        }
    }
}

/// Static web-client credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything the flow runner and the authenticated reads need to talk to
/// the API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub endpoints: Endpoints,
    pub bearer: BearerToken,
    pub options: FlowOptions,
}

impl ApiConfig {
    pub fn new(bearer: BearerToken) -> Self {
        Self {
            endpoints: Endpoints::default(),
            bearer,
            options: FlowOptions::default(),
        }
    }
}

pub fn login_options(args: &LoginArgs) -> FlowOptions {
    let defaults = FlowOptions::default();
    FlowOptions {
        forward_cookies: !args.no_forward_cookies,
        send_subtask_versions: args.subtask_versions,
        client_language: match args.client_language.trim() {
            "" => None,
            lang => Some(lang.to_string()),
        },
        js_instrumentation: args
            .js_instrumentation
            .clone()
            .unwrap_or(defaults.js_instrumentation),
    }
}

pub fn session_path(cli: &Cli) -> anyhow::Result<PathBuf> {
    match &cli.session {
        Some(path) => Ok(path.clone()),
        None => crate::paths::session_file_path(),
    }
}
