use std::time::Duration;

use serde_json::{Value, json};
use thiserror::Error;
use tracing::info;

use crate::config::ApiConfig;
use crate::http::{self, HttpError, HttpRequest};
use crate::login::{AuthSession, cookie_header};

const READ_ATTEMPTS: usize = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{endpoint}: HTTP {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },
    #[error("{endpoint}: response is not valid JSON: {source}")]
    MalformedBody {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{endpoint}: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: HttpError,
    },
}

/// Read-only calls made with a logged-in session. Each call hands back the
/// session with any cookies the server rotated.
pub struct ApiClient<'a> {
    agent: ureq::Agent,
    config: &'a ApiConfig,
    attempts: usize,
    retry_delay: Duration,
}

impl<'a> ApiClient<'a> {
    pub fn new(config: &'a ApiConfig) -> Self {
        Self {
            agent: http::agent_with_timeouts(CONNECT_TIMEOUT, READ_TIMEOUT),
            config,
            attempts: READ_ATTEMPTS,
            retry_delay: RETRY_DELAY,
        }
    }

    #[cfg(test)]
    fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn likes(
        &self,
        session: AuthSession,
        user_id: i64,
        cursor: Option<&str>,
    ) -> Result<(AuthSession, Value), ApiError> {
        let request = self
            .authenticated_get(&self.config.endpoints.likes, &session)
            .query("variables", likes_variables(user_id, cursor).to_string())
            .query("features", likes_features().to_string());
        self.fetch("likes", session, &request)
    }

    pub fn dm_inbox(&self, session: AuthSession) -> Result<(AuthSession, Value), ApiError> {
        let mut request = self.authenticated_get(&self.config.endpoints.dm_inbox, &session);
        for (key, value) in DM_INBOX_QUERY {
            request = request.query(key, *value);
        }
        self.fetch("dm inbox", session, &request)
    }

    fn authenticated_get<'r>(&'r self, url: &'r str, session: &AuthSession) -> HttpRequest<'r> {
        let mut request = HttpRequest::get(url)
            .header("authorization", self.config.bearer.header_value())
            .header("content-type", "application/json")
            .header("x-csrf-token", session.csrf_token.as_str())
            .header("x-twitter-auth-type", "OAuth2Session");
        if let Some(lang) = &self.config.options.client_language {
            request = request.header("x-twitter-client-language", lang.as_str());
        }
        if let Some(cookies) = cookie_header(&session.cookies) {
            request = request.header("cookie", cookies);
        }
        request
    }

    fn fetch(
        &self,
        endpoint: &'static str,
        session: AuthSession,
        request: &HttpRequest<'_>,
    ) -> Result<(AuthSession, Value), ApiError> {
        info!(endpoint, "fetching");
        let reply = http::send_with_retries(&self.agent, request, self.attempts, self.retry_delay)
            .map_err(|source| ApiError::Transport { endpoint, source })?;
        if !reply.is_ok() {
            return Err(ApiError::Status {
                endpoint,
                status: reply.status,
                body: reply.body_excerpt(),
            });
        }
        let json = serde_json::from_str(&reply.body)
            .map_err(|source| ApiError::MalformedBody { endpoint, source })?;
        Ok((session.with_cookies(&reply.set_cookies), json))
    }
}

fn likes_variables(user_id: i64, cursor: Option<&str>) -> Value {
    let mut variables = json!({
        "userId": user_id.to_string(),
        "count": 20,
        "includePromotedContent": false,
        "withSuperFollowsUserFields": true,
        "withDownvotePerspective": false,
        "withReactionsMetadata": false,
        "withReactionsPerspective": false,
        "withSuperFollowsTweetFields": true,
        "withClientEventToken": false,
        "withBirdwatchNotes": false,
        "withVoice": true,
        "withV2Timeline": true,
    });
    if let Some(cursor) = cursor {
        variables["cursor"] = Value::from(cursor);
    }
    variables
}

fn likes_features() -> Value {
    json!({
        "responsive_web_twitter_blue_verified_badge_is_enabled": true,
        "verified_phone_label_enabled": false,
        "responsive_web_graphql_timeline_navigation_enabled": true,
        "unified_cards_ad_metadata_container_dynamic_card_content_query_enabled": true,
        "tweetypie_unmention_optimization_enabled": true,
        "responsive_web_uc_gql_enabled": true,
        "vibe_api_enabled": true,
        "responsive_web_edit_tweet_api_enabled": true,
        "graphql_is_translatable_rweb_tweet_is_translatable_enabled": true,
        "standardized_nudges_misinfo": true,
        "tweet_with_visibility_results_prefer_gql_limited_actions_policy_enabled": false,
        "interactive_text_enabled": true,
        "responsive_web_text_conversations_enabled": false,
        "responsive_web_enhance_cards_enabled": true,
    })
}

const DM_INBOX_QUERY: &[(&str, &str)] = &[
    ("nsfw_filtering_enabled", "false"),
    ("filter_low_quality", "true"),
    ("include_quality", "all"),
    ("include_profile_interstitial_type", "1"),
    ("include_blocking", "1"),
    ("include_blocked_by", "1"),
    ("include_followed_by", "1"),
    ("include_want_retweets", "1"),
    ("include_mute_edge", "1"),
    ("include_can_dm", "1"),
    ("include_can_media_tag", "1"),
    ("include_ext_has_nft_avatar", "1"),
    ("include_ext_is_blue_verified", "1"),
    ("include_ext_verified_type", "1"),
    ("include_ext_profile_image_shape", "1"),
    ("skip_status", "1"),
    ("dm_secret_conversations_enabled", "false"),
    ("krs_registration_enabled", "true"),
    ("cards_platform", "Web-12"),
    ("include_cards", "1"),
    ("include_ext_alt_text", "true"),
    ("include_ext_limited_action_results", "false"),
    ("include_quote_count", "true"),
    ("include_reply_count", "1"),
    ("tweet_mode", "extended"),
];
