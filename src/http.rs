use std::thread;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("response decode failed: {0}")]
    Decode(#[from] std::io::Error),
}

/// One outgoing request. Header and query pairs are sent in order.
#[derive(Debug, Clone)]
pub(crate) struct HttpRequest<'a> {
    pub(crate) method: &'a str,
    pub(crate) url: &'a str,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: Option<String>,
}

impl<'a> HttpRequest<'a> {
    pub(crate) fn get(url: &'a str) -> Self {
        Self::new("GET", url)
    }

    pub(crate) fn post(url: &'a str) -> Self {
        Self::new("POST", url)
    }

    fn new(method: &'a str, url: &'a str) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
        }
    }

    pub(crate) fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub(crate) fn query(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query.push((name.to_string(), value.into()));
        self
    }

    pub(crate) fn json_body(mut self, body: &serde_json::Value) -> Self {
        self.body = Some(body.to_string());
        self
    }
}

/// A response of any status. Callers decide what a non-200 means.
#[derive(Debug, Clone)]
pub(crate) struct HttpReply {
    pub(crate) status: u16,
    pub(crate) body: String,
    pub(crate) set_cookies: Vec<String>,
}

impl HttpReply {
    fn read(response: ureq::Response) -> Result<Self, HttpError> {
        let status = response.status();
        let set_cookies = response
            .all("set-cookie")
            .into_iter()
            .map(str::to_string)
            .collect();
        let body = response.into_string()?;
        Ok(Self {
            status,
            body,
            set_cookies,
        })
    }

    pub(crate) fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Body trimmed and cut to a length that fits in an error line.
    pub(crate) fn body_excerpt(&self) -> String {
        self.body.trim().chars().take(240).collect()
    }
}

pub(crate) fn agent() -> ureq::Agent {
    ureq::AgentBuilder::new().build()
}

pub(crate) fn agent_with_timeouts(connect_timeout: Duration, read_timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(connect_timeout)
        .timeout_read(read_timeout)
        .timeout_write(read_timeout)
        .build()
}

pub(crate) fn send(agent: &ureq::Agent, request: &HttpRequest<'_>) -> Result<HttpReply, HttpError> {
    let mut call = agent.request(request.method, request.url);
    for (key, value) in &request.headers {
        call = call.set(key, value);
    }
    for (key, value) in &request.query {
        call = call.query(key, value);
    }

    let outcome = match &request.body {
        Some(body) => call.send_string(body),
        None => call.call(),
    };

    match outcome {
        Ok(response) | Err(ureq::Error::Status(_, response)) => HttpReply::read(response),
        Err(ureq::Error::Transport(err)) => Err(HttpError::Transport(err.to_string())),
    }
}

fn should_retry_http_status(status: u16) -> bool {
    status == 408 || status == 429 || (500..=599).contains(&status)
}

/// Sends `request` up to `attempts` times, sleeping `retry_delay` between
/// tries. Only throttling, timeouts, server errors and transport failures are
/// retried; any other reply is returned as-is on the first try.
pub(crate) fn send_with_retries(
    agent: &ureq::Agent,
    request: &HttpRequest<'_>,
    attempts: usize,
    retry_delay: Duration,
) -> Result<HttpReply, HttpError> {
    let attempts = attempts.max(1);

    for attempt in 1..=attempts {
        match send(agent, request) {
            Ok(reply) if should_retry_http_status(reply.status) && attempt < attempts => {
                tracing::debug!(status = reply.status, attempt, "retrying {}", request.url);
                thread::sleep(retry_delay);
            }
            Ok(reply) => return Ok(reply),
            Err(HttpError::Transport(err)) if attempt < attempts => {
                tracing::debug!(attempt, "retrying {} after transport error: {err}", request.url);
                thread::sleep(retry_delay);
            }
            Err(err) => return Err(err),
        }
    }

    Err(HttpError::Transport(
        "exhausted attempts without a concrete error".to_string(),
    ))
}


#[cfg(test)]
mod tests {
    use super::test_server::{Behavior, TestServer};
    use super::*;

    #[test]
    fn send_returns_non_ok_replies_instead_of_failing() {
        let server = TestServer::spawn(vec![Behavior::Respond(403, "forbidden".to_string())]);
        let url = server.url("/guest");

        let reply = send(&agent(), &HttpRequest::post(&url)).expect("403 is still a reply");

        assert_eq!(reply.status, 403);
        assert_eq!(reply.body, "forbidden");
        assert!(!reply.is_ok());
    }

    #[test]
    fn send_collects_every_set_cookie_header() {
        let server = TestServer::spawn(vec![Behavior::json_with_cookies(
            200,
            serde_json::json!({}),
            &["a=1; Path=/", "b=2; Secure"],
        )]);
        let url = server.url("/task");

        let reply = send(&agent(), &HttpRequest::post(&url)).expect("request should succeed");

        assert_eq!(reply.set_cookies, vec!["a=1; Path=/", "b=2; Secure"]);
    }

    #[test]
    fn send_writes_headers_query_and_body() {
        let server = TestServer::spawn(vec![Behavior::Respond(200, "{}".to_string())]);
        let url = server.url("/task.json");
        let request = HttpRequest::post(&url)
            .header("x-guest-token", "g-1")
            .query("flow_name", "login")
            .json_body(&serde_json::json!({ "flow_token": "t" }));

        send(&agent(), &request).expect("request should succeed");

        let recorded = &server.requests()[0];
        assert_eq!(recorded.method, "POST");
        assert_eq!(recorded.target, "/task.json?flow_name=login");
        assert_eq!(recorded.header("x-guest-token"), Some("g-1"));
        assert_eq!(recorded.json()["flow_token"], "t");
    }

    #[test]
    fn retries_retryable_statuses_until_success() {
        let server = TestServer::spawn(vec![
            Behavior::Respond(500, "server-error".to_string()),
            Behavior::Respond(429, "throttled".to_string()),
            Behavior::Respond(200, "ok".to_string()),
        ]);
        let url = server.url("/likes");

        let reply = send_with_retries(
            &agent_with_timeouts(Duration::from_millis(200), Duration::from_millis(200)),
            &HttpRequest::get(&url),
            3,
            Duration::from_millis(1),
        )
        .expect("should eventually succeed");

        assert_eq!(reply.body, "ok");
        assert_eq!(server.request_count(), 3);
    }

    #[test]
    fn does_not_retry_hard_client_errors() {
        let server = TestServer::spawn(vec![Behavior::Respond(404, "not-found".to_string())]);
        let url = server.url("/likes");

        let reply = send_with_retries(
            &agent_with_timeouts(Duration::from_millis(200), Duration::from_millis(200)),
            &HttpRequest::get(&url),
            5,
            Duration::from_millis(1),
        )
        .expect("404 is returned as a reply");

        assert_eq!(reply.status, 404);
        assert_eq!(server.request_count(), 1);
    }

    #[test]
    fn retries_transport_timeout_and_recovers() {
        let server = TestServer::spawn(vec![
            Behavior::DelayRespond(Duration::from_millis(120), 200, "slow".to_string()),
            Behavior::Respond(200, "ok".to_string()),
        ]);
        let url = server.url("/likes");

        let reply = send_with_retries(
            &agent_with_timeouts(Duration::from_millis(250), Duration::from_millis(20)),
            &HttpRequest::get(&url),
            2,
            Duration::from_millis(1),
        )
        .expect("timeout should be retried");

        assert_eq!(reply.body, "ok");
        assert_eq!(server.request_count(), 2);
    }

    #[test]
    fn returns_last_retryable_reply_when_attempts_run_out() {
        let server = TestServer::spawn(vec![
            Behavior::Respond(503, "down".to_string()),
            Behavior::Respond(503, "still-down".to_string()),
        ]);
        let url = server.url("/likes");

        let reply = send_with_retries(
            &agent_with_timeouts(Duration::from_millis(200), Duration::from_millis(200)),
            &HttpRequest::get(&url),
            2,
            Duration::from_millis(1),
        )
        .expect("final 503 is returned as a reply");

        assert_eq!(reply.status, 503);
        assert_eq!(reply.body, "still-down");
        assert_eq!(server.request_count(), 2);
    }
}
