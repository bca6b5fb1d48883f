use serde_json::Value;
use tracing::{debug, info};

use super::AuthError;
use super::session::{AuthSession, CSRF_COOKIE, FlowSession, ParsedCookie, cookie_header, parse_set_cookie};
use super::steps::{SubtaskStep, login_steps, start_flow_body};
use crate::config::{ApiConfig, Credentials};
use crate::http::{self, HttpReply, HttpRequest};

const GUEST_TOKEN_STEP: &str = "guest token";
const START_FLOW_STEP: &str = "start flow";

struct StepReply {
    json: Value,
    set_cookies: Vec<String>,
}

pub struct FlowRunner<'a> {
    agent: ureq::Agent,
    config: &'a ApiConfig,
}

impl<'a> FlowRunner<'a> {
    pub fn new(config: &'a ApiConfig) -> Self {
        Self {
            agent: http::agent(),
            config,
        }
    }

    /// Runs the whole flow. Stops at the first failing step; requests that
    /// already went out are not undone.
    pub fn run(&self, credentials: &Credentials) -> Result<AuthSession, AuthError> {
        let guest_token = self.acquire_guest_token()?;
        let (mut session, mut last) = self.start_flow(FlowSession::new(guest_token))?;

        for step in login_steps(credentials, &self.config.options) {
            (session, last) = self.submit(session, &step)?;
        }

        let csrf_token = csrf_from_set_cookies(&last.set_cookies).ok_or(AuthError::MissingCsrfCookie)?;
        let user_handle = last
            .json
            .pointer("/subtasks/0/open_account/user/screen_name")
            .and_then(Value::as_str)
            .map(str::to_string);

        info!(user = user_handle.as_deref().unwrap_or("<unknown>"), "login flow complete");
        Ok(session.into_authenticated(csrf_token, user_handle))
    }

    fn acquire_guest_token(&self) -> Result<String, AuthError> {
        info!("requesting guest token");
        let request = HttpRequest::post(&self.config.endpoints.guest_activate)
            .header("authorization", self.config.bearer.header_value());
        let reply = self.send(GUEST_TOKEN_STEP, &request)?;
        let json = parse_body(GUEST_TOKEN_STEP, &reply)?;

        non_empty_str(&json, "guest_token")
            .ok_or(AuthError::MissingField {
                step: GUEST_TOKEN_STEP,
                field: "guest_token",
            })
    }

    fn start_flow(&self, session: FlowSession) -> Result<(FlowSession, StepReply), AuthError> {
        info!("starting login flow");
        let mut request = self
            .flow_request(&session)
            .query("flow_name", "login");
        if self.config.options.send_subtask_versions {
            request = request.json_body(&start_flow_body());
        }
        self.exchange(START_FLOW_STEP, session, &request)
    }

    fn submit(
        &self,
        session: FlowSession,
        step: &SubtaskStep,
    ) -> Result<(FlowSession, StepReply), AuthError> {
        info!(subtask = step.subtask_id(), "submitting login subtask");
        let request = self.flow_request(&session).json_body(&step.payload(&session));

        self.exchange(step.subtask_id(), session, &request)
            .map_err(|err| match (step, err) {
                (SubtaskStep::EnterPassword { .. }, AuthError::Rejected { status, body, .. }) => {
                    AuthError::CredentialsRejected { status, body }
                }
                (_, err) => err,
            })
    }

    fn flow_request<'r>(&'r self, session: &FlowSession) -> HttpRequest<'r> {
        let options = &self.config.options;
        let mut request = HttpRequest::post(&self.config.endpoints.task)
            .header("authorization", self.config.bearer.header_value())
            .header("content-type", "application/json")
            .header("x-guest-token", session.guest_token.as_str());
        if let Some(lang) = &options.client_language {
            request = request.header("x-twitter-client-language", lang.as_str());
        }
        if options.forward_cookies {
            if let Some(cookies) = cookie_header(&session.cookies) {
                request = request.header("cookie", cookies);
            }
        }
        request
    }

    fn exchange(
        &self,
        step: &'static str,
        session: FlowSession,
        request: &HttpRequest<'_>,
    ) -> Result<(FlowSession, StepReply), AuthError> {
        let reply = self.send(step, request)?;
        let json = parse_body(step, &reply)?;
        let flow_token = non_empty_str(&json, "flow_token").ok_or(AuthError::MissingField {
            step,
            field: "flow_token",
        })?;
        debug!(step, cookies = reply.set_cookies.len(), "flow token received");

        let session = session
            .with_cookies(&reply.set_cookies)
            .with_flow_token(flow_token);
        Ok((
            session,
            StepReply {
                json,
                set_cookies: reply.set_cookies,
            },
        ))
    }

    fn send(&self, step: &'static str, request: &HttpRequest<'_>) -> Result<HttpReply, AuthError> {
        let reply = http::send(&self.agent, request)
            .map_err(|source| AuthError::Transport { step, source })?;
        if !reply.is_ok() {
            return Err(AuthError::Rejected {
                step,
                status: reply.status,
                body: reply.body_excerpt(),
            });
        }
        Ok(reply)
    }
}

fn parse_body(step: &'static str, reply: &HttpReply) -> Result<Value, AuthError> {
    serde_json::from_str(&reply.body).map_err(|source| AuthError::MalformedBody { step, source })
}

fn non_empty_str(json: &Value, field: &str) -> Option<String> {
    json.get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn csrf_from_set_cookies(set_cookies: &[String]) -> Option<String> {
    set_cookies
        .iter()
        .filter_map(|raw| match parse_set_cookie(raw) {
            Some(ParsedCookie::Set(name, value)) if name == CSRF_COOKIE && !value.is_empty() => {
                Some(value)
            }
            _ => None,
        })
        .last()
}
