//! Replays the web client's multi-step login flow.
//!
//! The flow is a fixed sequence of POSTs: guest-token activation, flow
//! start, then one request per [`SubtaskStep`]. Every reply carries the
//! `flow_token` the next request must echo back, and the last one sets the
//! `ct0` cookie used as the CSRF token on authenticated calls.

mod runner;
mod session;
mod steps;

use thiserror::Error;

use crate::http::HttpError;

pub use runner::FlowRunner;
#[cfg(test)]
pub use session::FlowSession;
pub use session::{AuthSession, cookie_header};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{step}: HTTP {status}: {body}")]
    Rejected {
        step: &'static str,
        status: u16,
        body: String,
    },
    #[error("credentials rejected: HTTP {status}: {body}")]
    CredentialsRejected { status: u16, body: String },
    #[error("{step}: response has no {field}")]
    MissingField {
        step: &'static str,
        field: &'static str,
    },
    #[error("{step}: response is not valid JSON: {source}")]
    MalformedBody {
        step: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("final login response did not set the ct0 cookie")]
    MissingCsrfCookie,
    #[error("{step}: {source}")]
    Transport {
        step: &'static str,
        #[source]
        source: HttpError,
    },
}
