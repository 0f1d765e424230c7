//! Error types for the instrumented REST client.
//!
//! # Design
//! `HttpStatus` is raised deliberately after a response has been logged and
//! recorded, and carries the full response so callers can inspect the status
//! and body. Transport failures are passed through untouched. A response body
//! that is not JSON is never an error here; the client only decodes bodies
//! for logging and falls back to an empty object.

use crate::http::HttpResponse;

/// Errors returned by `RestClient` and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    /// The transport could not complete the exchange (connection refused,
    /// DNS failure, TLS failure, ...).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a 4xx or 5xx status.
    #[error(
        "{} '{} {}' for url '{}'",
        .response.error_kind(),
        .response.status,
        .response.reason_phrase(),
        .response.request.url_with_query()
    )]
    HttpStatus { response: Box<HttpResponse> },

    /// A header name or value could not be sent on the wire.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// A JSON payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The coverage record could not be written.
    #[error("coverage write failed: {0}")]
    Coverage(String),

    /// The configuration document is missing or malformed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RestError {
    /// The response behind an `HttpStatus` error.
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            RestError::HttpStatus { response } => Some(response),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.response().map(|r| r.status)
    }

    /// Consume the error and take ownership of the failed response.
    pub fn into_response(self) -> Option<HttpResponse> {
        match self {
            RestError::HttpStatus { response } => Some(*response),
            _ => None,
        }
    }
}
