//! The network seam.
//!
//! `RestClient` never talks to the network directly. It builds an
//! `HttpRequest` and passes it to a `Transport`, which keeps the dispatcher
//! testable with an in-memory transport and lets callers swap the HTTP stack.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::RestError;
use crate::http::{HttpRequest, HttpResponse};

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the exchange. Any status code is a successful exchange here;
    /// status enforcement belongs to the caller.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, RestError>;
}

/// `Transport` backed by a single shared `reqwest::Client`.
///
/// No timeout is configured, so a hung peer blocks the call indefinitely.
/// Redirects are not followed: a 3xx is handed back as the response.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(accept_invalid_certs: bool) -> Result<Self, RestError> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(accept_invalid_certs)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, RestError> {
        let mut builder = self
            .client
            .request(request.method.into(), &request.url)
            .headers(header_map(&request.headers)?);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();
        let body = response.bytes().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
            request,
        })
    }
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap, RestError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| RestError::InvalidHeader(format!("{name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| RestError::InvalidHeader(format!("{name}: {e}")))?;
        map.append(name, value);
    }
    Ok(map)
}
