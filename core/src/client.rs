//! The instrumented request dispatcher.
//!
//! # Design
//! `RestClient` holds only what is fixed at construction: the host, the
//! session headers, the logging switch and two shared collaborators (the
//! transport and the coverage sink). Every verb method funnels into
//! `send_request`, which allocates its per-call state (the correlation id and
//! the tracing span carrying it) fresh each time. The client is therefore
//! `Clone + Send + Sync` and safe to share between concurrent callers.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Configuration;
use crate::coverage::{CoverageSink, RequestRecord, SwaggerCoverageWriter, Uri};
use crate::curl;
use crate::error::RestError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestOptions};
use crate::transport::{ReqwestTransport, Transport};

#[derive(Clone)]
pub struct RestClient {
    host: String,
    headers: Vec<(String, String)>,
    disable_log: bool,
    transport: Arc<dyn Transport>,
    coverage: Arc<dyn CoverageSink>,
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("host", &self.host)
            .field("headers", &self.headers)
            .field("disable_log", &self.disable_log)
            .finish_non_exhaustive()
    }
}

impl RestClient {
    /// Build a client with a reqwest transport and a swagger coverage writer
    /// rooted at `config.coverage_dir`.
    pub fn new(config: Configuration) -> Result<Self, RestError> {
        let transport = ReqwestTransport::new(config.accept_invalid_certs)?;
        let coverage = SwaggerCoverageWriter::new(config.coverage_dir.clone());
        Ok(Self::with_collaborators(
            config,
            Arc::new(transport),
            Arc::new(coverage),
        ))
    }

    pub fn with_collaborators(
        config: Configuration,
        transport: Arc<dyn Transport>,
        coverage: Arc<dyn CoverageSink>,
    ) -> Self {
        Self {
            headers: config.header_pairs(),
            host: config.host,
            disable_log: config.disable_log,
            transport,
            coverage,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn disable_log(&self) -> bool {
        self.disable_log
    }

    pub async fn post(&self, path: &str, options: RequestOptions) -> Result<HttpResponse, RestError> {
        self.send_request(HttpMethod::Post, path, options).await
    }

    pub async fn get(&self, path: &str, options: RequestOptions) -> Result<HttpResponse, RestError> {
        self.send_request(HttpMethod::Get, path, options).await
    }

    pub async fn put(&self, path: &str, options: RequestOptions) -> Result<HttpResponse, RestError> {
        self.send_request(HttpMethod::Put, path, options).await
    }

    pub async fn delete(&self, path: &str, options: RequestOptions) -> Result<HttpResponse, RestError> {
        self.send_request(HttpMethod::Delete, path, options).await
    }

    async fn send_request(
        &self,
        method: HttpMethod,
        path: &str,
        options: RequestOptions,
    ) -> Result<HttpResponse, RestError> {
        let span = tracing::info_span!("rest", service = "api", event_id = %Uuid::new_v4());
        self.dispatch(method, path, options).instrument(span).await
    }

    async fn dispatch(
        &self,
        method: HttpMethod,
        path: &str,
        options: RequestOptions,
    ) -> Result<HttpResponse, RestError> {
        // Plain concatenation; slashes are the caller's business.
        let full_url = format!("{}{}", self.host, path);
        let request = HttpRequest::build(method, full_url, &self.headers, &options)?;

        if self.disable_log {
            let response = self.transport.send(request).await?;
            return check_status(response);
        }

        tracing::info!(
            method = %method,
            full_url = %request.url,
            params = ?options.params,
            headers = ?options.headers,
            json = %display_json(options.json.as_ref()),
            data = ?options.data,
            "Request"
        );
        let response = self.transport.send(request).await?;
        println!("{}", curl::to_curl(&response.request));

        let record = RequestRecord {
            uri: Uri {
                host: self.host.clone(),
                base_path: String::new(),
                unformatted_path: path.to_string(),
                uri_params: options.params.clone(),
            },
            method: method.as_lower().to_string(),
            response: response.clone(),
            options,
        };
        let sink = Arc::clone(&self.coverage);
        tokio::task::spawn_blocking(move || sink.write_schema(&record))
            .await
            .map_err(|e| RestError::Coverage(e.to_string()))??;

        tracing::info!(
            status_code = response.status,
            headers = ?response.headers,
            json = %body_for_log(&response),
            "Response"
        );
        check_status(response)
    }
}

/// Fail with `HttpStatus` for any 4xx/5xx, otherwise hand the response back untouched.
fn check_status(response: HttpResponse) -> Result<HttpResponse, RestError> {
    if response.is_error() {
        return Err(RestError::HttpStatus {
            response: Box::new(response),
        });
    }
    Ok(response)
}

/// Best-effort decode for logging. Empty or non-JSON bodies log as `{}`.
fn body_for_log(response: &HttpResponse) -> Value {
    response
        .json::<Value>()
        .unwrap_or_else(|_| Value::Object(Map::new()))
}

fn display_json(value: Option<&Value>) -> String {
    value.map_or_else(|| "None".to_string(), Value::to_string)
}
