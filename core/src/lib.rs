//! Instrumented REST client for API test suites.
//!
//! # Overview
//! `RestClient` forwards GET/POST/PUT/DELETE calls to an async transport and
//! wraps each one with structured logs, a reproducible `curl` command on
//! stdout, a swagger coverage record, and status enforcement: any 4xx/5xx
//! comes back as `RestError::HttpStatus` carrying the full response.
//!
//! # Design
//! - `RestClient` holds only construction-time state; per-call state lives
//!   in a tracing span tagged with a fresh correlation id.
//! - The network and the coverage file writes sit behind the `Transport` and
//!   `CoverageSink` traits, so tests can substitute in-memory versions.
//! - Requests and responses are plain data (`HttpRequest`, `HttpResponse`);
//!   the request that was actually sent travels with its response.
//!
//! ```no_run
//! use restclient_core::{Configuration, RequestOptions, RestClient};
//!
//! # async fn run() -> Result<(), restclient_core::RestError> {
//! let client = RestClient::new(
//!     Configuration::new("https://api.example.com").with_header("X-Key", "abc"),
//! )?;
//! let response = client
//!     .post("/items", RequestOptions::new().json(&serde_json::json!({"name": "x"}))?)
//!     .await?;
//! assert_eq!(response.status, 201);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod coverage;
pub mod curl;
pub mod error;
pub mod http;
pub mod logging;
pub mod transport;

pub use client::RestClient;
pub use config::Configuration;
pub use coverage::{CoverageSink, RequestRecord, SwaggerCoverageWriter, Uri};
pub use error::RestError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, RequestOptions};
pub use logging::{init_logging, LogFormat};
pub use transport::{ReqwestTransport, Transport};
