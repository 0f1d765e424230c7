//! Client configuration.
//!
//! A `Configuration` is fixed once a `RestClient` is built from it. Only
//! `host` is required when loading from JSON; the remaining fields default.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::RestError;

/// Default directory picked up by swagger-coverage reporting.
pub const DEFAULT_COVERAGE_DIR: &str = "swagger-coverage-output";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Configuration {
    /// Base URL. Paths are appended to it verbatim.
    pub host: String,
    /// Session headers sent with every request.
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
    /// Skip request/response logging, curl output and coverage recording.
    #[serde(default)]
    pub disable_log: bool,
    #[serde(default = "default_coverage_dir")]
    pub coverage_dir: PathBuf,
    /// Test environments commonly run self-signed certificates.
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,
}

fn default_coverage_dir() -> PathBuf {
    PathBuf::from(DEFAULT_COVERAGE_DIR)
}

fn default_accept_invalid_certs() -> bool {
    true
}

impl Configuration {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            headers: None,
            disable_log: false,
            coverage_dir: default_coverage_dir(),
            accept_invalid_certs: default_accept_invalid_certs(),
        }
    }

    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers = Some(
            headers
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_disable_log(mut self, disable_log: bool) -> Self {
        self.disable_log = disable_log;
        self
    }

    pub fn with_coverage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.coverage_dir = dir.into();
        self
    }

    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn from_json_str(raw: &str) -> Result<Self, RestError> {
        serde_json::from_str(raw).map_err(|e| RestError::Config(e.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RestError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| RestError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&raw)
    }

    /// Session headers as ordered pairs.
    pub(crate) fn header_pairs(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .flatten()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
