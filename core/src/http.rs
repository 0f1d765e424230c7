//! HTTP request and response types.
//!
//! # Design
//! Requests and responses are plain data. `RestClient` turns a path and a set
//! of `RequestOptions` into an `HttpRequest`, hands it to a `Transport`, and
//! gets back an `HttpResponse` that still carries the request it answers. The
//! same `HttpRequest` value is what the curl renderer and the coverage writer
//! see, so all three agree on what was actually sent.
//!
//! All fields use owned types (`String`, `Vec`, `Bytes`) so values can move
//! into blocking tasks without lifetime concerns. Response bodies stay raw
//! bytes; nothing is decoded unless a caller asks for it.

use std::borrow::Cow;

use bytes::Bytes;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Lower-case form used as the operation key in swagger documents.
    pub fn as_lower(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Per-call options forwarded to the transport.
///
/// Every field is optional; an absent field is logged as absent rather than
/// as an empty collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestOptions {
    pub params: Option<Vec<(String, String)>>,
    pub json: Option<Value>,
    pub data: Option<String>,
    pub headers: Option<Vec<(String, String)>>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one query parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .get_or_insert_with(Vec::new)
            .push((name.into(), value.into()));
        self
    }

    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let list = self.params.get_or_insert_with(Vec::new);
        list.extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set a JSON body. Takes precedence over `data`.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, serde_json::Error> {
        self.json = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn data(mut self, body: impl Into<String>) -> Self {
        self.data = Some(body.into());
        self
    }

    /// Add a per-call header. Overrides a session header of the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Vec::new)
            .push((name.into(), value.into()));
        self
    }
}

/// The request exactly as handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// `host + path`, without the query string.
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Assemble a request from session headers and per-call options.
    ///
    /// Session headers are deduplicated case-insensitively, the later entry
    /// winning. Per-call headers replace every session header with the same
    /// name; repeated per-call headers are all kept and sent. A JSON body gets
    /// a JSON content type unless one of the headers already sets it.
    pub fn build(
        method: HttpMethod,
        url: String,
        session_headers: &[(String, String)],
        options: &RequestOptions,
    ) -> Result<Self, serde_json::Error> {
        let mut headers: Vec<(String, String)> = Vec::with_capacity(session_headers.len());
        for (name, value) in session_headers {
            headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
            headers.push((name.clone(), value.clone()));
        }

        let call_headers = options.headers.as_deref().unwrap_or_default();
        for (name, _) in call_headers {
            headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        }
        headers.extend(call_headers.iter().cloned());

        let body = match (&options.json, &options.data) {
            (Some(json), _) => {
                if !has_header(&headers, "content-type") {
                    headers.push(("content-type".to_string(), "application/json".to_string()));
                }
                Some(serde_json::to_string(json)?)
            }
            (None, Some(data)) => Some(data.clone()),
            (None, None) => None,
        };

        Ok(HttpRequest {
            method,
            url,
            query: options.params.clone().unwrap_or_default(),
            headers,
            body,
        })
    }

    /// The URL with its percent-encoded query string appended.
    pub fn url_with_query(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }
        let query = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let sep = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{sep}{query}", self.url)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// A response as returned by the transport, paired with its request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// Body exactly as received.
    pub body: Bytes,
    pub request: HttpRequest,
}

impl HttpResponse {
    /// UTF-8 view of the body; invalid sequences become U+FFFD.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Decode the body. Not cached: every call parses the raw body again.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// True for any status at or above 400.
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }

    pub fn reason_phrase(&self) -> &'static str {
        StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("")
    }

    pub(crate) fn error_kind(&self) -> &'static str {
        if self.is_server_error() {
            "Server error"
        } else {
            "Client error"
        }
    }
}

fn has_header(headers: &[(String, String)], name: &str) -> bool {
    find_header(headers, name).is_some()
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session() -> Vec<(String, String)> {
        vec![("X-Key".to_string(), "abc".to_string())]
    }

    #[test]
    fn build_keeps_url_verbatim() {
        let req = HttpRequest::build(
            HttpMethod::Get,
            "https://api.example.com//users/".to_string(),
            &[],
            &RequestOptions::new(),
        )
        .unwrap();
        assert_eq!(req.url, "https://api.example.com//users/");
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn json_body_sets_content_type() {
        let opts = RequestOptions::new().json(&json!({"name": "x"})).unwrap();
        let req = HttpRequest::build(HttpMethod::Post, "http://h/items".into(), &session(), &opts).unwrap();
        assert_eq!(req.header("x-key"), Some("abc"));
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        assert_eq!(req.body.as_deref(), Some(r#"{"name":"x"}"#));
    }

    #[test]
    fn explicit_content_type_is_not_overwritten() {
        let opts = RequestOptions::new()
            .json(&json!([1, 2]))
            .unwrap()
            .header("Content-Type", "application/vnd.api+json");
        let req = HttpRequest::build(HttpMethod::Put, "http://h/x".into(), &[], &opts).unwrap();
        assert_eq!(req.header("content-type"), Some("application/vnd.api+json"));
        assert_eq!(req.headers.len(), 1);
    }

    #[test]
    fn per_call_header_overrides_session_header() {
        let opts = RequestOptions::new().header("x-key", "override");
        let req = HttpRequest::build(HttpMethod::Get, "http://h/".into(), &session(), &opts).unwrap();
        assert_eq!(req.headers, vec![("x-key".to_string(), "override".to_string())]);
    }

    #[test]
    fn session_headers_differing_in_case_collapse() {
        let session = vec![
            ("X-Key".to_string(), "upper".to_string()),
            ("x-key".to_string(), "lower".to_string()),
        ];
        let req = HttpRequest::build(HttpMethod::Get, "http://h/".into(), &session, &RequestOptions::new()).unwrap();
        assert_eq!(req.headers, vec![("x-key".to_string(), "lower".to_string())]);
    }

    #[test]
    fn repeated_per_call_headers_are_all_kept() {
        let opts = RequestOptions::new()
            .header("Accept", "application/json")
            .header("accept", "text/plain");
        let session = vec![("ACCEPT".to_string(), "*/*".to_string())];
        let req = HttpRequest::build(HttpMethod::Get, "http://h/".into(), &session, &opts).unwrap();
        assert_eq!(
            req.headers,
            vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("accept".to_string(), "text/plain".to_string()),
            ]
        );
    }

    #[test]
    fn json_wins_over_data() {
        let opts = RequestOptions::new()
            .data("raw")
            .json(&json!({"a": 1}))
            .unwrap();
        let req = HttpRequest::build(HttpMethod::Post, "http://h/".into(), &[], &opts).unwrap();
        assert_eq!(req.body.as_deref(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn raw_data_has_no_implicit_content_type() {
        let opts = RequestOptions::new().data("a=1&b=2");
        let req = HttpRequest::build(HttpMethod::Post, "http://h/".into(), &[], &opts).unwrap();
        assert_eq!(req.body.as_deref(), Some("a=1&b=2"));
        assert!(req.header("content-type").is_none());
    }

    #[test]
    fn url_with_query_encodes_pairs() {
        let opts = RequestOptions::new()
            .param("name", "a b")
            .params([("tag", "x&y")]);
        let req = HttpRequest::build(HttpMethod::Get, "http://h/items".into(), &[], &opts).unwrap();
        assert_eq!(req.url_with_query(), "http://h/items?name=a%20b&tag=x%26y");
    }

    #[test]
    fn url_with_query_appends_to_existing_query() {
        let opts = RequestOptions::new().param("b", "2");
        let req = HttpRequest::build(HttpMethod::Get, "http://h/items?a=1".into(), &[], &opts).unwrap();
        assert_eq!(req.url_with_query(), "http://h/items?a=1&b=2");
    }

    #[test]
    fn response_status_classes() {
        let req = HttpRequest::build(HttpMethod::Get, "http://h/".into(), &[], &RequestOptions::new()).unwrap();
        let mut resp = HttpResponse {
            status: 302,
            headers: Vec::new(),
            body: Bytes::new(),
            request: req,
        };
        assert!(!resp.is_error());
        resp.status = 404;
        assert!(resp.is_client_error() && resp.is_error());
        assert_eq!(resp.reason_phrase(), "Not Found");
        resp.status = 500;
        assert!(resp.is_server_error() && !resp.is_client_error());
    }

    #[test]
    fn response_json_reports_decode_errors() {
        let req = HttpRequest::build(HttpMethod::Get, "http://h/".into(), &[], &RequestOptions::new()).unwrap();
        let resp = HttpResponse {
            status: 200,
            headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
            body: Bytes::from_static(b"plain text"),
            request: req,
        };
        assert!(resp.json::<Value>().is_err());
        assert_eq!(resp.text(), "plain text");
        assert_eq!(resp.header("content-type"), Some("text/plain"));
    }

    #[test]
    fn binary_body_is_kept_verbatim() {
        let req = HttpRequest::build(HttpMethod::Get, "http://h/".into(), &[], &RequestOptions::new()).unwrap();
        let resp = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: Bytes::from_static(&[0xff, 0xfe, 0x00, 0x80]),
            request: req,
        };
        assert_eq!(resp.body.as_ref(), &[0xff, 0xfe, 0x00, 0x80]);
        assert_eq!(resp.text(), "\u{fffd}\u{fffd}\0\u{fffd}");
        assert!(resp.json::<Value>().is_err());
    }
}
