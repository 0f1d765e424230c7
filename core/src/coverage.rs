//! API contract coverage recording.
//!
//! # Design
//! Every logged exchange is described as a one-operation swagger 2.0
//! document and dropped into an output directory as `<uuid>.json`. A
//! coverage reporter later merges those fragments and compares them against
//! the service's published schema. Writing is blocking file I/O, so
//! `RestClient` calls `CoverageSink::write_schema` from the blocking thread
//! pool.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::error::RestError;
use crate::http::{HttpResponse, RequestOptions};

/// Where a request was sent, with its path still in template form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Uri {
    pub host: String,
    pub base_path: String,
    pub unformatted_path: String,
    pub uri_params: Option<Vec<(String, String)>>,
}

/// One observed exchange handed to a `CoverageSink`.
#[derive(Debug, Clone)]
pub struct RequestRecord {
    pub uri: Uri,
    /// Lower-case method.
    pub method: String,
    pub response: HttpResponse,
    pub options: RequestOptions,
}

pub trait CoverageSink: Send + Sync {
    /// Persist one record. Called from a blocking context.
    fn write_schema(&self, record: &RequestRecord) -> Result<(), RestError>;
}

/// Writes swagger fragments into `output_dir`.
#[derive(Debug, Clone)]
pub struct SwaggerCoverageWriter {
    output_dir: PathBuf,
}

impl SwaggerCoverageWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl CoverageSink for SwaggerCoverageWriter {
    fn write_schema(&self, record: &RequestRecord) -> Result<(), RestError> {
        std::fs::create_dir_all(&self.output_dir)
            .map_err(|e| RestError::Coverage(format!("{}: {e}", self.output_dir.display())))?;
        let path = self.output_dir.join(format!("{}.json", Uuid::new_v4()));
        let doc = serde_json::to_vec_pretty(&swagger_document(record))?;
        std::fs::write(&path, doc).map_err(|e| RestError::Coverage(format!("{}: {e}", path.display())))
    }
}

/// Build the swagger 2.0 fragment describing `record`.
pub fn swagger_document(record: &RequestRecord) -> Value {
    let (scheme, host) = split_scheme(&record.uri.host);
    let request = &record.response.request;

    let mut operation = Map::new();
    operation.insert("parameters".to_string(), Value::Array(parameters(record)));
    operation.insert(
        "responses".to_string(),
        json!({
            record.response.status.to_string(): {
                "description": record.response.reason_phrase(),
            }
        }),
    );
    if let Some(ct) = request.header("content-type") {
        operation.insert("consumes".to_string(), json!([media_type(ct)]));
    }
    if let Some(ct) = record.response.header("content-type") {
        operation.insert("produces".to_string(), json!([media_type(ct)]));
    }

    json!({
        "swagger": "2.0",
        "info": { "title": "Recorded Request", "version": "1.0" },
        "host": host,
        "basePath": record.uri.base_path,
        "schemes": [scheme],
        "paths": {
            path_key(&record.uri): {
                record.method.clone(): Value::Object(operation),
            }
        }
    })
}

fn parameters(record: &RequestRecord) -> Vec<Value> {
    let mut params: Vec<Value> = path_placeholders(&record.uri.unformatted_path)
        .into_iter()
        .map(|name| json!({ "name": name, "in": "path", "required": true, "type": "string" }))
        .collect();

    for (name, value) in record.uri.uri_params.iter().flatten() {
        params.push(json!({
            "name": name,
            "in": "query",
            "required": false,
            "type": "string",
            "x-example": value,
        }));
    }

    for (name, value) in record.options.headers.iter().flatten() {
        params.push(json!({
            "name": name,
            "in": "header",
            "required": false,
            "type": "string",
            "x-example": value,
        }));
    }

    if let Some(body) = &record.options.json {
        params.push(json!({
            "name": "body",
            "in": "body",
            "required": true,
            "schema": { "type": json_type(body), "example": body },
        }));
    } else if let Some(data) = &record.options.data {
        params.push(json!({
            "name": "data",
            "in": "formData",
            "required": true,
            "type": "string",
            "x-example": data,
        }));
    }

    params
}

/// The path key, without any query string the caller inlined.
fn path_key(uri: &Uri) -> String {
    let path = uri.unformatted_path.split('?').next().unwrap_or_default();
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

/// Names of `{placeholder}` segments in a templated path.
fn path_placeholders(path: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let name = &rest[start + 1..start + len];
        if !name.is_empty() {
            names.push(name.to_string());
        }
        rest = &rest[start + len + 1..];
    }
    names
}

fn split_scheme(host: &str) -> (&str, &str) {
    match host.split_once("://") {
        Some((scheme, rest)) => (scheme, rest.trim_end_matches('/')),
        None => ("http", host.trim_end_matches('/')),
    }
}

fn media_type(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or_default().trim()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpMethod, HttpRequest};

    fn record(path: &str, options: RequestOptions, status: u16) -> RequestRecord {
        let request = HttpRequest::build(
            HttpMethod::Post,
            format!("https://api.test{path}"),
            &[],
            &options,
        )
        .unwrap();
        RequestRecord {
            uri: Uri {
                host: "https://api.test".to_string(),
                base_path: String::new(),
                unformatted_path: path.to_string(),
                uri_params: options.params.clone(),
            },
            method: "post".to_string(),
            response: HttpResponse {
                status,
                headers: vec![(
                    "content-type".to_string(),
                    "application/json; charset=utf-8".to_string(),
                )],
                body: bytes::Bytes::from_static(br#"{"id":1}"#),
                request,
            },
            options,
        }
    }

    #[test]
    fn document_describes_one_operation() {
        let opts = RequestOptions::new()
            .param("dry_run", "true")
            .json(&json!({"name": "x"}))
            .unwrap();
        let doc = swagger_document(&record("/items", opts, 201));

        assert_eq!(doc["swagger"], "2.0");
        assert_eq!(doc["host"], "api.test");
        assert_eq!(doc["basePath"], "");
        assert_eq!(doc["schemes"], json!(["https"]));

        let op = &doc["paths"]["/items"]["post"];
        assert_eq!(op["responses"]["201"]["description"], "Created");
        assert_eq!(op["consumes"], json!(["application/json"]));
        assert_eq!(op["produces"], json!(["application/json"]));

        let params = op["parameters"].as_array().unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0]["in"], "query");
        assert_eq!(params[0]["x-example"], "true");
        assert_eq!(params[1]["in"], "body");
        assert_eq!(params[1]["schema"]["type"], "object");
        assert_eq!(params[1]["schema"]["example"]["name"], "x");
    }

    #[test]
    fn templated_path_yields_path_parameters() {
        assert_eq!(
            path_placeholders("/users/{user_id}/orders/{order_id}"),
            vec!["user_id", "order_id"]
        );
        assert!(path_placeholders("/users/{").is_empty());
        assert!(path_placeholders("/users/{}").is_empty());

        let doc = swagger_document(&record("/users/{id}", RequestOptions::new(), 404));
        let op = &doc["paths"]["/users/{id}"]["post"];
        assert_eq!(op["parameters"][0]["in"], "path");
        assert_eq!(op["parameters"][0]["name"], "id");
        assert_eq!(op["responses"]["404"]["description"], "Not Found");
    }

    #[test]
    fn raw_data_and_headers_are_recorded() {
        let opts = RequestOptions::new().data("a=1").header("X-Trace", "t1");
        let doc = swagger_document(&record("/form?x=1", opts, 200));
        let params = doc["paths"]["/form"]["post"]["parameters"].as_array().unwrap();
        assert_eq!(params[0]["in"], "header");
        assert_eq!(params[0]["name"], "X-Trace");
        assert_eq!(params[1]["in"], "formData");
        assert_eq!(params[1]["x-example"], "a=1");
    }

    #[test]
    fn host_without_scheme_defaults_to_http() {
        assert_eq!(split_scheme("localhost:8080/"), ("http", "localhost:8080"));
        assert_eq!(split_scheme("https://api.test"), ("https", "api.test"));
    }

    #[test]
    fn writer_creates_one_file_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("coverage");
        let writer = SwaggerCoverageWriter::new(&out);

        let rec = record("/items", RequestOptions::new(), 200);
        writer.write_schema(&rec).unwrap();
        writer.write_schema(&rec).unwrap();

        let files: Vec<_> = std::fs::read_dir(writer.output_dir()).unwrap().collect();
        assert_eq!(files.len(), 2);

        let path = files[0].as_ref().unwrap().path();
        assert_eq!(path.extension().unwrap(), "json");
        let doc: Value = serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        assert!(doc["paths"]["/items"]["post"].is_object());
    }

    #[test]
    fn writer_reports_unwritable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let writer = SwaggerCoverageWriter::new(blocker.join("sub"));
        let err = writer
            .write_schema(&record("/items", RequestOptions::new(), 200))
            .unwrap_err();
        assert!(matches!(err, RestError::Coverage(_)));
    }
}
