//! Render an `HttpRequest` as an equivalent `curl` command line.
//!
//! The output is for humans reproducing a failing call by hand; nothing
//! parses it back.

use crate::http::HttpRequest;

pub fn to_curl(request: &HttpRequest) -> String {
    let mut parts = vec!["curl".to_string(), "-X".to_string(), request.method.as_str().to_string()];

    for (name, value) in &request.headers {
        parts.push("-H".to_string());
        parts.push(quote(&format!("{name}: {value}")));
    }

    if let Some(body) = &request.body {
        parts.push("-d".to_string());
        parts.push(quote(body));
    }

    parts.push(quote(&request.url_with_query()));
    parts.join(" ")
}

/// Single-quote `s` for a POSIX shell.
fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
