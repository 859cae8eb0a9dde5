//! HTTP API request execution.
//!
//! Issues a single request with the resolved method, URL, headers, and body.
//! At-most-once semantics: transport errors and timeouts are reported, never
//! retried.

use std::collections::HashMap;
use std::time::Duration;

use crate::exec::error::FailureCause;
use crate::exec::outcome::ApiOutcome;

/// Timeout applied when the caller does not impose one.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A fully rendered HTTP request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method (defaults to GET when empty)
    pub method: String,

    /// Target URL
    pub url: String,

    /// Request headers
    pub headers: HashMap<String, String>,

    /// Request body; bodies that parse as JSON are sent as JSON
    pub body: Option<String>,
}

/// Execute an HTTP request and report status plus body.
///
/// A non-success status is an executor failure carrying the status and body,
/// so playbooks fail fast on HTTP errors.
pub fn execute(request: &ApiRequest, timeout: Option<Duration>) -> Result<ApiOutcome, FailureCause> {
    let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| FailureCause::Network(e.to_string()))?;

    let method_name = if request.method.is_empty() { "GET" } else { &request.method };
    let method = reqwest::Method::from_bytes(method_name.to_uppercase().as_bytes())
        .map_err(|_| FailureCause::Network(format!("invalid HTTP method: {method_name}")))?;

    tracing::debug!(method = %method, url = %request.url, "issuing API request");

    let mut builder = client.request(method, &request.url);
    for (key, value) in &request.headers {
        builder = builder.header(key, value);
    }

    if let Some(ref body) = request.body {
        if !body.is_empty() {
            // Match stored-body intent: JSON documents go out as JSON,
            // anything else as raw text.
            builder = match serde_json::from_str::<serde_json::Value>(body) {
                Ok(json) => builder.json(&json),
                Err(_) => builder.body(body.clone()),
            };
        }
    }

    let response = builder.send().map_err(|e| {
        if e.is_timeout() {
            FailureCause::Timeout(timeout)
        } else {
            FailureCause::Network(e.to_string())
        }
    })?;

    let status = response.status();
    let body = response.text().map_err(|e| FailureCause::Network(e.to_string()))?;

    if status.is_success() {
        Ok(ApiOutcome { status: status.as_u16(), body })
    } else {
        Err(FailureCause::HttpStatus { status: status.as_u16(), body })
    }
}
