//! Serverless adapter: turns a function-platform event into a request for the
//! HTTP router and the router's response back into the platform's envelope.

use std::collections::HashMap;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tracing::{debug, warn};

use crate::error::{AuditError, Result};

const UPLOAD_PATH: &str = "/upload-csv";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvocationEvent {
    pub http_method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
    pub is_base64_encoded: bool,
}

impl InvocationEvent {
    /// Header lookup ignoring case, as platforms differ in how they send names.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn is_upload(&self) -> bool {
        self.http_method.eq_ignore_ascii_case("POST")
            && self.path.trim_end_matches('/').ends_with(UPLOAD_PATH)
    }

    fn decoded_body(&self) -> std::result::Result<Vec<u8>, base64::DecodeError> {
        let body = self.body.as_deref().unwrap_or_default();
        if self.is_base64_encoded {
            STANDARD.decode(body.trim())
        } else {
            Ok(body.as_bytes().to_vec())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResult {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    /// JSON document as text
    pub body: String,
}

impl InvocationResult {
    fn json(status: StatusCode, body: String) -> Self {
        let headers = HashMap::from([(
            header::CONTENT_TYPE.as_str().to_string(),
            "application/json".to_string(),
        )]);
        Self {
            status_code: status.as_u16(),
            headers,
            body,
        }
    }

    fn error(status: StatusCode, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }).to_string())
    }
}

/// Dispatch one event through `router`.
pub async fn handle_invocation(router: Router, event: InvocationEvent) -> Result<InvocationResult> {
    if !event.is_upload() {
        warn!(method = %event.http_method, path = %event.path, "Rejected invocation");
        return Ok(InvocationResult::error(StatusCode::BAD_REQUEST, "Invalid request"));
    }

    let content_type = event.header(header::CONTENT_TYPE.as_str()).unwrap_or_default();
    if !content_type.to_ascii_lowercase().starts_with("multipart/form-data") {
        return Ok(InvocationResult::error(StatusCode::BAD_REQUEST, "Invalid content type"));
    }

    let body = match event.decoded_body() {
        Ok(body) => body,
        Err(e) => {
            warn!("Invocation body is not valid base64: {}", e);
            return Ok(InvocationResult::error(StatusCode::BAD_REQUEST, "Invalid request body"));
        }
    };
    debug!(bytes = body.len(), "Forwarding invocation to router");

    let mut builder = Request::builder().method(Method::POST).uri(UPLOAD_PATH);
    for (name, value) in &event.headers {
        if name.eq_ignore_ascii_case(header::CONTENT_LENGTH.as_str()) {
            continue;
        }
        builder = builder.header(name.as_str(), value.as_str());
    }
    let request = builder
        .body(Body::from(body))
        .map_err(|e| AuditError::Format(format!("invalid request headers: {}", e)))?;

    let response = match router.oneshot(request).await {
        Ok(response) => response,
        Err(infallible) => match infallible {},
    };
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .map_err(|e| AuditError::Worker(format!("failed to read response body: {}", e)))?;

    Ok(InvocationResult::json(status, String::from_utf8_lossy(&bytes).into_owned()))
}

/// Parse a raw JSON event and dispatch it. Unparseable events get a 400.
pub async fn handle_raw(router: Router, raw: &str) -> Result<InvocationResult> {
    match serde_json::from_str::<InvocationEvent>(raw) {
        Ok(event) => handle_invocation(router, event).await,
        Err(e) => {
            warn!("Invalid invocation event: {}", e);
            Ok(InvocationResult::error(StatusCode::BAD_REQUEST, "Invalid request"))
        }
    }
}
