//! Outbound invocation response.

use bytes::Bytes;
use hyper::StatusCode;
use std::collections::HashMap;

/// Response returned to the caller of `/invocations`.
#[derive(Debug, Clone)]
pub struct InvocationResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// HTTP headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Bytes,
}

impl InvocationResponse {
    /// Create an empty response with the given status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Bytes::new(),
        }
    }

    /// Create an empty 200 response.
    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// Create an error response carrying `{"error": message}`.
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        let body = serde_json::json!({ "error": message.into() }).to_string();
        Self::new(status)
            .header("Content-Type", "application/json")
            .body(body)
    }

    /// Add a header to the response.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the response body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Get the body as text.
    pub fn text_body(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Parse the body as JSON.
    pub fn json_body<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

impl Default for InvocationResponse {
    fn default() -> Self {
        Self::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_is_json_escaped() {
        let response = InvocationResponse::error(StatusCode::BAD_REQUEST, "bad \"value\"");
        let body: serde_json::Value = response.json_body().unwrap();

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad \"value\"");
        assert_eq!(
            response.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
    }
}
