//! Per-invocation context handed to the handlers.

use crate::http::InvocationRequest;

/// Content type used for responses when the caller expresses no preference.
pub const DEFAULT_ACCEPT: &str = "application/json";

/// Execution context for a single invocation.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    /// Declared request content type, verbatim.
    pub request_content_type: Option<String>,
    /// Content type the caller asked for.
    pub accept_header: String,
    /// Request ID for tracing.
    pub request_id: String,
}

impl HandlerContext {
    /// Create a context with no content type and the default accept type.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_content_type: None,
            accept_header: DEFAULT_ACCEPT.to_string(),
            request_id: request_id.into(),
        }
    }

    /// Build the context for an inbound request.
    ///
    /// A missing or wildcard `Accept` header resolves to [`DEFAULT_ACCEPT`].
    pub fn from_request(request: &InvocationRequest, request_id: impl Into<String>) -> Self {
        let accept = match request.accept().map(str::trim) {
            None | Some("") | Some("*/*") => DEFAULT_ACCEPT,
            Some(accept) => accept,
        };

        Self {
            request_content_type: request.content_type().map(str::to_string),
            accept_header: accept.to_string(),
            request_id: request_id.into(),
        }
    }

    /// Set the request content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.request_content_type = Some(content_type.into());
        self
    }

    /// Set the accept header.
    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept_header = accept.into();
        self
    }

    /// The declared content type, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.request_content_type.as_deref()
    }
}
