//! The prediction backend the runtime forwards payloads to.

mod http;

pub use http::{HttpBackend, HttpBackendConfig};

use crate::handler::{HandlerContext, HandlerError};
use async_trait::async_trait;
use bytes::Bytes;

/// Raw response from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResponse {
    /// HTTP status code.
    pub status: u16,
    /// Content type reported by the backend, if any.
    pub content_type: Option<String>,
    /// Raw response bytes.
    pub content: Bytes,
}

impl BackendResponse {
    /// Create a response with the given status and content.
    pub fn new(status: u16, content: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: None,
            content: content.into(),
        }
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// A prediction backend: send JSON, receive status, content type and bytes.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Send a backend payload and return the raw response.
    async fn predict(
        &self,
        payload: String,
        ctx: &HandlerContext,
    ) -> Result<BackendResponse, HandlerError>;
}
