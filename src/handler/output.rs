//! Backend response → client response.

use super::HandlerError;
use crate::backend::BackendResponse;
use crate::http::InvocationResponse;
use bytes::Bytes;
use hyper::StatusCode;

/// Bytes and content type returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientResponse {
    pub content: Bytes,
    pub content_type: String,
}

impl From<ClientResponse> for InvocationResponse {
    fn from(response: ClientResponse) -> Self {
        InvocationResponse::new(StatusCode::OK)
            .header("Content-Type", response.content_type)
            .body(response.content)
    }
}

/// Pass the backend's bytes through with the caller's accept type.
///
/// Only a status of exactly 200 is a success; anything else becomes a
/// [`HandlerError::Backend`] carrying the decoded content.
pub fn transform_output(
    response: BackendResponse,
    accept: &str,
) -> Result<ClientResponse, HandlerError> {
    if response.status != 200 {
        return Err(HandlerError::Backend {
            status: response.status,
            message: String::from_utf8_lossy(&response.content).to_string(),
            content_type: response.content_type,
        });
    }

    Ok(ClientResponse {
        content: response.content,
        content_type: accept.to_string(),
    })
}
