//! Handler error taxonomy and its HTTP mapping.

use crate::feature_store::FeatureStoreError;
use crate::http::InvocationResponse;
use hyper::StatusCode;

/// Errors that abort an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// Request content type is not one the handler understands.
    /// `None` means the request carried no content type at all.
    UnsupportedContentType { content_type: Option<String> },
    /// The request body could not be parsed.
    Parse(String),
    /// The inbound payload does not match the latest stored feature value,
    /// or one side of the comparison could not be obtained or decoded.
    Consistency(String),
    /// The feature store failed for a reason other than a missing record.
    FeatureStore(FeatureStoreError),
    /// The backend answered with a non-200 status; `message` is its raw content.
    Backend {
        status: u16,
        message: String,
        content_type: Option<String>,
    },
    /// The backend could not be reached.
    Upstream(String),
}

impl HandlerError {
    /// Create an unsupported content type error.
    pub fn unsupported_content_type(content_type: Option<&str>) -> Self {
        HandlerError::UnsupportedContentType {
            content_type: content_type.map(str::to_string),
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        HandlerError::Parse(message.into())
    }

    /// Create a consistency error.
    pub fn consistency(message: impl Into<String>) -> Self {
        HandlerError::Consistency(message.into())
    }

    /// HTTP status reported to the caller.
    pub fn status_code(&self) -> StatusCode {
        match self {
            HandlerError::UnsupportedContentType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            HandlerError::Parse(_) => StatusCode::BAD_REQUEST,
            HandlerError::Consistency(_) => StatusCode::UNPROCESSABLE_ENTITY,
            HandlerError::FeatureStore(err) => match err {
                FeatureStoreError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                FeatureStoreError::Throttled | FeatureStoreError::Unavailable(_) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                FeatureStoreError::Malformed(_) => StatusCode::BAD_GATEWAY,
                FeatureStoreError::Rejected(_) | FeatureStoreError::Configuration(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            HandlerError::Backend { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            HandlerError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Whether the caller is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            HandlerError::UnsupportedContentType { .. } | HandlerError::Parse(_)
        )
    }
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerError::UnsupportedContentType { content_type } => {
                let content_type = content_type
                    .as_deref()
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or("unknown");
                let message = format!("unsupported content type {}", content_type);
                let quoted = serde_json::Value::String(message).to_string();
                write!(f, "{{\"error\": {}}}", quoted)
            }
            HandlerError::Parse(msg) => write!(f, "{}", msg),
            HandlerError::Consistency(msg) => write!(f, "{}", msg),
            HandlerError::FeatureStore(err) => write!(f, "{}", err),
            HandlerError::Backend { message, .. } => write!(f, "{}", message),
            HandlerError::Upstream(msg) => write!(f, "backend unreachable: {}", msg),
        }
    }
}

impl std::error::Error for HandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HandlerError::FeatureStore(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FeatureStoreError> for HandlerError {
    fn from(err: FeatureStoreError) -> Self {
        HandlerError::FeatureStore(err)
    }
}

impl From<HandlerError> for InvocationResponse {
    fn from(err: HandlerError) -> Self {
        let status = err.status_code();
        match &err {
            // Already a JSON document.
            HandlerError::UnsupportedContentType { .. } => InvocationResponse::new(status)
                .header("Content-Type", "application/json")
                .body(err.to_string()),
            // Surfaced as-is.
            HandlerError::Backend {
                message,
                content_type,
                ..
            } => InvocationResponse::new(status)
                .header(
                    "Content-Type",
                    content_type.as_deref().unwrap_or("application/json"),
                )
                .body(message.clone()),
            _ => InvocationResponse::error(status, err.to_string()),
        }
    }
}
