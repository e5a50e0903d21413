//! Request body → backend payload.

use super::HandlerError;
use serde::Serialize;

/// Recognized request media types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Json,
    Csv,
}

impl MediaType {
    /// Parse a `Content-Type` header value.
    ///
    /// Parameters such as `charset` are ignored and the comparison is
    /// ASCII case-insensitive.
    pub fn parse(content_type: &str) -> Option<Self> {
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        if essence.eq_ignore_ascii_case("application/json") {
            Some(MediaType::Json)
        } else if essence.eq_ignore_ascii_case("text/csv") {
            Some(MediaType::Csv)
        } else {
            None
        }
    }
}

/// Payload sent to the backend for CSV input.
#[derive(Debug, Serialize)]
pub struct InstancesPayload {
    pub instances: Vec<f64>,
}

/// Transform a raw request body into the backend payload.
///
/// JSON bodies are forwarded untouched (no validation); CSV bodies become
/// `{"instances": [...]}`.
pub fn transform_input(body: &[u8], content_type: Option<&str>) -> Result<String, HandlerError> {
    match content_type.and_then(MediaType::parse) {
        Some(MediaType::Json) => decode_utf8(body).map(str::to_string),
        Some(MediaType::Csv) => {
            let payload = InstancesPayload {
                instances: parse_csv_row(decode_utf8(body)?)?,
            };
            serde_json::to_string(&payload).map_err(|e| HandlerError::parse(e.to_string()))
        }
        None => Err(HandlerError::unsupported_content_type(content_type)),
    }
}

/// Parse one comma-separated row of numbers, preserving order.
pub fn parse_csv_row(text: &str) -> Result<Vec<f64>, HandlerError> {
    text.split(',')
        .enumerate()
        .map(|(index, field)| {
            let field = field.trim();
            match field.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(value),
                Ok(_) => Err(HandlerError::parse(format!(
                    "non-finite value {:?} in csv field {}",
                    field, index
                ))),
                Err(_) => Err(HandlerError::parse(format!(
                    "could not convert csv field {} to float: {:?}",
                    index, field
                ))),
            }
        })
        .collect()
}

fn decode_utf8(body: &[u8]) -> Result<&str, HandlerError> {
    std::str::from_utf8(body)
        .map_err(|e| HandlerError::parse(format!("request body is not valid UTF-8: {}", e)))
}
