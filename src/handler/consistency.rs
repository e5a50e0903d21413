//! Feature consistency check for the feature-checked variant.
//!
//! The inbound payload carries the instance to predict on (`data`) and the
//! record identifier (`id`). The latest stored feature value for that id must
//! decode to the same JSON value before the payload may reach the backend.

use super::HandlerError;
use crate::feature_store::FeatureStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Inbound payload for the feature-checked variant.
#[derive(Debug, Deserialize)]
pub struct CheckedPayload {
    pub data: Value,
    pub id: String,
}

/// Payload forwarded to the backend after a successful check.
#[derive(Debug, Serialize)]
pub struct InputsPayload<'a> {
    pub inputs: &'a Value,
}

/// Asserts that inbound data matches the feature store.
#[derive(Clone)]
pub struct FeatureConsistencyCheck {
    store: Arc<dyn FeatureStore>,
    feature_group: String,
    feature_name: Option<String>,
}

impl FeatureConsistencyCheck {
    /// Create a check against `feature_group` that compares the first feature
    /// of each record.
    pub fn new(store: Arc<dyn FeatureStore>, feature_group: impl Into<String>) -> Self {
        Self {
            store,
            feature_group: feature_group.into(),
            feature_name: None,
        }
    }

    /// Compare the named feature instead of the first one.
    pub fn with_feature_name(mut self, feature_name: impl Into<String>) -> Self {
        self.feature_name = Some(feature_name.into());
        self
    }

    /// The feature group records are read from.
    pub fn feature_group(&self) -> &str {
        &self.feature_group
    }

    /// Decode a raw request body and verify it, returning `{"inputs": data}`.
    pub async fn check_payload(&self, body: &[u8]) -> Result<Value, HandlerError> {
        let payload: CheckedPayload = serde_json::from_slice(body).map_err(|e| {
            HandlerError::consistency(format!("payload is not a valid checked request: {}", e))
        })?;
        self.verify(&payload.data, &payload.id).await
    }

    /// Verify `data` against the latest stored value for `record_id`.
    pub async fn verify(&self, data: &Value, record_id: &str) -> Result<Value, HandlerError> {
        let stored = self.latest_value(record_id).await?;

        if !json_eq(data, &stored) {
            warn!(record_id = %record_id, "Payload does not match the feature store");
            return Err(HandlerError::consistency(format!(
                "payload data does not match feature store value for record '{}'",
                record_id
            )));
        }

        debug!(record_id = %record_id, "Payload matches the feature store");
        serde_json::to_value(InputsPayload { inputs: data })
            .map_err(|e| HandlerError::consistency(e.to_string()))
    }

    async fn latest_value(&self, record_id: &str) -> Result<Value, HandlerError> {
        let record = self
            .store
            .get_record(&self.feature_group, record_id)
            .await?
            .ok_or_else(|| {
                HandlerError::consistency(format!(
                    "no feature record found for '{}' in '{}'",
                    record_id, self.feature_group
                ))
            })?;

        let raw = match &self.feature_name {
            Some(name) => record.value_of(name),
            None => record.first_value(),
        }
        .ok_or_else(|| {
            HandlerError::consistency(format!(
                "feature record '{}' has no value to compare",
                record_id
            ))
        })?;

        serde_json::from_str(raw).map_err(|e| {
            HandlerError::consistency(format!(
                "feature store value for '{}' is not valid JSON: {}",
                record_id, e
            ))
        })
    }
}

/// Structural JSON equality.
///
/// Unlike `Value`'s `PartialEq`, numbers compare by value so `1` equals `1.0`.
pub fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                x == y
            } else if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                x == y
            } else {
                match (x.as_f64(), y.as_f64()) {
                    (Some(x), Some(y)) => x == y,
                    _ => false,
                }
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).map_or(false, |w| json_eq(v, w)))
        }
        _ => a == b,
    }
}
