//! Read-only access to an external feature store.
//!
//! The store is owned by an external service; this crate only ever reads the
//! latest record for a record identifier. Implementations are injected into
//! the handlers as `Arc<dyn FeatureStore>` so tests can substitute
//! [`MemoryFeatureStore`] for the network-backed [`HttpFeatureStore`].

mod http;
mod memory;

pub use http::{HttpFeatureStore, HttpFeatureStoreConfig};
pub use memory::MemoryFeatureStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One feature of a record, with its value encoded as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FeatureValue {
    /// Feature name.
    pub feature_name: String,
    /// Feature value as a string (JSON text for the features this crate checks).
    pub value_as_string: String,
}

impl FeatureValue {
    /// Create a new feature value.
    pub fn new(feature_name: impl Into<String>, value_as_string: impl Into<String>) -> Self {
        Self {
            feature_name: feature_name.into(),
            value_as_string: value_as_string.into(),
        }
    }
}

/// The latest stored features for a record identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Features in store order.
    pub features: Vec<FeatureValue>,
}

impl Record {
    /// Create a record from its features.
    pub fn new(features: Vec<FeatureValue>) -> Self {
        Self { features }
    }

    /// Add a feature.
    pub fn with_feature(
        mut self,
        feature_name: impl Into<String>,
        value_as_string: impl Into<String>,
    ) -> Self {
        self.features
            .push(FeatureValue::new(feature_name, value_as_string));
        self
    }

    /// The first feature's string value.
    pub fn first_value(&self) -> Option<&str> {
        self.features.first().map(|f| f.value_as_string.as_str())
    }

    /// The string value of the named feature.
    pub fn value_of(&self, feature_name: &str) -> Option<&str> {
        self.features
            .iter()
            .find(|f| f.feature_name == feature_name)
            .map(|f| f.value_as_string.as_str())
    }

    /// Whether the record carries no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Trait for feature store backends.
#[async_trait]
pub trait FeatureStore: Send + Sync {
    /// Fetch the latest record for `record_id` in `feature_group`.
    ///
    /// Returns `Ok(None)` when the store holds no record for the identifier.
    async fn get_record(
        &self,
        feature_group: &str,
        record_id: &str,
    ) -> Result<Option<Record>, FeatureStoreError>;
}

/// Failures talking to the feature store, classified by cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureStoreError {
    /// The store did not answer within the configured timeout.
    Timeout,
    /// The store rejected the call because of request rate.
    Throttled,
    /// The store could not be reached or answered with a server error.
    Unavailable(String),
    /// The store refused the request with a client error (bad group name,
    /// access denied). Retrying will not help.
    Rejected(String),
    /// The store answered with a body that could not be decoded.
    Malformed(String),
    /// The client is misconfigured (bad URL, bad group name).
    Configuration(String),
}

impl std::fmt::Display for FeatureStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureStoreError::Timeout => write!(f, "feature store request timed out"),
            FeatureStoreError::Throttled => write!(f, "feature store request was throttled"),
            FeatureStoreError::Unavailable(msg) => write!(f, "feature store unavailable: {}", msg),
            FeatureStoreError::Rejected(msg) => {
                write!(f, "feature store rejected request: {}", msg)
            }
            FeatureStoreError::Malformed(msg) => {
                write!(f, "malformed feature store response: {}", msg)
            }
            FeatureStoreError::Configuration(msg) => {
                write!(f, "feature store configuration error: {}", msg)
            }
        }
    }
}

impl std::error::Error for FeatureStoreError {}

impl From<reqwest::Error> for FeatureStoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeatureStoreError::Timeout
        } else if err.is_decode() {
            FeatureStoreError::Malformed(err.to_string())
        } else if err.is_builder() {
            FeatureStoreError::Configuration(err.to_string())
        } else {
            FeatureStoreError::Unavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FeatureStoreError {
    fn from(err: serde_json::Error) -> Self {
        FeatureStoreError::Malformed(err.to_string())
    }
}
