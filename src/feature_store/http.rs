//! Feature store client speaking the `GetRecord` REST shape.

use super::{FeatureStore, FeatureStoreError, FeatureValue, Record};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Configuration for [`HttpFeatureStore`].
#[derive(Debug, Clone)]
pub struct HttpFeatureStoreConfig {
    /// Base URL of the feature store runtime endpoint.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for HttpFeatureStoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8090".to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

impl HttpFeatureStoreConfig {
    /// Create a config for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct GetRecordResponse {
    #[serde(rename = "Record", default)]
    record: Option<Vec<FeatureValue>>,
}

/// Network-backed feature store.
///
/// Issues `GET {base}/FeatureGroup/{group}?RecordIdentifierValueAsString={id}`.
/// The underlying connection pool is created once and shared by every call.
#[derive(Clone)]
pub struct HttpFeatureStore {
    client: Client,
    base_url: Url,
}

impl HttpFeatureStore {
    /// Create a new client.
    pub fn new(config: HttpFeatureStoreConfig) -> Result<Self, FeatureStoreError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| FeatureStoreError::Configuration(e.to_string()))?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FeatureStoreError::Configuration(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    fn record_url(&self, feature_group: &str) -> Result<Url, FeatureStoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                FeatureStoreError::Configuration(format!(
                    "base URL cannot carry a path: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .push("FeatureGroup")
            .push(feature_group);
        Ok(url)
    }
}

#[async_trait]
impl FeatureStore for HttpFeatureStore {
    #[instrument(skip(self))]
    async fn get_record(
        &self,
        feature_group: &str,
        record_id: &str,
    ) -> Result<Option<Record>, FeatureStoreError> {
        let url = self.record_url(feature_group)?;

        let response = self
            .client
            .get(url)
            .query(&[("RecordIdentifierValueAsString", record_id)])
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::NOT_FOUND => {
                debug!("Feature store has no record");
                return Ok(None);
            }
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("Feature store throttled the request");
                return Err(FeatureStoreError::Throttled);
            }
            s if s.is_client_error() => {
                let body = response.text().await.unwrap_or_default();
                warn!("Feature store rejected the request with {}", s);
                return Err(FeatureStoreError::Rejected(format!(
                    "status={}, message={}",
                    s.as_u16(),
                    body
                )));
            }
            s if !s.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(FeatureStoreError::Unavailable(format!(
                    "status={}, message={}",
                    s.as_u16(),
                    body
                )));
            }
            _ => {}
        }

        let body = response.bytes().await?;
        let parsed: GetRecordResponse = serde_json::from_slice(&body)?;

        match parsed.record {
            Some(features) if !features.is_empty() => Ok(Some(Record::new(features))),
            _ => {
                debug!("Feature store returned an empty record");
                Ok(None)
            }
        }
    }
}
