//! TensorFlow-Serving style REST backend.

use super::{Backend, BackendResponse};
use crate::handler::{HandlerContext, HandlerError};
use async_trait::async_trait;
use reqwest::{header, Client, Url};
use std::time::Duration;
use tracing::{debug, instrument};

/// Configuration for [`HttpBackend`].
#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    /// Base URL of the backend, e.g. `http://127.0.0.1:8501`.
    pub base_url: String,
    /// Model name used in the predict path.
    pub model_name: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8501".to_string(),
            model_name: "model".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl HttpBackendConfig {
    /// Create a config for a model served at `base_url`.
    pub fn new(base_url: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model_name: model_name.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Backend reached over HTTP at `{base}/v1/models/{model}:predict`.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    predict_url: Url,
}

impl HttpBackend {
    /// Create a new backend client.
    pub fn new(config: HttpBackendConfig) -> Result<Self, HandlerError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| HandlerError::Upstream(format!("invalid backend URL: {}", e)))?;
        let predict_url = base
            .join(&format!("v1/models/{}:predict", config.model_name))
            .map_err(|e| HandlerError::Upstream(format!("invalid backend URL: {}", e)))?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| HandlerError::Upstream(e.to_string()))?;

        Ok(Self {
            client,
            predict_url,
        })
    }

    /// The URL payloads are posted to.
    pub fn predict_url(&self) -> &Url {
        &self.predict_url
    }
}

#[async_trait]
impl Backend for HttpBackend {
    #[instrument(skip(self, payload, ctx), fields(request_id = %ctx.request_id))]
    async fn predict(
        &self,
        payload: String,
        ctx: &HandlerContext,
    ) -> Result<BackendResponse, HandlerError> {
        let response = self
            .client
            .post(self.predict_url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| HandlerError::Upstream(e.to_string()))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let content = response
            .bytes()
            .await
            .map_err(|e| HandlerError::Upstream(e.to_string()))?;

        debug!("Backend answered {} with {} bytes", status, content.len());

        Ok(BackendResponse {
            status,
            content_type,
            content,
        })
    }
}
