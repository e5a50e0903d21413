//! Runtime configuration.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Configuration for the inference server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
    /// Backend base URL.
    pub backend_url: String,
    /// Model name served by the backend.
    pub model_name: String,
    /// Backend request timeout in seconds.
    pub backend_timeout: u64,
    /// Feature group to check payloads against; enables the feature-checked variant.
    pub feature_group: Option<String>,
    /// Feature store base URL.
    pub feature_store_url: String,
    /// Feature to compare; the first feature of the record when unset.
    pub feature_name: Option<String>,
    /// Feature store request timeout in seconds.
    pub feature_store_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_body_size: 6 * 1024 * 1024, // 6MB
            backend_url: "http://127.0.0.1:8501".to_string(),
            model_name: "model".to_string(),
            backend_timeout: 60,
            feature_group: None,
            feature_store_url: "http://127.0.0.1:8090".to_string(),
            feature_name: None,
            feature_store_timeout: 5,
        }
    }
}

impl ServerConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            host: lookup("INFERHOOK_HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "INFERHOOK_PORT").unwrap_or(defaults.port),
            max_body_size: parse_var(&lookup, "INFERHOOK_MAX_BODY_SIZE")
                .unwrap_or(defaults.max_body_size),
            backend_url: lookup("BACKEND_URL").unwrap_or(defaults.backend_url),
            model_name: lookup("MODEL_NAME").unwrap_or(defaults.model_name),
            backend_timeout: parse_var(&lookup, "BACKEND_TIMEOUT_SECS")
                .unwrap_or(defaults.backend_timeout),
            feature_group: lookup("FEATURE_GROUP_NAME").filter(|v| !v.is_empty()),
            feature_store_url: lookup("FEATURE_STORE_URL").unwrap_or(defaults.feature_store_url),
            feature_name: lookup("FEATURE_NAME").filter(|v| !v.is_empty()),
            feature_store_timeout: parse_var(&lookup, "FEATURE_STORE_TIMEOUT_SECS")
                .unwrap_or(defaults.feature_store_timeout),
        }
    }

    /// Set the host address.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the backend URL and model name.
    pub fn backend(mut self, url: impl Into<String>, model_name: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self.model_name = model_name.into();
        self
    }

    /// Enable the feature-checked variant against `feature_group`.
    pub fn feature_group(mut self, feature_group: impl Into<String>) -> Self {
        self.feature_group = Some(feature_group.into());
        self
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Backend request timeout.
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_timeout)
    }

    /// Feature store request timeout.
    pub fn feature_store_timeout(&self) -> Duration {
        Duration::from_secs(self.feature_store_timeout)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}
