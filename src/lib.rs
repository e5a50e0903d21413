//! # inferhook
//!
//! Request/response transformation handlers for model-serving containers,
//! plus a thin host runtime that runs them in front of a prediction backend.
//!
//! ## Flow
//!
//! ```text
//! POST /invocations
//!        │
//!        ▼
//! ┌──────────────────┐   ┌──────────────────────────┐
//! │  input handler   │──▶│ feature consistency check│ (feature-checked only)
//! └──────────────────┘   └──────────────────────────┘
//!        │                           │
//!        ▼                           ▼
//! ┌──────────────────────────────────────────────────┐
//! │            backend  /v1/models/{m}:predict        │
//! └──────────────────────────────────────────────────┘
//!        │
//!        ▼
//! ┌──────────────────┐
//! │  output handler  │──▶ response (backend bytes, Accept content type)
//! └──────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use inferhook::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let config = ServerConfig::new().port(8080).backend("http://127.0.0.1:8501", "model");
//!     InferenceServer::from_config(config)?.run().await
//! }
//! ```
//!
//! The handlers are plain functions and can be used without the server:
//!
//! ```rust
//! use inferhook::handler::transform_input;
//!
//! let payload = transform_input(b"1.0,2.5,3.0", Some("text/csv")).unwrap();
//! assert_eq!(payload, r#"{"instances":[1.0,2.5,3.0]}"#);
//! ```

pub mod backend;
pub mod feature_store;
pub mod handler;
pub mod http;
pub mod runtime;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::backend::{Backend, BackendResponse, HttpBackend, HttpBackendConfig};
    pub use crate::feature_store::{
        FeatureStore, FeatureStoreError, FeatureValue, HttpFeatureStore, HttpFeatureStoreConfig,
        MemoryFeatureStore, Record,
    };
    pub use crate::handler::{
        transform_input, transform_output, ClientResponse, FeatureCheckedHandler,
        FeatureConsistencyCheck, HandlerContext, HandlerError, InferenceHandler,
        PassThroughHandler,
    };
    pub use crate::http::{InvocationRequest, InvocationResponse};
    pub use crate::runtime::{InferenceServer, Pipeline, ServerConfig};
    pub use async_trait::async_trait;
}

pub use handler::{HandlerContext, HandlerError, InferenceHandler};
pub use http::{InvocationRequest, InvocationResponse};
pub use runtime::{InferenceServer, Pipeline, ServerConfig};
