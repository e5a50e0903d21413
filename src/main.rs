//! inferhook server binary.
//!
//! Reads its configuration from the environment and serves `/invocations`.

use inferhook::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();

    tracing::info!(
        "Starting inferhook: backend {} model '{}'",
        config.backend_url,
        config.model_name
    );
    match &config.feature_group {
        Some(group) => tracing::info!(
            "Checking payloads against feature group '{}' at {}",
            group,
            config.feature_store_url
        ),
        None => tracing::info!("Feature consistency check disabled"),
    }
    tracing::info!("Health check: curl http://localhost:{}/ping", config.port);

    InferenceServer::from_config(config)?.run().await
}
