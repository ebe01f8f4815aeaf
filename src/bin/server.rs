//! device-models HTTP server binary.
//!
//! Loads the registry configuration, registers the configured model plugins
//! and serves the admin/query API.
//!
//! # Environment Variables
//!
//! - `PORT` - HTTP port (default: 8080)
//! - `DEVICE_MODELS_CONFIG` - Path to the registry YAML config (optional)
//! - `RUST_LOG` - Tracing filter (default: "info")
//!
//! # Usage
//!
//! ```bash
//! DEVICE_MODELS_CONFIG=config/registry.yaml cargo run --bin server
//! ```

use anyhow::Context;
use device_models::config::RegistryConfig;
use device_models::plugin::PluginLoader;
use device_models::registry::ModelRegistry;
use device_models::server::{app_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,device_models=debug".into()),
        )
        .init();

    let config = RegistryConfig::from_env().context("loading registry configuration")?;
    let registry = ModelRegistry::from_config(&config, PluginLoader::new());
    let loaded = registry.load_configured(&config);
    tracing::info!(
        loaded,
        configured = config.plugins.len(),
        "Registered startup model plugins"
    );

    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let bind_addr = format!("0.0.0.0:{}", port);

    let app = app_router(AppState::new(registry));

    tracing::info!("device-models server starting on {}", bind_addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health        - liveness probe");
    tracing::info!("  GET  /capabilities  - supported models");
    tracing::info!("  POST /models        - register a model plugin");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {}", bind_addr))?;

    axum::serve(listener, app).await.context("server failed")?;
    Ok(())
}
