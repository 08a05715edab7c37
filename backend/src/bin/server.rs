//! SARIMAX HTTP Server Binary
//!
//! This is the main entry point for the forecast REST API server.
//! It resolves configuration, loads the model registry, sets up the HTTP
//! router, and starts serving requests.
//!
//! # Usage
//!
//! ```bash
//! MODEL_PATH=./models PORT=9001 cargo run --bin sarimax-server
//! ```
//!
//! # Environment Variables
//!
//! - `MODEL_PATH`: Model artifact directory (default: /app/models)
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 9001)
//! - `DEFAULT_MODEL`: Fallback model name (default: sarimax_initial_18months)
//! - `SARIMAX_CONFIG`: Optional TOML configuration file
//! - `RUST_LOG`: Log filter directives, e.g. `sarimax_serve=debug` (default: info)

use std::env;
use std::net::SocketAddr;

use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use sarimax_serve::config::ServerConfig;
use sarimax_serve::http::{create_router, AppState};
use sarimax_serve::service::ForecastService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(log_filter(env::var("RUST_LOG").ok().as_deref()))
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting SARIMAX Inference Server...");

    let config = ServerConfig::load()?;
    let service = match ForecastService::from_config(config.clone()) {
        Ok(service) => service,
        Err(e) => {
            error!("Failed to load models. Exiting.");
            return Err(e.into());
        }
    };
    info!("Server ready with {} models", service.models_loaded());

    // Create router with all endpoints
    let app = create_router(AppState::new(service));

    let addr: SocketAddr = config.bind_address().parse()?;
    info!("Server listening on http://{}", addr);

    // Start the server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Filter from `RUST_LOG`-style directives, `info` when absent or invalid.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}
