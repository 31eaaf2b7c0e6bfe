mod config;
mod errors;
mod llm_client;
mod models;
mod routes;
mod state;
mod synthesis;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Synthesis API v{}", env!("CARGO_PKG_VERSION"));

    let settings = config.synthesis_settings();
    info!(
        "Synthesis settings: timeout {:?}, max attempts {}",
        settings.timeout, settings.retry.max_attempts
    );

    // The HTTP client gets a little headroom over the pipeline deadline
    let llm = LlmClient::new(
        config.anthropic_api_key.clone(),
        settings.timeout + std::time::Duration::from_secs(5),
    )?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let shutdown = CancellationToken::new();

    // Build app state
    let state = AppState {
        client: Arc::new(llm),
        settings,
        shutdown: shutdown.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS once the web client's origin is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port)
        .parse()
        .context("Invalid listen address")?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    Ok(())
}

/// Resolves on Ctrl-C and cancels in-flight generations.
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, cancelling in-flight generations");
    shutdown.cancel();
}
