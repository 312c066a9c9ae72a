//! rednote-mcp - 小红书自动化工具服务
//!
//! Owns a single automated browser session against xiaohongshu.com and
//! exposes search/extraction/comment tools over HTTP and SSE.

mod api;
mod config;
mod engine;
mod tools;

use api::{create_router, AppState};
use config::Config;
use engine::Engine;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rednote_mcp=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = Config::from_env();
    let port = config.port;
    tracing::info!(
        headless = config.headless,
        profile = %config.browser_data_dir.display(),
        "configuration loaded"
    );

    let engine = Arc::new(Engine::new(config));

    // Warm the browser up front so the first tool call is fast, but keep
    // serving if Chrome is unavailable — the session stays lazily
    // retryable on the next call.
    if let Err(e) = engine.warm_up().await {
        tracing::warn!(error = %e, "browser warm-up failed, continuing without a session");
    }

    let state = AppState::new(engine.clone());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state).layer(cors).layer(compression);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("rednote-mcp server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Close the browser before exiting so Chrome doesn't outlive us.
    engine.close().await;
    tracing::info!("shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
