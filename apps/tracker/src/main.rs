mod config;
mod db;
mod errors;
mod feed;
mod models;
mod routes;
mod state;
mod store;
mod views;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::feed::fallback::FallbackDataset;
use crate::feed::http::HttpFeed;
use crate::feed::store::StoreFeed;
use crate::feed::{LiveFeed, TieredSource};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tracker v{}", env!("CARGO_PKG_VERSION"));
    config.log_summary();

    // Open the record store selected by STORE_BACKEND
    let store = store::connect(&config).await?;

    // Pages read live data from the store, or from a remote API when configured
    let live: Arc<dyn LiveFeed> = match &config.api_base_url {
        Some(base) => Arc::new(HttpFeed::new(base, &config.collection)?),
        None => Arc::new(StoreFeed::new(store.clone())),
    };
    let fallback = Arc::new(FallbackDataset::new(&config.fallback_dataset));
    let pages = TieredSource::new(live, fallback);

    let state = AppState {
        store: store.clone(),
        pages,
        config: Arc::new(config.clone()),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Server is running on http://localhost:{}", config.port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Could not listen for ctrl+c: {e}");
        std::future::pending::<()>().await;
    }
    info!("Received ctrl+c, shutting down");
}
