mod config;
mod contracts;
mod db;
mod errors;
mod export;
mod layout;
mod models;
mod routes;
mod state;
mod storage;
#[cfg(test)]
mod testing;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::contracts::PgEntityStore;
use crate::db::create_pool;
use crate::export::JsonPageEncoder;
use crate::layout::LayoutConfig;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::S3BlobStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Agency Contracts API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize S3 / MinIO
    let blobs = S3BlobStore::from_config(&config).await;
    info!(bucket = %config.s3_bucket, "S3 client initialized");

    // Contract layout geometry (US letter, 50pt margins)
    let layout = LayoutConfig::default();
    info!(
        "Layout config: {}x{}pt, body {}pt",
        layout.page_width, layout.page_height, layout.body_size
    );

    // Build app state
    let state = AppState {
        entities: Arc::new(PgEntityStore::new(db)),
        blobs: Arc::new(blobs),
        encoder: Arc::new(JsonPageEncoder),
        config: config.clone(),
        layout,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS origins once the dashboard domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
