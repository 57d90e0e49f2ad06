pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::contracts::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Contracts API
        .route(
            "/api/v1/contracts/generate",
            post(handlers::handle_generate_contract),
        )
        .route(
            "/api/v1/contracts/:id",
            get(handlers::handle_get_contract).delete(handlers::handle_delete_contract),
        )
        .route(
            "/api/v1/contracts/:id/regenerate",
            post(handlers::handle_regenerate_contract),
        )
        .route(
            "/api/v1/contracts/:id/download",
            get(handlers::handle_download_contract),
        )
        // Template previews
        .route(
            "/api/v1/templates/:id/preview",
            post(handlers::handle_preview_template),
        )
        .route(
            "/api/v1/templates/:id/layout",
            post(handlers::handle_layout_template),
        )
        .with_state(state)
}
