//! HTTP server setup and routing

use crate::engine::BoothEngine;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<BoothEngine>,
    pub port: u16,
}

/// Build the kiosk router
///
/// Strips are served as plain static files from the engine's strips
/// directory so the MMS media URL works without any handler involvement.
pub fn create_router(state: AppState) -> Router {
    let strips = ServeDir::new(state.engine.strips_dir());

    Router::new()
        .route("/health", get(super::handlers::health))
        // Session control
        .route("/api/v1/session/start", post(super::handlers::start_session))
        .route("/api/v1/session/abort", post(super::handlers::abort_session))
        .route("/api/v1/session/status", get(super::handlers::session_status))
        // Selection catalogs
        .route("/api/v1/backgrounds", get(super::handlers::list_backgrounds))
        .route("/api/v1/styles", get(super::handlers::list_styles))
        // Delivery
        .route(
            "/api/v1/delivery/:session_id",
            get(super::handlers::delivery_status),
        )
        .route("/api/v1/delivery/resend", post(super::handlers::resend_delivery))
        // SSE event stream
        .route("/api/v1/events", get(super::sse::event_stream))
        // Hosted strips
        .nest_service("/strips", strips)
        .with_state(state)
        .layer(CorsLayer::permissive())
}
