//! Application setup and router configuration.

use std::sync::Arc;

use audit::{AuditStore, Pipeline};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::routes::{audit_handler, get_audit_handler, health_handler, history_handler};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub store: Arc<dyn AuditStore>,
}

/// Build the Axum application router.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/audit", post(audit_handler))
        .route("/audit/:id", get(get_audit_handler))
        .route("/history", get(history_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
