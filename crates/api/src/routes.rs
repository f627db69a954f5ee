use crate::handlers;
use crate::AppState;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health::health_check))
        // Trace search and lookup
        .route("/api/traces", get(handlers::traces::search_traces))
        .route("/api/traces/:trace_id", get(handlers::traces::get_trace))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
