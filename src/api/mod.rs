//! HTTP API module
//!
//! The daemon's message endpoint, the push stream towards panels and
//! status reporting.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::controller::Controller;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(controller: Arc<Controller>) -> Router {
    Router::new()
        .route("/message", post(message_handler))
        .route("/events", get(events_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(controller)
}
