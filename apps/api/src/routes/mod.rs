pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::tracking::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session tracking API
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id/frames",
            post(handlers::handle_submit_frame),
        )
        .route(
            "/api/v1/sessions/:id/stream",
            get(handlers::handle_stream),
        )
        .route(
            "/api/v1/sessions/:id/report",
            get(handlers::handle_report),
        )
        .route(
            "/api/v1/sessions/:id/reset",
            post(handlers::handle_reset),
        )
        .with_state(state)
}
