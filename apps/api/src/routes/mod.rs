pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::synthesis::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Synthesis API
        .route("/api/v1/synthesis", post(handlers::handle_synthesize))
        .route(
            "/api/v1/synthesis/prompt",
            post(handlers::handle_preview_prompt),
        )
        .route(
            "/api/v1/synthesis/assemble",
            post(handlers::handle_assemble),
        )
        .route(
            "/api/v1/synthesis/section",
            post(handlers::handle_find_section),
        )
        .with_state(state)
}
