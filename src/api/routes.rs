//! API route definitions

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, ApiState};

pub fn routes(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/status", get(handlers::get_status))
        .route("/clear", post(handlers::clear_all))
        .route("/clear/:resource_key", post(handlers::clear_resource))
        .with_state(state)
}
