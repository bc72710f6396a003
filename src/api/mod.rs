//! REST API module using Axum
//!
//! Serves the monitor's own endpoints:
//! - `GET /health` — the monitor's self-description
//! - `GET /status` — live snapshot of every monitored resource
//! - `POST /clear`, `POST /clear/:resource_key` — dedup-state administration

pub mod handlers;
mod routes;

pub use handlers::ApiState;

use axum::http::{header, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the complete application router.
pub fn create_app(state: ApiState) -> Router {
    Router::new()
        .merge(routes::routes(state))
        .layer(build_cors_layer())
        .layer(TraceLayer::new_for_http())
}

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// Set `HEALTHWATCH_CORS_ORIGINS` to a comma-separated list of allowed
/// origins for development dashboards.
fn build_cors_layer() -> CorsLayer {
    match std::env::var("HEALTHWATCH_CORS_ORIGINS") {
        Ok(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE])
        }
        Err(_) => CorsLayer::new(),
    }
}
