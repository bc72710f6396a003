//! HTTP handlers for the monitor's own endpoints

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::monitor::{MonitorService, StatusReport};

/// Shared state for the request-handling layer. The monitor instance is
/// the same one the scheduler drives; handlers never hold its dedup lock
/// across probe I/O.
#[derive(Clone)]
pub struct ApiState {
    pub monitor: Arc<MonitorService>,
    pub check_interval_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub monitoring: Vec<String>,
    pub check_interval: u64,
    pub health_threshold: u8,
}

/// GET /health — the monitor's self-description (always 200 while the
/// process serves requests).
pub async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        monitoring: state.monitor.resource_keys(),
        check_interval: state.check_interval_secs,
        health_threshold: state.monitor.threshold(),
    })
}

/// GET /status — live snapshot of every monitored resource. Blocks on live
/// probes, so it can be slower than the scheduler's cached view would be;
/// that is intentional, operators want current truth here.
pub async fn get_status(State(state): State<ApiState>) -> Json<StatusReport> {
    Json(state.monitor.status().await)
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub status: &'static str,
    pub cleared: usize,
}

/// POST /clear/:resource_key — clear one dedup entry so the next unhealthy
/// tick re-reports. Called by remediation tooling after it fixes a resource.
pub async fn clear_resource(
    State(state): State<ApiState>,
    Path(resource_key): Path<String>,
) -> Json<ClearResponse> {
    let cleared = state.monitor.clear(&resource_key).await;
    Json(ClearResponse {
        status: "ok",
        cleared: usize::from(cleared),
    })
}

/// POST /clear — clear every dedup entry.
pub async fn clear_all(State(state): State<ApiState>) -> Json<ClearResponse> {
    let cleared = state.monitor.clear_all().await;
    Json(ClearResponse {
        status: "ok",
        cleared,
    })
}
