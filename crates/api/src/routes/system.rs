//! Unauthenticated operational endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use carrier::CarrierClient;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub carrier: String,
    pub sync_running: bool,
}

/// GET /health — liveness plus whether a sync run is in progress.
pub async fn health<C: CarrierClient + Clone + 'static>(
    State(state): State<Arc<AppState<C>>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        carrier: state.carrier_name.clone(),
        sync_running: state.synchronizer.is_running(),
    })
}

/// GET /metrics — Prometheus text exposition.
pub async fn metrics(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        handle.render(),
    )
}
