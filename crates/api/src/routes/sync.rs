//! Status synchronization trigger.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::Method;
use carrier::CarrierClient;
use serde::Deserialize;
use shipment_sync::SyncSummary;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SyncParams {
    /// Shipments to poll in this run, capped at the configured maximum.
    pub limit: Option<usize>,
}

/// GET /api/cron/shipment-sync and POST /api/admin/shipment-sync — run one
/// synchronization pass and report what it did.
///
/// The run lives on its own task. If the caller disconnects, the run is
/// cancelled through its token and stops after the order in flight, so a
/// persisted status change is never left without its notification.
#[tracing::instrument(skip(state))]
pub async fn trigger<C: CarrierClient + Clone + 'static>(
    State(state): State<Arc<AppState<C>>>,
    method: Method,
    Query(params): Query<SyncParams>,
) -> Result<Json<SyncSummary>, ApiError> {
    let max_batch = state.synchronizer.options().max_batch;
    let limit = params.limit.unwrap_or(max_batch).min(max_batch);
    if limit == 0 {
        return Err(ApiError::BadRequest("limit must be at least 1".to_string()));
    }

    metrics::counter!("shipment_sync_triggers_total", "method" => method.to_string())
        .increment(1);

    let cancel = state.shutdown.child_token();
    let _cancel_on_drop = cancel.clone().drop_guard();
    let run = tokio::spawn(async move { state.synchronizer.run(limit, &cancel).await });

    let summary = run
        .await
        .map_err(|e| ApiError::Internal(format!("sync task failed: {e}")))??;
    Ok(Json(summary))
}
