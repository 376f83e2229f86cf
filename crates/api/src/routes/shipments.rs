//! Shipment creation and inspection for a single order.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use carrier::CarrierClient;
use chrono::{DateTime, Utc};
use common::OrderId;
use domain::{OrderRepository, OrderState, ShipmentStatus};
use serde::Serialize;
use shipment_sync::CreatedShipment;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ShipmentResponse {
    pub order_id: String,
    pub order_number: String,
    pub order_state: OrderState,
    pub carrier_name: String,
    pub created_at: DateTime<Utc>,
    pub status: Option<ShipmentStatus>,
    pub status_label: Option<&'static str>,
    pub integration_code: Option<String>,
    pub barcode_number: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
}

/// POST /api/admin/orders/{id}/shipment — register a shipment with the carrier.
#[tracing::instrument(skip(state))]
pub async fn create<C: CarrierClient + Clone + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<CreatedShipment>), ApiError> {
    let order_id = parse_order_id(&id)?;
    let created = state.creation.create_for_order(order_id).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/admin/orders/{id}/shipment — the stored shipment record.
#[tracing::instrument(skip(state))]
pub async fn get<C: CarrierClient + Clone + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Path(id): Path<String>,
) -> Result<Json<ShipmentResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .repository
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order not found: {order_id}")))?;
    let shipment = order
        .shipment
        .ok_or_else(|| ApiError::NotFound(format!("Order {order_id} has no shipment")))?;

    Ok(Json(ShipmentResponse {
        order_id: order_id.to_string(),
        order_number: order.order_number,
        order_state: order.state,
        carrier_name: shipment.carrier_name,
        created_at: shipment.created_at,
        status: shipment.status,
        status_label: shipment.status.map(|s| s.label()),
        integration_code: shipment.integration_code,
        barcode_number: shipment.barcode_number,
        tracking_number: shipment.tracking_number,
        tracking_url: shipment.tracking_url,
    }))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid order ID: {e}")))
}
