//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use carrier::CarrierError;
use domain::DomainError;
use shipment_sync::{ShipmentError, SyncError};

const CARRIER_UNAVAILABLE: &str = "Carrier is temporarily unavailable, please try again later";

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Missing or wrong bearer token.
    Unauthorized,
    /// Shipment creation error.
    Shipment(ShipmentError),
    /// Sync run error.
    Sync(SyncError),
    /// Order store error.
    Domain(DomainError),
    /// Unexpected server-side failure, logged and hidden from the caller.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Shipment(err) => shipment_error_to_response(err),
            ApiError::Sync(err) => sync_error_to_response(err),
            ApiError::Domain(err) => internal(err.to_string()),
            ApiError::Internal(msg) => internal(msg),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn internal(message: String) -> (StatusCode, String) {
    tracing::error!(error = %message, "internal server error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// Validation and business rejections are shown verbatim; everything else
/// is logged and reported as a generic retryable failure.
fn carrier_error_to_response(err: CarrierError) -> (StatusCode, String) {
    if err.is_user_actionable() {
        return (StatusCode::UNPROCESSABLE_ENTITY, err.to_string());
    }
    match &err {
        CarrierError::Fault { detail, .. } => {
            tracing::error!(error = %err, detail = ?detail, "carrier fault");
        }
        CarrierError::Parse { stage, .. } => {
            tracing::error!(error = %err, stage = %stage, "carrier response unparsable");
        }
        _ => tracing::warn!(error = %err, "carrier unreachable"),
    }
    (StatusCode::BAD_GATEWAY, CARRIER_UNAVAILABLE.to_string())
}

fn shipment_error_to_response(err: ShipmentError) -> (StatusCode, String) {
    match err {
        ShipmentError::OrderNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        ShipmentError::NotReady { .. } | ShipmentError::AlreadyCreated(_) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        ShipmentError::Carrier(carrier_err) => carrier_error_to_response(carrier_err),
        ShipmentError::Domain(domain_err) => internal(domain_err.to_string()),
    }
}

fn sync_error_to_response(err: SyncError) -> (StatusCode, String) {
    match err {
        SyncError::AlreadyRunning => (StatusCode::CONFLICT, err.to_string()),
        SyncError::CandidateFetch(_) => internal(err.to_string()),
    }
}

impl From<ShipmentError> for ApiError {
    fn from(err: ShipmentError) -> Self {
        ApiError::Shipment(err)
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        ApiError::Sync(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}
