//! HTTP server for the carrier shipment integration.
//!
//! Exposes the scheduler-facing sync trigger, admin endpoints for creating
//! and inspecting shipments, and the usual health and Prometheus endpoints.
//! Everything except `/health` and `/metrics` sits behind a bearer token.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use carrier::{CarrierClient, CarrierGateway, SoapShipmentClient, StatusQueryClient};
use domain::{InMemoryNotificationSender, InMemoryOrderRepository};
use metrics_exporter_prometheus::PrometheusHandle;
use shipment_sync::{ShipmentCreationService, ShipmentSynchronizer};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth::BearerAuth;
use config::Config;
use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<C: CarrierClient + Clone + 'static>(
    state: Arc<AppState<C>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let guarded = Router::new()
        .route("/api/cron/shipment-sync", get(routes::sync::trigger::<C>))
        .route("/api/admin/shipment-sync", post(routes::sync::trigger::<C>))
        .route(
            "/api/admin/orders/{id}/shipment",
            post(routes::shipments::create::<C>).get(routes::shipments::get::<C>),
        )
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth::require_bearer,
        ));

    let metrics_router = Router::new()
        .route("/metrics", get(routes::system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::system::health::<C>))
        .merge(guarded)
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Builds the application state around `carrier`, with in-memory order
/// storage and notification delivery.
pub fn create_state<C: CarrierClient + Clone + 'static>(
    carrier: C,
    config: &Config,
) -> Arc<AppState<C>> {
    let repository = InMemoryOrderRepository::new();
    let notifier = InMemoryNotificationSender::new();

    let creation =
        ShipmentCreationService::new(repository.clone(), carrier.clone(), config.shipper.clone());
    let carrier_name = carrier.carrier_name().to_string();
    let synchronizer = ShipmentSynchronizer::new(
        repository.clone(),
        carrier,
        notifier.clone(),
        config.sync,
    );

    Arc::new(AppState {
        carrier_name,
        repository,
        notifier,
        synchronizer,
        creation,
        auth: BearerAuth::new(config.cron_secret.clone()),
        shutdown: CancellationToken::new(),
    })
}

/// Builds the carrier gateway for both configured endpoints.
pub fn create_gateway(config: &Config) -> carrier::Result<CarrierGateway> {
    let settings = &config.carrier;
    let creator = SoapShipmentClient::new(settings.create.clone())?;
    let tracker = StatusQueryClient::new(settings.query.clone())?
        .with_tracking_url_template(settings.tracking_url_template.clone());
    Ok(CarrierGateway::new(settings.name.clone(), creator, tracker))
}
