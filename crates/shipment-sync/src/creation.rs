//! Shipment creation for confirmed orders.

use carrier::{CarrierClient, Party, PaymentResponsibility, ShipmentRequest, ShipmentResult};
use common::OrderId;
use domain::{AttemptContext, Order, OrderRepository, PersistedIdentifiers, derive_identifiers};
use serde::Serialize;

use crate::error::ShipmentError;

/// The shop's own address, printed as sender on every waybill.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SenderProfile {
    pub name: String,
    pub phone: String,
    pub address_line: String,
    pub city: String,
    pub district: Option<String>,
}

impl From<SenderProfile> for Party {
    fn from(profile: SenderProfile) -> Self {
        Party {
            name: profile.name,
            phone: profile.phone,
            address_line: profile.address_line,
            city: profile.city,
            district: profile.district,
            postal_code: None,
        }
    }
}

/// Identifiers stored on an order after a successful creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedShipment {
    pub order_id: OrderId,
    pub carrier_name: String,
    pub trading_waybill_number: String,
    pub integration_code: String,
    pub barcode_number: String,
    pub tracking_number: Option<String>,
}

/// Registers shipments with the carrier and records the identifiers on orders.
pub struct ShipmentCreationService<R, C>
where
    R: OrderRepository,
    C: CarrierClient,
{
    repository: R,
    carrier: C,
    sender: Party,
}

impl<R, C> ShipmentCreationService<R, C>
where
    R: OrderRepository,
    C: CarrierClient,
{
    pub fn new(repository: R, carrier: C, sender: SenderProfile) -> Self {
        Self {
            repository,
            carrier,
            sender: sender.into(),
        }
    }

    /// Creates a shipment for a confirmed order, with fresh identifiers.
    pub async fn create_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<CreatedShipment, ShipmentError> {
        self.create_for_order_with(order_id, AttemptContext::now())
            .await
    }

    /// Creates a shipment using the given attempt context for identifier
    /// derivation.
    ///
    /// Nothing is written unless the carrier accepts the shipment.
    #[tracing::instrument(skip(self, attempt))]
    pub async fn create_for_order_with(
        &self,
        order_id: OrderId,
        attempt: AttemptContext,
    ) -> Result<CreatedShipment, ShipmentError> {
        let order = self
            .repository
            .get_order(order_id)
            .await?
            .ok_or(ShipmentError::OrderNotFound(order_id))?;

        if order
            .shipment
            .as_ref()
            .is_some_and(|s| s.barcode_number.is_some())
        {
            return Err(ShipmentError::AlreadyCreated(order_id));
        }
        if !order.state.can_create_shipment() {
            return Err(ShipmentError::NotReady {
                order_id,
                state: order.state,
            });
        }

        let request = self.build_request(&order, attempt);
        let result = match self.carrier.create_shipment(&request).await {
            Ok(result) => result,
            Err(e) => {
                metrics::counter!("shipments_created_total", "outcome" => e.kind().as_str())
                    .increment(1);
                return Err(e.into());
            }
        };

        let carrier_name = self.carrier.carrier_name().to_string();
        let persisted = PersistedIdentifiers {
            carrier_name: carrier_name.clone(),
            integration_code: result.integration_code.clone(),
            barcode_number: result.barcode_number.clone(),
            tracking_number: result.tracking_number.clone(),
        };
        if let Err(e) = self
            .repository
            .persist_shipment_identifiers(order_id, persisted)
            .await
        {
            // The carrier already holds the shipment; keep enough to reconcile by hand.
            tracing::error!(
                integration_code = %result.integration_code,
                barcode = %result.barcode_number,
                error = %e,
                "shipment created but identifiers could not be stored"
            );
            return Err(e.into());
        }

        metrics::counter!("shipments_created_total", "outcome" => "success").increment(1);
        tracing::info!(
            order_number = %order.order_number,
            integration_code = %result.integration_code,
            "shipment registered"
        );
        Ok(created(order_id, carrier_name, &request, result))
    }

    fn build_request(&self, order: &Order, attempt: AttemptContext) -> ShipmentRequest {
        let destination = &order.destination;
        ShipmentRequest {
            identifiers: derive_identifiers(&order.order_number, attempt),
            sender: self.sender.clone(),
            recipient: Party {
                name: destination.name.clone(),
                phone: destination.phone.clone(),
                address_line: destination.address_line.clone(),
                city: destination.city.clone(),
                district: destination.district().map(str::to_string),
                postal_code: destination.postal_code.clone(),
            },
            weight_kg: order.parcel.weight_kg,
            desi: order.parcel.desi,
            piece_count: 1,
            payment: PaymentResponsibility::Sender,
            declared_value: order.total_amount,
            description: order.order_number.clone(),
        }
    }
}

fn created(
    order_id: OrderId,
    carrier_name: String,
    request: &ShipmentRequest,
    result: ShipmentResult,
) -> CreatedShipment {
    CreatedShipment {
        order_id,
        carrier_name,
        trading_waybill_number: request.identifiers.trading_waybill_number.clone(),
        integration_code: result.integration_code,
        barcode_number: result.barcode_number,
        tracking_number: result.tracking_number,
    }
}
