//! In-memory collaborator implementations.
//!
//! Used by tests and by the API binary when no external order store is
//! wired in. Failure switches let tests exercise the error paths.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::OrderId;
use tokio::sync::RwLock;

use crate::error::{DomainError, Result};
use crate::order::{Order, OrderState};
use crate::ports::{NotificationSender, OrderRepository, PersistedIdentifiers};
use crate::shipment::{Shipment, ShipmentStatus};

#[derive(Debug, Default)]
struct RepositoryState {
    orders: HashMap<OrderId, Order>,
    fail_on_fetch: bool,
    fail_on_update: HashSet<OrderId>,
}

/// In-memory order store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderRepository {
    state: Arc<RwLock<RepositoryState>>,
    status_writes: Arc<AtomicUsize>,
}

impl InMemoryOrderRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an order.
    pub async fn insert(&self, order: Order) {
        self.state.write().await.orders.insert(order.id, order);
    }

    /// Returns a snapshot of an order.
    pub async fn order(&self, order_id: OrderId) -> Option<Order> {
        self.state.read().await.orders.get(&order_id).cloned()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Number of successful `update_shipment_status` calls so far.
    pub fn status_write_count(&self) -> usize {
        self.status_writes.load(Ordering::SeqCst)
    }

    /// Makes `fetch_pending_shipments` fail.
    pub async fn set_fail_on_fetch(&self, fail: bool) {
        self.state.write().await.fail_on_fetch = fail;
    }

    /// Makes status updates for one order fail.
    pub async fn set_fail_on_update(&self, order_id: OrderId, fail: bool) {
        let mut state = self.state.write().await;
        if fail {
            state.fail_on_update.insert(order_id);
        } else {
            state.fail_on_update.remove(&order_id);
        }
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&order_id).cloned())
    }

    async fn fetch_pending_shipments(&self, limit: usize) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        if state.fail_on_fetch {
            return Err(DomainError::Repository(
                "order store unavailable".to_string(),
            ));
        }

        let mut pending: Vec<Order> = state
            .orders
            .values()
            .filter(|order| order.awaits_status_sync())
            .cloned()
            .collect();
        pending.sort_by_key(|order| std::cmp::Reverse(shipped_at(order)));
        pending.truncate(limit);
        Ok(pending)
    }

    async fn update_shipment_status(
        &self,
        order_id: OrderId,
        status: ShipmentStatus,
        tracking_number: Option<String>,
        tracking_url: Option<String>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail_on_update.contains(&order_id) {
            return Err(DomainError::Repository(format!(
                "write rejected for order {order_id}"
            )));
        }

        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or(DomainError::OrderNotFound(order_id))?;
        let shipment = order
            .shipment
            .as_mut()
            .ok_or(DomainError::ShipmentMissing(order_id))?;

        shipment.status = Some(status);
        if tracking_number.is_some() {
            shipment.tracking_number = tracking_number;
        }
        if tracking_url.is_some() {
            shipment.tracking_url = tracking_url;
        }
        order.state = if status.is_delivered() {
            OrderState::Delivered
        } else {
            OrderState::Shipped
        };

        self.status_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn persist_shipment_identifiers(
        &self,
        order_id: OrderId,
        identifiers: PersistedIdentifiers,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or(DomainError::OrderNotFound(order_id))?;

        let mut shipment = Shipment::new(identifiers.carrier_name);
        shipment.integration_code = Some(identifiers.integration_code);
        shipment.barcode_number = Some(identifiers.barcode_number);
        shipment.tracking_number = identifiers.tracking_number;
        order.shipment = Some(shipment);
        order.state = OrderState::ReadyToShip;
        Ok(())
    }
}

fn shipped_at(order: &Order) -> DateTime<Utc> {
    order
        .shipment
        .as_ref()
        .map_or(order.placed_at, |s| s.created_at)
}

/// A notification recorded by [`InMemoryNotificationSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub order_id: OrderId,
    pub recipient: String,
    pub status: ShipmentStatus,
    pub tracking_url: Option<String>,
}

#[derive(Debug, Default)]
struct NotificationState {
    sent: Vec<SentNotification>,
    fail: bool,
    delay: Duration,
}

/// Notification sender that records messages instead of emailing them.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationSender {
    state: Arc<RwLock<NotificationState>>,
}

impl InMemoryNotificationSender {
    /// Creates a new sender with no recorded messages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent sends fail.
    pub async fn set_fail(&self, fail: bool) {
        self.state.write().await.fail = fail;
    }

    /// Makes each send wait before it is recorded, like a slow mail relay.
    pub async fn set_delay(&self, delay: Duration) {
        self.state.write().await.delay = delay;
    }

    /// Returns all recorded notifications in send order.
    pub async fn sent(&self) -> Vec<SentNotification> {
        self.state.read().await.sent.clone()
    }

    /// Returns the number of recorded notifications.
    pub async fn sent_count(&self) -> usize {
        self.state.read().await.sent.len()
    }
}

#[async_trait]
impl NotificationSender for InMemoryNotificationSender {
    async fn send_shipment_status_email(
        &self,
        order: &Order,
        status: ShipmentStatus,
    ) -> Result<()> {
        let delay = self.state.read().await.delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().await;
        if state.fail {
            return Err(DomainError::Notification("mail relay refused".to_string()));
        }

        let tracking_url = order.shipment.as_ref().and_then(|s| s.tracking_url.clone());
        tracing::info!(
            order_number = %order.order_number,
            recipient = %order.customer_email,
            status = %status,
            "shipment status email queued"
        );
        state.sent.push(SentNotification {
            order_id: order.id,
            recipient: order.customer_email.clone(),
            status,
            tracking_url,
        });
        Ok(())
    }
}
