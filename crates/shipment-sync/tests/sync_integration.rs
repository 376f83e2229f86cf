//! Integration tests for the status synchronization loop.

use std::sync::Arc;
use std::time::Duration;

use carrier::{CarrierError, InMemoryCarrierClient, StatusLookup, StatusResult};
use chrono::{TimeZone, Utc};
use common::OrderId;
use domain::{
    DestinationAddress, InMemoryNotificationSender, InMemoryOrderRepository, Money, Order,
    OrderState, Shipment, ShipmentStatus,
};
use shipment_sync::{ShipmentSynchronizer, SyncError, SyncOptions};
use tokio_util::sync::CancellationToken;

type TestSynchronizer =
    ShipmentSynchronizer<InMemoryOrderRepository, InMemoryCarrierClient, InMemoryNotificationSender>;

struct TestHarness {
    synchronizer: Arc<TestSynchronizer>,
    repository: InMemoryOrderRepository,
    carrier: InMemoryCarrierClient,
    notifier: InMemoryNotificationSender,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_options(SyncOptions {
            inter_call_delay: Duration::ZERO,
            ..SyncOptions::default()
        })
    }

    fn with_options(options: SyncOptions) -> Self {
        let repository = InMemoryOrderRepository::new();
        let carrier = InMemoryCarrierClient::new();
        let notifier = InMemoryNotificationSender::new();
        let synchronizer = Arc::new(ShipmentSynchronizer::new(
            repository.clone(),
            carrier.clone(),
            notifier.clone(),
            options,
        ));
        Self {
            synchronizer,
            repository,
            carrier,
            notifier,
        }
    }

    /// Stores a shipped order. `seq` orders candidates: higher is newer.
    async fn shipped_order(&self, seq: u32, status: Option<ShipmentStatus>) -> (OrderId, String) {
        let integration_code = format!("{:016}", 1_000 + seq);
        let mut shipment = Shipment::new("in-memory-carrier");
        shipment.created_at = Utc.timestamp_opt(1_762_940_000 + i64::from(seq), 0).unwrap();
        shipment.integration_code = Some(integration_code.clone());
        shipment.barcode_number = Some(format!("{integration_code}1"));
        shipment.status = status;

        let order = Order::new(
            format!("SIP-{seq}"),
            format!("customer{seq}@example.com"),
            Money::from_major(100),
            DestinationAddress::default(),
        )
        .with_shipment(shipment);
        let id = order.id;
        self.repository.insert(order).await;
        (id, integration_code)
    }

    async fn run(&self) -> shipment_sync::SyncSummary {
        self.synchronizer
            .run(50, &CancellationToken::new())
            .await
            .unwrap()
    }
}

fn status_with_url(status: ShipmentStatus, tracking_number: &str) -> StatusResult {
    StatusResult {
        status: StatusLookup::Known(status),
        tracking_number: Some(tracking_number.to_string()),
        tracking_url: Some(format!("https://track.example/?no={tracking_number}")),
        description: None,
    }
}

#[tokio::test]
async fn test_status_change_is_persisted_and_notified() {
    let h = TestHarness::new();
    let (order_id, code) = h.shipped_order(1, None).await;
    h.carrier
        .set_status(&code, status_with_url(ShipmentStatus::InTransit, "7001"));

    let summary = h.run().await;
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.notified, 1);
    assert!(summary.errors.is_empty());
    assert!(!summary.cancelled);

    let order = h.repository.order(order_id).await.unwrap();
    let shipment = order.shipment.unwrap();
    assert_eq!(shipment.status, Some(ShipmentStatus::InTransit));
    assert_eq!(shipment.tracking_number.as_deref(), Some("7001"));
    assert_eq!(order.state, OrderState::Shipped);

    let sent = h.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "customer1@example.com");
    assert_eq!(sent[0].status, ShipmentStatus::InTransit);
    assert_eq!(
        sent[0].tracking_url.as_deref(),
        Some("https://track.example/?no=7001")
    );
}

#[tokio::test]
async fn test_rerun_without_carrier_change_is_a_no_op() {
    let h = TestHarness::new();
    let (_, code) = h.shipped_order(1, None).await;
    h.carrier
        .set_status(&code, status_with_url(ShipmentStatus::AtBranch, "7001"));

    h.run().await;
    let second = h.run().await;

    assert_eq!(second.processed, 1);
    assert_eq!(second.updated, 0);
    assert_eq!(second.notified, 0);
    assert_eq!(second.unchanged(), 1);
    assert_eq!(h.repository.status_write_count(), 1);
    assert_eq!(h.notifier.sent_count().await, 1);
}

#[tokio::test]
async fn test_one_failing_order_does_not_stop_the_batch() {
    let h = TestHarness::new();
    let (first, first_code) = h.shipped_order(3, None).await;
    let (_, failing_code) = h.shipped_order(2, None).await;
    let (third, third_code) = h.shipped_order(1, None).await;

    h.carrier
        .set_status(&first_code, StatusResult::with_status(ShipmentStatus::InTransit));
    h.carrier.fail_query(
        &failing_code,
        CarrierError::Transport {
            message: "operation timed out".to_string(),
            timed_out: true,
            status: None,
        },
    );
    h.carrier
        .set_status(&third_code, StatusResult::with_status(ShipmentStatus::Delivered));

    let summary = h.run().await;
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.updated, 2);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].order_number, "SIP-2");
    assert_eq!(summary.errors[0].kind, "transport");

    assert_eq!(
        h.repository.order(first).await.unwrap().shipment_status(),
        Some(ShipmentStatus::InTransit)
    );
    assert_eq!(
        h.repository.order(third).await.unwrap().shipment_status(),
        Some(ShipmentStatus::Delivered)
    );
}

#[tokio::test]
async fn test_repository_write_failure_is_recorded_per_order() {
    let h = TestHarness::new();
    let (order_id, code) = h.shipped_order(1, None).await;
    let (_, other_code) = h.shipped_order(2, None).await;
    h.carrier
        .set_status(&code, StatusResult::with_status(ShipmentStatus::InTransit));
    h.carrier
        .set_status(&other_code, StatusResult::with_status(ShipmentStatus::InTransit));
    h.repository.set_fail_on_update(order_id, true).await;

    let summary = h.run().await;
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].order_id, order_id);
    assert_eq!(summary.errors[0].kind, "repository");
}

#[tokio::test]
async fn test_delivered_shipments_leave_the_candidate_set() {
    let h = TestHarness::new();
    let (order_id, code) = h.shipped_order(1, Some(ShipmentStatus::OutForDelivery)).await;
    h.carrier
        .set_status(&code, status_with_url(ShipmentStatus::Delivered, "7001"));

    let first = h.run().await;
    assert_eq!(first.updated, 1);
    assert_eq!(
        h.repository.order(order_id).await.unwrap().state,
        OrderState::Delivered
    );

    let second = h.run().await;
    assert_eq!(second.processed, 0);
    assert_eq!(h.carrier.query_count(), 1);
}

#[tokio::test]
async fn test_notification_requires_a_tracking_url() {
    let h = TestHarness::new();
    let (_, code) = h.shipped_order(1, None).await;
    h.carrier
        .set_status(&code, StatusResult::with_status(ShipmentStatus::Received));

    let summary = h.run().await;
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.notified, 0);
    assert_eq!(h.notifier.sent_count().await, 0);
}

#[tokio::test]
async fn test_stored_tracking_url_enables_notification() {
    let h = TestHarness::new();
    let (order_id, code) = h.shipped_order(1, Some(ShipmentStatus::InTransit)).await;
    let mut order = h.repository.order(order_id).await.unwrap();
    if let Some(shipment) = order.shipment.as_mut() {
        shipment.tracking_url = Some("https://track.example/?no=7001".to_string());
    }
    h.repository.insert(order).await;
    h.carrier
        .set_status(&code, StatusResult::with_status(ShipmentStatus::OutForDelivery));

    let summary = h.run().await;
    assert_eq!(summary.notified, 1);
    let sent = h.notifier.sent().await;
    assert_eq!(
        sent[0].tracking_url.as_deref(),
        Some("https://track.example/?no=7001")
    );
}

#[tokio::test]
async fn test_notification_failure_is_not_a_sync_error() {
    let h = TestHarness::new();
    let (order_id, code) = h.shipped_order(1, None).await;
    h.carrier
        .set_status(&code, status_with_url(ShipmentStatus::InTransit, "7001"));
    h.notifier.set_fail(true).await;

    let summary = h.run().await;
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.notified, 0);
    assert!(summary.errors.is_empty());
    assert_eq!(
        h.repository.order(order_id).await.unwrap().shipment_status(),
        Some(ShipmentStatus::InTransit)
    );
}

#[tokio::test]
async fn test_unknown_or_missing_status_is_skipped() {
    let h = TestHarness::new();
    let (_, unknown_code) = h.shipped_order(2, Some(ShipmentStatus::InTransit)).await;
    h.shipped_order(1, Some(ShipmentStatus::InTransit)).await;
    h.carrier.set_status(
        &unknown_code,
        StatusResult {
            status: StatusLookup::Unknown("42".to_string()),
            ..StatusResult::missing()
        },
    );

    let summary = h.run().await;
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.updated, 0);
    assert_eq!(h.repository.status_write_count(), 0);
}

#[tokio::test]
async fn test_backward_transition_is_persisted() {
    let h = TestHarness::new();
    let (order_id, code) = h.shipped_order(1, Some(ShipmentStatus::NotDelivered)).await;
    h.carrier
        .set_status(&code, StatusResult::with_status(ShipmentStatus::OutForDelivery));

    let summary = h.run().await;
    assert_eq!(summary.updated, 1);
    assert_eq!(
        h.repository.order(order_id).await.unwrap().shipment_status(),
        Some(ShipmentStatus::OutForDelivery)
    );
}

#[tokio::test]
async fn test_tracking_number_used_without_integration_code() {
    let h = TestHarness::new();
    let (order_id, _) = h.shipped_order(1, None).await;
    let mut order = h.repository.order(order_id).await.unwrap();
    if let Some(shipment) = order.shipment.as_mut() {
        shipment.integration_code = None;
        shipment.tracking_number = Some("TR-7001".to_string());
    }
    h.repository.insert(order).await;
    h.carrier
        .set_status("7001", StatusResult::with_status(ShipmentStatus::InTransit));

    let summary = h.run().await;
    assert_eq!(summary.updated, 1);
    assert_eq!(h.carrier.queries()[0].mode(), carrier::QueryMode::TrackingNumber);
}

#[tokio::test]
async fn test_newest_first_and_batch_limits() {
    let h = TestHarness::with_options(SyncOptions {
        max_batch: 3,
        inter_call_delay: Duration::ZERO,
        run_deadline: None,
    });
    for seq in 1..=5 {
        h.shipped_order(seq, None).await;
    }

    let summary = h
        .synchronizer
        .run(2, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(summary.processed, 2);
    let queried: Vec<String> = h
        .carrier
        .queries()
        .iter()
        .map(|q| q.value().to_string())
        .collect();
    assert_eq!(queried, vec![format!("{:016}", 1_005), format!("{:016}", 1_004)]);

    // the configured maximum caps larger requests
    let summary = h.run().await;
    assert_eq!(summary.processed, 3);
}

#[tokio::test]
async fn test_candidate_fetch_failure_aborts_the_run() {
    let h = TestHarness::new();
    h.shipped_order(1, None).await;
    h.repository.set_fail_on_fetch(true).await;

    let err = h
        .synchronizer
        .run(50, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::CandidateFetch(_)));
    assert_eq!(h.carrier.query_count(), 0);
}

#[tokio::test]
async fn test_cancelled_token_stops_before_first_order() {
    let h = TestHarness::new();
    h.shipped_order(1, None).await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let summary = h.synchronizer.run(50, &cancel).await.unwrap();
    assert!(summary.cancelled);
    assert_eq!(summary.processed, 0);
    assert_eq!(h.carrier.query_count(), 0);
}

#[tokio::test]
async fn test_cancellation_between_orders() {
    let h = TestHarness::with_options(SyncOptions {
        inter_call_delay: Duration::from_millis(300),
        ..SyncOptions::default()
    });
    for seq in 1..=3 {
        h.shipped_order(seq, None).await;
    }
    let cancel = CancellationToken::new();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let summary = h.synchronizer.run(50, &cancel).await.unwrap();
    assert!(summary.cancelled);
    assert_eq!(summary.processed, 1);
    assert_eq!(h.carrier.query_count(), 1);
}

#[tokio::test]
async fn test_exhausted_deadline_stops_the_run() {
    let h = TestHarness::with_options(SyncOptions {
        inter_call_delay: Duration::ZERO,
        run_deadline: Some(Duration::ZERO),
        ..SyncOptions::default()
    });
    h.shipped_order(1, None).await;

    let summary = h.run().await;
    assert!(summary.cancelled);
    assert_eq!(summary.processed, 0);
}

#[tokio::test]
async fn test_overlapping_run_is_rejected() {
    let h = TestHarness::with_options(SyncOptions {
        inter_call_delay: Duration::from_millis(300),
        ..SyncOptions::default()
    });
    h.shipped_order(1, None).await;
    h.shipped_order(2, None).await;

    let synchronizer = h.synchronizer.clone();
    let first = tokio::spawn(async move {
        synchronizer.run(50, &CancellationToken::new()).await
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(h.synchronizer.is_running());
    let err = h
        .synchronizer
        .run(50, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::AlreadyRunning));

    let summary = first.await.unwrap().unwrap();
    assert_eq!(summary.processed, 2);
    assert!(!h.synchronizer.is_running());
}
