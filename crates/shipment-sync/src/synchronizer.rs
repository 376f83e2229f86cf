//! Polling loop keeping stored shipment status in line with the carrier.

use std::time::{Duration, Instant};

use carrier::{CarrierClient, QueryIdentifier, QueryMode, StatusResult};
use domain::{NotificationSender, Order, OrderRepository, ShipmentStatus};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::{OrderSyncError, SyncError};
use crate::summary::{OrderSyncFailure, SyncSummary};

/// Default number of shipments polled per run.
pub const DEFAULT_MAX_BATCH: usize = 50;

/// Default pause between two carrier calls.
pub const DEFAULT_INTER_CALL_DELAY: Duration = Duration::from_millis(100);

/// Tuning knobs for a [`ShipmentSynchronizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Upper bound on shipments polled per run. Callers may ask for fewer.
    pub max_batch: usize,
    /// Pause between consecutive carrier calls.
    pub inter_call_delay: Duration,
    /// Wall-clock budget for a run. Checked between orders only.
    pub run_deadline: Option<Duration>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            max_batch: DEFAULT_MAX_BATCH,
            inter_call_delay: DEFAULT_INTER_CALL_DELAY,
            run_deadline: None,
        }
    }
}

/// What happened to one shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrderOutcome {
    Updated { notified: bool },
    Unchanged,
    Skipped,
}

/// Polls the carrier for every open shipment and records changes.
///
/// Runs are single-flight: a call to [`run`](Self::run) while another one is
/// in progress fails immediately with [`SyncError::AlreadyRunning`]. Within
/// a run shipments are processed one at a time.
pub struct ShipmentSynchronizer<R, C, N>
where
    R: OrderRepository,
    C: CarrierClient,
    N: NotificationSender,
{
    repository: R,
    carrier: C,
    notifier: N,
    options: SyncOptions,
    run_lock: Mutex<()>,
}

impl<R, C, N> ShipmentSynchronizer<R, C, N>
where
    R: OrderRepository,
    C: CarrierClient,
    N: NotificationSender,
{
    pub fn new(repository: R, carrier: C, notifier: N, options: SyncOptions) -> Self {
        Self {
            repository,
            carrier,
            notifier,
            options,
            run_lock: Mutex::new(()),
        }
    }

    pub fn options(&self) -> SyncOptions {
        self.options
    }

    /// Returns true while a run is in progress.
    pub fn is_running(&self) -> bool {
        self.run_lock.try_lock().is_err()
    }

    /// Synchronizes at most `max_batch` shipments (capped by the configured
    /// maximum), newest first.
    ///
    /// Only a failure to load the candidate list aborts the run; every other
    /// failure is recorded against its order and the run moves on.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn run(
        &self,
        max_batch: usize,
        cancel: &CancellationToken,
    ) -> Result<SyncSummary, SyncError> {
        let Ok(_guard) = self.run_lock.try_lock() else {
            metrics::counter!("shipment_sync_runs_total", "outcome" => "rejected").increment(1);
            tracing::warn!("sync run rejected, previous run still in progress");
            return Err(SyncError::AlreadyRunning);
        };

        let started = Instant::now();
        let deadline = self.options.run_deadline.map(|d| started + d);
        let limit = max_batch.min(self.options.max_batch);

        let candidates = match self.repository.fetch_pending_shipments(limit).await {
            Ok(candidates) => candidates,
            Err(e) => {
                metrics::counter!("shipment_sync_runs_total", "outcome" => "failed").increment(1);
                tracing::error!(error = %e, "could not load pending shipments");
                return Err(SyncError::CandidateFetch(e));
            }
        };
        tracing::info!(candidates = candidates.len(), limit, "sync run started");

        let mut summary = SyncSummary::default();
        for (index, order) in candidates.iter().enumerate() {
            if index > 0 && !self.options.inter_call_delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(self.options.inter_call_delay) => {}
                }
            }
            if cancel.is_cancelled() || deadline.is_some_and(|d| Instant::now() >= d) {
                tracing::warn!(
                    remaining = candidates.len() - index,
                    "sync run stopped before completion"
                );
                summary.cancelled = true;
                break;
            }

            summary.processed += 1;
            match self.sync_order(order).await {
                Ok(OrderOutcome::Updated { notified }) => {
                    summary.updated += 1;
                    if notified {
                        summary.notified += 1;
                    }
                }
                Ok(OrderOutcome::Unchanged) => {}
                Ok(OrderOutcome::Skipped) => summary.skipped += 1,
                Err(e) => {
                    metrics::counter!("shipment_sync_errors_total", "kind" => e.kind())
                        .increment(1);
                    tracing::warn!(
                        order_number = %order.order_number,
                        kind = e.kind(),
                        error = %e,
                        "shipment sync failed"
                    );
                    summary.errors.push(OrderSyncFailure {
                        order_id: order.id,
                        order_number: order.order_number.clone(),
                        kind: e.kind().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let elapsed = started.elapsed();
        summary.duration_ms = elapsed.as_millis() as u64;
        metrics::histogram!("shipment_sync_duration_seconds").record(elapsed.as_secs_f64());
        metrics::counter!("shipment_sync_runs_total", "outcome" => "completed").increment(1);
        tracing::info!(
            processed = summary.processed,
            updated = summary.updated,
            notified = summary.notified,
            skipped = summary.skipped,
            errors = summary.errors.len(),
            cancelled = summary.cancelled,
            duration_ms = summary.duration_ms,
            "sync run finished"
        );
        Ok(summary)
    }

    #[tracing::instrument(skip(self, order), fields(order_number = %order.order_number))]
    async fn sync_order(&self, order: &Order) -> Result<OrderOutcome, OrderSyncError> {
        let identifier = query_identifier(order)?;
        let result = self.carrier.query_status(&identifier).await?;

        let Some(status) = result.status.known() else {
            tracing::debug!(reported = ?result.status, "no usable status from carrier");
            return Ok(OrderOutcome::Skipped);
        };

        let previous = order.shipment_status();
        if previous == Some(status) {
            return Ok(OrderOutcome::Unchanged);
        }
        if let Some(previous) = previous
            && status.is_regression_from(previous)
        {
            tracing::warn!(from = %previous, to = %status, "carrier reported a backward transition");
        }

        self.repository
            .update_shipment_status(
                order.id,
                status,
                result.tracking_number.clone(),
                result.tracking_url.clone(),
            )
            .await?;
        metrics::counter!("shipment_sync_status_changes_total", "status" => status.as_str())
            .increment(1);
        if status.is_delivered() {
            tracing::info!("shipment delivered, leaving the sync set");
        } else {
            tracing::info!(from = ?previous, to = %status, "shipment status changed");
        }

        let notified = self.notify(order, status, &result).await;
        Ok(OrderOutcome::Updated { notified })
    }

    /// Emails the customer if a tracking link is known. Failures are logged only.
    async fn notify(&self, order: &Order, status: ShipmentStatus, result: &StatusResult) -> bool {
        let mut updated = order.clone();
        let Some(shipment) = updated.shipment.as_mut() else {
            return false;
        };
        shipment.status = Some(status);
        if result.tracking_number.is_some() {
            shipment.tracking_number = result.tracking_number.clone();
        }
        if result.tracking_url.is_some() {
            shipment.tracking_url = result.tracking_url.clone();
        }
        if shipment.tracking_url.is_none() {
            tracing::debug!("no tracking URL yet, notification deferred");
            return false;
        }

        match self
            .notifier
            .send_shipment_status_email(&updated, status)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "shipment status email failed");
                false
            }
        }
    }
}

/// Picks the identifier to query with: the integration code when stored,
/// otherwise the tracking number.
fn query_identifier(order: &Order) -> Result<QueryIdentifier, OrderSyncError> {
    let shipment = order
        .shipment
        .as_ref()
        .ok_or(OrderSyncError::NoQueryIdentifier)?;

    let stored = [
        (QueryMode::IntegrationCode, &shipment.integration_code),
        (QueryMode::TrackingNumber, &shipment.tracking_number),
    ];
    for (mode, value) in stored {
        if let Some(value) = value.as_deref()
            && let Ok(identifier) = QueryIdentifier::new(mode, value)
        {
            return Ok(identifier);
        }
    }
    Err(OrderSyncError::NoQueryIdentifier)
}
