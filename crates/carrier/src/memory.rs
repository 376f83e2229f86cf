//! Scripted in-memory carrier for tests.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::client::CarrierClient;
use crate::create::{ShipmentRequest, ShipmentResult};
use crate::error::{CarrierError, Result};
use crate::query::{QueryIdentifier, StatusResult};

#[derive(Debug, Default)]
struct InMemoryCarrierState {
    statuses: HashMap<String, Result<StatusResult>>,
    create_failure: Option<CarrierError>,
    created: Vec<ShipmentRequest>,
    queries: Vec<QueryIdentifier>,
}

/// In-memory carrier.
///
/// Creation succeeds by echoing the sent identifiers unless a failure is
/// scripted. Queries answer whatever was scripted for the identifier value,
/// or a result without status.
#[derive(Debug, Clone)]
pub struct InMemoryCarrierClient {
    name: String,
    state: Arc<RwLock<InMemoryCarrierState>>,
}

impl Default for InMemoryCarrierClient {
    fn default() -> Self {
        Self {
            name: "in-memory-carrier".to_string(),
            state: Arc::default(),
        }
    }
}

impl InMemoryCarrierClient {
    /// Creates a new in-memory carrier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the answer for queries on `identifier` (compared by digits).
    pub fn set_status(&self, identifier: &str, result: StatusResult) {
        self.state
            .write()
            .unwrap()
            .statuses
            .insert(digits(identifier), Ok(result));
    }

    /// Scripts a failure for queries on `identifier`.
    pub fn fail_query(&self, identifier: &str, error: CarrierError) {
        self.state
            .write()
            .unwrap()
            .statuses
            .insert(digits(identifier), Err(error));
    }

    /// Makes every subsequent creation fail with `error`, or succeed again with `None`.
    pub fn set_create_failure(&self, error: Option<CarrierError>) {
        self.state.write().unwrap().create_failure = error;
    }

    /// Requests that reached the carrier (after local validation).
    pub fn created_requests(&self) -> Vec<ShipmentRequest> {
        self.state.read().unwrap().created.clone()
    }

    /// Number of status queries received.
    pub fn query_count(&self) -> usize {
        self.state.read().unwrap().queries.len()
    }

    /// Status queries received, in order.
    pub fn queries(&self) -> Vec<QueryIdentifier> {
        self.state.read().unwrap().queries.clone()
    }
}

fn digits(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

#[async_trait]
impl CarrierClient for InMemoryCarrierClient {
    fn carrier_name(&self) -> &str {
        &self.name
    }

    async fn create_shipment(&self, request: &ShipmentRequest) -> Result<ShipmentResult> {
        request.validate()?;

        let mut state = self.state.write().unwrap();
        state.created.push(request.clone());
        if let Some(error) = &state.create_failure {
            return Err(error.clone());
        }

        let ids = &request.identifiers;
        Ok(ShipmentResult {
            integration_code: ids.integration_code.clone(),
            waybill_key: ids.trading_waybill_number.clone(),
            barcode_number: ids.barcode_number.clone(),
            tracking_number: None,
            message: Some("OK".to_string()),
        })
    }

    async fn query_status(&self, identifier: &QueryIdentifier) -> Result<StatusResult> {
        let mut state = self.state.write().unwrap();
        state.queries.push(identifier.clone());
        state
            .statuses
            .get(identifier.value())
            .cloned()
            .unwrap_or_else(|| Ok(StatusResult::missing()))
    }
}
