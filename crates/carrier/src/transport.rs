//! HTTP plumbing shared by both adapters: POST an XML body, get status and text back.

use std::time::Instant;

use crate::config::EndpointConfig;
use crate::error::{CarrierError, Result};

const XML_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// Raw HTTP outcome of a SOAP call.
#[derive(Debug)]
pub(crate) struct SoapResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone)]
pub(crate) struct SoapTransport {
    http: reqwest::Client,
    url: String,
}

impl SoapTransport {
    /// Builds an HTTP client bound to the endpoint's timeouts.
    pub fn new(endpoint: &EndpointConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(endpoint.timeout)
            .connect_timeout(endpoint.connect_timeout())
            .build()
            .map_err(|e| CarrierError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                timed_out: false,
                status: None,
            })?;
        Ok(Self {
            http,
            url: endpoint.url.clone(),
        })
    }

    /// Posts `envelope` with the given SOAPAction header.
    ///
    /// Only failures to complete the exchange are errors here; the status
    /// code is returned for the adapter to interpret.
    pub async fn post(&self, soap_action: &str, envelope: String) -> Result<SoapResponse> {
        let started = Instant::now();
        let response = self
            .http
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, XML_CONTENT_TYPE)
            .header("SOAPAction", format!("\"{soap_action}\""))
            .body(envelope)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;

        tracing::debug!(
            soap_action,
            status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            bytes = body.len(),
            "carrier responded"
        );

        Ok(SoapResponse { status, body })
    }
}

fn transport_error(e: reqwest::Error) -> CarrierError {
    CarrierError::Transport {
        message: e.to_string(),
        timed_out: e.is_timeout(),
        status: e.status().map(|s| s.as_u16()),
    }
}

/// Records the outcome of one carrier call.
pub(crate) fn record_outcome<T>(operation: &'static str, started: Instant, result: &Result<T>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.kind().as_str(),
    };
    metrics::counter!("carrier_requests_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
    metrics::histogram!("carrier_request_duration_seconds", "operation" => operation)
        .record(started.elapsed().as_secs_f64());
}
