//! Shipment status queries over the carrier's WCF endpoint.
//!
//! Request: the login triple and the query parameters are each serialized
//! as their own small XML document, and both documents travel as CDATA
//! inside a single `GetQueryJSON` SOAP operation.
//!
//! Response: a JSON document, XML-entity-encoded, inside the
//! `GetQueryJSONResult` element.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{Credentials, EndpointConfig};
use crate::error::{CarrierError, ParseStage, Result};
use crate::status_map::{StatusLookup, map_status_code};
use crate::transport::{SoapTransport, record_outcome};
use crate::xml::{decode_xml_entities, escape_xml, extract_tag, parse_soap_fault, wrap_cdata};

/// SOAP operation name for status queries.
pub const QUERY_OPERATION: &str = "GetQueryJSON";

/// SOAPAction header value for status queries.
pub const QUERY_SOAP_ACTION: &str = "http://tempuri.org/IIntegrationService/GetQueryJSON";

/// Placeholder replaced by the tracking number in URL templates.
pub const TRACKING_NUMBER_PLACEHOLDER: &str = "{tracking_number}";

const RESULT_TAGS: &[&str] = &["GetQueryJSONResult", "QueryJSONResult"];

const STATUS_CODE_KEYS: &[&str] = &["StatusCode", "CargoStatusCode", "ShipmentStatusCode"];
const TRACKING_NUMBER_KEYS: &[&str] = &["TrackingNumber", "CargoTrackingNumber", "CargoKey"];
const TRACKING_URL_KEYS: &[&str] = &["TrackingUrl", "TrackingURL", "CargoTrackingUrl"];
const DESCRIPTION_KEYS: &[&str] = &["StatusDescription", "CargoStatus", "Status"];
const ERROR_CODE_KEYS: &[&str] = &["ErrorCode", "ResultCode"];
const ERROR_MESSAGE_KEYS: &[&str] = &["ErrorMessage", "ResultMessage", "Message"];

/// Which identifier a status query is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryMode {
    IntegrationCode,
    TrackingNumber,
}

impl QueryMode {
    /// The carrier's query-type discriminator.
    pub fn query_type(&self) -> &'static str {
        match self {
            QueryMode::IntegrationCode => "1",
            QueryMode::TrackingNumber => "2",
        }
    }

    /// Element name carrying the identifier inside the query fragment.
    pub fn element(&self) -> &'static str {
        match self {
            QueryMode::IntegrationCode => "IntegrationCode",
            QueryMode::TrackingNumber => "TrackingNumber",
        }
    }

    /// Field name used in validation errors.
    pub fn field(&self) -> &'static str {
        match self {
            QueryMode::IntegrationCode => "integrationCode",
            QueryMode::TrackingNumber => "trackingNumber",
        }
    }
}

/// A status query target. The value is always digits only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryIdentifier {
    mode: QueryMode,
    value: String,
}

impl QueryIdentifier {
    /// Normalizes `raw` to its digits. Fails if no digits remain.
    pub fn new(mode: QueryMode, raw: &str) -> Result<Self> {
        let value: String = raw.chars().filter(char::is_ascii_digit).collect();
        if value.is_empty() {
            return Err(CarrierError::invalid_field(
                mode.field(),
                format!("{raw:?} contains no digits"),
            ));
        }
        Ok(Self { mode, value })
    }

    pub fn integration_code(raw: &str) -> Result<Self> {
        Self::new(QueryMode::IntegrationCode, raw)
    }

    pub fn tracking_number(raw: &str) -> Result<Self> {
        Self::new(QueryMode::TrackingNumber, raw)
    }

    pub fn mode(&self) -> QueryMode {
        self.mode
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// What the carrier currently reports for a shipment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResult {
    pub status: StatusLookup,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub description: Option<String>,
}

impl StatusResult {
    /// A result with a known status and nothing else.
    pub fn with_status(status: domain::ShipmentStatus) -> Self {
        Self {
            status: StatusLookup::Known(status),
            tracking_number: None,
            tracking_url: None,
            description: None,
        }
    }

    /// A result carrying no status at all.
    pub fn missing() -> Self {
        Self {
            status: StatusLookup::Missing,
            tracking_number: None,
            tracking_url: None,
            description: None,
        }
    }
}

/// Builds the GetQueryJSON envelope with its two CDATA-wrapped fragments.
pub fn build_query_envelope(credentials: &Credentials, identifier: &QueryIdentifier) -> String {
    let login_info = format!(
        "<LoginInfo><UserName>{}</UserName><Password>{}</Password><CustomerCode>{}</CustomerCode></LoginInfo>",
        escape_xml(&credentials.username),
        escape_xml(&credentials.password),
        escape_xml(&credentials.customer_code),
    );
    let query_info = format!(
        "<QueryInfo><QueryType>{qt}</QueryType><{el}>{value}</{el}></QueryInfo>",
        qt = identifier.mode.query_type(),
        el = identifier.mode.element(),
        value = identifier.value,
    );

    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body>
    <{op} xmlns="http://tempuri.org/">
      <loginInfo>{login}</loginInfo>
      <queryInfo>{query}</queryInfo>
    </{op}>
  </s:Body>
</s:Envelope>"#,
        op = QUERY_OPERATION,
        login = wrap_cdata(&login_info),
        query = wrap_cdata(&query_info),
    )
}

/// Classifies a GetQueryJSON response.
///
/// Steps, each with its own failure: fault scan (any HTTP status), HTTP
/// status, result tag extraction, entity decoding, JSON parsing.
pub fn interpret_query_response(
    status: u16,
    body: &str,
    tracking_url_template: Option<&str>,
) -> Result<StatusResult> {
    if let Some(fault) = parse_soap_fault(body) {
        return Err(CarrierError::Fault {
            code: fault.code,
            message: fault.message,
            detail: fault.detail,
        });
    }

    if !(200..300).contains(&status) {
        return Err(CarrierError::Transport {
            message: format!("carrier returned HTTP {status}"),
            timed_out: false,
            status: Some(status),
        });
    }

    let encoded = extract_tag(body, RESULT_TAGS).ok_or_else(|| {
        CarrierError::parse(ParseStage::ResultTag, "no GetQueryJSONResult element")
    })?;
    let decoded = decode_xml_entities(&encoded);
    let document: Value = serde_json::from_str(&decoded)
        .map_err(|e| CarrierError::parse(ParseStage::Json, e.to_string()))?;

    read_status_document(&document, tracking_url_template)
}

fn read_status_document(
    document: &Value,
    tracking_url_template: Option<&str>,
) -> Result<StatusResult> {
    if let Some(error) = find_object(document, ERROR_CODE_KEYS)
        && let Some(code) = first_string(error, ERROR_CODE_KEYS).filter(|c| c != "0")
    {
        let message = first_string(error, ERROR_MESSAGE_KEYS)
            .unwrap_or_else(|| "no message from carrier".to_string());
        return Err(CarrierError::Business { code, message });
    }

    let Some(cargo) = find_object(document, STATUS_CODE_KEYS)
        .or_else(|| find_object(document, TRACKING_NUMBER_KEYS))
    else {
        return Ok(StatusResult::missing());
    };

    let status = first_string(cargo, STATUS_CODE_KEYS)
        .map(|code| map_status_code(&code))
        .unwrap_or(StatusLookup::Missing);
    let tracking_number = first_string(cargo, TRACKING_NUMBER_KEYS);
    let tracking_url = first_string(cargo, TRACKING_URL_KEYS).or_else(|| {
        let template = tracking_url_template?;
        let number = tracking_number.as_deref()?;
        Some(template.replace(TRACKING_NUMBER_PLACEHOLDER, number))
    });

    Ok(StatusResult {
        status,
        tracking_number,
        tracking_url,
        description: first_string(cargo, DESCRIPTION_KEYS),
    })
}

/// Depth-first search for the first object holding any of `keys`.
fn find_object<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Map<String, Value>> {
    match value {
        Value::Object(map) => {
            if keys.iter().any(|k| map.contains_key(*k)) {
                return Some(map);
            }
            map.values().find_map(|v| find_object(v, keys))
        }
        Value::Array(items) => items.iter().find_map(|v| find_object(v, keys)),
        _ => None,
    }
}

/// First non-empty scalar under any of `keys`, as a string.
fn first_string(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match map.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Adapter for the status-query endpoint.
#[derive(Debug, Clone)]
pub struct StatusQueryClient {
    transport: SoapTransport,
    credentials: Credentials,
    tracking_url_template: Option<String>,
}

impl StatusQueryClient {
    /// Creates a client for the given endpoint.
    pub fn new(endpoint: EndpointConfig) -> Result<Self> {
        Ok(Self {
            transport: SoapTransport::new(&endpoint)?,
            credentials: endpoint.credentials,
            tracking_url_template: None,
        })
    }

    /// Sets the URL template used when the carrier omits a tracking URL.
    /// `{tracking_number}` is replaced by the tracking number.
    pub fn with_tracking_url_template(mut self, template: Option<String>) -> Self {
        self.tracking_url_template = template;
        self
    }

    /// Asks the carrier for the current status of a shipment.
    #[tracing::instrument(
        skip(self, identifier),
        fields(mode = ?identifier.mode(), value = %identifier.value())
    )]
    pub async fn query_status(&self, identifier: &QueryIdentifier) -> Result<StatusResult> {
        let started = Instant::now();
        let envelope = build_query_envelope(&self.credentials, identifier);
        let result = match self.transport.post(QUERY_SOAP_ACTION, envelope).await {
            Ok(response) => interpret_query_response(
                response.status,
                &response.body,
                self.tracking_url_template.as_deref(),
            ),
            Err(e) => Err(e),
        };
        record_outcome("query_status", started, &result);

        match &result {
            Ok(StatusResult {
                status: StatusLookup::Unknown(code),
                ..
            }) => tracing::warn!(code = %code, "carrier returned an unknown status code"),
            Ok(found) => tracing::debug!(status = ?found.status, "status query answered"),
            Err(CarrierError::Parse { stage, message }) => {
                tracing::error!(stage = %stage, error = %message, "status response unparsable")
            }
            Err(e) => tracing::warn!(kind = e.kind().as_str(), error = %e, "status query failed"),
        }
        result
    }
}
