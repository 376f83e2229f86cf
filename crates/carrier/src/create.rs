//! Shipment creation over the carrier's flat SOAP/XML endpoint.

use std::time::Instant;

use domain::{Money, ShipmentIdentifiers, conventional_barcode, is_valid_integration_code};
use serde::{Deserialize, Serialize};

use crate::config::{Credentials, EndpointConfig};
use crate::error::{CarrierError, ParseStage, Result};
use crate::transport::{SoapTransport, record_outcome};
use crate::xml::{decode_xml_entities, escape_xml, extract_tag, parse_soap_fault};

/// SOAP operation name for shipment creation.
pub const CREATE_OPERATION: &str = "SetOrder";

/// SOAPAction header value for shipment creation.
pub const CREATE_SOAP_ACTION: &str = "http://tempuri.org/SetOrder";

/// Result code the carrier returns on success.
pub const RESULT_OK: &str = "0";

/// Weight sent when the order does not record one.
pub const DEFAULT_WEIGHT_KG: f64 = 1.0;

/// Volumetric weight sent when the order does not record one.
pub const DEFAULT_DESI: f64 = 1.0;

const RESULT_CODE_TAGS: &[&str] = &["ResultCode", "resultCode", "ErrorCode"];
const RESULT_MESSAGE_TAGS: &[&str] = &["ResultMessage", "resultMessage", "ErrorMessage"];
const INTEGRATION_CODE_TAGS: &[&str] = &["IntegrationCode", "OrgIntegrationCode", "integrationCode"];
const WAYBILL_KEY_TAGS: &[&str] = &["InvoiceKey", "WaybillKey", "TradingWaybillNumber"];
const BARCODE_TAGS: &[&str] = &["BarcodeNumber", "Barcode", "barcode"];
const TRACKING_NUMBER_TAGS: &[&str] = &["TrackingNumber", "CargoKey", "ShipmentNumber"];

/// Who pays the carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentResponsibility {
    #[default]
    Sender,
    Recipient,
}

impl PaymentResponsibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentResponsibility::Sender => "sender",
            PaymentResponsibility::Recipient => "recipient",
        }
    }
}

/// Name and address of a sender or recipient.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    pub phone: String,
    pub address_line: String,
    pub city: String,
    pub district: Option<String>,
    pub postal_code: Option<String>,
}

/// Everything the carrier needs to register a shipment.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentRequest {
    pub identifiers: ShipmentIdentifiers,
    pub sender: Party,
    pub recipient: Party,
    pub weight_kg: Option<f64>,
    pub desi: Option<f64>,
    pub piece_count: u32,
    pub payment: PaymentResponsibility,
    pub declared_value: Money,
    pub description: String,
}

impl ShipmentRequest {
    /// Checks the request locally. Errors name the offending wire field.
    pub fn validate(&self) -> Result<()> {
        let recipient = &self.recipient;
        require("recipientName", Some(&recipient.name))?;
        require("recipientPhone", Some(&recipient.phone))?;
        require("recipientAddress", Some(&recipient.address_line))?;
        require("recipientCity", Some(&recipient.city))?;
        require("recipientDistrict", recipient.district.as_ref())?;
        require("tradingWaybillNumber", Some(&self.identifiers.trading_waybill_number))?;

        if !is_valid_integration_code(&self.identifiers.integration_code) {
            return Err(CarrierError::invalid_field(
                "integrationCode",
                "must be exactly 16 digits",
            ));
        }
        if self.piece_count == 0 {
            return Err(CarrierError::invalid_field(
                "pieceCount",
                "must be at least 1",
            ));
        }
        for (field, value) in [("weight", self.weight_kg), ("desi", self.desi)] {
            if value.is_some_and(|v| !v.is_finite() || v <= 0.0) {
                return Err(CarrierError::invalid_field(field, "must be positive"));
            }
        }
        Ok(())
    }

    pub fn effective_weight_kg(&self) -> f64 {
        self.weight_kg.unwrap_or(DEFAULT_WEIGHT_KG)
    }

    pub fn effective_desi(&self) -> f64 {
        self.desi.unwrap_or(DEFAULT_DESI)
    }
}

fn require(field: &str, value: Option<&String>) -> Result<()> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(CarrierError::missing_field(field)),
    }
}

/// Identifiers the carrier assigned to a newly created shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentResult {
    pub integration_code: String,
    pub waybill_key: String,
    pub barcode_number: String,
    pub tracking_number: Option<String>,
    pub message: Option<String>,
}

/// Builds the SetOrder envelope.
pub fn build_create_envelope(credentials: &Credentials, request: &ShipmentRequest) -> String {
    let ids = &request.identifiers;
    let sender = &request.sender;
    let recipient = &request.recipient;
    let opt = |v: &Option<String>| escape_xml(v.as_deref().unwrap_or_default().trim());

    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <{op} xmlns="http://tempuri.org/">
      <orderInfo>
        <Order>
          <UserName>{username}</UserName>
          <Password>{password}</Password>
          <CustomerCode>{customer_code}</CustomerCode>
          <TradingWaybillNumber>{waybill}</TradingWaybillNumber>
          <IntegrationCode>{integration_code}</IntegrationCode>
          <BarcodeNumber>{barcode}</BarcodeNumber>
          <SenderName>{sender_name}</SenderName>
          <SenderPhone>{sender_phone}</SenderPhone>
          <SenderAddress>{sender_address}</SenderAddress>
          <SenderCityName>{sender_city}</SenderCityName>
          <SenderTownName>{sender_district}</SenderTownName>
          <SenderPostalCode>{sender_postal}</SenderPostalCode>
          <ReceiverName>{recipient_name}</ReceiverName>
          <ReceiverPhone1>{recipient_phone}</ReceiverPhone1>
          <ReceiverAddress>{recipient_address}</ReceiverAddress>
          <ReceiverCityName>{recipient_city}</ReceiverCityName>
          <ReceiverTownName>{recipient_district}</ReceiverTownName>
          <ReceiverPostalCode>{recipient_postal}</ReceiverPostalCode>
          <Weight>{weight:.2}</Weight>
          <VolumetricWeight>{desi:.2}</VolumetricWeight>
          <PieceCount>{pieces}</PieceCount>
          <PayorType>{payor}</PayorType>
          <DeclaredValue>{declared}</DeclaredValue>
          <Description>{description}</Description>
        </Order>
      </orderInfo>
    </{op}>
  </soap:Body>
</soap:Envelope>"#,
        op = CREATE_OPERATION,
        username = escape_xml(&credentials.username),
        password = escape_xml(&credentials.password),
        customer_code = escape_xml(&credentials.customer_code),
        waybill = escape_xml(&ids.trading_waybill_number),
        integration_code = ids.integration_code,
        barcode = escape_xml(&ids.barcode_number),
        sender_name = escape_xml(sender.name.trim()),
        sender_phone = escape_xml(sender.phone.trim()),
        sender_address = escape_xml(sender.address_line.trim()),
        sender_city = escape_xml(sender.city.trim()),
        sender_district = opt(&sender.district),
        sender_postal = opt(&sender.postal_code),
        recipient_name = escape_xml(recipient.name.trim()),
        recipient_phone = escape_xml(recipient.phone.trim()),
        recipient_address = escape_xml(recipient.address_line.trim()),
        recipient_city = escape_xml(recipient.city.trim()),
        recipient_district = opt(&recipient.district),
        recipient_postal = opt(&recipient.postal_code),
        weight = request.effective_weight_kg(),
        desi = request.effective_desi(),
        pieces = request.piece_count,
        payor = request.payment.as_str(),
        declared = request.declared_value,
        description = escape_xml(&request.description),
    )
}

/// Classifies a SetOrder response.
///
/// A SOAP Fault wins over everything, whatever the HTTP status. An HTTP
/// error without a fault is a transport error. Otherwise the result code
/// decides between success and a business rejection.
pub fn interpret_create_response(
    status: u16,
    body: &str,
    sent: &ShipmentIdentifiers,
) -> Result<ShipmentResult> {
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

    let code = extract_tag(body, RESULT_CODE_TAGS).ok_or_else(|| {
        CarrierError::parse(ParseStage::ResultCode, "no result code in SetOrder response")
    })?;
    let message = extract_tag(body, RESULT_MESSAGE_TAGS).map(|m| decode_xml_entities(&m));

    if code != RESULT_OK {
        return Err(CarrierError::Business {
            code,
            message: message.unwrap_or_else(|| "no message from carrier".to_string()),
        });
    }

    let integration_code = extract_tag(body, INTEGRATION_CODE_TAGS).unwrap_or_else(|| {
        tracing::warn!("carrier omitted integration code, keeping the one sent");
        sent.integration_code.clone()
    });
    let waybill_key = extract_tag(body, WAYBILL_KEY_TAGS).unwrap_or_else(|| {
        tracing::warn!("carrier omitted waybill key, keeping the trading waybill number");
        sent.trading_waybill_number.clone()
    });
    let barcode_number = extract_tag(body, BARCODE_TAGS).unwrap_or_else(|| {
        tracing::warn!("carrier omitted barcode, assuming the conventional one");
        conventional_barcode(&integration_code)
    });

    Ok(ShipmentResult {
        integration_code,
        waybill_key,
        barcode_number,
        tracking_number: extract_tag(body, TRACKING_NUMBER_TAGS),
        message,
    })
}

/// Adapter for the shipment-creation endpoint.
#[derive(Debug, Clone)]
pub struct SoapShipmentClient {
    transport: SoapTransport,
    credentials: Credentials,
}

impl SoapShipmentClient {
    /// Creates a client for the given endpoint.
    pub fn new(endpoint: EndpointConfig) -> Result<Self> {
        Ok(Self {
            transport: SoapTransport::new(&endpoint)?,
            credentials: endpoint.credentials,
        })
    }

    /// Registers a shipment with the carrier.
    ///
    /// Validation errors are returned before any network traffic.
    #[tracing::instrument(
        skip(self, request),
        fields(
            waybill = %request.identifiers.trading_waybill_number,
            integration_code = %request.identifiers.integration_code,
        )
    )]
    pub async fn create_shipment(&self, request: &ShipmentRequest) -> Result<ShipmentResult> {
        request.validate()?;

        let started = Instant::now();
        let envelope = build_create_envelope(&self.credentials, request);
        let result = match self.transport.post(CREATE_SOAP_ACTION, envelope).await {
            Ok(response) => {
                interpret_create_response(response.status, &response.body, &request.identifiers)
            }
            Err(e) => Err(e),
        };
        record_outcome("create_shipment", started, &result);

        match &result {
            Ok(created) => tracing::info!(barcode = %created.barcode_number, "shipment created"),
            Err(e) => tracing::warn!(kind = e.kind().as_str(), error = %e, "shipment creation failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{AttemptContext, derive_identifiers};

    fn request() -> ShipmentRequest {
        ShipmentRequest {
            identifiers: derive_identifiers(
                "SIP-1762940574",
                AttemptContext::new(1_762_940_574_537, 11),
            ),
            sender: Party {
                name: "Örnek Mağaza".to_string(),
                phone: "02120000000".to_string(),
                address_line: "Depo 1".to_string(),
                city: "İstanbul".to_string(),
                district: Some("Esenyurt".to_string()),
                postal_code: None,
            },
            recipient: Party {
                name: "Ayşe <Yılmaz> & Co".to_string(),
                phone: "05550000000".to_string(),
                address_line: "Moda Cad. \"No:5\"".to_string(),
                city: "İstanbul".to_string(),
                district: Some("Kadıköy".to_string()),
                postal_code: Some("34710".to_string()),
            },
            weight_kg: None,
            desi: Some(3.5),
            piece_count: 1,
            payment: PaymentResponsibility::Sender,
            declared_value: Money::from_minor(129_990),
            description: "SIP-1762940574".to_string(),
        }
    }

    #[test]
    fn test_blank_district_is_rejected_with_field_name() {
        for district in [None, Some(String::new()), Some("   ".to_string())] {
            let mut req = request();
            req.recipient.district = district;
            let err = req.validate().unwrap_err();
            assert_eq!(err, CarrierError::missing_field("recipientDistrict"));
        }
    }

    #[test]
    fn test_other_mandatory_fields_are_named() {
        let mut req = request();
        req.recipient.phone = " ".to_string();
        assert!(matches!(
            req.validate(),
            Err(CarrierError::Validation { field, .. }) if field == "recipientPhone"
        ));

        let mut req = request();
        req.identifiers.integration_code = "12AB".to_string();
        assert!(matches!(
            req.validate(),
            Err(CarrierError::Validation { field, .. }) if field == "integrationCode"
        ));

        let mut req = request();
        req.weight_kg = Some(0.0);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_envelope_escapes_free_text_and_applies_defaults() {
        let creds = Credentials::new("shop&co", "p<w>", "C-1");
        let xml = build_create_envelope(&creds, &request());

        assert!(xml.contains("<UserName>shop&amp;co</UserName>"));
        assert!(xml.contains("<Password>p&lt;w&gt;</Password>"));
        assert!(xml.contains("<ReceiverName>Ayşe &lt;Yılmaz&gt; &amp; Co</ReceiverName>"));
        assert!(xml.contains("<ReceiverAddress>Moda Cad. &quot;No:5&quot;</ReceiverAddress>"));
        assert!(xml.contains("<ReceiverTownName>Kadıköy</ReceiverTownName>"));
        assert!(xml.contains("<Weight>1.00</Weight>"));
        assert!(xml.contains("<VolumetricWeight>3.50</VolumetricWeight>"));
        assert!(xml.contains("<PayorType>sender</PayorType>"));
        assert!(xml.contains("<DeclaredValue>1299.90</DeclaredValue>"));
        assert!(xml.contains("<TradingWaybillNumber>SIP-1762940574</TradingWaybillNumber>"));
        assert!(xml.contains("<IntegrationCode>9405744057453711</IntegrationCode>"));
        assert!(xml.contains("<BarcodeNumber>94057440574537111</BarcodeNumber>"));
    }

    #[test]
    fn test_success_reads_aliased_fields() {
        let body = r#"<soap:Envelope><soap:Body><SetOrderResponse><SetOrderResult>
            <OrderResultInfo>
              <ResultCode>0</ResultCode>
              <ResultMessage>Başarılı</ResultMessage>
              <OrgIntegrationCode>9405744057453711</OrgIntegrationCode>
              <InvoiceKey>SIP-1762940574</InvoiceKey>
              <Barcode>94057440574537111</Barcode>
            </OrderResultInfo>
        </SetOrderResult></SetOrderResponse></soap:Body></soap:Envelope>"#;

        let result = interpret_create_response(200, body, &request().identifiers).unwrap();
        assert_eq!(result.integration_code, "9405744057453711");
        assert_eq!(result.waybill_key, "SIP-1762940574");
        assert_eq!(result.barcode_number, "94057440574537111");
        assert_eq!(result.tracking_number, None);
        assert_eq!(result.message.as_deref(), Some("Başarılı"));
    }

    #[test]
    fn test_success_falls_back_to_sent_identifiers() {
        let sent = request().identifiers;
        let body = "<SetOrderResult><ResultCode>0</ResultCode></SetOrderResult>";
        let result = interpret_create_response(200, body, &sent).unwrap();
        assert_eq!(result.integration_code, sent.integration_code);
        assert_eq!(result.waybill_key, sent.trading_waybill_number);
        assert_eq!(result.barcode_number, sent.barcode_number);
    }

    #[test]
    fn test_non_ok_code_is_business_error() {
        let body = "<SetOrderResult><ResultCode>5001</ResultCode><ResultMessage>Geçersiz ilçe</ResultMessage></SetOrderResult>";
        let err = interpret_create_response(200, body, &request().identifiers).unwrap_err();
        assert_eq!(
            err,
            CarrierError::Business {
                code: "5001".to_string(),
                message: "Geçersiz ilçe".to_string(),
            }
        );
    }

    #[test]
    fn test_fault_wins_even_with_http_200() {
        let body = "<s:Envelope><s:Body><s:Fault><faultcode>s:Server</faultcode><faultstring>Object reference not set</faultstring></s:Fault></s:Body></s:Envelope>";
        let err = interpret_create_response(200, body, &request().identifiers).unwrap_err();
        assert!(matches!(err, CarrierError::Fault { ref code, .. } if code == "s:Server"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_http_error_without_fault_is_transport() {
        let err = interpret_create_response(503, "Service Unavailable", &request().identifiers)
            .unwrap_err();
        assert!(matches!(err, CarrierError::Transport { status: Some(503), .. }));
    }

    #[test]
    fn test_missing_result_code_is_parse_error() {
        let err = interpret_create_response(200, "<html>maintenance</html>", &request().identifiers)
            .unwrap_err();
        assert!(matches!(
            err,
            CarrierError::Parse { stage: ParseStage::ResultCode, .. }
        ));
    }
}
