//! Carrier error taxonomy.

use thiserror::Error;

/// Which step of response decoding failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    /// The expected result element was not found.
    ResultTag,
    /// The result code was missing from an otherwise well-formed response.
    ResultCode,
    /// The entity-decoded payload was not valid JSON.
    Json,
}

impl ParseStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseStage::ResultTag => "result_tag",
            ParseStage::ResultCode => "result_code",
            ParseStage::Json => "json",
        }
    }
}

impl std::fmt::Display for ParseStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse error class, used for logging, metrics and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Business,
    Fault,
    Transport,
    Parse,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Business => "business",
            ErrorKind::Fault => "fault",
            ErrorKind::Transport => "transport",
            ErrorKind::Parse => "parse",
        }
    }
}

/// Errors returned by the carrier adapters.
///
/// Adapters never panic on carrier-side problems; every outcome other than
/// success is one of these variants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CarrierError {
    /// The request was rejected locally before any network call.
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// The carrier answered with a non-OK result code.
    #[error("Carrier rejected the request (code {code}): {message}")]
    Business { code: String, message: String },

    /// The carrier answered with a SOAP Fault.
    #[error("Carrier fault {code}: {message}")]
    Fault {
        code: String,
        message: String,
        detail: Option<String>,
    },

    /// The request did not complete: timeout, connection failure, or an
    /// HTTP error status without a fault body.
    #[error("Carrier transport error: {message}")]
    Transport {
        message: String,
        timed_out: bool,
        status: Option<u16>,
    },

    /// The response did not have any expected shape.
    #[error("Unparsable carrier response ({stage}): {message}")]
    Parse { stage: ParseStage, message: String },
}

impl CarrierError {
    /// A mandatory request field is empty or absent.
    pub fn missing_field(field: impl Into<String>) -> Self {
        CarrierError::Validation {
            field: field.into(),
            message: "missing required field".to_string(),
        }
    }

    /// A request field is present but malformed.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        CarrierError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn parse(stage: ParseStage, message: impl Into<String>) -> Self {
        CarrierError::Parse {
            stage,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CarrierError::Validation { .. } => ErrorKind::Validation,
            CarrierError::Business { .. } => ErrorKind::Business,
            CarrierError::Fault { .. } => ErrorKind::Fault,
            CarrierError::Transport { .. } => ErrorKind::Transport,
            CarrierError::Parse { .. } => ErrorKind::Parse,
        }
    }

    /// Returns true if the caller may retry the same request later.
    ///
    /// Parse failures count as faults for retry purposes.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Fault | ErrorKind::Transport | ErrorKind::Parse
        )
    }

    /// Returns true if the message is actionable by an operator and safe to show.
    pub fn is_user_actionable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation | ErrorKind::Business)
    }
}

/// Convenience type alias for carrier results.
pub type Result<T> = std::result::Result<T, CarrierError>;
