//! Application configuration loaded from environment variables.
//!
//! Everything is resolved once at start-up. Several carrier settings accept
//! an older variable name as fallback so existing deployments keep working.

use std::time::Duration;

use carrier::{Credentials, EndpointConfig};
use shipment_sync::{SenderProfile, SyncOptions};
use thiserror::Error;

/// Shortest allowed carrier request timeout.
pub const MIN_CARRIER_TIMEOUT: Duration = Duration::from_secs(30);
/// Longest allowed carrier request timeout.
pub const MAX_CARRIER_TIMEOUT: Duration = Duration::from_secs(45);

const DEV_CREATE_URL: &str = "http://127.0.0.1:8089/Service.asmx";
const DEV_QUERY_URL: &str = "http://127.0.0.1:8089/Service.svc";

/// Configuration errors. Each one names the offending variable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required in this environment")]
    Missing(&'static str),

    #[error("{variable} has invalid value {value:?}: {reason}")]
    Invalid {
        variable: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Deployment environment, from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::Invalid {
                variable: "APP_ENV",
                value: value.to_string(),
                reason: "expected development, staging or production",
            }),
        }
    }

    /// Staging and production refuse to start with missing carrier settings.
    pub fn is_strict(&self) -> bool {
        !matches!(self, Environment::Development)
    }
}

/// Both carrier endpoints and their shared settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierSettings {
    /// Name stored on shipment records.
    pub name: String,
    pub create: EndpointConfig,
    pub query: EndpointConfig,
    /// `{tracking_number}` template used when the carrier sends no tracking URL.
    pub tracking_url_template: Option<String>,
}

/// Server and integration configuration.
///
/// Reads from environment variables:
/// - `HOST`, `PORT`, `RUST_LOG`, `APP_ENV`
/// - `CARRIER_CREATE_URL` (or `CARRIER_SOAP_URL`), `CARRIER_QUERY_URL` (or `CARRIER_TRACKING_URL`)
/// - `CARRIER_CREATE_USERNAME`/`CARRIER_CREATE_PASSWORD` (or `CARRIER_USERNAME`/`CARRIER_PASSWORD`)
/// - `CARRIER_QUERY_USERNAME`/`CARRIER_QUERY_PASSWORD` (fall back to the create pair)
/// - `CARRIER_CUSTOMER_CODE`, `CARRIER_NAME`, `CARRIER_TRACKING_URL_TEMPLATE`, `CARRIER_TIMEOUT_SECS`
/// - `SYNC_MAX_BATCH`, `SYNC_INTER_CALL_DELAY_MS`, `SYNC_RUN_DEADLINE_SECS`
/// - `CRON_SECRET`
/// - `SHIPPER_NAME`, `SHIPPER_PHONE`, `SHIPPER_ADDRESS`, `SHIPPER_CITY`, `SHIPPER_DISTRICT`
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub environment: Environment,
    pub carrier: CarrierSettings,
    pub sync: SyncOptions,
    /// Bearer token for the sync trigger and admin routes. Without one every
    /// guarded request is rejected.
    pub cron_secret: Option<String>,
    pub shipper: SenderProfile,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let first = |keys: &[&str]| keys.iter().find_map(|k| get(*k));

        let environment = get("APP_ENV")
            .map(|v| Environment::parse(&v))
            .transpose()?
            .unwrap_or_default();
        let strict = environment.is_strict();
        let required = |keys: &[&'static str], dev_default: &str| match first(keys) {
            Some(value) => Ok(value),
            None if strict => Err(ConfigError::Missing(keys[0])),
            None => Ok(dev_default.to_string()),
        };

        let customer_code = required(&["CARRIER_CUSTOMER_CODE"], "")?;
        let create_username = required(&["CARRIER_CREATE_USERNAME", "CARRIER_USERNAME"], "")?;
        let create_password = required(&["CARRIER_CREATE_PASSWORD", "CARRIER_PASSWORD"], "")?;
        let query_username =
            get("CARRIER_QUERY_USERNAME").unwrap_or_else(|| create_username.clone());
        let query_password =
            get("CARRIER_QUERY_PASSWORD").unwrap_or_else(|| create_password.clone());

        let timeout = match get("CARRIER_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| ConfigError::Invalid {
                    variable: "CARRIER_TIMEOUT_SECS",
                    value: raw.clone(),
                    reason: "expected whole seconds",
                })?;
                Duration::from_secs(secs).clamp(MIN_CARRIER_TIMEOUT, MAX_CARRIER_TIMEOUT)
            }
            None if environment == Environment::Production => MAX_CARRIER_TIMEOUT,
            None => MIN_CARRIER_TIMEOUT,
        };

        let carrier = CarrierSettings {
            name: get("CARRIER_NAME").unwrap_or_else(|| "cargo".to_string()),
            create: EndpointConfig::new(
                required(&["CARRIER_CREATE_URL", "CARRIER_SOAP_URL"], DEV_CREATE_URL)?,
                Credentials::new(create_username, create_password, customer_code.clone()),
                timeout,
            ),
            query: EndpointConfig::new(
                required(&["CARRIER_QUERY_URL", "CARRIER_TRACKING_URL"], DEV_QUERY_URL)?,
                Credentials::new(query_username, query_password, customer_code),
                timeout,
            ),
            tracking_url_template: get("CARRIER_TRACKING_URL_TEMPLATE"),
        };

        let defaults = SyncOptions::default();
        let max_batch = parse_number("SYNC_MAX_BATCH", get("SYNC_MAX_BATCH"))?
            .map_or(defaults.max_batch, |n| n as usize);
        if max_batch == 0 {
            return Err(ConfigError::Invalid {
                variable: "SYNC_MAX_BATCH",
                value: "0".to_string(),
                reason: "must be at least 1",
            });
        }
        let delay_ms = parse_number("SYNC_INTER_CALL_DELAY_MS", get("SYNC_INTER_CALL_DELAY_MS"))?;
        let deadline_secs = parse_number("SYNC_RUN_DEADLINE_SECS", get("SYNC_RUN_DEADLINE_SECS"))?;
        let sync = SyncOptions {
            max_batch,
            inter_call_delay: delay_ms.map_or(defaults.inter_call_delay, Duration::from_millis),
            run_deadline: deadline_secs.map(Duration::from_secs),
        };

        let cron_secret = get("CRON_SECRET");
        if strict && cron_secret.is_none() {
            return Err(ConfigError::Missing("CRON_SECRET"));
        }

        let port = match parse_number("PORT", get("PORT"))? {
            Some(p) => u16::try_from(p).map_err(|_| ConfigError::Invalid {
                variable: "PORT",
                value: p.to_string(),
                reason: "out of range",
            })?,
            None => 3000,
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            log_level: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            environment,
            carrier,
            sync,
            cron_secret,
            shipper: SenderProfile {
                name: get("SHIPPER_NAME").unwrap_or_default(),
                phone: get("SHIPPER_PHONE").unwrap_or_default(),
                address_line: get("SHIPPER_ADDRESS").unwrap_or_default(),
                city: get("SHIPPER_CITY").unwrap_or_default(),
                district: get("SHIPPER_DISTRICT"),
            },
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_number(variable: &'static str, raw: Option<String>) -> Result<Option<u64>, ConfigError> {
    raw.map(|value| {
        value.parse().map_err(|_| ConfigError::Invalid {
            variable,
            value,
            reason: "expected a non-negative integer",
        })
    })
    .transpose()
}

impl Default for Config {
    /// Development configuration with no environment overrides.
    fn default() -> Self {
        let credentials = Credentials::new("", "", "");
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            environment: Environment::Development,
            carrier: CarrierSettings {
                name: "cargo".to_string(),
                create: EndpointConfig::new(
                    DEV_CREATE_URL,
                    credentials.clone(),
                    MIN_CARRIER_TIMEOUT,
                ),
                query: EndpointConfig::new(DEV_QUERY_URL, credentials, MIN_CARRIER_TIMEOUT),
                tracking_url_template: None,
            },
            sync: SyncOptions::default(),
            cron_secret: None,
            shipper: SenderProfile::default(),
        }
    }
}
