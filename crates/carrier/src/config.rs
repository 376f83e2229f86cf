//! Connection settings for a carrier endpoint.

use std::time::Duration;

/// Login triple sent with every request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub customer_code: String,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        customer_code: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            customer_code: customer_code.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("customer_code", &self.customer_code)
            .finish()
    }
}

/// Where and how to reach one of the carrier's endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub url: String,
    pub credentials: Credentials,
    /// Upper bound for a whole request, connection included.
    pub timeout: Duration,
}

impl EndpointConfig {
    pub fn new(url: impl Into<String>, credentials: Credentials, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            credentials,
            timeout,
        }
    }

    /// Connection phase limit: the request timeout, capped at 10 seconds.
    pub fn connect_timeout(&self) -> Duration {
        self.timeout.min(Duration::from_secs(10))
    }
}
