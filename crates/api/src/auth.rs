//! Bearer-token guard for the scheduler and admin routes.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;

/// The shared secret guarded routes expect as `Authorization: Bearer <secret>`.
#[derive(Clone)]
pub struct BearerAuth {
    secret: Option<Arc<str>>,
}

impl BearerAuth {
    /// A guard accepting `secret`. With `None` every request is rejected.
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.map(Arc::from),
        }
    }

    /// Checks an `Authorization` header value.
    pub fn accepts(&self, header: Option<&str>) -> bool {
        let Some(secret) = self.secret.as_deref() else {
            return false;
        };
        header
            .and_then(|h| h.strip_prefix("Bearer "))
            .is_some_and(|token| constant_time_eq(token.trim().as_bytes(), secret.as_bytes()))
    }
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth")
            .field("configured", &self.secret.is_some())
            .finish()
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Middleware rejecting requests without the expected bearer token.
pub async fn require_bearer(
    State(auth): State<BearerAuth>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if !auth.accepts(header) {
        tracing::warn!(path = %request.uri().path(), "rejected request with bad bearer token");
        return Err(ApiError::Unauthorized);
    }
    Ok(next.run(request).await)
}
