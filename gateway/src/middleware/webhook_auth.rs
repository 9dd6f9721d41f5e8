use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::errors::WebhookError;
use crate::state::AppState;

/// Header Vapi sends with the server URL secret configured on the assistant
pub const VAPI_SECRET_HEADER: &str = "x-vapi-secret";

/// Constant-time comparison of a presented secret against the configured one
fn secret_matches(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Middleware that checks the shared webhook secret
///
/// When no secret is configured every request passes through. Otherwise the
/// `X-Vapi-Secret` header must be present and equal to the configured value,
/// or the request is rejected with 401 before it reaches the handler.
pub async fn webhook_secret_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, WebhookError> {
    let Some(expected) = state
        .config
        .webhook_secret
        .as_deref()
        .filter(|secret| !secret.is_empty())
    else {
        return Ok(next.run(request).await);
    };

    let presented = request
        .headers()
        .get(VAPI_SECRET_HEADER)
        .and_then(|value| value.to_str().ok());

    match presented {
        Some(token) if secret_matches(token, expected) => {
            tracing::debug!("Webhook secret verified");
            Ok(next.run(request).await)
        }
        Some(_) => {
            tracing::warn!(
                path = %request.uri().path(),
                "Webhook rejected: secret mismatch"
            );
            Err(WebhookError::Unauthorized)
        }
        None => {
            tracing::warn!(
                path = %request.uri().path(),
                "Webhook rejected: missing secret header"
            );
            Err(WebhookError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_matches() {
        assert!(secret_matches("s3cret", "s3cret"));
        assert!(!secret_matches("s3cret", "s3cre"));
        assert!(!secret_matches("", "s3cret"));
        assert!(!secret_matches("S3CRET", "s3cret"));
    }
}
