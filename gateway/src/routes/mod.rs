pub mod api;
pub mod webhooks;

use std::any::Any;
use std::sync::Arc;

use axum::{Router, http, response::IntoResponse, response::Response};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::errors::WebhookError;
use crate::handlers;
use crate::state::AppState;

/// Build the complete application router
///
/// Rate limiting is left to the caller because it needs the peer address,
/// which only exists when serving real connections.
pub fn create_router(state: Arc<AppState>) -> Router {
    // Security headers
    let security_headers = tower::ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            http::header::X_CONTENT_TYPE_OPTIONS,
            http::HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            http::header::X_FRAME_OPTIONS,
            http::HeaderValue::from_static("DENY"),
        ));

    api::create_api_router()
        .merge(webhooks::create_webhook_router(state.clone()))
        .fallback(handlers::api::not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(security_headers)
}

/// Turn a handler panic into the generic 500 body
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    };

    tracing::error!(message = %message, "Webhook error");
    WebhookError::Internal(message).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_handle_panic_string_payload() {
        let response = handle_panic(Box::new("index out of bounds".to_string()));
        assert_eq!(response.status(), http::StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["message"], "index out of bounds");
    }

    #[tokio::test]
    async fn test_handle_panic_unknown_payload() {
        let response = handle_panic(Box::new(42_u32));
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Unknown panic");
    }
}
