use axum::{Router, handler::Handler, middleware, routing::post};
use tower_http::trace::TraceLayer;

use crate::handlers::webhook;
use crate::middleware::webhook_secret_middleware;
use crate::state::AppState;
use std::sync::Arc;

pub const WEBHOOK_PATH: &str = "/api/webhook";

/// Create the Vapi webhook router
///
/// The secret check wraps only the POST handler so that other methods get a
/// plain 405 regardless of credentials.
pub fn create_webhook_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let secret_check = middleware::from_fn_with_state(state, webhook_secret_middleware);

    Router::new()
        .route(
            WEBHOOK_PATH,
            post(webhook::vapi_webhook.layer(secret_check))
                .fallback(webhook::method_not_allowed),
        )
        .layer(TraceLayer::new_for_http())
}
