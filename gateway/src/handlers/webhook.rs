//! Vapi webhook receiver
//!
//! `POST /api/webhook` accepts the Vapi server events. The response only
//! acknowledges the scheduling decision; the end-call request itself happens
//! later on the timer task.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{error, info};

use crate::core::{CallId, WebhookEvent};
use crate::errors::{WebhookError, WebhookResult};
use crate::state::AppState;

/// Handle one Vapi webhook event
///
/// Order of checks:
/// 1. the Vapi credential must be configured (500 otherwise)
/// 2. the body must be JSON (400 otherwise)
/// 3. the event is dispatched; a `call-started` without `call.id` is a 400
pub async fn vapi_webhook(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> WebhookResult<Json<Value>> {
    let Some(terminator) = state.terminator.clone() else {
        error!("VAPI_PRIVATE_KEY not set");
        return Err(WebhookError::Configuration);
    };

    let payload: Value = serde_json::from_slice(&body).map_err(|e| {
        error!(error = %e, "Webhook body is not valid JSON");
        WebhookError::InvalidPayload(e.to_string())
    })?;

    let event = WebhookEvent::from_value(&payload);
    // Payloads carry customer data; only the routing fields are logged
    info!(
        event_type = event.event_type(),
        call_id = event.call_id().map(CallId::as_str).unwrap_or("<none>"),
        "Received event"
    );

    let outcome = state.dispatcher.dispatch(event, terminator).inspect_err(|e| {
        if matches!(e, WebhookError::MissingCallId) {
            error!("No call ID found in event");
        }
    })?;

    Ok(Json(outcome.to_json()))
}

/// Any method other than POST on the webhook route
pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method not allowed" })),
    )
        .into_response()
}
