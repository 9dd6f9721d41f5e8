use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;

use crate::state::AppState;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "OK" }))
}

/// List the calls that currently have an end-call timer
pub async fn list_timers(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let timers = state.registry().snapshot();
    Json(json!({
        "count": timers.len(),
        "graceSeconds": state.dispatcher.grace().as_secs(),
        "timers": timers,
    }))
}

/// Fallback for unknown routes
pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not Found" }))).into_response()
}
