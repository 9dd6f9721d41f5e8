use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Result type for webhook request handling
pub type WebhookResult<T> = Result<T, WebhookError>;

/// Errors surfaced to the webhook caller
///
/// Every variant maps to a fixed status code and a JSON body. None of them
/// carries internal details beyond a short message string.
#[derive(Error, Debug)]
pub enum WebhookError {
    /// The Vapi credential is not configured on this server
    #[error("Server configuration error")]
    Configuration,

    /// A call event arrived without `call.id`
    #[error("No call ID")]
    MissingCallId,

    /// The request body could not be decoded as JSON
    #[error("Invalid JSON payload: {0}")]
    InvalidPayload(String),

    /// The shared webhook secret was missing or did not match
    #[error("Unauthorized")]
    Unauthorized,

    /// Anything else that went wrong while handling the event
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl WebhookError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::Configuration | WebhookError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            WebhookError::MissingCallId | WebhookError::InvalidPayload(_) => {
                StatusCode::BAD_REQUEST
            }
            WebhookError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            WebhookError::Configuration => json!({ "error": "Server configuration error" }),
            WebhookError::MissingCallId => json!({ "error": "No call ID" }),
            WebhookError::InvalidPayload(message) => {
                json!({ "error": "Invalid JSON payload", "message": message })
            }
            WebhookError::Unauthorized => json!({ "error": "Unauthorized" }),
            WebhookError::Internal(message) => {
                json!({ "error": "Internal server error", "message": message })
            }
        };

        (status, Json(body)).into_response()
    }
}
