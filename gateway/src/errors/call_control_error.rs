use reqwest::StatusCode;
use thiserror::Error;

/// Result type for outbound call-control requests
pub type CallControlResult<T> = Result<T, CallControlError>;

/// Failures of the outbound end-call request
///
/// These are logged by the scheduled action and never reach a webhook caller.
#[derive(Error, Debug)]
pub enum CallControlError {
    /// The request could not be built or sent (DNS, connect, timeout, ...)
    #[error("Request to call API failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The call API answered with a non-success status
    #[error("Call API returned {status}: {body}")]
    UpstreamStatus { status: StatusCode, body: String },

    /// The call URL could not be built from the configured base URL
    #[error("Invalid call API URL: {0}")]
    InvalidUrl(String),
}
