//! Outbound Vapi call control
//!
//! The only request this server makes to Vapi is marking a call as ended:
//!
//! ```text
//! PATCH {api_url}/call/{callId}
//! Authorization: Bearer <private key>
//! Content-Type: application/json
//!
//! {"status": "ended"}
//! ```

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, error, info};

use super::events::CallId;
use crate::config::{Secret, ServerConfig};
use crate::errors::{CallControlError, CallControlResult};

/// Ends a call on the upstream voice platform
#[async_trait]
pub trait CallTerminator: Send + Sync {
    async fn end_call(&self, call_id: &CallId) -> CallControlResult<()>;
}

/// Vapi REST client
#[derive(Clone)]
pub struct VapiClient {
    client: reqwest::Client,
    api_url: String,
    api_key: Secret,
    timeout: Duration,
}

impl fmt::Debug for VapiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VapiClient")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl VapiClient {
    pub fn new(api_url: impl Into<String>, api_key: Secret, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key,
            timeout,
        }
    }

    /// Build a client from server configuration
    ///
    /// Returns `None` when no private key is configured.
    pub fn from_config(config: &ServerConfig) -> Option<Self> {
        if !config.has_vapi_credentials() {
            return None;
        }
        let api_key = config.vapi_private_key.clone()?;
        Some(Self::new(
            config.vapi_api_url.clone(),
            api_key,
            config.vapi_request_timeout(),
        ))
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn call_url(&self, call_id: &CallId) -> CallControlResult<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.api_url)
            .map_err(|e| CallControlError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| CallControlError::InvalidUrl(self.api_url.clone()))?
            .pop_if_empty()
            .push("call")
            .push(call_id.as_str());
        Ok(url)
    }
}

#[async_trait]
impl CallTerminator for VapiClient {
    async fn end_call(&self, call_id: &CallId) -> CallControlResult<()> {
        let url = self.call_url(call_id)?;
        debug!(call_id = %call_id, url = %url, "Sending end-call request");

        let response = self
            .client
            .patch(url)
            .timeout(self.timeout)
            .header("Authorization", format!("Bearer {}", self.api_key.as_str()))
            .json(&json!({ "status": "ended" }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(CallControlError::UpstreamStatus { status, body })
    }
}

/// The delayed effect scheduled for every started call
///
/// Sends one end-call request and logs the outcome. Failures are never retried
/// and never reported anywhere else.
pub async fn terminate_call(terminator: &dyn CallTerminator, call_id: CallId) {
    info!(call_id = %call_id, "Grace period reached, ending call");

    match terminator.end_call(&call_id).await {
        Ok(()) => info!(call_id = %call_id, "Call ended successfully"),
        Err(CallControlError::UpstreamStatus { status, body }) => error!(
            call_id = %call_id,
            status = %status,
            body = %body,
            "Failed to end call"
        ),
        Err(e) => error!(call_id = %call_id, error = %e, "Error ending call"),
    }
}
