//! Inbound Vapi webhook events
//!
//! Only two event types matter to the server: `call-started` and `call-ended`.
//! Everything else is acknowledged and ignored, so the payload is read
//! leniently from a [`serde_json::Value`] instead of a strict struct.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::Value;

pub const CALL_STARTED: &str = "call-started";
pub const CALL_ENDED: &str = "call-ended";

/// Opaque identifier of a Vapi call
///
/// Cheap to clone; the registry and every scheduled action hold their own copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallId(Arc<str>);

impl CallId {
    /// Returns `None` for an empty identifier
    pub fn new(id: impl AsRef<str>) -> Option<Self> {
        let id = id.as_ref();
        if id.is_empty() {
            None
        } else {
            Some(Self(Arc::from(id)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for CallId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl AsRef<str> for CallId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A decoded webhook event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// `call-started`; the id is `None` when the payload did not carry one
    CallStarted { call_id: Option<CallId> },
    /// `call-ended`
    CallEnded { call_id: Option<CallId> },
    /// Any other type tag, or none at all
    Other { event_type: Option<String> },
}

impl WebhookEvent {
    /// Interpret a JSON payload of the shape `{ "type": ..., "call": { "id": ... } }`
    ///
    /// A non-string `type` is treated as missing. A `call.id` that is absent,
    /// empty or not a string yields `call_id: None`.
    pub fn from_value(payload: &Value) -> Self {
        let event_type = payload.get("type").and_then(Value::as_str);
        let call_id = || {
            payload
                .pointer("/call/id")
                .and_then(Value::as_str)
                .and_then(CallId::new)
        };

        match event_type {
            Some(CALL_STARTED) => WebhookEvent::CallStarted { call_id: call_id() },
            Some(CALL_ENDED) => WebhookEvent::CallEnded { call_id: call_id() },
            other => WebhookEvent::Other {
                event_type: other.map(str::to_string),
            },
        }
    }

    /// The call this event refers to, if any
    pub fn call_id(&self) -> Option<&CallId> {
        match self {
            WebhookEvent::CallStarted { call_id } | WebhookEvent::CallEnded { call_id } => {
                call_id.as_ref()
            }
            WebhookEvent::Other { .. } => None,
        }
    }

    /// The type tag as it appeared in the payload, for logging
    pub fn event_type(&self) -> &str {
        match self {
            WebhookEvent::CallStarted { .. } => CALL_STARTED,
            WebhookEvent::CallEnded { .. } => CALL_ENDED,
            WebhookEvent::Other { event_type } => event_type.as_deref().unwrap_or("<none>"),
        }
    }
}
