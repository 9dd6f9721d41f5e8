pub mod dispatcher;
pub mod events;
pub mod registry;
pub mod vapi;

// Re-export commonly used types for convenience
pub use dispatcher::{DispatchOutcome, EventDispatcher};
pub use events::{CALL_ENDED, CALL_STARTED, CallId, WebhookEvent};
pub use registry::{
    CancelOutcome, DeferredActionRegistry, EntryPhase, PendingCall, ScheduleOutcome,
};
pub use vapi::{CallTerminator, VapiClient, terminate_call};
