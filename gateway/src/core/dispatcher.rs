//! Webhook event dispatcher
//!
//! Routes a decoded [`WebhookEvent`] to the registry:
//! - `call-started` arms the end-call timer (idempotent on redelivery)
//! - `call-ended` cancels it
//! - anything else is acknowledged and ignored
//!
//! The dispatcher answers as soon as the scheduling decision is made and never
//! waits for a timer to fire.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tracing::{debug, info};

use super::events::{CallId, WebhookEvent};
use super::registry::{CancelOutcome, DeferredActionRegistry, ScheduleOutcome};
use super::vapi::{CallTerminator, terminate_call};
use crate::errors::{WebhookError, WebhookResult};

/// Acknowledgment produced for a successfully handled event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Scheduled { call_id: CallId, grace: Duration },
    AlreadyScheduled { call_id: CallId },
    Ended { call_id: Option<CallId>, cancel: Option<CancelOutcome> },
    Ignored { event_type: Option<String> },
}

impl DispatchOutcome {
    /// JSON body returned to the webhook caller
    pub fn to_json(&self) -> Value {
        match self {
            DispatchOutcome::Scheduled { call_id, grace } => json!({
                "success": true,
                "message": format!("Timer set for {} seconds", grace.as_secs()),
                "callId": call_id,
            }),
            DispatchOutcome::AlreadyScheduled { call_id } => json!({
                "success": true,
                "message": "Timer already running",
                "callId": call_id,
            }),
            DispatchOutcome::Ended { .. } => json!({
                "success": true,
                "message": "Call ended",
            }),
            DispatchOutcome::Ignored { .. } => json!({
                "success": true,
                "message": "Event received",
            }),
        }
    }
}

/// Routes webhook events to the [`DeferredActionRegistry`]
#[derive(Clone)]
pub struct EventDispatcher {
    registry: DeferredActionRegistry,
    grace: Duration,
}

impl EventDispatcher {
    pub fn new(registry: DeferredActionRegistry, grace: Duration) -> Self {
        Self { registry, grace }
    }

    pub fn registry(&self) -> &DeferredActionRegistry {
        &self.registry
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Handle one event
    ///
    /// `terminator` is what the scheduled action will use once the grace period
    /// elapses; it is only captured when a new timer is armed.
    pub fn dispatch(
        &self,
        event: WebhookEvent,
        terminator: Arc<dyn CallTerminator>,
    ) -> WebhookResult<DispatchOutcome> {
        match event {
            WebhookEvent::CallStarted { call_id } => {
                let call_id = call_id.ok_or(WebhookError::MissingCallId)?;
                info!(call_id = %call_id, "Call started");

                let outcome = self.registry.schedule_if_absent(
                    call_id.clone(),
                    self.grace,
                    move |id| async move { terminate_call(terminator.as_ref(), id).await },
                );

                match outcome {
                    ScheduleOutcome::Scheduled => {
                        info!(
                            call_id = %call_id,
                            grace_seconds = self.grace.as_secs(),
                            "End-call timer set"
                        );
                        Ok(DispatchOutcome::Scheduled {
                            call_id,
                            grace: self.grace,
                        })
                    }
                    ScheduleOutcome::AlreadyScheduled => {
                        info!(call_id = %call_id, "End-call timer already running");
                        Ok(DispatchOutcome::AlreadyScheduled { call_id })
                    }
                    ScheduleOutcome::DelayOutOfRange => Err(WebhookError::Internal(format!(
                        "grace period of {} seconds is out of range",
                        self.grace.as_secs()
                    ))),
                }
            }
            WebhookEvent::CallEnded { call_id } => {
                let cancel = call_id.as_ref().map(|id| {
                    let outcome = self.registry.cancel_and_remove(id);
                    match outcome {
                        CancelOutcome::Cancelled => info!(call_id = %id, "Cleaned up timer"),
                        CancelOutcome::AlreadyFiring => {
                            info!(call_id = %id, "Call ended while end-call request in flight")
                        }
                        CancelOutcome::NotFound => info!(call_id = %id, "Call ended, no timer"),
                    }
                    outcome
                });
                Ok(DispatchOutcome::Ended { call_id, cancel })
            }
            WebhookEvent::Other { event_type } => {
                debug!(
                    event_type = event_type.as_deref().unwrap_or("<none>"),
                    "Event ignored"
                );
                Ok(DispatchOutcome::Ignored { event_type })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{CallControlError, CallControlResult};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use reqwest::StatusCode;

    const GRACE: Duration = Duration::from_secs(15);

    #[derive(Default)]
    struct RecordingTerminator {
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl CallTerminator for RecordingTerminator {
        async fn end_call(&self, call_id: &CallId) -> CallControlResult<()> {
            self.calls.lock().push(call_id.to_string());
            if self.fail {
                return Err(CallControlError::UpstreamStatus {
                    status: StatusCode::NOT_FOUND,
                    body: "no such call".to_string(),
                });
            }
            Ok(())
        }
    }

    fn started(id: &str) -> WebhookEvent {
        WebhookEvent::CallStarted {
            call_id: CallId::new(id),
        }
    }

    fn ended(id: &str) -> WebhookEvent {
        WebhookEvent::CallEnded {
            call_id: CallId::new(id),
        }
    }

    fn setup() -> (EventDispatcher, Arc<RecordingTerminator>) {
        let dispatcher = EventDispatcher::new(DeferredActionRegistry::new(), GRACE);
        (dispatcher, Arc::new(RecordingTerminator::default()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_started_then_grace_elapses_ends_call_once() {
        let (dispatcher, terminator) = setup();

        let outcome = dispatcher.dispatch(started("abc"), terminator.clone()).unwrap();
        assert_eq!(
            outcome.to_json(),
            json!({ "success": true, "message": "Timer set for 15 seconds", "callId": "abc" })
        );

        tokio::time::sleep(GRACE + Duration::from_secs(1)).await;

        assert_eq!(*terminator.calls.lock(), vec!["abc".to_string()]);
        assert!(dispatcher.registry().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_started_then_ended_never_ends_call() {
        let (dispatcher, terminator) = setup();

        dispatcher.dispatch(started("abc"), terminator.clone()).unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;
        let outcome = dispatcher.dispatch(ended("abc"), terminator.clone()).unwrap();

        assert_eq!(
            outcome,
            DispatchOutcome::Ended {
                call_id: CallId::new("abc"),
                cancel: Some(CancelOutcome::Cancelled),
            }
        );

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(terminator.calls.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_start_reports_already_running() {
        let (dispatcher, terminator) = setup();

        dispatcher.dispatch(started("abc"), terminator.clone()).unwrap();
        let outcome = dispatcher.dispatch(started("abc"), terminator.clone()).unwrap();

        assert_eq!(
            outcome.to_json(),
            json!({ "success": true, "message": "Timer already running", "callId": "abc" })
        );

        tokio::time::sleep(GRACE + Duration::from_secs(1)).await;
        assert_eq!(terminator.calls.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_range_grace_is_an_error() {
        let dispatcher = EventDispatcher::new(
            DeferredActionRegistry::new(),
            Duration::from_secs(u64::MAX),
        );
        let terminator = Arc::new(RecordingTerminator::default());

        let result = dispatcher.dispatch(started("abc"), terminator);

        assert!(matches!(result, Err(WebhookError::Internal(_))));
        assert!(dispatcher.registry().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_without_id_is_rejected() {
        let (dispatcher, terminator) = setup();

        let result = dispatcher.dispatch(WebhookEvent::CallStarted { call_id: None }, terminator);

        assert!(matches!(result, Err(WebhookError::MissingCallId)));
        assert!(dispatcher.registry().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_end_is_harmless() {
        let (dispatcher, terminator) = setup();

        dispatcher.dispatch(started("abc"), terminator.clone()).unwrap();
        dispatcher.dispatch(ended("abc"), terminator.clone()).unwrap();
        let second = dispatcher.dispatch(ended("abc"), terminator.clone()).unwrap();

        assert_eq!(
            second,
            DispatchOutcome::Ended {
                call_id: CallId::new("abc"),
                cancel: Some(CancelOutcome::NotFound),
            }
        );
        assert_eq!(
            second.to_json(),
            json!({ "success": true, "message": "Call ended" })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_without_id_is_acknowledged() {
        let (dispatcher, terminator) = setup();

        let outcome = dispatcher
            .dispatch(WebhookEvent::CallEnded { call_id: None }, terminator)
            .unwrap();

        assert_eq!(
            outcome,
            DispatchOutcome::Ended {
                call_id: None,
                cancel: None
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_event_is_ignored() {
        let (dispatcher, terminator) = setup();

        let outcome = dispatcher
            .dispatch(
                WebhookEvent::Other {
                    event_type: Some("transcript".to_string()),
                },
                terminator.clone(),
            )
            .unwrap();

        assert_eq!(
            outcome.to_json(),
            json!({ "success": true, "message": "Event received" })
        );
        assert!(dispatcher.registry().is_empty());
        tokio::time::sleep(GRACE * 2).await;
        assert!(terminator.calls.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_end_call_still_clears_entry() {
        let dispatcher = EventDispatcher::new(DeferredActionRegistry::new(), GRACE);
        let terminator = Arc::new(RecordingTerminator {
            fail: true,
            ..Default::default()
        });

        dispatcher.dispatch(started("abc"), terminator.clone()).unwrap();
        tokio::time::sleep(GRACE + Duration::from_secs(1)).await;

        assert_eq!(terminator.calls.lock().len(), 1);
        assert!(dispatcher.registry().is_empty());

        // A later start for the same id arms a fresh timer
        let outcome = dispatcher.dispatch(started("abc"), terminator).unwrap();
        assert!(matches!(outcome, DispatchOutcome::Scheduled { .. }));
    }
}
