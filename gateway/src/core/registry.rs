//! Deferred action registry
//!
//! Maps an in-flight [`CallId`] to a delayed, cancellable action. Each action
//! runs on its own tokio task that sleeps for the requested delay and then
//! executes once. The whole map sits behind a single mutex so that the
//! check-then-arm step of [`DeferredActionRegistry::schedule_if_absent`] and
//! the remove-then-abort step of [`DeferredActionRegistry::cancel_and_remove`]
//! never interleave.
//!
//! Firing and cancellation are mutually exclusive for a given entry: when the
//! timer elapses the task claims its entry under the lock, and only proceeds if
//! the entry is still present, still pending, and still the one it was armed
//! for. Once claimed, cancellation removes the entry but lets the action run to
//! completion.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use vapi_guard::core::{CallId, DeferredActionRegistry, ScheduleOutcome};
//!
//! # async fn example() {
//! let registry = DeferredActionRegistry::new();
//! let call_id = CallId::new("abc").unwrap();
//!
//! let outcome = registry.schedule_if_absent(call_id.clone(), Duration::from_secs(15), |id| async move {
//!     println!("time is up for {id}");
//! });
//! assert_eq!(outcome, ScheduleOutcome::Scheduled);
//!
//! registry.cancel_and_remove(&call_id);
//! # }
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::events::CallId;

/// Result of [`DeferredActionRegistry::schedule_if_absent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// A new timer was armed
    Scheduled,
    /// An entry already existed; nothing was armed
    AlreadyScheduled,
    /// The delay does not fit the clock; nothing was armed
    DelayOutOfRange,
}

/// Result of [`DeferredActionRegistry::cancel_and_remove`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The timer had not fired yet and never will
    Cancelled,
    /// The action was already running; the entry was removed but the action
    /// continues to completion
    AlreadyFiring,
    /// No entry existed for the id
    NotFound,
}

/// Lifecycle phase of a registry entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryPhase {
    Pending,
    Firing,
}

/// Read-only view of one registry entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCall {
    pub call_id: CallId,
    pub phase: EntryPhase,
    pub elapsed_ms: u64,
    pub remaining_ms: u64,
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

struct ScheduledEntry {
    generation: u64,
    phase: EntryPhase,
    scheduled_at: Instant,
    deadline: Instant,
    abort: AbortHandle,
}

#[derive(Default)]
struct Inner {
    entries: Mutex<HashMap<CallId, ScheduledEntry>>,
    next_generation: AtomicU64,
}

impl Inner {
    /// Claim an entry for execution. Returns false if it was cancelled or replaced.
    fn begin_firing(&self, call_id: &CallId, generation: u64) -> bool {
        let mut entries = self.entries.lock();
        match entries.get_mut(call_id) {
            Some(entry) if entry.generation == generation && entry.phase == EntryPhase::Pending => {
                entry.phase = EntryPhase::Firing;
                true
            }
            _ => false,
        }
    }

    /// Remove an entry only if it is still the one armed with `generation`
    fn finish(&self, call_id: &CallId, generation: u64) {
        let mut entries = self.entries.lock();
        if entries
            .get(call_id)
            .is_some_and(|entry| entry.generation == generation)
        {
            entries.remove(call_id);
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        for entry in self.entries.get_mut().values() {
            if entry.phase == EntryPhase::Pending {
                entry.abort.abort();
            }
        }
    }
}

/// Removes the entry when the action finishes, panics, or is dropped mid-flight.
struct FiringGuard {
    inner: Arc<Inner>,
    call_id: CallId,
    generation: u64,
}

impl Drop for FiringGuard {
    fn drop(&mut self) {
        self.inner.finish(&self.call_id, self.generation);
    }
}

/// In-process registry of delayed, cancellable per-call actions
///
/// Cloning is cheap and every clone refers to the same map. Timer tasks hold
/// only a weak reference, so dropping the last clone aborts every pending timer.
#[derive(Clone, Default)]
pub struct DeferredActionRegistry {
    inner: Arc<Inner>,
}

impl DeferredActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `action` to run once after `delay`, unless an entry for `call_id` exists
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule_if_absent<F, Fut>(
        &self,
        call_id: CallId,
        delay: Duration,
        action: F,
    ) -> ScheduleOutcome
    where
        F: FnOnce(CallId) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut entries = self.inner.entries.lock();
        if entries.contains_key(&call_id) {
            debug!(call_id = %call_id, "Timer already scheduled");
            return ScheduleOutcome::AlreadyScheduled;
        }

        let scheduled_at = Instant::now();
        let Some(deadline) = scheduled_at.checked_add(delay) else {
            warn!(call_id = %call_id, delay_secs = delay.as_secs(), "Timer delay out of range");
            return ScheduleOutcome::DelayOutOfRange;
        };

        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let task_call_id = call_id.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;

            let Some(inner) = weak.upgrade() else {
                return;
            };
            if !inner.begin_firing(&task_call_id, generation) {
                return;
            }

            let _guard = FiringGuard {
                inner,
                call_id: task_call_id.clone(),
                generation,
            };
            debug!(call_id = %task_call_id, "Timer fired");
            action(task_call_id).await;
        });

        entries.insert(
            call_id.clone(),
            ScheduledEntry {
                generation,
                phase: EntryPhase::Pending,
                scheduled_at,
                deadline,
                abort: handle.abort_handle(),
            },
        );
        debug!(call_id = %call_id, delay_ms = millis(delay), "Timer scheduled");

        ScheduleOutcome::Scheduled
    }

    /// Remove the entry for `call_id`, preventing its action from firing if it has not yet
    ///
    /// Never blocks on an action that is already running.
    pub fn cancel_and_remove(&self, call_id: &CallId) -> CancelOutcome {
        let mut entries = self.inner.entries.lock();
        match entries.remove(call_id) {
            None => CancelOutcome::NotFound,
            Some(entry) if entry.phase == EntryPhase::Pending => {
                entry.abort.abort();
                debug!(call_id = %call_id, "Timer cancelled");
                CancelOutcome::Cancelled
            }
            Some(_) => {
                debug!(call_id = %call_id, "Timer already firing, entry removed");
                CancelOutcome::AlreadyFiring
            }
        }
    }

    pub fn contains(&self, call_id: &CallId) -> bool {
        self.inner.entries.lock().contains_key(call_id)
    }

    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.lock().is_empty()
    }

    /// Snapshot of every entry, ordered by call id
    pub fn snapshot(&self) -> Vec<PendingCall> {
        let now = Instant::now();
        let entries = self.inner.entries.lock();
        let mut calls: Vec<PendingCall> = entries
            .iter()
            .map(|(call_id, entry)| PendingCall {
                call_id: call_id.clone(),
                phase: entry.phase,
                elapsed_ms: millis(now.saturating_duration_since(entry.scheduled_at)),
                remaining_ms: millis(entry.deadline.saturating_duration_since(now)),
            })
            .collect();
        drop(entries);

        calls.sort_by(|a, b| a.call_id.cmp(&b.call_id));
        calls
    }

    /// Abort every pending timer and clear the map
    ///
    /// Actions that are already running finish on their own. Returns the number
    /// of timers that were aborted.
    pub fn shutdown(&self) -> usize {
        let mut entries = self.inner.entries.lock();
        let mut aborted = 0;
        for (_, entry) in entries.drain() {
            if entry.phase == EntryPhase::Pending {
                entry.abort.abort();
                aborted += 1;
            }
        }
        aborted
    }
}
