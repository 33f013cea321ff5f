//! Time-ordered event queue and the consumer loop
//!
//! Producers (network handlers, timers, running events) call the scheduling
//! and cancellation methods from any thread. Exactly one consumer calls
//! [`Scheduler::run_cycle`]; events execute one at a time on that thread.
//!
//! # Ordering
//!
//! Entries are ordered by due time, then by insertion sequence, so events
//! due at the same instant run in the order they were enqueued.

use crate::context::OperationContext;
use crate::core::time::GameClock;
use crate::models::CreatureId;
use crate::operations::OperationKind;
use crate::scheduler::event::{
    EventHandle, EventId, EventKind, EventState, ExecutionError, ScheduledEvent,
};
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, trace, warn};

/// Heap size above which dead entries are swept out
const COMPACTION_THRESHOLD: usize = 256;

struct QueueEntry {
    due: Duration,
    sequence: u64,
    handle: EventHandle,
}

// BinaryHeap is a max-heap; invert so the earliest (due, sequence) is on top.
impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.sequence == other.sequence
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

#[derive(Default)]
struct QueueState {
    heap: BinaryHeap<QueueEntry>,

    /// Queued events that may still run, for cancellation lookups
    pending: HashMap<EventId, EventHandle>,

    next_sequence: u64,
}

impl QueueState {
    fn push(&mut self, handle: &EventHandle, due: Duration) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.pending.insert(handle.id(), handle.clone());
        self.heap.push(QueueEntry {
            due,
            sequence,
            handle: handle.clone(),
        });
    }

    /// Drop heap entries whose events can no longer run
    fn compact_if_needed(&mut self) {
        if self.heap.len() <= COMPACTION_THRESHOLD || self.heap.len() <= 2 * self.pending.len() {
            return;
        }
        self.pending.retain(|_, handle| handle.state() == EventState::Pending);
        let before = self.heap.len();
        let entries = std::mem::take(&mut self.heap).into_vec();
        self.heap = entries
            .into_iter()
            .filter(|entry| entry.handle.state() == EventState::Pending)
            .collect();
        debug!(before, after = self.heap.len(), "compacted scheduler queue");
    }
}

/// Outcome of one [`Scheduler::run_cycle`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Events that ran to completion
    pub executed: usize,

    /// Queue entries discarded because their event was cancelled or already ran
    pub skipped: usize,

    /// Events that returned an error or panicked (still consumed)
    pub faulted: usize,
}

impl CycleReport {
    pub fn consumed(&self) -> usize {
        self.executed + self.faulted
    }
}

/// The engine's event scheduler
///
/// # Example
/// ```
/// use tick_engine_core_rs::{GameClock, Scheduler};
/// use tick_engine_core_rs::notifications::{Notification, TextMessageType};
/// use tick_engine_core_rs::models::CreatureId;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let scheduler = Scheduler::new(Arc::new(GameClock::new()));
/// let handle = scheduler.schedule_event(
///     Notification::text(CreatureId(1), TextMessageType::StatusSmall, "later"),
///     Duration::from_secs(5),
/// );
/// assert_eq!(scheduler.pending_count(), 1);
/// assert_eq!(scheduler.next_due(), Some(Duration::from_secs(5)));
/// assert!(scheduler.cancel(&handle));
/// ```
pub struct Scheduler {
    clock: Arc<GameClock>,
    queue: Mutex<QueueState>,
}

impl Scheduler {
    pub fn new(clock: Arc<GameClock>) -> Self {
        Self {
            clock,
            queue: Mutex::new(QueueState::default()),
        }
    }

    pub fn clock(&self) -> &Arc<GameClock> {
        &self.clock
    }

    /// Current simulated time
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Enqueue `event` to run once `delay` has elapsed
    pub fn schedule_event<E: ScheduledEvent + 'static>(
        &self,
        event: E,
        delay: Duration,
    ) -> EventHandle {
        let handle = EventHandle::new(event);
        self.schedule_handle(&handle, delay);
        handle
    }

    /// Enqueue `event` to run in the current cycle
    pub fn immediate_event<E: ScheduledEvent + 'static>(&self, event: E) -> EventHandle {
        self.schedule_event(event, Duration::ZERO)
    }

    /// Enqueue a prepared handle
    ///
    /// Returns `false` (and enqueues nothing) when the event already ran or
    /// was cancelled.
    pub fn schedule_handle(&self, handle: &EventHandle, delay: Duration) -> bool {
        let due = self.clock.now() + delay;
        let mut queue = self.queue.lock();

        // Checked under the lock: `cancel` holds it while claiming the handle.
        if handle.state() != EventState::Pending {
            debug!(
                event_id = %handle.id(),
                state = ?handle.state(),
                "refusing to enqueue finished event"
            );
            return false;
        }
        queue.push(handle, due);
        trace!(event_id = %handle.id(), kind = ?handle.kind(), ?due, "event scheduled");
        true
    }

    /// Force a pending event to run now, ahead of its original due time
    ///
    /// Any entry already queued for the event stays in the heap and is
    /// skipped when it surfaces, so the event runs at most once.
    pub fn expedite(&self, handle: &EventHandle) -> bool {
        let expedited = self.schedule_handle(handle, Duration::ZERO);
        if expedited {
            debug!(event_id = %handle.id(), requestor = %handle.requestor_id(), "event expedited");
        }
        expedited
    }

    /// Cancel one event if it has not started yet
    pub fn cancel(&self, handle: &EventHandle) -> bool {
        let mut queue = self.queue.lock();
        let cancelled = handle.try_cancel();
        if cancelled {
            queue.pending.remove(&handle.id());
        }
        cancelled
    }

    /// Cancel every pending operation of `kind` requested by `requestor`
    ///
    /// Returns how many were cancelled; zero matches is not an error.
    pub fn cancel_all_for(&self, requestor: CreatureId, kind: OperationKind) -> usize {
        let target = EventKind::Operation(kind);
        let mut cancelled = 0;

        let mut queue = self.queue.lock();
        queue.pending.retain(|_, handle| {
            let matches = handle.requestor_id() == requestor && handle.kind() == target;
            if matches && handle.try_cancel() {
                cancelled += 1;
                false
            } else {
                true
            }
        });
        queue.compact_if_needed();

        if cancelled > 0 {
            debug!(%requestor, ?kind, cancelled, "cancelled pending operations");
        }
        cancelled
    }

    /// Number of queued events that may still run
    pub fn pending_count(&self) -> usize {
        self.queue.lock().pending.len()
    }

    /// Earliest due time among queued entries
    pub fn next_due(&self) -> Option<Duration> {
        let queue = self.queue.lock();
        queue
            .heap
            .iter()
            .filter(|entry| entry.handle.state() == EventState::Pending)
            .map(|entry| entry.due)
            .min()
    }

    /// Run every event due at the current time
    ///
    /// Events enqueued while the cycle runs with no delay are picked up by
    /// the same cycle. An event that fails or panics is logged, marked
    /// executed and never retried.
    pub fn run_cycle(&self, context: &mut OperationContext<'_>) -> CycleReport {
        let mut report = CycleReport::default();

        while let Some(handle) = self.next_runnable(&mut report) {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handle.event().execute(context)));
            handle.finish();

            match outcome {
                Ok(Ok(())) => report.executed += 1,
                Ok(Err(err)) => {
                    report.faulted += 1;
                    warn!(
                        event_id = %handle.id(),
                        kind = ?handle.kind(),
                        error = %err,
                        "event execution failed"
                    );
                }
                Err(payload) => {
                    report.faulted += 1;
                    let fault = ExecutionError::Panicked(panic_message(payload.as_ref()));
                    error!(
                        event_id = %handle.id(),
                        kind = ?handle.kind(),
                        error = %fault,
                        "event panicked"
                    );
                }
            }
        }

        self.queue.lock().compact_if_needed();
        report
    }

    /// Pop the next due entry whose event can still be claimed
    fn next_runnable(&self, report: &mut CycleReport) -> Option<EventHandle> {
        let now = self.clock.now();
        let mut queue = self.queue.lock();

        loop {
            if queue.heap.peek()?.due > now {
                return None;
            }
            let entry = queue.heap.pop()?;
            if entry.handle.try_begin() {
                queue.pending.remove(&entry.handle.id());
                return Some(entry.handle);
            }
            let id = entry.handle.id();
            if queue.pending.get(&id).is_some_and(|pending| pending.same_event(&entry.handle)) {
                queue.pending.remove(&id);
            }
            report.skipped += 1;
            trace!(event_id = %id, state = ?entry.handle.state(), "skipping dead queue entry");
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
