//! Scheduled event contract and shared handles
//!
//! An [`EventHandle`] is the single identity of a unit of scheduled work.
//! The queue may hold several entries pointing at the same handle (for
//! example after an expedition), so every state transition goes through a
//! compare-and-swap on the handle: whichever entry reaches it first wins and
//! the rest are skipped.

use crate::context::OperationContext;
use crate::models::{CreatureId, ItemId, Location, ThingRef};
use crate::operations::OperationKind;
use crate::rules::RuleError;
use crate::world::WorldError;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Identity of a scheduled event
pub type EventId = Uuid;

/// What kind of work an event is, used for group cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Operation(OperationKind),
    Notification,
}

/// Faults raised while an event executes
///
/// These never escape the scheduler loop; they are logged and the event is
/// consumed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("Requestor not found: {0}")]
    RequestorNotFound(CreatureId),

    #[error("Thing not found: {0}")]
    ThingNotFound(ThingRef),

    #[error("Item {item} not found at {location}")]
    ItemNotFound { item: ItemId, location: Location },

    #[error("World error: {0}")]
    World(#[from] WorldError),

    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    #[error("Event panicked: {0}")]
    Panicked(String),
}

/// A unit of work the scheduler can run
///
/// `execute` runs on the single consumer thread, to completion, with
/// exclusive access to the world through `context`. It may enqueue further
/// events but must not block.
pub trait ScheduledEvent: Send + Sync + fmt::Debug {
    fn kind(&self) -> EventKind;

    /// Creature on whose behalf the event exists, `CreatureId::NONE` for system work
    fn requestor_id(&self) -> CreatureId;

    fn execute(&self, context: &mut OperationContext<'_>) -> Result<(), ExecutionError>;
}

/// Lifecycle of a scheduled event
///
/// `Cancelled` and `Executed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EventState {
    Pending = 0,
    Executing = 1,
    Cancelled = 2,
    Executed = 3,
}

impl EventState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => EventState::Pending,
            1 => EventState::Executing,
            2 => EventState::Cancelled,
            _ => EventState::Executed,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, EventState::Cancelled | EventState::Executed)
    }
}

struct EventSlot {
    id: EventId,
    kind: EventKind,
    requestor_id: CreatureId,
    state: AtomicU8,
    event: Box<dyn ScheduledEvent>,
}

/// Shared handle to a scheduled (or ready-to-schedule) event
///
/// Cloning is cheap; all clones observe the same state.
///
/// # Example
/// ```
/// use tick_engine_core_rs::scheduler::{EventHandle, EventState};
/// use tick_engine_core_rs::notifications::{Notification, NotificationPayload, TextMessageType};
/// use tick_engine_core_rs::models::CreatureId;
///
/// let handle = EventHandle::new(Notification::text(CreatureId(1), TextMessageType::StatusSmall, "hi"));
/// assert_eq!(handle.state(), EventState::Pending);
/// ```
#[derive(Clone)]
pub struct EventHandle {
    slot: Arc<EventSlot>,
}

impl EventHandle {
    pub fn new<E: ScheduledEvent + 'static>(event: E) -> Self {
        Self::from_boxed(Box::new(event))
    }

    pub fn from_boxed(event: Box<dyn ScheduledEvent>) -> Self {
        Self {
            slot: Arc::new(EventSlot {
                id: Uuid::new_v4(),
                kind: event.kind(),
                requestor_id: event.requestor_id(),
                state: AtomicU8::new(EventState::Pending as u8),
                event,
            }),
        }
    }

    pub fn id(&self) -> EventId {
        self.slot.id
    }

    pub fn kind(&self) -> EventKind {
        self.slot.kind
    }

    pub fn requestor_id(&self) -> CreatureId {
        self.slot.requestor_id
    }

    pub fn state(&self) -> EventState {
        EventState::from_u8(self.slot.state.load(Ordering::Acquire))
    }

    pub fn event(&self) -> &dyn ScheduledEvent {
        self.slot.event.as_ref()
    }

    /// Whether two handles refer to the same event
    pub fn same_event(&self, other: &EventHandle) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }

    fn transition(&self, from: EventState, to: EventState) -> bool {
        self.slot
            .state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Claim the event for execution
    pub(crate) fn try_begin(&self) -> bool {
        self.transition(EventState::Pending, EventState::Executing)
    }

    pub(crate) fn try_cancel(&self) -> bool {
        self.transition(EventState::Pending, EventState::Cancelled)
    }

    pub(crate) fn finish(&self) {
        self.transition(EventState::Executing, EventState::Executed);
    }
}

impl fmt::Debug for EventHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandle")
            .field("id", &self.slot.id)
            .field("kind", &self.slot.kind)
            .field("requestor_id", &self.slot.requestor_id)
            .field("state", &self.state())
            .finish()
    }
}
