//! Event scheduler
//!
//! - event.rs: the `ScheduledEvent` contract, handles and states
//! - queue.rs: the lock-guarded priority queue and consumer loop

pub mod event;
pub mod queue;

pub use event::{EventHandle, EventId, EventKind, EventState, ExecutionError, ScheduledEvent};
pub use queue::{CycleReport, Scheduler};
