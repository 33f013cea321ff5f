//! Stock implementations of the stateless world services

use crate::models::{ConnectionId, Item, ItemId, ItemTypeId};
use crate::notifications::NotificationPayload;
use crate::world::{ClientOutbox, ItemFactory};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

/// Hands out item instance ids from a monotonic counter
#[derive(Debug)]
pub struct SequentialItemFactory {
    next_id: AtomicU32,
}

impl SequentialItemFactory {
    /// Ids start at `first_id`; keep it above any id loaded from a map
    pub fn starting_at(first_id: u32) -> Self {
        Self {
            next_id: AtomicU32::new(first_id),
        }
    }
}

impl Default for SequentialItemFactory {
    fn default() -> Self {
        Self::starting_at(1_000_000)
    }
}

impl ItemFactory for SequentialItemFactory {
    fn create_item(&self, type_id: ItemTypeId, amount: u8) -> Item {
        let id = ItemId(self.next_id.fetch_add(1, Ordering::Relaxed));
        Item::new(id, type_id).with_amount(amount.max(1))
    }
}

/// Outbox that keeps every delivery in memory
///
/// Used by tests and the demo driver in place of a network writer.
#[derive(Debug, Default)]
pub struct RecordingOutbox {
    delivered: Mutex<Vec<(ConnectionId, NotificationPayload)>>,
}

impl RecordingOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything delivered so far
    pub fn drain(&self) -> Vec<(ConnectionId, NotificationPayload)> {
        std::mem::take(&mut *self.delivered.lock())
    }

    /// Copies of the payloads delivered to one connection
    pub fn delivered_to(&self, connection: ConnectionId) -> Vec<NotificationPayload> {
        self.delivered
            .lock()
            .iter()
            .filter(|(target, _)| *target == connection)
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.delivered.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.delivered.lock().is_empty()
    }
}

impl ClientOutbox for RecordingOutbox {
    fn deliver(&self, connection: ConnectionId, payload: &NotificationPayload) {
        self.delivered.lock().push((connection, payload.clone()));
    }
}
