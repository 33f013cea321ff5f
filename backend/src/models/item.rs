//! Item model
//!
//! Item business rules live outside the engine. The engine only needs
//! identity, type, stack amount and whether the item can be opened.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique instance id of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

/// Item type (the client-side sprite/type id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemTypeId(pub u16);

/// An item instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub type_id: ItemTypeId,

    /// Stack size, 1 for non-stackable items
    pub amount: u8,

    /// Slots when the item is a container
    #[serde(default)]
    pub capacity: Option<u8>,

    /// Blocks walking onto its tile
    #[serde(default)]
    pub blocks_path: bool,
}

impl Item {
    pub fn new(id: ItemId, type_id: ItemTypeId) -> Self {
        Self {
            id,
            type_id,
            amount: 1,
            capacity: None,
            blocks_path: false,
        }
    }

    pub fn with_amount(mut self, amount: u8) -> Self {
        self.amount = amount;
        self
    }

    pub fn container(mut self, capacity: u8) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn blocking(mut self) -> Self {
        self.blocks_path = true;
        self
    }

    pub fn is_container(&self) -> bool {
        self.capacity.is_some()
    }
}
