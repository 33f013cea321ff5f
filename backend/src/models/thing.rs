//! Things: anything that occupies a tile

use crate::models::creature::CreatureId;
use crate::models::item::ItemId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to an item or creature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "thing", content = "id", rename_all = "snake_case")]
pub enum ThingRef {
    Creature(CreatureId),
    Item(ItemId),
}

impl ThingRef {
    pub fn as_creature(&self) -> Option<CreatureId> {
        match self {
            ThingRef::Creature(id) => Some(*id),
            ThingRef::Item(_) => None,
        }
    }

    pub fn as_item(&self) -> Option<ItemId> {
        match self {
            ThingRef::Item(id) => Some(*id),
            ThingRef::Creature(_) => None,
        }
    }
}

impl From<CreatureId> for ThingRef {
    fn from(id: CreatureId) -> Self {
        ThingRef::Creature(id)
    }
}

impl From<ItemId> for ThingRef {
    fn from(id: ItemId) -> Self {
        ThingRef::Item(id)
    }
}

impl fmt::Display for ThingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThingRef::Creature(id) => id.fmt(f),
            ThingRef::Item(id) => id.fmt(f),
        }
    }
}
