//! Map tile
//!
//! A tile holds a ground, a stack of items (top of stack is the last
//! element) and the creatures standing on it.

use crate::models::creature::CreatureId;
use crate::models::item::{Item, ItemId, ItemTypeId};
use crate::models::location::Location;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    location: Location,
    ground: Option<ItemTypeId>,
    items: Vec<Item>,
    creatures: Vec<CreatureId>,
}

impl Tile {
    pub fn new(location: Location, ground: Option<ItemTypeId>) -> Self {
        Self {
            location,
            ground,
            items: Vec::new(),
            creatures: Vec::new(),
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn ground(&self) -> Option<ItemTypeId> {
        self.ground
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn creatures(&self) -> &[CreatureId] {
        &self.creatures
    }

    /// A creature may step here
    ///
    /// Requires ground, no creature and no path-blocking item.
    pub fn is_walkable(&self) -> bool {
        self.ground.is_some()
            && self.creatures.is_empty()
            && !self.items.iter().any(|item| item.blocks_path)
    }

    pub fn top_item(&self) -> Option<&Item> {
        self.items.last()
    }

    pub fn find_item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn find_item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    pub fn add_item(&mut self, item: Item) {
        self.items.push(item);
    }

    pub fn remove_item(&mut self, id: ItemId) -> Option<Item> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    pub fn add_creature(&mut self, id: CreatureId) {
        if !self.creatures.contains(&id) {
            self.creatures.push(id);
        }
    }

    pub fn remove_creature(&mut self, id: CreatureId) -> bool {
        let before = self.creatures.len();
        self.creatures.retain(|existing| *existing != id);
        before != self.creatures.len()
    }
}
