//! In-memory world state
//!
//! A `HashMap`-backed implementation of the world collaborator traits. The
//! production server plugs its own map and creature stores in; this one
//! backs the test suite and the demo driver.
//!
//! # Critical Invariants
//!
//! 1. **Creature placement**: every creature in `creatures` is listed on
//!    exactly the tile at its `location`
//! 2. **Unique ids**: a creature id is present at most once
//! 3. **Container slots**: a creature never has more than
//!    `MAX_OPEN_CONTAINERS` windows open

use crate::models::creature::{Creature, CreatureId};
use crate::models::item::{Item, ItemTypeId};
use crate::models::location::Location;
use crate::models::tile::Tile;
use crate::models::ItemId;
use crate::world::{
    ContainerId, ContainerManager, CreatureManager, MapDescription, MapDescriptor, TileAccessor,
    TileDescription, WorldError, VIEW_RANGE_X, VIEW_RANGE_Y,
};
use std::collections::{BTreeMap, HashMap};

/// Maximum simultaneously open container windows per creature
pub const MAX_OPEN_CONTAINERS: u8 = 16;

/// Complete in-memory world
///
/// # Example
///
/// ```rust
/// use tick_engine_core_rs::models::{ConnectionId, Creature, CreatureId, ItemTypeId, Location, WorldState};
/// use tick_engine_core_rs::world::CreatureManager;
///
/// let mut world = WorldState::new();
/// world.fill_area(Location::new(100, 100, 7), 5, 5, ItemTypeId(102));
///
/// let player = Creature::player(CreatureId(1), "Ana", Location::new(101, 101, 7), ConnectionId(1));
/// world.add_creature(player).unwrap();
/// assert_eq!(world.num_creatures(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct WorldState {
    tiles: HashMap<Location, Tile>,
    creatures: HashMap<CreatureId, Creature>,
    open_containers: HashMap<CreatureId, BTreeMap<ContainerId, ItemId>>,

    /// Next id handed to system-created creatures
    next_creature_id: u32,
}

impl WorldState {
    pub fn new() -> Self {
        Self {
            next_creature_id: 0x4000_0000,
            ..Default::default()
        }
    }

    /// Insert or replace a tile
    pub fn add_tile(&mut self, tile: Tile) {
        self.tiles.insert(tile.location(), tile);
    }

    /// Create a `width` × `height` rectangle of ground tiles at `origin`
    pub fn fill_area(&mut self, origin: Location, width: i32, height: i32, ground: ItemTypeId) {
        for dx in 0..width {
            for dy in 0..height {
                let location = Location::new(origin.x + dx, origin.y + dy, origin.z);
                self.add_tile(Tile::new(location, Some(ground)));
            }
        }
    }

    /// Put an item on top of the stack at `location`
    pub fn place_item(&mut self, location: Location, item: Item) -> Result<(), WorldError> {
        self.tiles
            .get_mut(&location)
            .ok_or(WorldError::TileNotFound(location))?
            .add_item(item);
        Ok(())
    }

    pub fn num_creatures(&self) -> usize {
        self.creatures.len()
    }

    pub fn num_tiles(&self) -> usize {
        self.tiles.len()
    }

    pub fn creatures(&self) -> impl Iterator<Item = &Creature> {
        self.creatures.values()
    }

    /// Location of the item with `id`, searching every tile
    pub fn locate_item(&self, id: ItemId) -> Option<Location> {
        self.tiles
            .values()
            .find(|tile| tile.find_item(id).is_some())
            .map(Tile::location)
    }
}

fn in_view(viewer: Location, target: Location) -> bool {
    viewer.z == target.z
        && (viewer.x - target.x).abs() <= VIEW_RANGE_X
        && (viewer.y - target.y).abs() <= VIEW_RANGE_Y
}

impl CreatureManager for WorldState {
    fn find_creature(&self, id: CreatureId) -> Option<&Creature> {
        self.creatures.get(&id)
    }

    fn find_creature_mut(&mut self, id: CreatureId) -> Option<&mut Creature> {
        self.creatures.get_mut(&id)
    }

    fn add_creature(&mut self, creature: Creature) -> Result<(), WorldError> {
        if self.creatures.contains_key(&creature.id()) {
            return Err(WorldError::DuplicateCreature(creature.id()));
        }

        let location = creature.location();
        let tile = self
            .tiles
            .get_mut(&location)
            .ok_or(WorldError::TileNotFound(location))?;
        if !tile.is_walkable() {
            return Err(WorldError::TileBlocked(location));
        }

        tile.add_creature(creature.id());
        self.creatures.insert(creature.id(), creature);
        Ok(())
    }

    fn remove_creature(&mut self, id: CreatureId) -> Option<Creature> {
        let creature = self.creatures.remove(&id)?;
        if let Some(tile) = self.tiles.get_mut(&creature.location()) {
            tile.remove_creature(id);
        }
        self.open_containers.remove(&id);
        Some(creature)
    }

    fn players_in_view(&self, location: Location) -> Vec<CreatureId> {
        let mut viewers: Vec<CreatureId> = self
            .creatures
            .values()
            .filter(|creature| creature.is_player() && in_view(creature.location(), location))
            .map(Creature::id)
            .collect();
        viewers.sort();
        viewers
    }

    fn next_creature_id(&mut self) -> CreatureId {
        loop {
            self.next_creature_id = self.next_creature_id.wrapping_add(1).max(1);
            let candidate = CreatureId(self.next_creature_id);
            if !self.creatures.contains_key(&candidate) {
                return candidate;
            }
        }
    }
}

impl TileAccessor for WorldState {
    fn tile(&self, location: Location) -> Option<&Tile> {
        self.tiles.get(&location)
    }

    fn tile_mut(&mut self, location: Location) -> Option<&mut Tile> {
        self.tiles.get_mut(&location)
    }
}

impl MapDescriptor for WorldState {
    fn describe_area(&self, center: Location) -> MapDescription {
        let mut tiles: Vec<TileDescription> = self
            .tiles
            .values()
            .filter(|tile| in_view(center, tile.location()))
            .map(|tile| TileDescription {
                location: tile.location(),
                ground: tile.ground(),
                items: tile.items().iter().map(|item| item.type_id).collect(),
                creatures: tile.creatures().to_vec(),
            })
            .collect();
        tiles.sort_by_key(|tile| (tile.location.y, tile.location.x));

        MapDescription { center, tiles }
    }
}

impl ContainerManager for WorldState {
    fn open_container(
        &mut self,
        creature: CreatureId,
        item: ItemId,
    ) -> Result<ContainerId, WorldError> {
        let windows = self.open_containers.entry(creature).or_default();

        if let Some((id, _)) = windows.iter().find(|(_, open)| **open == item) {
            return Ok(*id);
        }

        let free = (0..MAX_OPEN_CONTAINERS)
            .map(ContainerId)
            .find(|id| !windows.contains_key(id))
            .ok_or(WorldError::TooManyContainers(creature))?;
        windows.insert(free, item);
        Ok(free)
    }

    fn close_container(&mut self, creature: CreatureId, container: ContainerId) -> Option<ItemId> {
        self.open_containers.get_mut(&creature)?.remove(&container)
    }

    fn open_containers(&self, creature: CreatureId) -> Vec<(ContainerId, ItemId)> {
        self.open_containers
            .get(&creature)
            .map(|windows| windows.iter().map(|(id, item)| (*id, *item)).collect())
            .unwrap_or_default()
    }

    fn close_all(&mut self, creature: CreatureId) -> Vec<ContainerId> {
        self.open_containers
            .remove(&creature)
            .map(|windows| windows.into_keys().collect())
            .unwrap_or_default()
    }
}
