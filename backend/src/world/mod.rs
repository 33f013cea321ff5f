//! World collaborators
//!
//! The engine never owns map, creature or container storage directly. It
//! talks to these traits, which the server (or [`crate::models::WorldState`]
//! in tests and the demo driver) implements.
//!
//! All `&mut` access happens on the consumer thread that runs the scheduler
//! cycle, so the traits carry no internal locking requirements beyond
//! `Send` for handing the world to that thread.

pub mod pathfinding;
pub mod services;

use crate::models::{
    ConnectionId, Creature, CreatureId, Direction, Item, ItemId, ItemTypeId, Location, Tile,
};
use crate::notifications::NotificationPayload;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use pathfinding::GridPathfinder;
pub use services::{RecordingOutbox, SequentialItemFactory};

/// Horizontal view range (tiles each side of the viewer)
pub const VIEW_RANGE_X: i32 = 8;

/// Vertical view range (tiles each side of the viewer)
pub const VIEW_RANGE_Y: i32 = 6;

/// Errors raised by world mutations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WorldError {
    #[error("No tile at {0}")]
    TileNotFound(Location),

    #[error("Tile at {0} is not walkable")]
    TileBlocked(Location),

    #[error("Creature not found: {0}")]
    CreatureNotFound(CreatureId),

    #[error("Creature already in world: {0}")]
    DuplicateCreature(CreatureId),

    #[error("Item {item} not found at {location}")]
    ItemNotFound { item: ItemId, location: Location },

    #[error("No free container slot for {0}")]
    TooManyContainers(CreatureId),
}

/// Creature lookup and lifecycle
pub trait CreatureManager {
    fn find_creature(&self, id: CreatureId) -> Option<&Creature>;

    fn find_creature_mut(&mut self, id: CreatureId) -> Option<&mut Creature>;

    /// Insert a creature and place it on its location's tile
    fn add_creature(&mut self, creature: Creature) -> Result<(), WorldError>;

    /// Remove a creature and clear it from its tile
    fn remove_creature(&mut self, id: CreatureId) -> Option<Creature>;

    /// Players whose viewport contains `location`
    fn players_in_view(&self, location: Location) -> Vec<CreatureId>;

    /// Allocate an id for a system-created creature
    fn next_creature_id(&mut self) -> CreatureId;
}

/// Tile storage access
pub trait TileAccessor {
    fn tile(&self, location: Location) -> Option<&Tile>;

    fn tile_mut(&mut self, location: Location) -> Option<&mut Tile>;
}

/// Snapshot of the area around a location, as sent to a logging-in client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDescription {
    pub center: Location,
    pub tiles: Vec<TileDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileDescription {
    pub location: Location,
    pub ground: Option<ItemTypeId>,
    pub items: Vec<ItemTypeId>,
    pub creatures: Vec<CreatureId>,
}

/// Produces map descriptions for clients
pub trait MapDescriptor {
    fn describe_area(&self, center: Location) -> MapDescription;
}

/// Slot index of an open container window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(pub u8);

/// Bookkeeping of which containers each creature has open
pub trait ContainerManager {
    fn open_container(
        &mut self,
        creature: CreatureId,
        item: ItemId,
    ) -> Result<ContainerId, WorldError>;

    fn close_container(&mut self, creature: CreatureId, container: ContainerId) -> Option<ItemId>;

    fn open_containers(&self, creature: CreatureId) -> Vec<(ContainerId, ItemId)>;

    /// Close every container the creature has open
    fn close_all(&mut self, creature: CreatureId) -> Vec<ContainerId>;
}

/// Everything the consumer thread mutates
pub trait World: CreatureManager + TileAccessor + MapDescriptor + ContainerManager + Send {}

impl<T> World for T where
    T: CreatureManager + TileAccessor + MapDescriptor + ContainerManager + Send
{
}

/// Creates new item instances
pub trait ItemFactory: Send + Sync {
    fn create_item(&self, type_id: ItemTypeId, amount: u8) -> Item;
}

/// Computes walking routes
pub trait Pathfinder: Send + Sync {
    /// Directions leading from `from` to `to`, at most `max_steps` long
    ///
    /// `to` itself does not need to be walkable: the route may end on it
    /// only if it is.
    fn find_path(
        &self,
        world: &dyn World,
        from: Location,
        to: Location,
        max_steps: usize,
    ) -> Option<Vec<Direction>>;
}

/// Outbound channel to connected clients
pub trait ClientOutbox: Send + Sync {
    fn deliver(&self, connection: ConnectionId, payload: &NotificationPayload);
}

/// Move a creature to an adjacent or remote tile
///
/// Fails without side effects when the creature or destination tile is
/// missing, or the destination is not walkable.
pub fn relocate_creature(
    world: &mut dyn World,
    id: CreatureId,
    to: Location,
) -> Result<Location, WorldError> {
    let from = world
        .find_creature(id)
        .map(Creature::location)
        .ok_or(WorldError::CreatureNotFound(id))?;

    let destination = world.tile(to).ok_or(WorldError::TileNotFound(to))?;
    if !destination.is_walkable() {
        return Err(WorldError::TileBlocked(to));
    }

    if let Some(origin) = world.tile_mut(from) {
        origin.remove_creature(id);
    }
    if let Some(destination) = world.tile_mut(to) {
        destination.add_creature(id);
    }
    if let Some(creature) = world.find_creature_mut(id) {
        if let Some(direction) = from.direction_to(&to) {
            creature.turn(direction);
        }
        creature.set_location(to);
    }

    Ok(from)
}

/// Move an item (or part of a stack) between tiles
///
/// Returns the id of the item that ended up on the destination tile, which
/// differs from `id` when a stack is split.
pub fn relocate_item(
    world: &mut dyn World,
    item_factory: &dyn ItemFactory,
    id: ItemId,
    from: Location,
    to: Location,
    amount: Option<u8>,
) -> Result<ItemId, WorldError> {
    if world.tile(to).is_none() {
        return Err(WorldError::TileNotFound(to));
    }

    let origin = world.tile_mut(from).ok_or(WorldError::TileNotFound(from))?;
    let item = origin
        .find_item_mut(id)
        .ok_or(WorldError::ItemNotFound { item: id, location: from })?;

    let moved = match amount {
        Some(requested) if requested < item.amount => {
            item.amount -= requested;
            let mut split = item_factory.create_item(item.type_id, requested);
            split.capacity = item.capacity;
            split.blocks_path = item.blocks_path;
            split
        }
        _ => origin
            .remove_item(id)
            .ok_or(WorldError::ItemNotFound { item: id, location: from })?,
    };

    let moved_id = moved.id;
    world
        .tile_mut(to)
        .ok_or(WorldError::TileNotFound(to))?
        .add_item(moved);

    Ok(moved_id)
}
