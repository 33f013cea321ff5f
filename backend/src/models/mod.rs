//! Domain models for the world the engine mutates

pub mod creature;
pub mod item;
pub mod light;
pub mod location;
pub mod state;
pub mod thing;
pub mod tile;

// Re-exports
pub use creature::{ConnectionId, Creature, CreatureId, CreatureKind, DEFAULT_SPEED};
pub use item::{Item, ItemId, ItemTypeId};
pub use light::WorldLight;
pub use location::{Direction, Location};
pub use state::WorldState;
pub use thing::ThingRef;
pub use tile::Tile;
