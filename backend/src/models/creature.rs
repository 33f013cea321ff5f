//! Creature model
//!
//! Players, monsters and NPCs share one representation. Only players carry a
//! client connection; everything else is driven by system operations.

use crate::models::location::{Direction, Location};
use crate::operations::OperationKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Identifier of a creature in the world
///
/// `CreatureId::NONE` marks system-originated work (spawns, world rules)
/// that has no acting creature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreatureId(pub u32);

impl CreatureId {
    /// Sentinel for "no requestor"
    pub const NONE: CreatureId = CreatureId(0);

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

impl fmt::Display for CreatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "creature#{}", self.0)
    }
}

/// Opaque reference to a connected game client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatureKind {
    Player,
    Monster,
    Npc,
}

/// Default walking speed for newly created creatures
pub const DEFAULT_SPEED: u16 = 220;

/// A creature in the world
///
/// # Example
/// ```
/// use tick_engine_core_rs::models::{ConnectionId, Creature, CreatureId, Location};
///
/// let player = Creature::player(CreatureId(7), "Ana", Location::new(100, 100, 7), ConnectionId(1));
/// assert!(player.is_player());
/// assert_eq!(player.connection(), Some(ConnectionId(1)));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creature {
    id: CreatureId,
    name: String,
    kind: CreatureKind,
    location: Location,
    direction: Direction,

    /// Walking speed; higher is faster
    speed: u16,

    /// Client connection, players only
    connection: Option<ConnectionId>,

    /// Instant until which the creature is exhausted, per operation kind
    #[serde(default)]
    exhaustion: HashMap<OperationKind, Duration>,
}

impl Creature {
    pub fn new(
        id: CreatureId,
        name: impl Into<String>,
        kind: CreatureKind,
        location: Location,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            location,
            direction: Direction::South,
            speed: DEFAULT_SPEED,
            connection: None,
            exhaustion: HashMap::new(),
        }
    }

    pub fn player(
        id: CreatureId,
        name: impl Into<String>,
        location: Location,
        connection: ConnectionId,
    ) -> Self {
        let mut creature = Self::new(id, name, CreatureKind::Player, location);
        creature.connection = Some(connection);
        creature
    }

    pub fn monster(id: CreatureId, name: impl Into<String>, location: Location) -> Self {
        Self::new(id, name, CreatureKind::Monster, location)
    }

    pub fn with_speed(mut self, speed: u16) -> Self {
        self.speed = speed;
        self
    }

    pub fn id(&self) -> CreatureId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> CreatureKind {
        self.kind
    }

    pub fn is_player(&self) -> bool {
        self.kind == CreatureKind::Player
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn turn(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub fn speed(&self) -> u16 {
        self.speed
    }

    pub fn connection(&self) -> Option<ConnectionId> {
        self.connection
    }

    /// Time one step in `direction` takes at the creature's current speed
    ///
    /// # Example
    /// ```
    /// use tick_engine_core_rs::models::{Creature, CreatureId, Direction, Location};
    /// use std::time::Duration;
    ///
    /// let rat = Creature::monster(CreatureId(9), "rat", Location::new(0, 0, 7)).with_speed(100);
    /// assert_eq!(rat.step_duration(Direction::North), Duration::from_millis(1000));
    /// assert_eq!(rat.step_duration(Direction::NorthEast), Duration::from_millis(2000));
    /// ```
    pub fn step_duration(&self, direction: Direction) -> Duration {
        let base = 100_000 / u64::from(self.speed.max(1));
        let factor = if direction.is_diagonal() { 2 } else { 1 };
        Duration::from_millis(base * factor)
    }

    /// Remaining exhaustion for `kind` at `now`
    pub fn remaining_exhaustion(&self, kind: OperationKind, now: Duration) -> Duration {
        self.exhaustion
            .get(&kind)
            .map(|until| until.saturating_sub(now))
            .unwrap_or(Duration::ZERO)
    }

    /// Record that the creature is exhausted for `kind` until `until`
    ///
    /// Never shortens an exhaustion already in place.
    pub fn add_exhaustion(&mut self, kind: OperationKind, until: Duration) {
        let entry = self.exhaustion.entry(kind).or_insert(Duration::ZERO);
        if until > *entry {
            *entry = until;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhaustion_never_shortens() {
        let mut creature = Creature::monster(CreatureId(3), "wolf", Location::new(1, 1, 7));
        creature.add_exhaustion(OperationKind::UseItem, Duration::from_secs(5));
        creature.add_exhaustion(OperationKind::UseItem, Duration::from_secs(2));

        assert_eq!(
            creature.remaining_exhaustion(OperationKind::UseItem, Duration::from_secs(1)),
            Duration::from_secs(4)
        );
        assert_eq!(
            creature.remaining_exhaustion(OperationKind::UseItem, Duration::from_secs(9)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_none_sentinel() {
        assert!(CreatureId::NONE.is_none());
        assert!(!CreatureId(1).is_none());
    }
}
