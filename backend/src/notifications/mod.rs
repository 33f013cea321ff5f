//! Client notifications
//!
//! A notification is just another scheduled event: when it runs it resolves
//! its recipients against the world and hands the payload to the
//! [`ClientOutbox`](crate::world::ClientOutbox). How payloads are encoded on
//! the wire is the outbox's business.

use crate::context::OperationContext;
use crate::models::{ConnectionId, CreatureId, Direction, ItemId, ItemTypeId, Location, WorldLight};
use crate::scheduler::{EventKind, ExecutionError, ScheduledEvent};
use crate::world::{ContainerId, MapDescription};
use serde::{Deserialize, Serialize};

pub const THERE_IS_NO_WAY: &str = "There is no way.";
pub const TOO_FAR_AWAY: &str = "You are too far away.";
pub const CANNOT_USE_OBJECT: &str = "You cannot use this object.";
pub const NOT_ENOUGH_ROOM: &str = "There is not enough room.";

/// Presentation class of a text message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextMessageType {
    /// Short status line at the bottom of the game window
    StatusSmall,
    /// Look descriptions
    Description,
    /// Red warning in the centre of the screen
    Warning,
    /// Server broadcast
    Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechType {
    Say,
    Whisper,
    Yell,
}

/// What a client is told
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationPayload {
    TextMessage {
        message_type: TextMessageType,
        text: String,
    },
    LoginSuccess {
        creature: CreatureId,
    },
    WorldLight {
        light: WorldLight,
    },
    MapDescription {
        description: MapDescription,
    },
    CreatureAppeared {
        creature: CreatureId,
        name: String,
        location: Location,
    },
    CreatureRemoved {
        creature: CreatureId,
        location: Location,
    },
    CreatureMoved {
        creature: CreatureId,
        from: Location,
        to: Location,
    },
    CreatureTurned {
        creature: CreatureId,
        direction: Direction,
    },
    CreatureSpoke {
        creature: CreatureId,
        name: String,
        speech_type: SpeechType,
        text: String,
    },
    WalkCancelled {
        direction: Direction,
    },
    TileUpdated {
        location: Location,
        items: Vec<ItemTypeId>,
    },
    MagicEffect {
        location: Location,
        effect: u8,
    },
    ContainerOpened {
        container: ContainerId,
        item: ItemId,
        type_id: ItemTypeId,
    },
    ContainerClosed {
        container: ContainerId,
    },
}

/// Who receives a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipients {
    /// One creature (ignored unless it has a connection)
    Creature(CreatureId),
    /// A connection that may not have a creature yet
    Connection(ConnectionId),
    /// Every player that can see the location
    Spectators(Location),
    /// Players within `range` tiles of the location
    Nearby { location: Location, range: u32 },
    /// Players that can see either end of a move
    Movement { from: Location, to: Location },
}

/// A payload bound to its recipients
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub recipients: Recipients,
    pub payload: NotificationPayload,
}

impl Notification {
    pub fn new(recipients: Recipients, payload: NotificationPayload) -> Self {
        Self { recipients, payload }
    }

    pub fn to_creature(creature: CreatureId, payload: NotificationPayload) -> Self {
        Self::new(Recipients::Creature(creature), payload)
    }

    pub fn to_spectators(location: Location, payload: NotificationPayload) -> Self {
        Self::new(Recipients::Spectators(location), payload)
    }

    /// Text message to one creature
    pub fn text(
        creature: CreatureId,
        message_type: TextMessageType,
        text: impl Into<String>,
    ) -> Self {
        Self::to_creature(
            creature,
            NotificationPayload::TextMessage {
                message_type,
                text: text.into(),
            },
        )
    }

    fn resolve_connections(&self, context: &OperationContext<'_>) -> Vec<ConnectionId> {
        let world = &*context.world;
        let connection_of =
            |id: CreatureId| world.find_creature(id).and_then(|creature| creature.connection());

        match self.recipients {
            Recipients::Creature(id) => connection_of(id).into_iter().collect(),
            Recipients::Connection(connection) => vec![connection],
            Recipients::Spectators(location) => world
                .players_in_view(location)
                .into_iter()
                .filter_map(connection_of)
                .collect(),
            Recipients::Nearby { location, range } => world
                .players_in_view(location)
                .into_iter()
                .filter(|id| {
                    world
                        .find_creature(*id)
                        .is_some_and(|creature| creature.location().is_within(&location, range))
                })
                .filter_map(connection_of)
                .collect(),
            Recipients::Movement { from, to } => {
                let mut viewers = world.players_in_view(from);
                viewers.extend(world.players_in_view(to));
                viewers.sort();
                viewers.dedup();
                viewers.into_iter().filter_map(connection_of).collect()
            }
        }
    }
}

impl ScheduledEvent for Notification {
    fn kind(&self) -> EventKind {
        EventKind::Notification
    }

    fn requestor_id(&self) -> CreatureId {
        match self.recipients {
            Recipients::Creature(id) => id,
            _ => CreatureId::NONE,
        }
    }

    fn execute(&self, context: &mut OperationContext<'_>) -> Result<(), ExecutionError> {
        for connection in self.resolve_connections(context) {
            context.outbox.deliver(connection, &self.payload);
        }
        Ok(())
    }
}
