//! Entering and leaving the world

use crate::context::OperationContext;
use crate::models::{Creature, DEFAULT_SPEED};
use crate::notifications::{Notification, NotificationPayload, Recipients, TextMessageType};
use crate::operations::{require_creature, LoginArguments, LogoutArguments, OperationKind};
use crate::scheduler::ExecutionError;

pub const LOGIN_REJECTED: &str = "Your login position is not available.";

#[derive(Debug, Clone, PartialEq)]
pub struct LoginOperation {
    arguments: LoginArguments,
}

impl LoginOperation {
    pub(crate) fn new(arguments: LoginArguments) -> Self {
        Self { arguments }
    }

    pub fn arguments(&self) -> &LoginArguments {
        &self.arguments
    }

    /// Place the player and send the initial client state
    ///
    /// The connection receives login confirmation, the map around the
    /// player and the world light, in that order. Spectators see the
    /// player appear.
    pub(crate) fn execute(&self, context: &mut OperationContext<'_>) -> Result<(), ExecutionError> {
        let LoginArguments {
            connection,
            player,
            world_light,
        } = &self.arguments;

        let creature =
            Creature::player(player.id, player.name.clone(), player.location, *connection)
                .with_speed(player.speed.unwrap_or(DEFAULT_SPEED));
        let to_connection = Recipients::Connection(*connection);
        if let Err(err) = context.world.add_creature(creature) {
            tracing::info!(creature = %player.id, %err, "login rejected");
            context.notify(Notification::new(
                to_connection,
                NotificationPayload::TextMessage {
                    message_type: TextMessageType::Warning,
                    text: LOGIN_REJECTED.to_string(),
                },
            ));
            return Ok(());
        }
        tracing::info!(creature = %player.id, name = %player.name, "player logged in");

        context.notify(Notification::new(
            to_connection,
            NotificationPayload::LoginSuccess { creature: player.id },
        ));
        context.notify(Notification::new(
            to_connection,
            NotificationPayload::MapDescription {
                description: context.world.describe_area(player.location),
            },
        ));
        context.notify(Notification::new(
            to_connection,
            NotificationPayload::WorldLight { light: *world_light },
        ));
        context.notify(Notification::to_spectators(
            player.location,
            NotificationPayload::CreatureAppeared {
                creature: player.id,
                name: player.name.clone(),
                location: player.location,
            },
        ));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogoutOperation {
    arguments: LogoutArguments,
}

impl LogoutOperation {
    pub(crate) fn new(arguments: LogoutArguments) -> Self {
        Self { arguments }
    }

    pub fn arguments(&self) -> &LogoutArguments {
        &self.arguments
    }

    /// Drop all pending work of the player, then remove it
    pub(crate) fn execute(&self, context: &mut OperationContext<'_>) -> Result<(), ExecutionError> {
        let requestor_id = self.arguments.requestor_id;
        let (location, connection) = {
            let creature = require_creature(context, requestor_id)?;
            (creature.location(), creature.connection())
        };

        let walks = context.scheduler.cancel_all_for(requestor_id, OperationKind::AutoWalk);
        let rules = context.rules.clear_all_for_requestor(requestor_id);

        let closed = context.world.close_all(requestor_id);
        if let Some(connection) = connection {
            for container in closed {
                context.notify(Notification::new(
                    Recipients::Connection(connection),
                    NotificationPayload::ContainerClosed { container },
                ));
            }
        }

        context.world.remove_creature(requestor_id);
        context.notify(Notification::to_spectators(
            location,
            NotificationPayload::CreatureRemoved {
                creature: requestor_id,
                location,
            },
        ));
        tracing::info!(creature = %requestor_id, walks, rules, "player logged out");
        Ok(())
    }
}
