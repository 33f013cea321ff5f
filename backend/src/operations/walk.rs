use crate::context::OperationContext;
use crate::models::ThingRef;
use crate::notifications::{Notification, NotificationPayload, TextMessageType, THERE_IS_NO_WAY};
use crate::operations::movement::{creature_moved, fire_movement_rules};
use crate::operations::{require_creature, AutoWalkArguments, Operation};
use crate::rules::RuleThing;
use crate::scheduler::ExecutionError;
use crate::world::{relocate_creature, WorldError};

/// Walks one step, then reschedules itself with the remaining directions
///
/// Each step waits for the creature's step duration before the next one
/// runs, so a cancelled walk stops at the tile it has reached.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoWalkOperation {
    arguments: AutoWalkArguments,
}

impl AutoWalkOperation {
    pub(crate) fn new(arguments: AutoWalkArguments) -> Self {
        Self { arguments }
    }

    pub fn arguments(&self) -> &AutoWalkArguments {
        &self.arguments
    }

    pub(crate) fn execute(&self, context: &mut OperationContext<'_>) -> Result<(), ExecutionError> {
        let requestor_id = self.arguments.requestor_id;
        let Some((&direction, remaining)) = self.arguments.directions.split_first() else {
            return Ok(());
        };

        let (origin, step_duration) = {
            let walker = require_creature(context, requestor_id)?;
            (walker.location(), walker.step_duration(direction))
        };
        let target = origin.step(direction);

        match relocate_creature(context.world, requestor_id, target) {
            Ok(from) => {
                context.notify(creature_moved(requestor_id, from, target));
                fire_movement_rules(
                    context,
                    RuleThing::new(ThingRef::Creature(requestor_id), target),
                    from,
                    target,
                    Some(requestor_id),
                );
            }
            Err(WorldError::TileBlocked(_)) | Err(WorldError::TileNotFound(_)) => {
                tracing::debug!(creature = %requestor_id, ?direction, "walk blocked");
                context.notify(Notification::to_creature(
                    requestor_id,
                    NotificationPayload::WalkCancelled { direction },
                ));
                context.notify(Notification::text(
                    requestor_id,
                    TextMessageType::StatusSmall,
                    THERE_IS_NO_WAY,
                ));
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        }

        if !remaining.is_empty() {
            let next = AutoWalkOperation::new(AutoWalkArguments {
                requestor_id,
                directions: remaining.to_vec(),
            });
            context
                .scheduler
                .schedule_event(Operation::AutoWalk(next), step_duration);
        }
        Ok(())
    }
}
