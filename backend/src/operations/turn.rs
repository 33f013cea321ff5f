use crate::context::OperationContext;
use crate::notifications::{Notification, NotificationPayload};
use crate::operations::ChangeDirectionArguments;
use crate::scheduler::ExecutionError;

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeDirectionOperation {
    arguments: ChangeDirectionArguments,
}

impl ChangeDirectionOperation {
    pub(crate) fn new(arguments: ChangeDirectionArguments) -> Self {
        Self { arguments }
    }

    pub fn arguments(&self) -> &ChangeDirectionArguments {
        &self.arguments
    }

    pub(crate) fn execute(&self, context: &mut OperationContext<'_>) -> Result<(), ExecutionError> {
        let ChangeDirectionArguments { requestor_id, direction } = self.arguments;
        let creature = context
            .world
            .find_creature_mut(requestor_id)
            .ok_or(ExecutionError::RequestorNotFound(requestor_id))?;

        if creature.direction() == direction {
            return Ok(());
        }
        creature.turn(direction);
        let location = creature.location();

        context.notify(Notification::to_spectators(
            location,
            NotificationPayload::CreatureTurned {
                creature: requestor_id,
                direction,
            },
        ));
        Ok(())
    }
}
