use crate::context::OperationContext;
use crate::models::{Location, ThingRef};
use crate::notifications::{Notification, TextMessageType};
use crate::operations::{require_creature, LookAtArguments};
use crate::scheduler::ExecutionError;

#[derive(Debug, Clone, PartialEq)]
pub struct LookAtOperation {
    arguments: LookAtArguments,
}

impl LookAtOperation {
    pub(crate) fn new(arguments: LookAtArguments) -> Self {
        Self { arguments }
    }

    pub fn arguments(&self) -> &LookAtArguments {
        &self.arguments
    }

    pub(crate) fn execute(&self, context: &mut OperationContext<'_>) -> Result<(), ExecutionError> {
        let args = &self.arguments;
        require_creature(context, args.requestor_id)?;

        let description = self.describe(context, args.location)?;
        context.notify(Notification::text(
            args.requestor_id,
            TextMessageType::Description,
            description,
        ));
        Ok(())
    }

    fn describe(
        &self,
        context: &OperationContext<'_>,
        location: Location,
    ) -> Result<String, ExecutionError> {
        let thing = match self.arguments.thing {
            Some(thing) => thing,
            None => {
                let tile = context.world.tile(location);
                match tile.and_then(|tile| tile.top_item()) {
                    Some(item) => ThingRef::Item(item.id),
                    None => {
                        return Ok(match tile.and_then(|tile| tile.ground()) {
                            Some(ground) => format!("You see the ground ({}).", ground.0),
                            None => "You see nothing.".to_string(),
                        })
                    }
                }
            }
        };

        match thing {
            ThingRef::Creature(id) => {
                let creature = context
                    .world
                    .find_creature(id)
                    .ok_or(ExecutionError::ThingNotFound(thing))?;
                Ok(format!("You see {}.", creature.name()))
            }
            ThingRef::Item(id) => {
                let item = context
                    .world
                    .tile(location)
                    .and_then(|tile| tile.find_item(id))
                    .ok_or(ExecutionError::ItemNotFound { item: id, location })?;
                Ok(if item.amount > 1 {
                    format!("You see {} items of type {}.", item.amount, item.type_id.0)
                } else {
                    format!("You see an item of type {}.", item.type_id.0)
                })
            }
        }
    }
}
