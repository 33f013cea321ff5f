use crate::context::OperationContext;
use crate::models::Creature;
use crate::notifications::{Notification, NotificationPayload};
use crate::operations::SpawnMonstersArguments;
use crate::scheduler::ExecutionError;

/// Places a batch of monsters on the map
///
/// Spawns whose tile is missing or occupied are skipped, the rest still
/// appear.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnMonstersOperation {
    arguments: SpawnMonstersArguments,
}

impl SpawnMonstersOperation {
    pub(crate) fn new(arguments: SpawnMonstersArguments) -> Self {
        Self { arguments }
    }

    pub fn arguments(&self) -> &SpawnMonstersArguments {
        &self.arguments
    }

    pub(crate) fn execute(&self, context: &mut OperationContext<'_>) -> Result<(), ExecutionError> {
        for spawn in &self.arguments.spawns {
            let id = context.world.next_creature_id();
            let mut monster = Creature::monster(id, spawn.name.clone(), spawn.location);
            if let Some(speed) = spawn.speed {
                monster = monster.with_speed(speed);
            }

            if let Err(err) = context.world.add_creature(monster) {
                tracing::debug!(
                    name = %spawn.name,
                    location = ?spawn.location,
                    %err,
                    "spawn skipped"
                );
                continue;
            }

            context.notify(Notification::to_spectators(
                spawn.location,
                NotificationPayload::CreatureAppeared {
                    creature: id,
                    name: spawn.name.clone(),
                    location: spawn.location,
                },
            ));
        }
        Ok(())
    }
}
