//! Moving things between tiles
//!
//! Also hosts the helpers every moving operation shares: spectator updates
//! and the separation → collision → movement rule sequence.

use crate::context::OperationContext;
use crate::models::{CreatureId, Location, ThingRef};
use crate::notifications::{
    Notification, NotificationPayload, Recipients, TextMessageType, NOT_ENOUGH_ROOM, TOO_FAR_AWAY,
};
use crate::operations::{require_creature, MovementArguments};
use crate::rules::{RuleSubjects, RuleThing};
use crate::scheduler::ExecutionError;
use crate::world::{relocate_creature, relocate_item, WorldError};

#[derive(Debug, Clone, PartialEq)]
pub struct MovementOperation {
    arguments: MovementArguments,
}

impl MovementOperation {
    pub(crate) fn new(arguments: MovementArguments) -> Self {
        Self { arguments }
    }

    pub fn arguments(&self) -> &MovementArguments {
        &self.arguments
    }

    pub(crate) fn execute(&self, context: &mut OperationContext<'_>) -> Result<(), ExecutionError> {
        let args = &self.arguments;
        let actor = (!args.requestor_id.is_none()).then_some(args.requestor_id);

        if let Some(requestor_id) = actor {
            let requestor = require_creature(context, requestor_id)?;
            if !requestor
                .location()
                .is_within(&args.from, context.settings.interaction_radius)
            {
                context.notify(Notification::text(
                    requestor_id,
                    TextMessageType::StatusSmall,
                    TOO_FAR_AWAY,
                ));
                return Ok(());
            }
        }

        match args.thing {
            ThingRef::Creature(id) => self.move_creature(context, id, actor),
            ThingRef::Item(id) => {
                let moved = relocate_item(
                    context.world,
                    context.item_factory,
                    id,
                    args.from,
                    args.to,
                    args.amount,
                )
                .map_err(|err| match err {
                    WorldError::ItemNotFound { item, location } => {
                        ExecutionError::ItemNotFound { item, location }
                    }
                    other => ExecutionError::World(other),
                })?;

                context.notify(tile_update(context, args.from));
                context.notify(tile_update(context, args.to));
                fire_movement_rules(
                    context,
                    RuleThing::new(ThingRef::Item(moved), args.to),
                    args.from,
                    args.to,
                    actor,
                );
                Ok(())
            }
        }
    }

    fn move_creature(
        &self,
        context: &mut OperationContext<'_>,
        id: CreatureId,
        actor: Option<CreatureId>,
    ) -> Result<(), ExecutionError> {
        let args = &self.arguments;
        let current = context
            .world
            .find_creature(id)
            .map(|creature| creature.location())
            .ok_or(ExecutionError::ThingNotFound(ThingRef::Creature(id)))?;
        if current != args.from {
            return Err(ExecutionError::ThingNotFound(ThingRef::Creature(id)));
        }

        match relocate_creature(context.world, id, args.to) {
            Ok(from) => {
                context.notify(creature_moved(id, from, args.to));
                let moved = RuleThing::new(ThingRef::Creature(id), args.to);
                fire_movement_rules(context, moved, from, args.to, actor);
                Ok(())
            }
            Err(WorldError::TileBlocked(_)) | Err(WorldError::TileNotFound(_)) => {
                if let Some(requestor_id) = actor {
                    context.notify(Notification::text(
                        requestor_id,
                        TextMessageType::StatusSmall,
                        NOT_ENOUGH_ROOM,
                    ));
                }
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

pub(crate) fn creature_moved(id: CreatureId, from: Location, to: Location) -> Notification {
    Notification::new(
        Recipients::Movement { from, to },
        NotificationPayload::CreatureMoved { creature: id, from, to },
    )
}

/// Current item stack of a tile, for its spectators
pub(crate) fn tile_update(context: &OperationContext<'_>, location: Location) -> Notification {
    let items = context
        .world
        .tile(location)
        .map(|tile| tile.items().iter().map(|item| item.type_id).collect())
        .unwrap_or_default();
    Notification::to_spectators(location, NotificationPayload::TileUpdated { location, items })
}

/// Fire the rules a completed move can trigger
///
/// Order: separation from items left behind, collision with items at the
/// destination, then the movement itself.
pub(crate) fn fire_movement_rules(
    context: &mut OperationContext<'_>,
    moved: RuleThing,
    from: Location,
    to: Location,
    actor: Option<CreatureId>,
) {
    let rules = context.rules;

    for item in items_on(context, from, &moved.thing) {
        let subjects = RuleSubjects::new(Some(RuleThing::new(item, from)), Some(moved), actor);
        rules.on_separation(subjects, context);
    }

    for item in items_on(context, to, &moved.thing) {
        let subjects = RuleSubjects::new(Some(RuleThing::new(item, to)), Some(moved), actor);
        rules.on_collision(subjects, context);
    }

    rules.on_movement(RuleSubjects::new(Some(moved), None, actor), context);
}

fn items_on(
    context: &OperationContext<'_>,
    location: Location,
    excluded: &ThingRef,
) -> Vec<ThingRef> {
    context
        .world
        .tile(location)
        .map(|tile| {
            tile.items()
                .iter()
                .map(|item| ThingRef::Item(item.id))
                .filter(|thing| thing != excluded)
                .collect()
        })
        .unwrap_or_default()
}
