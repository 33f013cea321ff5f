//! Using items, alone or on another thing
//!
//! Item behaviour lives in event rules. When no rule fires, containers open
//! and anything else answers with a refusal.

use crate::context::OperationContext;
use crate::models::{CreatureId, Item, ItemId, Location, ThingRef};
use crate::notifications::{
    Notification, NotificationPayload, TextMessageType, CANNOT_USE_OBJECT, TOO_FAR_AWAY,
};
use crate::operations::{require_creature, UseItemArguments, UseItemOnArguments};
use crate::rules::{RuleSubjects, RuleThing};
use crate::scheduler::ExecutionError;

#[derive(Debug, Clone, PartialEq)]
pub struct UseItemOperation {
    arguments: UseItemArguments,
}

impl UseItemOperation {
    pub(crate) fn new(arguments: UseItemArguments) -> Self {
        Self { arguments }
    }

    pub fn arguments(&self) -> &UseItemArguments {
        &self.arguments
    }

    pub(crate) fn execute(&self, context: &mut OperationContext<'_>) -> Result<(), ExecutionError> {
        let UseItemArguments {
            requestor_id,
            item,
            location,
        } = self.arguments;

        if !within_reach(context, requestor_id, location)? {
            return Ok(());
        }
        let container = find_item(context, item, location)?.is_container();

        let rules = context.rules;
        let used = RuleThing::new(ThingRef::Item(item), location);
        let subjects = RuleSubjects::new(Some(used), None, Some(requestor_id));
        if rules.on_use(subjects, context) > 0 {
            return Ok(());
        }

        if container {
            let type_id = find_item(context, item, location)?.type_id;
            let slot = context.world.open_container(requestor_id, item)?;
            context.notify(Notification::to_creature(
                requestor_id,
                NotificationPayload::ContainerOpened {
                    container: slot,
                    item,
                    type_id,
                },
            ));
        } else {
            context.notify(Notification::text(
                requestor_id,
                TextMessageType::StatusSmall,
                CANNOT_USE_OBJECT,
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UseItemOnOperation {
    arguments: UseItemOnArguments,
}

impl UseItemOnOperation {
    pub(crate) fn new(arguments: UseItemOnArguments) -> Self {
        Self { arguments }
    }

    pub fn arguments(&self) -> &UseItemOnArguments {
        &self.arguments
    }

    pub(crate) fn execute(&self, context: &mut OperationContext<'_>) -> Result<(), ExecutionError> {
        let UseItemOnArguments {
            requestor_id,
            item,
            item_location,
            target,
            target_location,
        } = self.arguments;

        if !within_reach(context, requestor_id, item_location)? {
            return Ok(());
        }
        find_item(context, item, item_location)?;
        match target {
            ThingRef::Item(target_item) => {
                find_item(context, target_item, target_location)?;
            }
            ThingRef::Creature(id) => {
                context
                    .world
                    .find_creature(id)
                    .ok_or(ExecutionError::ThingNotFound(target))?;
            }
        }

        let rules = context.rules;
        let subjects = RuleSubjects::new(
            Some(RuleThing::new(ThingRef::Item(item), item_location)),
            Some(RuleThing::new(target, target_location)),
            Some(requestor_id),
        );
        if rules.on_multi_use(subjects, context) == 0 {
            context.notify(Notification::text(
                requestor_id,
                TextMessageType::StatusSmall,
                CANNOT_USE_OBJECT,
            ));
        }
        Ok(())
    }
}

/// Whether the requestor stands close enough; tells it otherwise
fn within_reach(
    context: &OperationContext<'_>,
    requestor_id: CreatureId,
    location: Location,
) -> Result<bool, ExecutionError> {
    let requestor = require_creature(context, requestor_id)?;
    if requestor
        .location()
        .is_within(&location, context.settings.interaction_radius)
    {
        return Ok(true);
    }
    context.notify(Notification::text(requestor_id, TextMessageType::StatusSmall, TOO_FAR_AWAY));
    Ok(false)
}

fn find_item<'w>(
    context: &'w OperationContext<'_>,
    item: ItemId,
    location: Location,
) -> Result<&'w Item, ExecutionError> {
    context
        .world
        .tile(location)
        .and_then(|tile| tile.find_item(item))
        .ok_or(ExecutionError::ItemNotFound { item, location })
}
