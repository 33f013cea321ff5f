//! Built-in rule functions
//!
//! Rule text names conditions and actions by string. The names are looked up
//! once, when a [`RuleDefinition`] is resolved; evaluation calls straight
//! through the stored function pointers.
//!
//! Conditions:
//! - `IsType(subject, type)`: item subject has the given type id
//! - `IsCreature(subject)`
//! - `IsPlayer(subject)`
//! - `IsCreatureId(subject, id)`
//! - `IsAtLocation(subject, location)`
//! - `CountAtLeast(subject, amount)`: item stack holds at least `amount`
//!
//! Actions:
//! - `Change(subject, type)`: turn an item into another type
//! - `Delete(subject)`: remove an item
//! - `Create(type, location)`
//! - `MoveTo(subject, location)`
//! - `Text(subject, text)`: message to a creature subject
//! - `Effect(location, effect)`: magic effect for spectators

use crate::context::OperationContext;
use crate::models::{Item, ItemId, ItemTypeId, Location, ThingRef};
use crate::notifications::{Notification, NotificationPayload, TextMessageType};
use crate::operations::movement::{creature_moved, tile_update};
use crate::rules::event_rule::{ActionFn, ConditionFn, RuleAction, RuleCondition, RuleView};
use crate::rules::{
    ArgumentKind, EventRule, ExecutionCount, FunctionCall, RuleArgument, RuleDefinition, RuleError,
    RuleSubjects, RuleThing, Subject,
};
use crate::world::{relocate_creature, relocate_item, World, WorldError};
use std::collections::HashMap;

struct Signature<F> {
    name: &'static str,
    parameters: &'static [ArgumentKind],
    function: F,
}

/// Name → function table for rule conditions and actions
pub struct RuleFunctionTable {
    conditions: HashMap<&'static str, Signature<ConditionFn>>,
    actions: HashMap<&'static str, Signature<ActionFn>>,
}

impl RuleFunctionTable {
    /// Table holding every built-in function
    pub fn builtin() -> Self {
        use ArgumentKind::{Location as Loc, Number, Subject as Subj, Text};

        let conditions: [(&'static str, &'static [ArgumentKind], ConditionFn); 6] = [
            ("IsType", &[Subj, Number], is_type),
            ("IsCreature", &[Subj], is_creature),
            ("IsPlayer", &[Subj], is_player),
            ("IsCreatureId", &[Subj, Number], is_creature_id),
            ("IsAtLocation", &[Subj, Loc], is_at_location),
            ("CountAtLeast", &[Subj, Number], count_at_least),
        ];
        let actions: [(&'static str, &'static [ArgumentKind], ActionFn); 6] = [
            ("Change", &[Subj, Number], change),
            ("Delete", &[Subj], delete),
            ("Create", &[Number, Loc], create),
            ("MoveTo", &[Subj, Loc], move_to),
            ("Text", &[Subj, Text], text),
            ("Effect", &[Loc, Number], effect),
        ];

        Self {
            conditions: conditions
                .into_iter()
                .map(|(name, parameters, function)| {
                    (name, Signature { name, parameters, function })
                })
                .collect(),
            actions: actions
                .into_iter()
                .map(|(name, parameters, function)| {
                    (name, Signature { name, parameters, function })
                })
                .collect(),
        }
    }

    pub fn has_condition(&self, name: &str) -> bool {
        self.conditions.contains_key(name)
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Bind every named function of `definition`
    ///
    /// Fails on unknown names, wrong argument counts and wrong argument
    /// kinds.
    pub fn resolve(&self, definition: &RuleDefinition) -> Result<EventRule, RuleError> {
        let conditions = definition
            .conditions
            .iter()
            .map(|call| {
                let signature = lookup(&self.conditions, call)?;
                Ok(RuleCondition {
                    name: signature.name,
                    function: signature.function,
                    arguments: call.arguments.clone(),
                })
            })
            .collect::<Result<Vec<_>, RuleError>>()?;

        let actions = definition
            .actions
            .iter()
            .map(|call| {
                let signature = lookup(&self.actions, call)?;
                Ok(RuleAction {
                    name: signature.name,
                    function: signature.function,
                    arguments: call.arguments.clone(),
                })
            })
            .collect::<Result<Vec<_>, RuleError>>()?;

        Ok(EventRule::new(
            definition.rule_type,
            conditions,
            actions,
            ExecutionCount::from_max(definition.max_executions),
        ))
    }
}

impl Default for RuleFunctionTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn lookup<'t, F>(
    table: &'t HashMap<&'static str, Signature<F>>,
    call: &FunctionCall,
) -> Result<&'t Signature<F>, RuleError> {
    let signature = table
        .get(call.name.as_str())
        .ok_or_else(|| RuleError::UnknownFunction(call.name.clone()))?;

    if signature.parameters.len() != call.arguments.len() {
        return Err(RuleError::ArgumentCount {
            function: call.name.clone(),
            expected: signature.parameters.len(),
            found: call.arguments.len(),
        });
    }
    let pairs = signature.parameters.iter().zip(&call.arguments);
    for (index, (expected, argument)) in pairs.enumerate() {
        if argument.kind() != *expected {
            return Err(RuleError::ArgumentType {
                function: call.name.clone(),
                index,
                expected: *expected,
            });
        }
    }
    Ok(signature)
}

// ============================================================================
// ARGUMENT ACCESS
// ============================================================================

fn subject_at(
    function: &str,
    arguments: &[RuleArgument],
    index: usize,
) -> Result<Subject, RuleError> {
    match arguments.get(index) {
        Some(RuleArgument::Subject(subject)) => Ok(*subject),
        _ => Err(argument_type(function, index, ArgumentKind::Subject)),
    }
}

fn number_at(function: &str, arguments: &[RuleArgument], index: usize) -> Result<i64, RuleError> {
    match arguments.get(index) {
        Some(RuleArgument::Number(number)) => Ok(*number),
        _ => Err(argument_type(function, index, ArgumentKind::Number)),
    }
}

fn location_at(
    function: &str,
    arguments: &[RuleArgument],
    index: usize,
) -> Result<Location, RuleError> {
    match arguments.get(index) {
        Some(RuleArgument::Location(location)) => Ok(*location),
        _ => Err(argument_type(function, index, ArgumentKind::Location)),
    }
}

fn text_at<'a>(
    function: &str,
    arguments: &'a [RuleArgument],
    index: usize,
) -> Result<&'a str, RuleError> {
    match arguments.get(index) {
        Some(RuleArgument::Text(text)) => Ok(text),
        _ => Err(argument_type(function, index, ArgumentKind::Text)),
    }
}

fn argument_type(function: &str, index: usize, expected: ArgumentKind) -> RuleError {
    RuleError::ArgumentType {
        function: function.to_string(),
        index,
        expected,
    }
}

fn type_id_from(function: &'static str, number: i64) -> Result<ItemTypeId, RuleError> {
    u16::try_from(number).map(ItemTypeId).map_err(|_| RuleError::Action {
        function,
        reason: format!("{number} is not an item type"),
    })
}

/// Item behind a located subject
fn subject_item<'w>(
    world: &'w dyn World,
    subjects: &RuleSubjects,
    subject: Subject,
) -> Option<&'w Item> {
    let RuleThing { thing, location } = subjects.located(subject)?;
    let id = thing.as_item()?;
    world.tile(location)?.find_item(id)
}

fn located_item(
    subjects: &RuleSubjects,
    subject: Subject,
) -> Result<(ItemId, Location), RuleError> {
    let located = subjects.located(subject).ok_or(RuleError::MissingSubject(subject))?;
    match located.thing {
        ThingRef::Item(id) => Ok((id, located.location)),
        ThingRef::Creature(_) => Err(RuleError::MissingSubject(subject)),
    }
}

fn replace_subject(subjects: &mut RuleSubjects, subject: Subject, replacement: Option<RuleThing>) {
    match subject {
        Subject::Primary => subjects.primary = replacement,
        Subject::Secondary => subjects.secondary = replacement,
        Subject::Actor => {
            subjects.actor = replacement.and_then(|located| located.thing.as_creature());
        }
    }
}

// ============================================================================
// CONDITIONS
// ============================================================================

fn is_type(view: &RuleView<'_>, arguments: &[RuleArgument]) -> Result<bool, RuleError> {
    let subject = subject_at("IsType", arguments, 0)?;
    let type_id = number_at("IsType", arguments, 1)?;
    Ok(subject_item(view.world, view.subjects, subject)
        .is_some_and(|item| i64::from(item.type_id.0) == type_id))
}

fn is_creature(view: &RuleView<'_>, arguments: &[RuleArgument]) -> Result<bool, RuleError> {
    let subject = subject_at("IsCreature", arguments, 0)?;
    Ok(view
        .subjects
        .thing(subject)
        .and_then(|thing| thing.as_creature())
        .is_some_and(|id| view.world.find_creature(id).is_some()))
}

fn is_player(view: &RuleView<'_>, arguments: &[RuleArgument]) -> Result<bool, RuleError> {
    let subject = subject_at("IsPlayer", arguments, 0)?;
    Ok(view
        .subjects
        .thing(subject)
        .and_then(|thing| thing.as_creature())
        .and_then(|id| view.world.find_creature(id))
        .is_some_and(|creature| creature.is_player()))
}

pub(crate) fn is_creature_id(
    view: &RuleView<'_>,
    arguments: &[RuleArgument],
) -> Result<bool, RuleError> {
    let subject = subject_at("IsCreatureId", arguments, 0)?;
    let id = number_at("IsCreatureId", arguments, 1)?;
    Ok(view
        .subjects
        .thing(subject)
        .and_then(|thing| thing.as_creature())
        .is_some_and(|creature| i64::from(creature.0) == id))
}

/// Creatures are checked at their current position, items at the
/// location recorded for the occurrence
pub(crate) fn is_at_location(
    view: &RuleView<'_>,
    arguments: &[RuleArgument],
) -> Result<bool, RuleError> {
    let subject = subject_at("IsAtLocation", arguments, 0)?;
    let location = location_at("IsAtLocation", arguments, 1)?;

    let current = match view.subjects.thing(subject) {
        Some(ThingRef::Creature(id)) => {
            view.world.find_creature(id).map(|creature| creature.location())
        }
        Some(ThingRef::Item(_)) => view.subjects.located(subject).map(|located| located.location),
        None => None,
    };
    Ok(current == Some(location))
}

fn count_at_least(view: &RuleView<'_>, arguments: &[RuleArgument]) -> Result<bool, RuleError> {
    let subject = subject_at("CountAtLeast", arguments, 0)?;
    let amount = number_at("CountAtLeast", arguments, 1)?;
    Ok(subject_item(view.world, view.subjects, subject)
        .is_some_and(|item| i64::from(item.amount) >= amount))
}

// ============================================================================
// ACTIONS
// ============================================================================

fn change(
    context: &mut OperationContext<'_>,
    subjects: &mut RuleSubjects,
    arguments: &[RuleArgument],
) -> Result<(), RuleError> {
    let subject = subject_at("Change", arguments, 0)?;
    let type_id = type_id_from("Change", number_at("Change", arguments, 1)?)?;
    let (id, location) = located_item(subjects, subject)?;

    let item = context
        .world
        .tile_mut(location)
        .and_then(|tile| tile.find_item_mut(id))
        .ok_or(WorldError::ItemNotFound { item: id, location })?;
    item.type_id = type_id;

    context.notify(tile_update(context, location));
    Ok(())
}

fn delete(
    context: &mut OperationContext<'_>,
    subjects: &mut RuleSubjects,
    arguments: &[RuleArgument],
) -> Result<(), RuleError> {
    let subject = subject_at("Delete", arguments, 0)?;
    let (id, location) = located_item(subjects, subject)?;

    context
        .world
        .tile_mut(location)
        .and_then(|tile| tile.remove_item(id))
        .ok_or(WorldError::ItemNotFound { item: id, location })?;
    replace_subject(subjects, subject, None);

    context.notify(tile_update(context, location));
    Ok(())
}

fn create(
    context: &mut OperationContext<'_>,
    _subjects: &mut RuleSubjects,
    arguments: &[RuleArgument],
) -> Result<(), RuleError> {
    let type_id = type_id_from("Create", number_at("Create", arguments, 0)?)?;
    let location = location_at("Create", arguments, 1)?;

    let item = context.item_factory.create_item(type_id, 1);
    context
        .world
        .tile_mut(location)
        .ok_or(WorldError::TileNotFound(location))?
        .add_item(item);

    context.notify(tile_update(context, location));
    Ok(())
}

fn move_to(
    context: &mut OperationContext<'_>,
    subjects: &mut RuleSubjects,
    arguments: &[RuleArgument],
) -> Result<(), RuleError> {
    let subject = subject_at("MoveTo", arguments, 0)?;
    let destination = location_at("MoveTo", arguments, 1)?;

    match subjects.thing(subject).ok_or(RuleError::MissingSubject(subject))? {
        ThingRef::Creature(id) => {
            let from = relocate_creature(context.world, id, destination)?;
            context.notify(creature_moved(id, from, destination));
            if subject != Subject::Actor {
                let moved = RuleThing::new(ThingRef::Creature(id), destination);
                replace_subject(subjects, subject, Some(moved));
            }
        }
        ThingRef::Item(_) => {
            let (id, from) = located_item(subjects, subject)?;
            let moved =
                relocate_item(context.world, context.item_factory, id, from, destination, None)?;
            context.notify(tile_update(context, from));
            context.notify(tile_update(context, destination));
            let relocated = RuleThing::new(ThingRef::Item(moved), destination);
            replace_subject(subjects, subject, Some(relocated));
        }
    }
    Ok(())
}

fn text(
    context: &mut OperationContext<'_>,
    subjects: &mut RuleSubjects,
    arguments: &[RuleArgument],
) -> Result<(), RuleError> {
    let subject = subject_at("Text", arguments, 0)?;
    let message = text_at("Text", arguments, 1)?;

    let creature = subjects
        .thing(subject)
        .and_then(|thing| thing.as_creature())
        .ok_or(RuleError::MissingSubject(subject))?;
    context.notify(Notification::text(creature, TextMessageType::Event, message));
    Ok(())
}

fn effect(
    context: &mut OperationContext<'_>,
    _subjects: &mut RuleSubjects,
    arguments: &[RuleArgument],
) -> Result<(), RuleError> {
    let location = location_at("Effect", arguments, 0)?;
    let effect = number_at("Effect", arguments, 1)?;
    let effect = u8::try_from(effect).map_err(|_| RuleError::Action {
        function: "Effect",
        reason: format!("{effect} is not an effect id"),
    })?;

    context.notify(Notification::to_spectators(
        location,
        NotificationPayload::MagicEffect { location, effect },
    ));
    Ok(())
}
