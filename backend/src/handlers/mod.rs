//! Player request handlers
//!
//! Handlers translate a [`PlayerRequest`] into creation arguments, build the
//! operation through the [`OperationFactory`] and decide how it reaches the
//! scheduler:
//!
//! - Local requests (turn, speak, look, logout) run in the current cycle.
//! - Throttled kinds wait out the requestor's exhaustion first.
//! - Ranged requests (use, use on, move) follow the expedition pattern when
//!   the requestor is out of reach.
//!
//! # Expedition
//!
//! ```text
//! clear ranged rules + cancel walk + cancel queued ops of the kind
//!   │
//!   ├─ in reach ─────────► schedule operation (after exhaustion)
//!   │
//!   └─ out of reach ─► path to a tile in reach
//!        ├─ none ──────► "There is no way." (nothing scheduled)
//!        └─ found ─────► arm expedition rule (partition key, retry tile)
//!                        schedule auto walk
//! ```
//!
//! Any ranged request before arrival discards the stale rule and walk, so an
//! abandoned interaction never runs and a re-issued one never runs twice.

use crate::context::OperationContext;
use crate::models::{ConnectionId, CreatureId, Direction, ItemId, Location, ThingRef};
use crate::notifications::{
    Notification, NotificationPayload, SpeechType, TextMessageType, THERE_IS_NO_WAY,
};
use crate::operations::{
    AutoWalkArguments, ChangeDirectionArguments, LoginArguments, LogoutArguments, LookAtArguments,
    MovementArguments, Operation, OperationCreationArguments, OperationError, OperationFactory,
    OperationKind, PlayerMetadata, SpeechArguments, UseItemArguments, UseItemOnArguments,
};
use crate::rules::{EventRule, PartitionKey, RuleId};
use crate::scheduler::EventHandle;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Kinds that may walk their requestor into range first
pub const RANGED_KINDS: [OperationKind; 3] = [
    OperationKind::UseItem,
    OperationKind::UseItemOn,
    OperationKind::Movement,
];

/// A request as decoded from a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "request", rename_all = "snake_case")]
pub enum PlayerRequest {
    Login {
        connection: ConnectionId,
        player: PlayerMetadata,
    },
    Walk {
        requestor_id: CreatureId,
        directions: Vec<Direction>,
    },
    StopWalking {
        requestor_id: CreatureId,
    },
    Turn {
        requestor_id: CreatureId,
        direction: Direction,
    },
    Speak {
        requestor_id: CreatureId,
        speech_type: SpeechType,
        text: String,
    },
    LookAt {
        requestor_id: CreatureId,
        location: Location,
        #[serde(default)]
        thing: Option<ThingRef>,
    },
    MoveThing {
        requestor_id: CreatureId,
        thing: ThingRef,
        from: Location,
        to: Location,
        #[serde(default)]
        amount: Option<u8>,
    },
    UseItem {
        requestor_id: CreatureId,
        item: ItemId,
        location: Location,
    },
    UseItemOn {
        requestor_id: CreatureId,
        item: ItemId,
        item_location: Location,
        target: ThingRef,
        target_location: Location,
    },
    Logout {
        requestor_id: CreatureId,
    },
}

/// What a handler did with a request
#[derive(Debug, Clone)]
pub enum HandlerOutcome {
    /// The operation is queued
    Scheduled(EventHandle),
    /// The requestor walks first; the rule runs the operation on arrival
    Expedition {
        walk: EventHandle,
        rule: RuleId,
        operation: EventHandle,
        retry_location: Location,
    },
    /// No path leads into reach; the requestor was told so
    NoWay,
    /// Walking was stopped
    Stopped { cancelled: usize },
}

/// Turns player requests into scheduled work
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestHandler {
    factory: OperationFactory,
}

impl RequestHandler {
    pub fn new(factory: OperationFactory) -> Self {
        Self { factory }
    }

    pub fn handle(
        &self,
        request: PlayerRequest,
        context: &mut OperationContext<'_>,
    ) -> Result<HandlerOutcome, OperationError> {
        let arguments = match request {
            PlayerRequest::Login { connection, player } => {
                OperationCreationArguments::Login(LoginArguments {
                    connection,
                    player,
                    world_light: context.settings.world_light,
                })
            }
            PlayerRequest::Walk {
                requestor_id,
                directions,
            } => return self.walk(context, requestor_id, directions),
            PlayerRequest::StopWalking { requestor_id } => {
                return Ok(self.stop_walking(context, requestor_id))
            }
            PlayerRequest::Turn {
                requestor_id,
                direction,
            } => OperationCreationArguments::ChangeDirection(ChangeDirectionArguments {
                requestor_id,
                direction,
            }),
            PlayerRequest::Speak {
                requestor_id,
                speech_type,
                text,
            } => OperationCreationArguments::Speech(SpeechArguments {
                requestor_id,
                speech_type,
                text,
            }),
            PlayerRequest::LookAt {
                requestor_id,
                location,
                thing,
            } => OperationCreationArguments::LookAt(LookAtArguments {
                requestor_id,
                location,
                thing,
            }),
            PlayerRequest::MoveThing {
                requestor_id,
                thing,
                from,
                to,
                amount,
            } => {
                let arguments = OperationCreationArguments::Movement(MovementArguments {
                    requestor_id,
                    thing,
                    from,
                    to,
                    amount,
                });
                return self.ranged(context, arguments, from);
            }
            PlayerRequest::UseItem {
                requestor_id,
                item,
                location,
            } => {
                let arguments = OperationCreationArguments::UseItem(UseItemArguments {
                    requestor_id,
                    item,
                    location,
                });
                return self.ranged(context, arguments, location);
            }
            PlayerRequest::UseItemOn {
                requestor_id,
                item,
                item_location,
                target,
                target_location,
            } => {
                let arguments = OperationCreationArguments::UseItemOn(UseItemOnArguments {
                    requestor_id,
                    item,
                    item_location,
                    target,
                    target_location,
                });
                return self.ranged(context, arguments, item_location);
            }
            PlayerRequest::Logout { requestor_id } => {
                OperationCreationArguments::Logout(LogoutArguments { requestor_id })
            }
        };

        let operation = self.factory.create(arguments)?;
        let delay = throttle_delay(context, &operation);
        Ok(HandlerOutcome::Scheduled(context.scheduler.schedule_event(operation, delay)))
    }

    fn walk(
        &self,
        context: &mut OperationContext<'_>,
        requestor_id: CreatureId,
        directions: Vec<Direction>,
    ) -> Result<HandlerOutcome, OperationError> {
        let operation = self.factory.create(OperationCreationArguments::AutoWalk(AutoWalkArguments {
            requestor_id,
            directions,
        }))?;

        abandon_interactions(context, requestor_id);
        context.scheduler.cancel_all_for(requestor_id, OperationKind::AutoWalk);
        Ok(HandlerOutcome::Scheduled(context.scheduler.immediate_event(operation)))
    }

    fn stop_walking(
        &self,
        context: &mut OperationContext<'_>,
        requestor_id: CreatureId,
    ) -> HandlerOutcome {
        abandon_interactions(context, requestor_id);
        let cancelled = context.scheduler.cancel_all_for(requestor_id, OperationKind::AutoWalk);

        if let Some(direction) = context
            .creature(requestor_id)
            .map(|creature| creature.direction())
        {
            context.notify(Notification::to_creature(
                requestor_id,
                NotificationPayload::WalkCancelled { direction },
            ));
        }
        HandlerOutcome::Stopped { cancelled }
    }

    /// Schedule an interaction with `target`, walking there first if needed
    fn ranged(
        &self,
        context: &mut OperationContext<'_>,
        arguments: OperationCreationArguments,
        target: Location,
    ) -> Result<HandlerOutcome, OperationError> {
        let operation = self.factory.create(arguments)?;
        let requestor_id = operation.requestor_id();
        let partition = operation.partition_key();

        // Ranged interactions share one auto walk.
        abandon_interactions(context, requestor_id);
        context.scheduler.cancel_all_for(requestor_id, OperationKind::AutoWalk);
        context.scheduler.cancel_all_for(requestor_id, operation.kind());

        let origin = context
            .creature(requestor_id)
            .map(|creature| creature.location())
            .ok_or_else(|| {
                OperationError::Validation(format!("{requestor_id} is not in the world"))
            })?;

        let radius = context.settings.interaction_radius;
        if origin.is_within(&target, radius) {
            let delay = throttle_delay(context, &operation);
            let handle = context.scheduler.schedule_event(operation, delay);
            return Ok(HandlerOutcome::Scheduled(handle));
        }

        let Some((retry_location, directions)) = path_into_reach(context, origin, target, radius)
        else {
            tracing::debug!(creature = %requestor_id, ?target, "no path into reach");
            context.notify(Notification::text(
                requestor_id,
                TextMessageType::StatusSmall,
                THERE_IS_NO_WAY,
            ));
            return Ok(HandlerOutcome::NoWay);
        };

        let walk = self.factory.create(OperationCreationArguments::AutoWalk(AutoWalkArguments {
            requestor_id,
            directions,
        }))?;

        let operation = EventHandle::new(operation);
        let rule = context
            .rules
            .setup_rule(EventRule::expedite(operation.clone(), retry_location), partition);
        let walk = context.scheduler.immediate_event(walk);

        tracing::info!(creature = %requestor_id, %partition, ?retry_location, "expedition armed");
        Ok(HandlerOutcome::Expedition {
            walk,
            rule,
            operation,
            retry_location,
        })
    }
}

/// Drop every pending ranged interaction of the requestor
fn abandon_interactions(context: &OperationContext<'_>, requestor_id: CreatureId) {
    for kind in RANGED_KINDS {
        context.rules.clear_all_for(&PartitionKey::for_operation(requestor_id, kind));
    }
}

/// Remaining exhaustion of the requestor when the kind is throttled
fn throttle_delay(context: &OperationContext<'_>, operation: &Operation) -> Duration {
    let kind = operation.kind();
    if !context.settings.throttled_kinds.contains(&kind) {
        return Duration::ZERO;
    }
    context
        .creature(operation.requestor_id())
        .map(|creature| creature.remaining_exhaustion(kind, context.now()))
        .unwrap_or_default()
}

/// Shortest route to a walkable tile within `radius` of `target`
///
/// Candidates closer to the requestor are searched first; ties keep the
/// first route found.
fn path_into_reach(
    context: &OperationContext<'_>,
    origin: Location,
    target: Location,
    radius: u32,
) -> Option<(Location, Vec<Direction>)> {
    let reach = i32::try_from(radius).unwrap_or(i32::MAX).min(8);
    let mut candidates: Vec<Location> = (-reach..=reach)
        .flat_map(|dy| {
            (-reach..=reach).map(move |dx| Location::new(target.x + dx, target.y + dy, target.z))
        })
        .filter(|candidate| {
            context
                .world
                .tile(*candidate)
                .is_some_and(|tile| tile.is_walkable())
        })
        .collect();
    candidates.sort_by_key(|candidate| origin.distance_to(candidate).unwrap_or(u32::MAX));

    let mut best: Option<(Location, Vec<Direction>)> = None;
    for candidate in candidates {
        let bound = best
            .as_ref()
            .map_or(context.settings.max_path_length, |(_, route)| route.len().saturating_sub(1));
        if bound == 0 {
            break;
        }
        if let Some(route) = context
            .pathfinder
            .find_path(&*context.world, origin, candidate, bound)
        {
            best = Some((candidate, route));
        }
    }
    best
}
