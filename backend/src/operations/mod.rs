//! Operations: units of game-state-mutating work
//!
//! An [`Operation`] is a closed sum type over the concrete operations. Each
//! is built by the [`OperationFactory`] from its matching creation
//! arguments, so an operation can never hold a payload of the wrong kind.
//!
//! Architecture:
//! - arguments.rs: creation-argument payloads (the wire surface)
//! - factory.rs: validation and construction
//! - one module per operation kind with its `execute` logic

pub mod arguments;
pub mod factory;
pub mod login;
pub mod look;
pub mod movement;
pub mod speech;
pub mod spawn;
pub mod turn;
pub mod use_item;
pub mod walk;

use crate::context::OperationContext;
use crate::models::{Creature, CreatureId};
use crate::rules::PartitionKey;
use crate::scheduler::{EventKind, ExecutionError, ScheduledEvent};
use crate::world::CreatureManager;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub use arguments::{
    AutoWalkArguments, ChangeDirectionArguments, LoginArguments, LogoutArguments, LookAtArguments,
    MonsterSpawn, MovementArguments, OperationCreationArguments, PlayerMetadata,
    SpawnMonstersArguments, SpeechArguments, UseItemArguments, UseItemOnArguments,
};
pub use factory::{OperationError, OperationFactory};
pub use login::{LoginOperation, LogoutOperation};
pub use look::LookAtOperation;
pub use movement::MovementOperation;
pub use speech::SpeechOperation;
pub use spawn::SpawnMonstersOperation;
pub use turn::ChangeDirectionOperation;
pub use use_item::{UseItemOnOperation, UseItemOperation};
pub use walk::AutoWalkOperation;

/// Exhaustion applied after using an item
pub const USE_EXHAUSTION: Duration = Duration::from_millis(1000);

/// Discriminator of the closed set of operation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    AutoWalk,
    ChangeDirection,
    Login,
    Logout,
    LookAt,
    Movement,
    Speech,
    SpawnMonsters,
    UseItem,
    UseItemOn,
}

impl OperationKind {
    pub const ALL: [OperationKind; 10] = [
        OperationKind::AutoWalk,
        OperationKind::ChangeDirection,
        OperationKind::Login,
        OperationKind::Logout,
        OperationKind::LookAt,
        OperationKind::Movement,
        OperationKind::Speech,
        OperationKind::SpawnMonsters,
        OperationKind::UseItem,
        OperationKind::UseItemOn,
    ];

    /// Wire name of the kind
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::AutoWalk => "auto_walk",
            OperationKind::ChangeDirection => "change_direction",
            OperationKind::Login => "login",
            OperationKind::Logout => "logout",
            OperationKind::LookAt => "look_at",
            OperationKind::Movement => "movement",
            OperationKind::Speech => "speech",
            OperationKind::SpawnMonsters => "spawn_monsters",
            OperationKind::UseItem => "use_item",
            OperationKind::UseItemOn => "use_item_on",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| OperationError::UnsupportedOperationKind(s.to_string()))
    }
}

/// A schedulable unit of game work
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    AutoWalk(AutoWalkOperation),
    ChangeDirection(ChangeDirectionOperation),
    Login(LoginOperation),
    Logout(LogoutOperation),
    LookAt(LookAtOperation),
    Movement(MovementOperation),
    Speech(SpeechOperation),
    SpawnMonsters(SpawnMonstersOperation),
    UseItem(UseItemOperation),
    UseItemOn(UseItemOnOperation),
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::AutoWalk(_) => OperationKind::AutoWalk,
            Operation::ChangeDirection(_) => OperationKind::ChangeDirection,
            Operation::Login(_) => OperationKind::Login,
            Operation::Logout(_) => OperationKind::Logout,
            Operation::LookAt(_) => OperationKind::LookAt,
            Operation::Movement(_) => OperationKind::Movement,
            Operation::Speech(_) => OperationKind::Speech,
            Operation::SpawnMonsters(_) => OperationKind::SpawnMonsters,
            Operation::UseItem(_) => OperationKind::UseItem,
            Operation::UseItemOn(_) => OperationKind::UseItemOn,
        }
    }

    pub fn requestor_id(&self) -> CreatureId {
        match self {
            Operation::AutoWalk(op) => op.arguments().requestor_id,
            Operation::ChangeDirection(op) => op.arguments().requestor_id,
            Operation::Login(op) => op.arguments().player.id,
            Operation::Logout(op) => op.arguments().requestor_id,
            Operation::LookAt(op) => op.arguments().requestor_id,
            Operation::Movement(op) => op.arguments().requestor_id,
            Operation::Speech(op) => op.arguments().requestor_id,
            Operation::SpawnMonsters(_) => CreatureId::NONE,
            Operation::UseItem(op) => op.arguments().requestor_id,
            Operation::UseItemOn(op) => op.arguments().requestor_id,
        }
    }

    /// Minimum time the requestor waits before another operation of this kind
    pub fn exhaustion_cost(&self) -> Duration {
        match self {
            Operation::UseItem(_) | Operation::UseItemOn(_) => USE_EXHAUSTION,
            _ => Duration::ZERO,
        }
    }

    /// Grouping key for all pending work of this interaction
    pub fn partition_key(&self) -> PartitionKey {
        PartitionKey::for_operation(self.requestor_id(), self.kind())
    }

    /// Resolve the acting creature on demand
    ///
    /// `None` for system operations and for requestors that left the world.
    pub fn get_requestor<'w>(&self, creatures: &'w dyn CreatureManager) -> Option<&'w Creature> {
        let id = self.requestor_id();
        if id.is_none() {
            return None;
        }
        creatures.find_creature(id)
    }

    fn record_exhaustion(&self, context: &mut OperationContext<'_>) {
        let cost = self.exhaustion_cost();
        if cost.is_zero() {
            return;
        }
        let until = context.now() + cost;
        let kind = self.kind();
        if let Some(creature) = context.world.find_creature_mut(self.requestor_id()) {
            creature.add_exhaustion(kind, until);
        }
    }
}

impl ScheduledEvent for Operation {
    fn kind(&self) -> EventKind {
        EventKind::Operation(Operation::kind(self))
    }

    fn requestor_id(&self) -> CreatureId {
        Operation::requestor_id(self)
    }

    fn execute(&self, context: &mut OperationContext<'_>) -> Result<(), ExecutionError> {
        match self {
            Operation::AutoWalk(op) => op.execute(context)?,
            Operation::ChangeDirection(op) => op.execute(context)?,
            Operation::Login(op) => op.execute(context)?,
            Operation::Logout(op) => op.execute(context)?,
            Operation::LookAt(op) => op.execute(context)?,
            Operation::Movement(op) => op.execute(context)?,
            Operation::Speech(op) => op.execute(context)?,
            Operation::SpawnMonsters(op) => op.execute(context)?,
            Operation::UseItem(op) => op.execute(context)?,
            Operation::UseItemOn(op) => op.execute(context)?,
        }
        self.record_exhaustion(context);
        Ok(())
    }
}

/// Creature behind `id`, or `RequestorNotFound`
pub(crate) fn require_creature<'w>(
    context: &'w OperationContext<'_>,
    id: CreatureId,
) -> Result<&'w Creature, ExecutionError> {
    context
        .world
        .find_creature(id)
        .ok_or(ExecutionError::RequestorNotFound(id))
}
