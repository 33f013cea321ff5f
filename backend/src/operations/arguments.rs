//! Operation creation arguments
//!
//! One payload per operation kind. The enum is internally tagged by `kind`
//! so the same value doubles as the wire form handlers receive.

use crate::models::{ConnectionId, CreatureId, Direction, ItemId, Location, ThingRef, WorldLight};
use crate::notifications::SpeechType;
use crate::operations::OperationKind;
use serde::{Deserialize, Serialize};

/// Kind-tagged payload consumed by the operation factory
///
/// # Example
/// ```
/// use tick_engine_core_rs::operations::{OperationCreationArguments, OperationKind};
///
/// let json = r#"{"kind": "logout", "requestor_id": 7}"#;
/// let arguments: OperationCreationArguments = serde_json::from_str(json).unwrap();
/// assert_eq!(arguments.kind(), OperationKind::Logout);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationCreationArguments {
    AutoWalk(AutoWalkArguments),
    ChangeDirection(ChangeDirectionArguments),
    Login(LoginArguments),
    Logout(LogoutArguments),
    LookAt(LookAtArguments),
    Movement(MovementArguments),
    Speech(SpeechArguments),
    SpawnMonsters(SpawnMonstersArguments),
    UseItem(UseItemArguments),
    UseItemOn(UseItemOnArguments),
}

impl OperationCreationArguments {
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationCreationArguments::AutoWalk(_) => OperationKind::AutoWalk,
            OperationCreationArguments::ChangeDirection(_) => OperationKind::ChangeDirection,
            OperationCreationArguments::Login(_) => OperationKind::Login,
            OperationCreationArguments::Logout(_) => OperationKind::Logout,
            OperationCreationArguments::LookAt(_) => OperationKind::LookAt,
            OperationCreationArguments::Movement(_) => OperationKind::Movement,
            OperationCreationArguments::Speech(_) => OperationKind::Speech,
            OperationCreationArguments::SpawnMonsters(_) => OperationKind::SpawnMonsters,
            OperationCreationArguments::UseItem(_) => OperationKind::UseItem,
            OperationCreationArguments::UseItemOn(_) => OperationKind::UseItemOn,
        }
    }

    /// Creature on whose behalf the operation would run
    pub fn requestor_id(&self) -> CreatureId {
        match self {
            OperationCreationArguments::AutoWalk(args) => args.requestor_id,
            OperationCreationArguments::ChangeDirection(args) => args.requestor_id,
            OperationCreationArguments::Login(args) => args.player.id,
            OperationCreationArguments::Logout(args) => args.requestor_id,
            OperationCreationArguments::LookAt(args) => args.requestor_id,
            OperationCreationArguments::Movement(args) => args.requestor_id,
            OperationCreationArguments::Speech(args) => args.requestor_id,
            OperationCreationArguments::SpawnMonsters(_) => CreatureId::NONE,
            OperationCreationArguments::UseItem(args) => args.requestor_id,
            OperationCreationArguments::UseItemOn(args) => args.requestor_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoWalkArguments {
    pub requestor_id: CreatureId,
    pub directions: Vec<Direction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeDirectionArguments {
    pub requestor_id: CreatureId,
    pub direction: Direction,
}

/// Character data loaded by the login server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMetadata {
    pub id: CreatureId,
    pub name: String,
    pub location: Location,
    #[serde(default)]
    pub speed: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginArguments {
    pub connection: ConnectionId,
    pub player: PlayerMetadata,
    #[serde(default)]
    pub world_light: WorldLight,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogoutArguments {
    pub requestor_id: CreatureId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookAtArguments {
    pub requestor_id: CreatureId,
    pub location: Location,
    /// Specific thing to look at; the top thing on the tile when absent
    #[serde(default)]
    pub thing: Option<ThingRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementArguments {
    /// `CreatureId::NONE` for world-driven movement
    pub requestor_id: CreatureId,
    pub thing: ThingRef,
    pub from: Location,
    pub to: Location,
    /// Part of a stack to move; the whole stack when absent
    #[serde(default)]
    pub amount: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechArguments {
    pub requestor_id: CreatureId,
    pub speech_type: SpeechType,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterSpawn {
    pub name: String,
    pub location: Location,
    #[serde(default)]
    pub speed: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnMonstersArguments {
    pub spawns: Vec<MonsterSpawn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseItemArguments {
    pub requestor_id: CreatureId,
    pub item: ItemId,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseItemOnArguments {
    pub requestor_id: CreatureId,
    pub item: ItemId,
    pub item_location: Location,
    pub target: ThingRef,
    pub target_location: Location,
}
