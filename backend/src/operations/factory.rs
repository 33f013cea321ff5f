//! Operation construction
//!
//! The factory is the only way to obtain an [`Operation`]. Dispatch is a
//! closed match over [`OperationCreationArguments`]: a payload always
//! carries its own kind, so a kind/payload mismatch cannot be expressed.
//! What remains is payload validation, which fails closed.
//!
//! # Example
//! ```
//! use tick_engine_core_rs::models::{CreatureId, Direction};
//! use tick_engine_core_rs::operations::{
//!     ChangeDirectionArguments, OperationCreationArguments, OperationFactory, OperationKind,
//! };
//!
//! let factory = OperationFactory::new();
//! let operation = factory
//!     .create(OperationCreationArguments::ChangeDirection(ChangeDirectionArguments {
//!         requestor_id: CreatureId(1),
//!         direction: Direction::East,
//!     }))
//!     .unwrap();
//! assert_eq!(operation.kind(), OperationKind::ChangeDirection);
//! ```

use crate::models::CreatureId;
use crate::operations::{
    AutoWalkOperation, ChangeDirectionOperation, LoginOperation, LogoutOperation, LookAtOperation,
    MovementOperation, Operation, OperationCreationArguments, OperationKind, SpawnMonstersOperation,
    SpeechOperation, UseItemOnOperation, UseItemOperation,
};
use serde_json::{Map, Value};
use thiserror::Error;

/// Longest text a creature may say at once
pub const MAX_SPEECH_LENGTH: usize = 255;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OperationError {
    #[error("Invalid operation arguments: {0}")]
    Validation(String),

    #[error("Unsupported operation kind: {0}")]
    UnsupportedOperationKind(String),
}

/// Builds operations from creation arguments
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationFactory;

impl OperationFactory {
    pub fn new() -> Self {
        Self
    }

    /// Validate `arguments` and build the matching operation
    pub fn create(
        &self,
        arguments: OperationCreationArguments,
    ) -> Result<Operation, OperationError> {
        validate(&arguments)?;

        let operation = match arguments {
            OperationCreationArguments::AutoWalk(args) => {
                Operation::AutoWalk(AutoWalkOperation::new(args))
            }
            OperationCreationArguments::ChangeDirection(args) => {
                Operation::ChangeDirection(ChangeDirectionOperation::new(args))
            }
            OperationCreationArguments::Login(args) => Operation::Login(LoginOperation::new(args)),
            OperationCreationArguments::Logout(args) => {
                Operation::Logout(LogoutOperation::new(args))
            }
            OperationCreationArguments::LookAt(args) => {
                Operation::LookAt(LookAtOperation::new(args))
            }
            OperationCreationArguments::Movement(args) => {
                Operation::Movement(MovementOperation::new(args))
            }
            OperationCreationArguments::Speech(args) => {
                Operation::Speech(SpeechOperation::new(args))
            }
            OperationCreationArguments::SpawnMonsters(args) => {
                Operation::SpawnMonsters(SpawnMonstersOperation::new(args))
            }
            OperationCreationArguments::UseItem(args) => {
                Operation::UseItem(UseItemOperation::new(args))
            }
            OperationCreationArguments::UseItemOn(args) => {
                Operation::UseItemOn(UseItemOnOperation::new(args))
            }
        };

        tracing::trace!(
            kind = %operation.kind(),
            requestor = %operation.requestor_id(),
            "operation created"
        );
        Ok(operation)
    }

    /// Build an operation from a wire kind name and its JSON payload
    ///
    /// The payload must not carry its own `kind` field, or it must agree
    /// with `kind`.
    pub fn create_from_wire(
        &self,
        kind: &str,
        payload: Value,
    ) -> Result<Operation, OperationError> {
        let kind: OperationKind = kind.parse()?;

        let mut fields = match payload {
            Value::Object(fields) => fields,
            Value::Null => Map::new(),
            other => {
                return Err(OperationError::Validation(format!(
                    "{kind} payload must be an object, got {other}"
                )))
            }
        };
        if let Some(tag) = fields.get("kind") {
            if tag.as_str() != Some(kind.as_str()) {
                return Err(OperationError::Validation(format!(
                    "payload kind {tag} does not match {kind}"
                )));
            }
        }
        fields.insert("kind".to_string(), Value::String(kind.as_str().to_string()));

        let arguments: OperationCreationArguments = serde_json::from_value(Value::Object(fields))
            .map_err(|err| OperationError::Validation(format!("{kind}: {err}")))?;
        self.create(arguments)
    }
}

fn validate(arguments: &OperationCreationArguments) -> Result<(), OperationError> {
    match arguments {
        OperationCreationArguments::AutoWalk(args) => {
            require_requestor(args.requestor_id)?;
            if args.directions.is_empty() {
                return invalid("auto walk needs at least one direction");
            }
        }
        OperationCreationArguments::ChangeDirection(args) => require_requestor(args.requestor_id)?,
        OperationCreationArguments::Login(args) => {
            require_requestor(args.player.id)?;
            if args.player.name.trim().is_empty() {
                return invalid("player name must not be empty");
            }
            if args.player.speed == Some(0) {
                return invalid("player speed must be positive");
            }
        }
        OperationCreationArguments::Logout(args) => require_requestor(args.requestor_id)?,
        OperationCreationArguments::LookAt(args) => require_requestor(args.requestor_id)?,
        OperationCreationArguments::Movement(args) => {
            if args.from == args.to {
                return invalid("movement source and destination are the same");
            }
            if args.amount == Some(0) {
                return invalid("movement amount must be positive");
            }
        }
        OperationCreationArguments::Speech(args) => {
            require_requestor(args.requestor_id)?;
            if args.text.trim().is_empty() {
                return invalid("speech text must not be empty");
            }
            if args.text.chars().count() > MAX_SPEECH_LENGTH {
                return invalid("speech text is too long");
            }
        }
        OperationCreationArguments::SpawnMonsters(args) => {
            if args.spawns.is_empty() {
                return invalid("spawn list must not be empty");
            }
            if args.spawns.iter().any(|spawn| spawn.name.trim().is_empty()) {
                return invalid("monster name must not be empty");
            }
            if args.spawns.iter().any(|spawn| spawn.speed == Some(0)) {
                return invalid("monster speed must be positive");
            }
        }
        OperationCreationArguments::UseItem(args) => require_requestor(args.requestor_id)?,
        OperationCreationArguments::UseItemOn(args) => require_requestor(args.requestor_id)?,
    }
    Ok(())
}

fn require_requestor(id: CreatureId) -> Result<(), OperationError> {
    if id.is_none() {
        return invalid("operation needs a requestor");
    }
    Ok(())
}

fn invalid(reason: &str) -> Result<(), OperationError> {
    Err(OperationError::Validation(reason.to_string()))
}
