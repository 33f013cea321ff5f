// Event rule value types
//
// Rule definitions deserialize from JSON (world configuration) and resolve
// against the function table into executable rules.

use crate::models::{CreatureId, Location, ThingRef};
use crate::world::WorldError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// RULE TYPES
// ============================================================================

/// The occurrence a rule reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventRuleType {
    /// A thing arrived on a tile holding the primary thing
    Collision,
    /// A thing left a tile holding the primary thing
    Separation,
    /// A thing moved
    Movement,
    /// An item was used
    Use,
    /// An item was used on another thing
    MultiUse,
}

impl EventRuleType {
    pub const ALL: [EventRuleType; 5] = [
        EventRuleType::Collision,
        EventRuleType::Separation,
        EventRuleType::Movement,
        EventRuleType::Use,
        EventRuleType::MultiUse,
    ];
}

impl fmt::Display for EventRuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventRuleType::Collision => "collision",
            EventRuleType::Separation => "separation",
            EventRuleType::Movement => "movement",
            EventRuleType::Use => "use",
            EventRuleType::MultiUse => "multi_use",
        };
        f.write_str(name)
    }
}

// ============================================================================
// SUBJECTS
// ============================================================================

/// Which participant of the occurrence an argument refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    /// The item used, or the thing collided with / separated from
    Primary,
    /// The use target, or the thing that moved into / out of the tile
    Secondary,
    /// The creature that caused the occurrence
    Actor,
}

/// A thing together with where it is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleThing {
    pub thing: ThingRef,
    pub location: Location,
}

impl RuleThing {
    pub fn new(thing: ThingRef, location: Location) -> Self {
        Self { thing, location }
    }
}

/// Participants of one occurrence
///
/// For movement the moved thing is the primary subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuleSubjects {
    pub primary: Option<RuleThing>,
    pub secondary: Option<RuleThing>,
    pub actor: Option<CreatureId>,
}

impl RuleSubjects {
    pub fn new(
        primary: Option<RuleThing>,
        secondary: Option<RuleThing>,
        actor: Option<CreatureId>,
    ) -> Self {
        Self {
            primary,
            secondary,
            actor,
        }
    }

    /// Thing named by `subject`, without a location for the actor
    pub fn thing(&self, subject: Subject) -> Option<ThingRef> {
        match subject {
            Subject::Primary => self.primary.map(|subject| subject.thing),
            Subject::Secondary => self.secondary.map(|subject| subject.thing),
            Subject::Actor => self.actor.map(ThingRef::Creature),
        }
    }

    /// Recorded location of `subject`; the actor has none
    pub fn located(&self, subject: Subject) -> Option<RuleThing> {
        match subject {
            Subject::Primary => self.primary,
            Subject::Secondary => self.secondary,
            Subject::Actor => None,
        }
    }
}

// ============================================================================
// DEFINITIONS
// ============================================================================

/// Literal argument of a rule function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleArgument {
    Subject(Subject),
    Number(i64),
    Location(Location),
    Text(String),
}

impl RuleArgument {
    pub(crate) fn kind(&self) -> ArgumentKind {
        match self {
            RuleArgument::Subject(_) => ArgumentKind::Subject,
            RuleArgument::Number(_) => ArgumentKind::Number,
            RuleArgument::Location(_) => ArgumentKind::Location,
            RuleArgument::Text(_) => ArgumentKind::Text,
        }
    }
}

/// Type of a rule function parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    Subject,
    Number,
    Location,
    Text,
}

impl fmt::Display for ArgumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArgumentKind::Subject => "subject",
            ArgumentKind::Number => "number",
            ArgumentKind::Location => "location",
            ArgumentKind::Text => "text",
        };
        f.write_str(name)
    }
}

/// A named condition or action with its arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<RuleArgument>,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, arguments: Vec<RuleArgument>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Serializable rule as written in world configuration
///
/// # Example
/// ```
/// use tick_engine_core_rs::rules::{EventRuleType, RuleDefinition};
///
/// let json = r#"{
///     "type": "use",
///     "conditions": [{"name": "IsType", "arguments": [{"subject": "primary"}, {"number": 1945}]}],
///     "actions": [{"name": "Change", "arguments": [{"subject": "primary"}, {"number": 1946}]}]
/// }"#;
/// let definition: RuleDefinition = serde_json::from_str(json).unwrap();
/// assert_eq!(definition.rule_type, EventRuleType::Use);
/// assert_eq!(definition.max_executions, None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    #[serde(rename = "type")]
    pub rule_type: EventRuleType,

    #[serde(default)]
    pub conditions: Vec<FunctionCall>,

    #[serde(default)]
    pub actions: Vec<FunctionCall>,

    /// Absent means the rule never runs out
    #[serde(default)]
    pub max_executions: Option<u32>,
}

/// How many more times a rule may fire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionCount {
    Unlimited,
    Remaining(u32),
}

impl ExecutionCount {
    pub fn from_max(max_executions: Option<u32>) -> Self {
        match max_executions {
            Some(count) => ExecutionCount::Remaining(count),
            None => ExecutionCount::Unlimited,
        }
    }

    pub fn is_exhausted(self) -> bool {
        self == ExecutionCount::Remaining(0)
    }

    /// Consume one execution; false when none was left
    pub(crate) fn take(&mut self) -> bool {
        match self {
            ExecutionCount::Unlimited => true,
            ExecutionCount::Remaining(0) => false,
            ExecutionCount::Remaining(count) => {
                *count -= 1;
                true
            }
        }
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuleError {
    #[error("Unknown rule function: {0}")]
    UnknownFunction(String),

    #[error("{function} takes {expected} arguments, got {found}")]
    ArgumentCount {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("Argument {index} of {function} must be a {expected}")]
    ArgumentType {
        function: String,
        index: usize,
        expected: ArgumentKind,
    },

    #[error("Rule subject {0:?} is not part of this occurrence")]
    MissingSubject(Subject),

    #[error("Rule action {function} failed: {reason}")]
    Action { function: &'static str, reason: String },

    #[error("World error: {0}")]
    World(#[from] WorldError),
}
