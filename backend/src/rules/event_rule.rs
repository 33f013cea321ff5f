//! Armed rules
//!
//! # State Machine
//!
//! ```text
//! resolve / expedite ──► Armed ──(conditions hold, count taken)──► fired
//!                          ▲                                        │
//!                          └──────────── count remains ◄────────────┘
//!                                        count spent ──► removed
//! ```
//!
//! # Critical Invariants
//!
//! 1. The remaining count is taken before actions run and never drops
//!    below zero
//! 2. An expedition rule fires once and then hands its operation to the
//!    scheduler
//! 3. Conditions only read the world; actions may mutate it

use crate::context::OperationContext;
use crate::models::{CreatureId, Location};
use crate::rules::functions::{is_at_location, is_creature_id};
use crate::rules::{EventRuleType, ExecutionCount, RuleArgument, RuleError, RuleSubjects, Subject};
use crate::scheduler::EventHandle;
use crate::world::World;
use std::fmt;
use std::sync::Arc;

/// Read-only view a condition is evaluated against
pub struct RuleView<'a> {
    pub world: &'a dyn World,
    pub subjects: &'a RuleSubjects,
}

pub type ConditionFn = fn(&RuleView<'_>, &[RuleArgument]) -> Result<bool, RuleError>;

pub type ActionFn =
    fn(&mut OperationContext<'_>, &mut RuleSubjects, &[RuleArgument]) -> Result<(), RuleError>;

/// A condition bound to its function and arguments
#[derive(Clone)]
pub struct RuleCondition {
    pub(crate) name: &'static str,
    pub(crate) function: ConditionFn,
    pub(crate) arguments: Vec<RuleArgument>,
}

impl RuleCondition {
    pub fn name(&self) -> &'static str {
        self.name
    }

    fn holds(&self, view: &RuleView<'_>) -> bool {
        match (self.function)(view, &self.arguments) {
            Ok(result) => result,
            Err(err) => {
                tracing::debug!(condition = self.name, %err, "rule condition failed");
                false
            }
        }
    }
}

impl fmt::Debug for RuleCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleCondition")
            .field("name", &self.name)
            .field("arguments", &self.arguments)
            .finish()
    }
}

/// An action bound to its function and arguments
#[derive(Clone)]
pub struct RuleAction {
    pub(crate) name: &'static str,
    pub(crate) function: ActionFn,
    pub(crate) arguments: Vec<RuleArgument>,
}

impl RuleAction {
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleAction")
            .field("name", &self.name)
            .field("arguments", &self.arguments)
            .finish()
    }
}

/// Reactive condition → action binding
#[derive(Debug, Clone)]
pub struct EventRule {
    rule_type: EventRuleType,
    conditions: Vec<RuleCondition>,
    actions: Arc<[RuleAction]>,
    remaining: ExecutionCount,
    expedition: Option<EventHandle>,
}

impl EventRule {
    pub(crate) fn new(
        rule_type: EventRuleType,
        conditions: Vec<RuleCondition>,
        actions: Vec<RuleAction>,
        remaining: ExecutionCount,
    ) -> Self {
        Self {
            rule_type,
            conditions,
            actions: actions.into(),
            remaining,
            expedition: None,
        }
    }

    /// One-shot movement rule that runs `operation` as soon as its requestor
    /// stands on `retry_location`
    ///
    /// The handle is usually detached (never scheduled on its own), but a
    /// queued handle works too: whichever path runs it first wins.
    pub fn expedite(operation: EventHandle, retry_location: Location) -> Self {
        let requestor: CreatureId = operation.requestor_id();
        let conditions = vec![
            RuleCondition {
                name: "IsCreatureId",
                function: is_creature_id,
                arguments: vec![
                    RuleArgument::Subject(Subject::Actor),
                    RuleArgument::Number(i64::from(requestor.0)),
                ],
            },
            RuleCondition {
                name: "IsAtLocation",
                function: is_at_location,
                arguments: vec![
                    RuleArgument::Subject(Subject::Actor),
                    RuleArgument::Location(retry_location),
                ],
            },
        ];

        Self {
            rule_type: EventRuleType::Movement,
            conditions,
            actions: Arc::from(Vec::new()),
            remaining: ExecutionCount::Remaining(1),
            expedition: Some(operation),
        }
    }

    pub fn rule_type(&self) -> EventRuleType {
        self.rule_type
    }

    pub fn remaining(&self) -> ExecutionCount {
        self.remaining
    }

    pub fn conditions(&self) -> &[RuleCondition] {
        &self.conditions
    }

    pub fn actions(&self) -> &[RuleAction] {
        &self.actions
    }

    /// Operation this rule forces into execution, if any
    pub fn expedition(&self) -> Option<&EventHandle> {
        self.expedition.as_ref()
    }

    /// Whether every condition holds for this occurrence
    pub fn can_be_executed(&self, view: &RuleView<'_>) -> bool {
        !self.remaining.is_exhausted()
            && self.conditions.iter().all(|condition| condition.holds(view))
    }

    /// Take one execution; returns what has to run once the registry is
    /// unlocked
    pub(crate) fn reserve(&mut self) -> Option<RuleFiring> {
        if !self.remaining.take() {
            return None;
        }
        Some(RuleFiring {
            actions: Arc::clone(&self.actions),
            expedition: self.expedition.clone(),
        })
    }

    pub(crate) fn is_spent(&self) -> bool {
        self.remaining.is_exhausted()
    }
}

/// Work of one rule execution, detached from the registry
#[derive(Debug)]
pub(crate) struct RuleFiring {
    actions: Arc<[RuleAction]>,
    expedition: Option<EventHandle>,
}

impl RuleFiring {
    /// Run the actions in order, threading subjects through them
    ///
    /// An action failure stops the remaining actions and the expedition.
    pub(crate) fn execute(
        &self,
        context: &mut OperationContext<'_>,
        mut subjects: RuleSubjects,
    ) -> Result<(), RuleError> {
        for action in self.actions.iter() {
            (action.function)(context, &mut subjects, &action.arguments)?;
        }

        if let Some(operation) = &self.expedition {
            let expedited = context.scheduler.expedite(operation);
            tracing::info!(
                event = %operation.id(),
                requestor = %operation.requestor_id(),
                expedited,
                "expedition rule fired"
            );
        }
        Ok(())
    }
}
