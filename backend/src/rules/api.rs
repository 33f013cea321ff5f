//! Rule registry
//!
//! Rules are stored per occurrence type in registration order. Evaluation
//! happens in two phases:
//!
//! 1. Under the registry lock: check conditions against the occurrence,
//!    take one execution from each matching rule, drop spent rules
//! 2. After unlocking: run the actions and expeditions of the taken rules
//!
//! Actions may therefore register further rules, clear partitions or
//! schedule events without deadlocking, and a rule can never fire more
//! often than its count allows even if an action re-enters evaluation.

use crate::context::OperationContext;
use crate::models::CreatureId;
use crate::rules::event_rule::{RuleFiring, RuleView};
use crate::rules::{EventRule, EventRuleType, PartitionKey, RuleSubjects};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Registry-assigned identity of an armed rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(pub u64);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule#{}", self.0)
    }
}

#[derive(Debug)]
struct RegisteredRule {
    id: RuleId,
    partition: PartitionKey,
    rule: EventRule,
}

#[derive(Debug, Default)]
struct RuleRegistry {
    by_type: HashMap<EventRuleType, Vec<RegisteredRule>>,
    next_id: u64,
}

impl RuleRegistry {
    fn remove_where(&mut self, mut matches: impl FnMut(&RegisteredRule) -> bool) -> usize {
        let mut removed = 0;
        for rules in self.by_type.values_mut() {
            let before = rules.len();
            rules.retain(|registered| !matches(registered));
            removed += before - rules.len();
        }
        removed
    }
}

/// Thread-safe registry of armed event rules
#[derive(Debug, Default)]
pub struct EventRulesApi {
    registry: Mutex<RuleRegistry>,
}

impl EventRulesApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `rule` under `partition`
    pub fn setup_rule(&self, rule: EventRule, partition: PartitionKey) -> RuleId {
        let mut registry = self.registry.lock();
        registry.next_id += 1;
        let id = RuleId(registry.next_id);
        let rule_type = rule.rule_type();

        registry.by_type.entry(rule_type).or_default().push(RegisteredRule { id, partition, rule });
        tracing::debug!(rule = %id, %partition, %rule_type, "rule armed");
        id
    }

    /// Remove every rule under `partition`, whatever its remaining count
    ///
    /// Clearing an empty partition is a no-op that returns zero.
    pub fn clear_all_for(&self, partition: &PartitionKey) -> usize {
        let removed = self
            .registry
            .lock()
            .remove_where(|registered| registered.partition == *partition);
        if removed > 0 {
            tracing::debug!(%partition, removed, "partition cleared");
        }
        removed
    }

    /// Remove every interaction rule owned by `requestor`
    pub fn clear_all_for_requestor(&self, requestor: CreatureId) -> usize {
        if requestor.is_none() {
            return 0;
        }
        self.registry
            .lock()
            .remove_where(|registered| registered.partition.requestor() == requestor)
    }

    /// Remove one rule by id
    pub fn remove(&self, id: RuleId) -> bool {
        self.registry.lock().remove_where(|registered| registered.id == id) > 0
    }

    pub fn len(&self) -> usize {
        self.registry.lock().by_type.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of armed rules under `partition`
    pub fn count_for(&self, partition: &PartitionKey) -> usize {
        self.registry
            .lock()
            .by_type
            .values()
            .flatten()
            .filter(|registered| registered.partition == *partition)
            .count()
    }

    /// Check every rule of `rule_type` against one occurrence and run the
    /// ones whose conditions hold
    ///
    /// Returns the number of rules that fired.
    pub fn evaluate(
        &self,
        rule_type: EventRuleType,
        subjects: RuleSubjects,
        context: &mut OperationContext<'_>,
    ) -> usize {
        let firings: Vec<(RuleId, RuleFiring)> = {
            let mut registry = self.registry.lock();
            let Some(rules) = registry.by_type.get_mut(&rule_type) else {
                return 0;
            };

            let view = RuleView {
                world: &*context.world,
                subjects: &subjects,
            };
            let firings = rules
                .iter_mut()
                .filter(|registered| registered.rule.can_be_executed(&view))
                .filter_map(|registered| {
                    registered.rule.reserve().map(|firing| (registered.id, firing))
                })
                .collect();
            rules.retain(|registered| !registered.rule.is_spent());
            firings
        };

        let fired = firings.len();
        for (id, firing) in firings {
            if let Err(err) = firing.execute(context, subjects) {
                tracing::warn!(rule = %id, %rule_type, %err, "rule action failed");
            }
        }
        fired
    }

    pub fn on_movement(&self, subjects: RuleSubjects, context: &mut OperationContext<'_>) -> usize {
        self.evaluate(EventRuleType::Movement, subjects, context)
    }

    pub fn on_collision(
        &self,
        subjects: RuleSubjects,
        context: &mut OperationContext<'_>,
    ) -> usize {
        self.evaluate(EventRuleType::Collision, subjects, context)
    }

    pub fn on_separation(
        &self,
        subjects: RuleSubjects,
        context: &mut OperationContext<'_>,
    ) -> usize {
        self.evaluate(EventRuleType::Separation, subjects, context)
    }

    pub fn on_use(&self, subjects: RuleSubjects, context: &mut OperationContext<'_>) -> usize {
        self.evaluate(EventRuleType::Use, subjects, context)
    }

    pub fn on_multi_use(
        &self,
        subjects: RuleSubjects,
        context: &mut OperationContext<'_>,
    ) -> usize {
        self.evaluate(EventRuleType::MultiUse, subjects, context)
    }
}
