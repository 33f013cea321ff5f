//! Execution context handed to events, rules and request handlers
//!
//! Built by the orchestrator for each scheduler cycle. Every collaborator is
//! passed in explicitly; nothing in the engine reaches for global state.

use crate::models::{Creature, CreatureId};
use crate::notifications::Notification;
use crate::orchestrator::GameplaySettings;
use crate::rules::EventRulesApi;
use crate::scheduler::{EventHandle, Scheduler};
use crate::world::{ClientOutbox, ItemFactory, Pathfinder, World};
use std::time::Duration;

pub struct OperationContext<'a> {
    /// Map, creatures and containers; mutated only on the consumer thread
    pub world: &'a mut dyn World,
    pub item_factory: &'a dyn ItemFactory,
    pub pathfinder: &'a dyn Pathfinder,
    pub outbox: &'a dyn ClientOutbox,
    pub rules: &'a EventRulesApi,
    pub scheduler: &'a Scheduler,
    pub settings: &'a GameplaySettings,
}

impl<'a> OperationContext<'a> {
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn creature(&self, id: CreatureId) -> Option<&Creature> {
        self.world.find_creature(id)
    }

    /// Queue a notification for delivery in the current cycle
    pub fn notify(&self, notification: Notification) -> EventHandle {
        self.scheduler.immediate_event(notification)
    }
}
