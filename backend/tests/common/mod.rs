//! Shared fixtures for the integration tests

#![allow(dead_code)]

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tick_engine_core_rs::context::OperationContext;
use tick_engine_core_rs::handlers::{HandlerOutcome, PlayerRequest, RequestHandler};
use tick_engine_core_rs::models::{
    ConnectionId, Creature, CreatureId, ItemTypeId, Location, WorldState,
};
use tick_engine_core_rs::notifications::NotificationPayload;
use tick_engine_core_rs::operations::{OperationError, OperationKind};
use tick_engine_core_rs::orchestrator::GameplaySettings;
use tick_engine_core_rs::rules::EventRulesApi;
use tick_engine_core_rs::scheduler::{CycleReport, EventKind, ExecutionError, ScheduledEvent};
use tick_engine_core_rs::world::pathfinding::GridPathfinder;
use tick_engine_core_rs::world::services::{RecordingOutbox, SequentialItemFactory};
use tick_engine_core_rs::world::CreatureManager;
use tick_engine_core_rs::{GameClock, Scheduler};

pub const GROUND: ItemTypeId = ItemTypeId(102);
pub const FLOOR: u8 = 7;

pub fn loc(x: i32, y: i32) -> Location {
    Location::new(x, y, FLOOR)
}

/// Everything an operation context borrows, owned in one place
pub struct Harness {
    pub world: WorldState,
    pub clock: Arc<GameClock>,
    pub scheduler: Scheduler,
    pub rules: EventRulesApi,
    pub outbox: RecordingOutbox,
    pub item_factory: SequentialItemFactory,
    pub pathfinder: GridPathfinder,
    pub settings: GameplaySettings,
    pub handler: RequestHandler,
}

impl Harness {
    /// A 20x20 open floor at (0, 0)
    pub fn new() -> Self {
        let mut world = WorldState::new();
        world.fill_area(loc(0, 0), 20, 20, GROUND);
        Self::with_world(world)
    }

    pub fn with_world(world: WorldState) -> Self {
        let clock = Arc::new(GameClock::new());
        Self {
            world,
            scheduler: Scheduler::new(Arc::clone(&clock)),
            clock,
            rules: EventRulesApi::new(),
            outbox: RecordingOutbox::new(),
            item_factory: SequentialItemFactory::default(),
            pathfinder: GridPathfinder,
            settings: GameplaySettings::default(),
            handler: RequestHandler::default(),
        }
    }

    /// Advance the clock and run one scheduler cycle
    pub fn run(&mut self, elapsed: Duration) -> CycleReport {
        self.clock.advance(elapsed);
        let mut context = OperationContext {
            world: &mut self.world,
            item_factory: &self.item_factory,
            pathfinder: &self.pathfinder,
            outbox: &self.outbox,
            rules: &self.rules,
            scheduler: &self.scheduler,
            settings: &self.settings,
        };
        self.scheduler.run_cycle(&mut context)
    }

    /// Run cycles of `step` until `total` has elapsed
    pub fn run_for(&mut self, total: Duration, step: Duration) -> CycleReport {
        let mut report = self.run(Duration::ZERO);
        let mut elapsed = Duration::ZERO;
        while elapsed < total {
            let cycle = self.run(step);
            report.executed += cycle.executed;
            report.skipped += cycle.skipped;
            report.faulted += cycle.faulted;
            elapsed += step;
        }
        report
    }

    pub fn handle(&mut self, request: PlayerRequest) -> Result<HandlerOutcome, OperationError> {
        let handler = self.handler;
        let mut context = OperationContext {
            world: &mut self.world,
            item_factory: &self.item_factory,
            pathfinder: &self.pathfinder,
            outbox: &self.outbox,
            rules: &self.rules,
            scheduler: &self.scheduler,
            settings: &self.settings,
        };
        handler.handle(request, &mut context)
    }

    /// Put a player straight into the world; its connection id equals its
    /// creature id
    pub fn add_player(&mut self, id: u32, location: Location) -> ConnectionId {
        let connection = ConnectionId(u64::from(id));
        self.world
            .add_creature(Creature::player(
                CreatureId(id),
                format!("player{id}"),
                location,
                connection,
            ))
            .expect("player placement");
        connection
    }

    pub fn location_of(&self, id: u32) -> Option<Location> {
        self.world.find_creature(CreatureId(id)).map(|creature| creature.location())
    }

    /// Texts delivered to a connection, in order
    pub fn texts_to(&self, connection: ConnectionId) -> Vec<String> {
        self.outbox
            .delivered_to(connection)
            .into_iter()
            .filter_map(|payload| match payload {
                NotificationPayload::TextMessage { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }
}

/// How a [`TracedEvent`] behaves when executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracedBehaviour {
    Succeed,
    Fail,
    Panic,
}

/// Test event that records its label when executed
#[derive(Debug)]
pub struct TracedEvent {
    pub label: String,
    pub requestor: CreatureId,
    pub kind: EventKind,
    pub behaviour: TracedBehaviour,
    pub log: Arc<Mutex<Vec<String>>>,
}

impl TracedEvent {
    pub fn new(label: impl Into<String>, log: &Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            label: label.into(),
            requestor: CreatureId::NONE,
            kind: EventKind::Notification,
            behaviour: TracedBehaviour::Succeed,
            log: Arc::clone(log),
        }
    }

    pub fn operation(mut self, requestor: u32, kind: OperationKind) -> Self {
        self.requestor = CreatureId(requestor);
        self.kind = EventKind::Operation(kind);
        self
    }

    pub fn behaving(mut self, behaviour: TracedBehaviour) -> Self {
        self.behaviour = behaviour;
        self
    }
}

impl ScheduledEvent for TracedEvent {
    fn kind(&self) -> EventKind {
        self.kind
    }

    fn requestor_id(&self) -> CreatureId {
        self.requestor
    }

    fn execute(&self, _context: &mut OperationContext<'_>) -> Result<(), ExecutionError> {
        self.log.lock().push(self.label.clone());
        match self.behaviour {
            TracedBehaviour::Succeed => Ok(()),
            TracedBehaviour::Fail => Err(ExecutionError::RequestorNotFound(self.requestor)),
            TracedBehaviour::Panic => panic!("event {} panicked", self.label),
        }
    }
}

pub fn new_log() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}
