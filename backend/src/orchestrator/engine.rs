//! Orchestrator Engine
//!
//! Owns the world and wires every collaborator of the tick engine:
//!
//! ```text
//! producers (any thread)            consumer (tick loop)
//! ──────────────────────            ────────────────────
//! scheduler().schedule_event  ──►   tick(elapsed)
//! scheduler().cancel_all_for           1. advance clock
//! rules().clear_all_for                2. run every due event
//!                                      3. report
//! ```
//!
//! Request handling ([`Orchestrator::handle`]) runs on the consumer side,
//! between ticks, because handlers read the world to decide between
//! scheduling directly and arming an expedition.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tick_engine_core_rs::handlers::PlayerRequest;
//! use tick_engine_core_rs::models::{ConnectionId, CreatureId, ItemTypeId, Location, WorldState};
//! use tick_engine_core_rs::operations::PlayerMetadata;
//! use tick_engine_core_rs::orchestrator::{Orchestrator, OrchestratorConfig};
//!
//! let mut world = WorldState::new();
//! world.fill_area(Location::new(0, 0, 7), 10, 10, ItemTypeId(102));
//!
//! let mut orchestrator = Orchestrator::new(OrchestratorConfig::default(), world).unwrap();
//! orchestrator
//!     .handle(PlayerRequest::Login {
//!         connection: ConnectionId(1),
//!         player: PlayerMetadata {
//!             id: CreatureId(1),
//!             name: "Ana".to_string(),
//!             location: Location::new(5, 5, 7),
//!             speed: None,
//!         },
//!     })
//!     .unwrap();
//!
//! let result = orchestrator.tick(Duration::from_millis(50));
//! assert_eq!(result.tick, 1);
//! assert!(result.executed >= 1);
//! assert!(!orchestrator.outbox().is_empty());
//! ```

use crate::context::OperationContext;
use crate::core::time::GameClock;
use crate::handlers::{HandlerOutcome, PlayerRequest, RequestHandler};
use crate::models::WorldState;
use crate::operations::{OperationCreationArguments, OperationError, OperationFactory};
use crate::orchestrator::config::{ConfigError, GameplaySettings, OrchestratorConfig};
use crate::rules::{EventRulesApi, PartitionKey, RuleError, RuleFunctionTable};
use crate::scheduler::{EventHandle, Scheduler};
use crate::world::pathfinding::GridPathfinder;
use crate::world::services::{RecordingOutbox, SequentialItemFactory};
use crate::world::World;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Results and errors
// ============================================================================

/// Result of a single tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickResult {
    /// Tick number, starting at 1
    pub tick: u64,

    /// Game time after the clock advanced
    pub now: Duration,

    /// Events that ran to completion
    pub executed: usize,

    /// Cancelled or already-run entries discarded from the queue
    pub skipped: usize,

    /// Events that returned an error or panicked
    pub faulted: usize,

    /// Events still waiting after this tick
    pub pending: usize,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Operation error: {0}")]
    Operation(#[from] OperationError),

    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),
}

// ============================================================================
// Orchestrator
// ============================================================================

/// The tick engine
///
/// Generic over the world so embedders can bring their own map storage;
/// [`WorldState`] is the in-memory default.
pub struct Orchestrator<W: World = WorldState> {
    /// Map, creatures and containers
    world: W,

    /// Shared simulated time
    clock: Arc<GameClock>,

    /// Time-ordered event queue
    scheduler: Arc<Scheduler>,

    /// Armed event rules
    rules: Arc<EventRulesApi>,

    /// Request → operation translation
    handler: RequestHandler,

    factory: OperationFactory,
    pathfinder: GridPathfinder,
    item_factory: SequentialItemFactory,
    outbox: Arc<RecordingOutbox>,
    settings: GameplaySettings,

    /// Number of ticks run so far
    tick_count: u64,
}

impl<W: World> Orchestrator<W> {
    /// Create an orchestrator over `world`
    ///
    /// Validates the configuration and arms its world rules under
    /// [`PartitionKey::world`].
    pub fn new(config: OrchestratorConfig, world: W) -> Result<Self, EngineError> {
        config.validate()?;

        let clock = Arc::new(GameClock::new());
        let scheduler = Arc::new(Scheduler::new(Arc::clone(&clock)));
        let rules = Arc::new(EventRulesApi::new());

        let table = RuleFunctionTable::builtin();
        for definition in &config.rules {
            rules.setup_rule(table.resolve(definition)?, PartitionKey::world());
        }
        tracing::info!(
            world_rules = config.rules.len(),
            interaction_radius = config.gameplay.interaction_radius,
            "orchestrator ready"
        );

        let factory = OperationFactory::new();
        Ok(Self {
            world,
            clock,
            scheduler,
            rules,
            handler: RequestHandler::new(factory),
            factory,
            pathfinder: GridPathfinder,
            item_factory: SequentialItemFactory::default(),
            outbox: Arc::new(RecordingOutbox::new()),
            settings: config.gameplay,
            tick_count: 0,
        })
    }

    pub fn current_tick(&self) -> u64 {
        self.tick_count
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn clock(&self) -> Arc<GameClock> {
        Arc::clone(&self.clock)
    }

    /// Scheduler handle for producer threads
    pub fn scheduler(&self) -> Arc<Scheduler> {
        Arc::clone(&self.scheduler)
    }

    /// Rule registry handle for producer threads
    pub fn rules(&self) -> Arc<EventRulesApi> {
        Arc::clone(&self.rules)
    }

    pub fn settings(&self) -> &GameplaySettings {
        &self.settings
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// Everything delivered to clients so far
    pub fn outbox(&self) -> &Arc<RecordingOutbox> {
        &self.outbox
    }

    /// Advance the clock by `elapsed` and run every event that became due
    pub fn tick(&mut self, elapsed: Duration) -> TickResult {
        self.clock.advance(elapsed);
        let scheduler = Arc::clone(&self.scheduler);
        let report = self.with_context(|context| scheduler.run_cycle(context));
        self.tick_count += 1;

        let result = TickResult {
            tick: self.tick_count,
            now: self.clock.now(),
            executed: report.executed,
            skipped: report.skipped,
            faulted: report.faulted,
            pending: self.scheduler.pending_count(),
        };
        tracing::debug!(
            tick = result.tick,
            executed = result.executed,
            skipped = result.skipped,
            faulted = result.faulted,
            pending = result.pending,
            "tick complete"
        );
        result
    }

    /// Run a player request through the handler layer
    pub fn handle(&mut self, request: PlayerRequest) -> Result<HandlerOutcome, EngineError> {
        let handler = self.handler;
        Ok(self.with_context(|context| handler.handle(request, context))?)
    }

    /// Schedule a system operation for the next cycle
    pub fn submit(
        &self,
        arguments: OperationCreationArguments,
        delay: Duration,
    ) -> Result<EventHandle, EngineError> {
        let operation = self.factory.create(arguments)?;
        Ok(self.scheduler.schedule_event(operation, delay))
    }

    fn with_context<R>(&mut self, run: impl FnOnce(&mut OperationContext<'_>) -> R) -> R {
        let mut context = OperationContext {
            world: &mut self.world,
            item_factory: &self.item_factory,
            pathfinder: &self.pathfinder,
            outbox: &*self.outbox,
            rules: &*self.rules,
            scheduler: &*self.scheduler,
            settings: &self.settings,
        };
        run(&mut context)
    }
}

impl<W: World> std::fmt::Debug for Orchestrator<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("tick_count", &self.tick_count)
            .field("now", &self.clock.now())
            .field("pending_events", &self.scheduler.pending_count())
            .field("armed_rules", &self.rules.len())
            .finish()
    }
}
