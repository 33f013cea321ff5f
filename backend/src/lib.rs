//! Tick Engine Core - Rust Engine
//!
//! Time-ordered event scheduling and reactive event rules for a
//! multiplayer game world.
//!
//! # Architecture
//!
//! - **core**: Simulated game clock
//! - **scheduler**: Lock-guarded event queue and the single-consumer cycle
//! - **operations**: Game-state-mutating operations and their factory
//! - **rules**: Event rules, partition keys and the expedition mechanism
//! - **handlers**: Player requests → scheduled operations
//! - **notifications**: Client notifications as schedulable events
//! - **world**: World collaborator traits and in-memory services
//! - **models**: Domain types (Creature, Item, Tile, WorldState)
//! - **orchestrator**: Configuration and the tick loop
//!
//! # Critical Invariants
//!
//! 1. Events run one at a time on the consumer; world state is never
//!    mutated concurrently
//! 2. Every event runs at most once; cancelled events never run
//! 3. Equal due times run in insertion order
//! 4. All pending work of one interaction shares one partition key

pub mod context;
pub mod core;
pub mod handlers;
pub mod models;
pub mod notifications;
pub mod operations;
pub mod orchestrator;
pub mod rules;
pub mod scheduler;
pub mod world;

// Re-exports for convenience
pub use context::OperationContext;
pub use crate::core::time::GameClock;
pub use handlers::{HandlerOutcome, PlayerRequest, RequestHandler};
pub use models::{Creature, CreatureId, Location, WorldState};
pub use notifications::{Notification, NotificationPayload};
pub use operations::{
    Operation, OperationCreationArguments, OperationError, OperationFactory, OperationKind,
};
pub use orchestrator::{
    ConfigError, EngineError, GameplaySettings, Orchestrator, OrchestratorConfig, TickResult,
};
pub use rules::{
    EventRule, EventRulesApi, PartitionKey, RuleDefinition, RuleError, RuleFunctionTable,
};
pub use scheduler::{
    CycleReport, EventHandle, EventState, ExecutionError, ScheduledEvent, Scheduler,
};
