//! Orchestrator: configuration and the tick loop
//!
//! See `engine.rs` for the tick loop and `config.rs` for the JSON
//! configuration it is built from.

pub mod config;
pub mod engine;

pub use config::{ConfigError, GameplaySettings, OrchestratorConfig};
pub use engine::{EngineError, Orchestrator, TickResult};
