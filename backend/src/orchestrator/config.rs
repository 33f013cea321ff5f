//! Orchestrator configuration
//!
//! Loaded from JSON. Every field has a default, so `{}` is a valid
//! configuration.

use crate::models::WorldLight;
use crate::operations::OperationKind;
use crate::rules::{RuleDefinition, RuleError, RuleFunctionTable};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_MAX_PATH_LENGTH: usize = 64;
pub const DEFAULT_INTERACTION_RADIUS: u32 = 1;

/// Largest radius that still keeps the target on the requestor's screen
pub const MAX_INTERACTION_RADIUS: u32 = 6;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid world rule #{index}: {source}")]
    InvalidRule { index: usize, source: RuleError },
}

/// Gameplay knobs shared with every operation context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplaySettings {
    /// Longest route the pathfinder searches, in steps
    pub max_path_length: usize,

    /// Chebyshev distance at which a creature can act on a target
    pub interaction_radius: u32,

    /// Kinds whose requests wait out the requestor's exhaustion
    pub throttled_kinds: Vec<OperationKind>,

    /// Light sent to players when they log in
    pub world_light: WorldLight,
}

impl Default for GameplaySettings {
    fn default() -> Self {
        Self {
            max_path_length: DEFAULT_MAX_PATH_LENGTH,
            interaction_radius: DEFAULT_INTERACTION_RADIUS,
            throttled_kinds: vec![OperationKind::UseItem, OperationKind::UseItemOn],
            world_light: WorldLight::default(),
        }
    }
}

/// Complete orchestrator configuration
///
/// # Example
///
/// ```
/// use tick_engine_core_rs::orchestrator::OrchestratorConfig;
///
/// let config = OrchestratorConfig::from_json_str(r#"{"interaction_radius": 2}"#).unwrap();
/// assert_eq!(config.gameplay.interaction_radius, 2);
/// assert_eq!(config.gameplay.max_path_length, 64);
/// assert!(config.rules.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(flatten)]
    pub gameplay: GameplaySettings,

    /// World rules armed at start-up
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

impl OrchestratorConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: OrchestratorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Check value ranges and that every world rule resolves
    pub fn validate(&self) -> Result<(), ConfigError> {
        let gameplay = &self.gameplay;
        if gameplay.max_path_length == 0 {
            return Err(ConfigError::Invalid("max_path_length must be positive".to_string()));
        }
        if gameplay.interaction_radius > MAX_INTERACTION_RADIUS {
            return Err(ConfigError::Invalid(format!(
                "interaction_radius {} exceeds {}",
                gameplay.interaction_radius, MAX_INTERACTION_RADIUS
            )));
        }

        let table = RuleFunctionTable::builtin();
        for (index, definition) in self.rules.iter().enumerate() {
            table
                .resolve(definition)
                .map_err(|source| ConfigError::InvalidRule { index, source })?;
        }
        Ok(())
    }
}
