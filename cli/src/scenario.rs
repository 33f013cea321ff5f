//! Scenario files
//!
//! A scenario describes a rectangular map, the items on it, the engine
//! configuration and a list of player requests keyed by the tick before
//! which they are handled.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tick_engine_core_rs::handlers::PlayerRequest;
use tick_engine_core_rs::models::{Item, ItemId, ItemTypeId, Location, WorldState};
use tick_engine_core_rs::orchestrator::OrchestratorConfig;

#[derive(Debug, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: OrchestratorConfig,
    pub map: MapArea,
    #[serde(default)]
    pub items: Vec<ItemPlacement>,
    #[serde(default)]
    pub requests: Vec<TimedRequest>,
}

#[derive(Debug, Deserialize)]
pub struct MapArea {
    pub origin: Location,
    pub width: i32,
    pub height: i32,
    pub ground: ItemTypeId,
}

#[derive(Debug, Deserialize)]
pub struct ItemPlacement {
    pub id: ItemId,
    pub type_id: ItemTypeId,
    pub location: Location,
    #[serde(default)]
    pub amount: Option<u8>,
    /// Slot count when the item is a container
    #[serde(default)]
    pub container: Option<u8>,
    #[serde(default)]
    pub blocking: bool,
}

#[derive(Debug, Deserialize)]
pub struct TimedRequest {
    pub at_tick: u64,
    pub request: PlayerRequest,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        let scenario: Scenario = serde_json::from_str(&contents)
            .with_context(|| format!("parsing scenario {}", path.display()))?;
        scenario.config.validate()?;
        Ok(scenario)
    }

    /// Build the world the scenario starts from
    pub fn build_world(&self) -> Result<WorldState> {
        let mut world = WorldState::new();
        world.fill_area(self.map.origin, self.map.width, self.map.height, self.map.ground);

        for placement in &self.items {
            let mut item = Item::new(placement.id, placement.type_id);
            if let Some(amount) = placement.amount {
                item = item.with_amount(amount);
            }
            if let Some(capacity) = placement.container {
                item = item.container(capacity);
            }
            if placement.blocking {
                item = item.blocking();
            }
            world
                .place_item(placement.location, item)
                .with_context(|| format!("placing {}", placement.id))?;
        }
        Ok(world)
    }
}
