//! Orchestrator start-up, configuration and ticking

use serde_json::json;
use std::io::Write;
use std::time::Duration;
use tick_engine_core_rs::handlers::{HandlerOutcome, PlayerRequest};
use tick_engine_core_rs::models::{
    ConnectionId, CreatureId, Direction, ItemTypeId, Location, WorldState,
};
use tick_engine_core_rs::operations::{
    MonsterSpawn, OperationCreationArguments, PlayerMetadata, SpawnMonstersArguments,
};
use tick_engine_core_rs::orchestrator::config::MAX_INTERACTION_RADIUS;
use tick_engine_core_rs::orchestrator::{ConfigError, EngineError, Orchestrator, OrchestratorConfig};
use tick_engine_core_rs::rules::{PartitionKey, RuleError};
use tick_engine_core_rs::world::CreatureManager;

fn world() -> WorldState {
    let mut world = WorldState::new();
    world.fill_area(Location::new(0, 0, 7), 10, 10, ItemTypeId(102));
    world
}

fn lever_rule() -> serde_json::Value {
    json!({
        "type": "use",
        "conditions": [{"name": "IsType", "arguments": [{"subject": "primary"}, {"number": 1945}]}],
        "actions": [{"name": "Change", "arguments": [{"subject": "primary"}, {"number": 1946}]}]
    })
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_gameplay_fields_sit_at_the_top_level() {
    let config = OrchestratorConfig::from_json_str(
        &json!({
            "max_path_length": 32,
            "interaction_radius": 2,
            "throttled_kinds": ["use_item"],
            "world_light": {"level": 100, "color": 0},
            "rules": [lever_rule()]
        })
        .to_string(),
    )
    .unwrap();

    assert_eq!(config.gameplay.max_path_length, 32);
    assert_eq!(config.gameplay.interaction_radius, 2);
    assert_eq!(config.gameplay.throttled_kinds.len(), 1);
    assert_eq!(config.gameplay.world_light.level, 100);
    assert_eq!(config.rules.len(), 1);
}

#[test]
fn test_radius_above_the_limit_is_rejected() {
    let json = json!({ "interaction_radius": MAX_INTERACTION_RADIUS + 1 }).to_string();
    let result = OrchestratorConfig::from_json_str(&json);
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_malformed_json_is_a_parse_error() {
    let result = OrchestratorConfig::from_json_str("{ not json");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_bad_rule_reports_its_index() {
    let json = json!({
        "rules": [
            lever_rule(),
            {"type": "use", "actions": [{"name": "Explode", "arguments": []}]}
        ]
    })
    .to_string();

    match OrchestratorConfig::from_json_str(&json) {
        Err(ConfigError::InvalidRule { index, source }) => {
            assert_eq!(index, 1);
            assert_eq!(source, RuleError::UnknownFunction("Explode".to_string()));
        }
        other => panic!("expected an invalid rule, got {other:?}"),
    }
}

#[test]
fn test_config_loads_from_file() {
    let path = std::env::temp_dir().join(format!("tick-engine-config-{}.json", std::process::id()));
    {
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{}", json!({ "max_path_length": 12 })).unwrap();
    }

    let config = OrchestratorConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.gameplay.max_path_length, 12);
}

#[test]
fn test_missing_file_is_an_io_error() {
    let result = OrchestratorConfig::from_file("/nonexistent/tick-engine.json");
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

// ============================================================================
// Orchestrator
// ============================================================================

#[test]
fn test_world_rules_are_armed_at_start() {
    let json = json!({ "rules": [lever_rule(), lever_rule()] }).to_string();
    let config = OrchestratorConfig::from_json_str(&json).unwrap();
    let orchestrator = Orchestrator::new(config, world()).unwrap();

    assert_eq!(orchestrator.rules().count_for(&PartitionKey::world()), 2);
    assert_eq!(orchestrator.current_tick(), 0);
    assert_eq!(orchestrator.now(), Duration::ZERO);
}

#[test]
fn test_invalid_config_is_refused_by_the_engine() {
    let mut config = OrchestratorConfig::default();
    config.gameplay.max_path_length = 0;

    let result = Orchestrator::new(config, world());
    assert!(matches!(result, Err(EngineError::Config(ConfigError::Invalid(_)))));
}

#[test]
fn test_tick_reports_what_ran() {
    let mut orchestrator = Orchestrator::new(OrchestratorConfig::default(), world()).unwrap();

    let outcome = orchestrator
        .handle(PlayerRequest::Login {
            connection: ConnectionId(1),
            player: PlayerMetadata {
                id: CreatureId(1),
                name: "Ana".to_string(),
                location: Location::new(3, 3, 7),
                speed: None,
            },
        })
        .unwrap();
    assert!(matches!(outcome, HandlerOutcome::Scheduled(_)));

    let first = orchestrator.tick(Duration::from_millis(50));
    assert_eq!(first.tick, 1);
    assert_eq!(first.now, Duration::from_millis(50));
    // The login plus its four notifications
    assert_eq!(first.executed, 5);
    assert_eq!(first.faulted, 0);
    assert_eq!(first.pending, 0);
    assert_eq!(orchestrator.world().num_creatures(), 1);

    orchestrator
        .handle(PlayerRequest::Walk {
            requestor_id: CreatureId(1),
            directions: vec![Direction::East, Direction::East],
        })
        .unwrap();
    let second = orchestrator.tick(Duration::from_millis(50));
    assert_eq!(second.tick, 2);
    assert_eq!(second.pending, 1);
    assert_eq!(
        orchestrator.world().find_creature(CreatureId(1)).map(|creature| creature.location()),
        Some(Location::new(4, 3, 7))
    );
}

#[test]
fn test_submit_rejects_invalid_arguments() {
    let orchestrator = Orchestrator::new(OrchestratorConfig::default(), world()).unwrap();

    let result = orchestrator.submit(
        OperationCreationArguments::SpawnMonsters(SpawnMonstersArguments { spawns: vec![] }),
        Duration::ZERO,
    );
    assert!(matches!(result, Err(EngineError::Operation(_))));
}

#[test]
fn test_submitted_spawn_runs_after_its_delay() {
    let mut orchestrator = Orchestrator::new(OrchestratorConfig::default(), world()).unwrap();
    orchestrator
        .submit(
            OperationCreationArguments::SpawnMonsters(SpawnMonstersArguments {
                spawns: vec![MonsterSpawn {
                    name: "rat".to_string(),
                    location: Location::new(5, 5, 7),
                    speed: None,
                }],
            }),
            Duration::from_secs(1),
        )
        .unwrap();

    orchestrator.tick(Duration::from_millis(999));
    assert_eq!(orchestrator.world().num_creatures(), 0);

    orchestrator.tick(Duration::from_millis(1));
    assert_eq!(orchestrator.world().num_creatures(), 1);
}

#[test]
fn test_outbox_collects_deliveries() {
    let mut orchestrator = Orchestrator::new(OrchestratorConfig::default(), world()).unwrap();
    orchestrator
        .handle(PlayerRequest::Login {
            connection: ConnectionId(8),
            player: PlayerMetadata {
                id: CreatureId(8),
                name: "Bo".to_string(),
                location: Location::new(1, 1, 7),
                speed: Some(300),
            },
        })
        .unwrap();
    orchestrator.tick(Duration::ZERO);

    let delivered = orchestrator.outbox().drain();
    assert_eq!(delivered.len(), 4);
    assert!(delivered.iter().all(|(connection, _)| *connection == ConnectionId(8)));
    assert!(orchestrator.outbox().is_empty());
    assert_eq!(
        orchestrator.world().find_creature(CreatureId(8)).map(|creature| creature.speed()),
        Some(300)
    );
}
