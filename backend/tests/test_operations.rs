//! Operation behaviour, driven through the scheduler

mod common;

use common::{loc, Harness, GROUND};
use std::time::Duration;
use tick_engine_core_rs::handlers::{HandlerOutcome, PlayerRequest};
use tick_engine_core_rs::models::{
    ConnectionId, Creature, CreatureId, Direction, Item, ItemId, ItemTypeId, ThingRef,
};
use tick_engine_core_rs::notifications::{
    NotificationPayload, SpeechType, CANNOT_USE_OBJECT, NOT_ENOUGH_ROOM, THERE_IS_NO_WAY,
    TOO_FAR_AWAY,
};
use tick_engine_core_rs::operations::login::LOGIN_REJECTED;
use tick_engine_core_rs::operations::{
    MonsterSpawn, OperationCreationArguments, OperationFactory, OperationKind, PlayerMetadata,
    SpawnMonstersArguments, UseItemArguments,
};
use tick_engine_core_rs::rules::{EventRule, PartitionKey};
use tick_engine_core_rs::scheduler::EventHandle;
use tick_engine_core_rs::world::{CreatureManager, TileAccessor};

const CHEST: ItemTypeId = ItemTypeId(1987);
const COINS: ItemTypeId = ItemTypeId(3031);
const STONE: ItemTypeId = ItemTypeId(1285);

fn submit(harness: &Harness, arguments: OperationCreationArguments) -> EventHandle {
    let operation = OperationFactory::new().create(arguments).unwrap();
    harness.scheduler.immediate_event(operation)
}

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

// ============================================================================
// Walking
// ============================================================================

#[test]
fn test_walk_steps_at_creature_speed() {
    let mut harness = Harness::new();
    harness.add_player(1, loc(5, 5));

    harness
        .handle(PlayerRequest::Walk {
            requestor_id: CreatureId(1),
            directions: vec![Direction::East, Direction::East],
        })
        .unwrap();

    harness.run(Duration::ZERO);
    assert_eq!(harness.location_of(1), Some(loc(6, 5)));

    // Default speed 220 gives 454 ms per straight step
    harness.run(ms(453));
    assert_eq!(harness.location_of(1), Some(loc(6, 5)));

    harness.run(ms(1));
    assert_eq!(harness.location_of(1), Some(loc(7, 5)));
    assert_eq!(harness.scheduler.pending_count(), 0);
}

#[test]
fn test_diagonal_step_takes_twice_as_long() {
    let mut harness = Harness::new();
    harness.add_player(1, loc(5, 5));

    harness
        .handle(PlayerRequest::Walk {
            requestor_id: CreatureId(1),
            directions: vec![Direction::SouthEast, Direction::South],
        })
        .unwrap();

    harness.run(Duration::ZERO);
    assert_eq!(harness.location_of(1), Some(loc(6, 6)));

    harness.run(ms(907));
    assert_eq!(harness.location_of(1), Some(loc(6, 6)));

    harness.run(ms(1));
    assert_eq!(harness.location_of(1), Some(loc(6, 7)));
}

#[test]
fn test_blocked_walk_stops_and_tells_the_walker() {
    let mut harness = Harness::new();
    let connection = harness.add_player(1, loc(5, 5));
    harness
        .world
        .place_item(loc(6, 5), Item::new(ItemId(10), STONE).blocking())
        .unwrap();

    harness
        .handle(PlayerRequest::Walk {
            requestor_id: CreatureId(1),
            directions: vec![Direction::East, Direction::East],
        })
        .unwrap();
    harness.run_for(ms(2000), ms(100));

    assert_eq!(harness.location_of(1), Some(loc(5, 5)));
    assert_eq!(harness.texts_to(connection), vec![THERE_IS_NO_WAY.to_string()]);
    assert!(harness
        .outbox
        .delivered_to(connection)
        .contains(&NotificationPayload::WalkCancelled {
            direction: Direction::East
        }));
}

#[test]
fn test_new_walk_replaces_the_old_one() {
    let mut harness = Harness::new();
    harness.add_player(1, loc(5, 5));

    harness
        .handle(PlayerRequest::Walk {
            requestor_id: CreatureId(1),
            directions: vec![Direction::East; 4],
        })
        .unwrap();
    harness.run(Duration::ZERO);
    assert_eq!(harness.location_of(1), Some(loc(6, 5)));

    harness
        .handle(PlayerRequest::Walk {
            requestor_id: CreatureId(1),
            directions: vec![Direction::South],
        })
        .unwrap();
    harness.run_for(ms(3000), ms(100));

    assert_eq!(harness.location_of(1), Some(loc(6, 6)));
}

#[test]
fn test_stop_walking_cancels_the_remaining_steps() {
    let mut harness = Harness::new();
    let connection = harness.add_player(1, loc(5, 5));

    harness
        .handle(PlayerRequest::Walk {
            requestor_id: CreatureId(1),
            directions: vec![Direction::East; 4],
        })
        .unwrap();
    harness.run(Duration::ZERO);

    let outcome = harness
        .handle(PlayerRequest::StopWalking {
            requestor_id: CreatureId(1),
        })
        .unwrap();
    assert!(matches!(outcome, HandlerOutcome::Stopped { cancelled: 1 }));

    harness.run_for(ms(3000), ms(100));
    assert_eq!(harness.location_of(1), Some(loc(6, 5)));
    assert!(harness
        .outbox
        .delivered_to(connection)
        .contains(&NotificationPayload::WalkCancelled {
            direction: Direction::East
        }));
}

// ============================================================================
// Turning, speaking, looking
// ============================================================================

#[test]
fn test_turn_notifies_only_on_change() {
    let mut harness = Harness::new();
    let connection = harness.add_player(1, loc(5, 5));

    for _ in 0..2 {
        harness
            .handle(PlayerRequest::Turn {
                requestor_id: CreatureId(1),
                direction: Direction::West,
            })
            .unwrap();
        harness.run(Duration::ZERO);
    }

    let turned: Vec<_> = harness
        .outbox
        .delivered_to(connection)
        .into_iter()
        .filter(|payload| matches!(payload, NotificationPayload::CreatureTurned { .. }))
        .collect();
    assert_eq!(
        turned,
        vec![NotificationPayload::CreatureTurned {
            creature: CreatureId(1),
            direction: Direction::West,
        }]
    );
    assert_eq!(
        harness.world.find_creature(CreatureId(1)).unwrap().direction(),
        Direction::West
    );
}

fn spoken(harness: &Harness, connection: ConnectionId) -> Vec<String> {
    harness
        .outbox
        .delivered_to(connection)
        .into_iter()
        .filter_map(|payload| match payload {
            NotificationPayload::CreatureSpoke { text, .. } => Some(text),
            _ => None,
        })
        .collect()
}

#[test]
fn test_yell_is_upper_cased_for_everyone_in_view() {
    let mut harness = Harness::new();
    harness.add_player(1, loc(5, 5));
    let listener = harness.add_player(2, loc(9, 8));

    harness
        .handle(PlayerRequest::Speak {
            requestor_id: CreatureId(1),
            speech_type: SpeechType::Yell,
            text: "Hello there".to_string(),
        })
        .unwrap();
    harness.run(Duration::ZERO);

    assert_eq!(spoken(&harness, listener), vec!["HELLO THERE".to_string()]);
}

#[test]
fn test_whisper_only_reaches_adjacent_players() {
    let mut harness = Harness::new();
    let speaker = harness.add_player(1, loc(5, 5));
    let neighbour = harness.add_player(2, loc(6, 6));
    let bystander = harness.add_player(3, loc(8, 5));

    harness
        .handle(PlayerRequest::Speak {
            requestor_id: CreatureId(1),
            speech_type: SpeechType::Whisper,
            text: "psst".to_string(),
        })
        .unwrap();
    harness.run(Duration::ZERO);

    assert_eq!(spoken(&harness, speaker), vec!["psst".to_string()]);
    assert_eq!(spoken(&harness, neighbour), vec!["psst".to_string()]);
    assert!(spoken(&harness, bystander).is_empty());
}

#[test]
fn test_look_descriptions() {
    let mut harness = Harness::new();
    let connection = harness.add_player(1, loc(5, 5));
    harness.add_player(2, loc(7, 7));
    harness
        .world
        .place_item(loc(6, 5), Item::new(ItemId(20), COINS).with_amount(3))
        .unwrap();

    let looks = [
        (loc(6, 5), None),
        (loc(5, 6), None),
        (loc(7, 7), Some(ThingRef::Creature(CreatureId(2)))),
        (loc(50, 50), None),
    ];
    for (location, thing) in looks {
        harness
            .handle(PlayerRequest::LookAt {
                requestor_id: CreatureId(1),
                location,
                thing,
            })
            .unwrap();
    }
    harness.run(Duration::ZERO);

    assert_eq!(
        harness.texts_to(connection),
        vec![
            "You see 3 items of type 3031.".to_string(),
            format!("You see the ground ({}).", GROUND.0),
            "You see player2.".to_string(),
            "You see nothing.".to_string(),
        ]
    );
}

// ============================================================================
// Login and logout
// ============================================================================

fn login_request(id: u32, connection: u64, x: i32, y: i32) -> PlayerRequest {
    PlayerRequest::Login {
        connection: ConnectionId(connection),
        player: PlayerMetadata {
            id: CreatureId(id),
            name: "Newcomer".to_string(),
            location: loc(x, y),
            speed: None,
        },
    }
}

#[test]
fn test_login_sends_initial_state_in_order() {
    let mut harness = Harness::new();
    let watcher = harness.add_player(1, loc(5, 5));

    harness.handle(login_request(9, 42, 6, 6)).unwrap();
    harness.run(Duration::ZERO);

    let delivered = harness.outbox.delivered_to(ConnectionId(42));
    assert!(matches!(
        delivered.as_slice(),
        [
            NotificationPayload::LoginSuccess { creature: CreatureId(9) },
            NotificationPayload::MapDescription { .. },
            NotificationPayload::WorldLight { .. },
            NotificationPayload::CreatureAppeared { .. },
        ]
    ));
    assert!(harness
        .outbox
        .delivered_to(watcher)
        .contains(&NotificationPayload::CreatureAppeared {
            creature: CreatureId(9),
            name: "Newcomer".to_string(),
            location: loc(6, 6),
        }));
    assert_eq!(harness.location_of(9), Some(loc(6, 6)));
}

#[test]
fn test_login_on_occupied_tile_is_rejected_with_a_message() {
    let mut harness = Harness::new();
    harness.add_player(1, loc(5, 5));

    harness.handle(login_request(9, 42, 5, 5)).unwrap();
    let report = harness.run(Duration::ZERO);

    assert_eq!(report.faulted, 0);
    assert_eq!(harness.location_of(9), None);
    assert_eq!(harness.texts_to(ConnectionId(42)), vec![LOGIN_REJECTED.to_string()]);
}

#[test]
fn test_logout_drops_pending_work() {
    let mut harness = Harness::new();
    let watcher = harness.add_player(2, loc(9, 9));
    harness.add_player(1, loc(5, 5));

    harness
        .handle(PlayerRequest::Walk {
            requestor_id: CreatureId(1),
            directions: vec![Direction::East; 4],
        })
        .unwrap();
    harness.run(Duration::ZERO);

    let pending_use = EventHandle::new(
        OperationFactory::new()
            .create(OperationCreationArguments::UseItem(UseItemArguments {
                requestor_id: CreatureId(1),
                item: ItemId(1),
                location: loc(12, 12),
            }))
            .unwrap(),
    );
    let partition = PartitionKey::for_operation(CreatureId(1), OperationKind::UseItem);
    harness
        .rules
        .setup_rule(EventRule::expedite(pending_use, loc(11, 11)), partition);

    harness
        .handle(PlayerRequest::Logout {
            requestor_id: CreatureId(1),
        })
        .unwrap();
    harness.run(Duration::ZERO);

    assert_eq!(harness.location_of(1), None);
    assert_eq!(harness.rules.count_for(&partition), 0);
    assert_eq!(harness.scheduler.pending_count(), 0);

    let report = harness.run_for(ms(3000), ms(100));
    assert_eq!(report.executed, 0);
    assert!(harness
        .outbox
        .delivered_to(watcher)
        .contains(&NotificationPayload::CreatureRemoved {
            creature: CreatureId(1),
            location: loc(6, 5),
        }));
}

// ============================================================================
// Using items
// ============================================================================

#[test]
fn test_using_a_container_opens_it() {
    let mut harness = Harness::new();
    let connection = harness.add_player(1, loc(5, 5));
    harness
        .world
        .place_item(loc(6, 5), Item::new(ItemId(30), CHEST).container(8))
        .unwrap();

    let outcome = harness
        .handle(PlayerRequest::UseItem {
            requestor_id: CreatureId(1),
            item: ItemId(30),
            location: loc(6, 5),
        })
        .unwrap();
    assert!(matches!(outcome, HandlerOutcome::Scheduled(_)));
    harness.run(Duration::ZERO);

    assert!(harness.outbox.delivered_to(connection).iter().any(|payload| matches!(
        payload,
        NotificationPayload::ContainerOpened {
            item: ItemId(30),
            type_id: CHEST,
            ..
        }
    )));
}

#[test]
fn test_using_a_plain_item_without_rules_is_refused() {
    let mut harness = Harness::new();
    let connection = harness.add_player(1, loc(5, 5));
    harness
        .world
        .place_item(loc(5, 6), Item::new(ItemId(31), STONE))
        .unwrap();

    harness
        .handle(PlayerRequest::UseItem {
            requestor_id: CreatureId(1),
            item: ItemId(31),
            location: loc(5, 6),
        })
        .unwrap();
    harness.run(Duration::ZERO);

    assert_eq!(harness.texts_to(connection), vec![CANNOT_USE_OBJECT.to_string()]);
}

#[test]
fn test_use_out_of_reach_is_refused_at_execution() {
    let mut harness = Harness::new();
    let connection = harness.add_player(1, loc(5, 5));
    harness
        .world
        .place_item(loc(10, 10), Item::new(ItemId(32), STONE))
        .unwrap();

    submit(
        &harness,
        OperationCreationArguments::UseItem(UseItemArguments {
            requestor_id: CreatureId(1),
            item: ItemId(32),
            location: loc(10, 10),
        }),
    );
    harness.run(Duration::ZERO);

    assert_eq!(harness.texts_to(connection), vec![TOO_FAR_AWAY.to_string()]);
}

#[test]
fn test_use_exhaustion_delays_the_next_use() {
    let mut harness = Harness::new();
    let connection = harness.add_player(1, loc(5, 5));
    harness
        .world
        .place_item(loc(5, 6), Item::new(ItemId(33), STONE))
        .unwrap();
    let use_stone = || PlayerRequest::UseItem {
        requestor_id: CreatureId(1),
        item: ItemId(33),
        location: loc(5, 6),
    };

    harness.handle(use_stone()).unwrap();
    harness.run(Duration::ZERO);
    assert_eq!(harness.texts_to(connection).len(), 1);

    let remaining = harness
        .world
        .find_creature(CreatureId(1))
        .unwrap()
        .remaining_exhaustion(OperationKind::UseItem, harness.clock.now());
    assert_eq!(remaining, ms(1000));

    harness.handle(use_stone()).unwrap();
    harness.run(ms(999));
    assert_eq!(harness.texts_to(connection).len(), 1);

    harness.run(ms(1));
    assert_eq!(harness.texts_to(connection).len(), 2);
}

// ============================================================================
// Moving things
// ============================================================================

#[test]
fn test_moving_part_of_a_stack_splits_it() {
    let mut harness = Harness::new();
    harness.add_player(1, loc(5, 5));
    harness
        .world
        .place_item(loc(5, 6), Item::new(ItemId(40), COINS).with_amount(10))
        .unwrap();

    harness
        .handle(PlayerRequest::MoveThing {
            requestor_id: CreatureId(1),
            thing: ThingRef::Item(ItemId(40)),
            from: loc(5, 6),
            to: loc(6, 6),
            amount: Some(4),
        })
        .unwrap();
    harness.run(Duration::ZERO);

    let source = harness.world.tile(loc(5, 6)).unwrap();
    assert_eq!(source.find_item(ItemId(40)).unwrap().amount, 6);

    let destination = harness.world.tile(loc(6, 6)).unwrap();
    let split = destination.top_item().unwrap();
    assert_ne!(split.id, ItemId(40));
    assert_eq!(split.type_id, COINS);
    assert_eq!(split.amount, 4);
}

#[test]
fn test_moving_a_whole_item_keeps_its_identity() {
    let mut harness = Harness::new();
    let connection = harness.add_player(1, loc(5, 5));
    harness
        .world
        .place_item(loc(5, 6), Item::new(ItemId(41), STONE))
        .unwrap();

    harness
        .handle(PlayerRequest::MoveThing {
            requestor_id: CreatureId(1),
            thing: ThingRef::Item(ItemId(41)),
            from: loc(5, 6),
            to: loc(8, 8),
            amount: None,
        })
        .unwrap();
    harness.run(Duration::ZERO);

    assert!(harness.world.tile(loc(5, 6)).unwrap().items().is_empty());
    assert!(harness.world.tile(loc(8, 8)).unwrap().find_item(ItemId(41)).is_some());
    assert!(harness
        .outbox
        .delivered_to(connection)
        .contains(&NotificationPayload::TileUpdated {
            location: loc(8, 8),
            items: vec![STONE],
        }));
}

#[test]
fn test_pushing_a_creature_onto_an_occupied_tile_fails_politely() {
    let mut harness = Harness::new();
    let connection = harness.add_player(1, loc(5, 5));
    harness
        .world
        .add_creature(Creature::monster(CreatureId(70), "rat", loc(5, 6)))
        .unwrap();
    harness
        .world
        .add_creature(Creature::monster(CreatureId(71), "rat", loc(5, 7)))
        .unwrap();

    harness
        .handle(PlayerRequest::MoveThing {
            requestor_id: CreatureId(1),
            thing: ThingRef::Creature(CreatureId(70)),
            from: loc(5, 6),
            to: loc(5, 7),
            amount: None,
        })
        .unwrap();
    let report = harness.run(Duration::ZERO);

    assert_eq!(report.faulted, 0);
    assert_eq!(harness.location_of(70), Some(loc(5, 6)));
    assert_eq!(harness.texts_to(connection), vec![NOT_ENOUGH_ROOM.to_string()]);
}

#[test]
fn test_pushing_a_creature_moves_it() {
    let mut harness = Harness::new();
    harness.add_player(1, loc(5, 5));
    harness
        .world
        .add_creature(Creature::monster(CreatureId(70), "rat", loc(5, 6)))
        .unwrap();

    harness
        .handle(PlayerRequest::MoveThing {
            requestor_id: CreatureId(1),
            thing: ThingRef::Creature(CreatureId(70)),
            from: loc(5, 6),
            to: loc(6, 7),
            amount: None,
        })
        .unwrap();
    harness.run(Duration::ZERO);

    assert_eq!(harness.location_of(70), Some(loc(6, 7)));
}

// ============================================================================
// System operations
// ============================================================================

#[test]
fn test_spawn_skips_blocked_locations() {
    let mut harness = Harness::new();
    let watcher = harness.add_player(1, loc(5, 5));
    harness
        .world
        .place_item(loc(7, 7), Item::new(ItemId(50), STONE).blocking())
        .unwrap();

    submit(
        &harness,
        OperationCreationArguments::SpawnMonsters(SpawnMonstersArguments {
            spawns: vec![
                MonsterSpawn {
                    name: "rat".to_string(),
                    location: loc(6, 6),
                    speed: Some(80),
                },
                MonsterSpawn {
                    name: "troll".to_string(),
                    location: loc(7, 7),
                    speed: None,
                },
            ],
        }),
    );
    let report = harness.run(Duration::ZERO);

    assert_eq!(report.faulted, 0);
    assert_eq!(harness.world.num_creatures(), 2);
    let rat = harness
        .world
        .creatures()
        .find(|creature| creature.name() == "rat")
        .unwrap();
    assert_eq!(rat.location(), loc(6, 6));
    assert_eq!(rat.speed(), 80);

    let appeared = harness
        .outbox
        .delivered_to(watcher)
        .into_iter()
        .filter(|payload| matches!(payload, NotificationPayload::CreatureAppeared { .. }))
        .count();
    assert_eq!(appeared, 1);
}

#[test]
fn test_operation_of_a_missing_requestor_faults_in_isolation() {
    let mut harness = Harness::new();
    harness.add_player(1, loc(5, 5));

    harness
        .handle(PlayerRequest::Turn {
            requestor_id: CreatureId(77),
            direction: Direction::North,
        })
        .unwrap();
    harness
        .handle(PlayerRequest::Turn {
            requestor_id: CreatureId(1),
            direction: Direction::North,
        })
        .unwrap();
    let report = harness.run(Duration::ZERO);

    assert_eq!(report.faulted, 1);
    assert_eq!(
        harness.world.find_creature(CreatureId(1)).unwrap().direction(),
        Direction::North
    );
}
