use std::time::Duration;

use fogline_core::{CellCoord, Command, Event};
use fogline_system_fog::{FogConfig, FogReveal};
use fogline_world::{self as world, query, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[test]
fn revealed_cells_never_hide_within_a_level() {
    let mut rng = ChaCha8Rng::seed_from_u64(0xf06_0001);
    let mut world = World::new();
    let mut fog = FogReveal::default();

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ConfigureGrid {
            columns: 14,
            rows: 14,
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::PlacePlayer {
            cell: CellCoord::new(7, 7),
        },
        &mut events,
    );
    fog.handle(&events, query::grid_view(&world));

    let mut previous: Vec<CellCoord> = Vec::new();
    for frame in 0..300 {
        let mut commands = vec![Command::Tick {
            dt: Duration::from_millis(rng.gen_range(10..200)),
        }];
        if rng.gen_bool(0.1) {
            commands.push(Command::RequestScan);
        }
        if rng.gen_bool(0.2) {
            commands.push(Command::SetWalkable {
                cell: CellCoord::new(rng.gen_range(0..14), rng.gen_range(0..14)),
                walkable: rng.gen_bool(0.5),
            });
        }
        if rng.gen_bool(0.3) {
            let cell = CellCoord::new(rng.gen_range(0..14), rng.gen_range(0..14));
            commands.push(Command::PlacePlayer { cell });
        }

        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut world, command, &mut events);
        }
        fog.handle(&events, query::grid_view(&world));

        for cell in &previous {
            assert!(
                fog.is_revealed(*cell),
                "frame {frame}: {cell:?} was hidden again"
            );
        }
        previous = query::grid_view(&world)
            .coords()
            .filter(|cell| fog.is_revealed(*cell))
            .collect();
        assert_eq!(previous.len(), fog.revealed_count());
    }

    assert!(fog.revealed_count() > 0, "no scan ever revealed a cell");
}

#[test]
fn scan_request_from_world_animates_reveal() {
    let mut world = World::new();
    let config = FogConfig::new(1, Duration::from_millis(150)).expect("valid config");
    let mut fog = FogReveal::new(config, 12, 12);

    let mut events = Vec::new();
    for command in [
        Command::ConfigureGrid {
            columns: 5,
            rows: 5,
        },
        Command::PlacePlayer {
            cell: CellCoord::new(2, 2),
        },
        Command::RequestScan,
    ] {
        world::apply(&mut world, command, &mut events);
    }
    fog.handle(&events, query::grid_view(&world));
    assert!(events.contains(&Event::ScanRequested {
        origin: CellCoord::new(2, 2)
    }));
    assert!(fog.is_animating());

    for _ in 0..2 {
        let mut tick_events = Vec::new();
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(150),
            },
            &mut tick_events,
        );
        fog.handle(&tick_events, query::grid_view(&world));
    }

    assert_eq!(fog.revealed_count(), 5);
    assert!(!fog.is_revealed(CellCoord::new(0, 0)));
}
