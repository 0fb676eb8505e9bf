use fogline_core::{BuildError, CellCoord, Command, Event, TrapKind};
use fogline_system_builder::{Builder, BuilderInput};
use fogline_world::{self as world, query, World};

#[test]
fn wall_request_targets_player_cell() {
    let mut builder = Builder::default();
    let mut commands = Vec::new();

    builder.handle(
        &[],
        BuilderInput {
            build_wall: true,
            ..BuilderInput::default()
        },
        Some(CellCoord::new(3, 2)),
        &mut commands,
    );

    assert_eq!(
        commands,
        vec![Command::BuildWall {
            cell: CellCoord::new(3, 2),
        }],
        "builder should build where the player stands",
    );
}

#[test]
fn cursor_cell_overrides_player_cell() {
    let mut builder = Builder::new();
    let mut commands = Vec::new();

    builder.handle(
        &[],
        BuilderInput::new(false, Some(TrapKind::Gravity), Some(CellCoord::new(1, 1))),
        Some(CellCoord::new(4, 4)),
        &mut commands,
    );

    assert_eq!(
        commands,
        vec![Command::PlaceTrap {
            cell: CellCoord::new(1, 1),
            kind: TrapKind::Gravity,
        }],
    );
}

#[test]
fn nothing_emitted_without_a_target() {
    let mut builder = Builder::default();
    let mut commands = Vec::new();

    builder.handle(
        &[],
        BuilderInput::new(true, Some(TrapKind::Bind), None),
        None,
        &mut commands,
    );

    assert!(commands.is_empty(), "no player and no cursor, nothing to build");
}

#[test]
fn rejections_are_remembered_until_next_success() {
    let mut builder = Builder::default();
    let mut commands = Vec::new();
    let cell = CellCoord::new(0, 0);

    builder.handle(
        &[Event::BuildRejected {
            cell,
            reason: BuildError::InsufficientResources,
        }],
        BuilderInput::default(),
        None,
        &mut commands,
    );
    assert_eq!(
        builder.last_rejection(),
        Some(BuildError::InsufficientResources)
    );

    builder.handle(
        &[Event::WallBuilt { cell }],
        BuilderInput::default(),
        None,
        &mut commands,
    );
    assert_eq!(builder.last_rejection(), None);
}

#[test]
fn built_wall_blocks_cell_in_world() {
    let mut world = World::new();
    let mut builder = Builder::default();
    let mut events = Vec::new();
    let player = CellCoord::new(2, 2);

    for command in [
        Command::ConfigureGrid {
            columns: 5,
            rows: 5,
        },
        Command::PlacePlayer { cell: player },
        Command::GrantResources { amount: 5 },
    ] {
        world::apply(&mut world, command, &mut events);
    }

    let mut commands = Vec::new();
    builder.handle(
        &events,
        BuilderInput {
            build_wall: true,
            ..BuilderInput::default()
        },
        query::player_cell(&world),
        &mut commands,
    );
    events.clear();
    for command in commands {
        world::apply(&mut world, command, &mut events);
    }

    assert!(events.contains(&Event::WallBuilt { cell: player }));
    assert!(!query::grid(&world).is_walkable(player));
    assert_eq!(query::resources(&world), 0);
}
