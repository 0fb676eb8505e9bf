//! ASCII presentation of a running session.

use std::fmt::Write as _;

use fogline_core::{AgentState, CellCoord, MoveCost, TrapKind};
use fogline_system_pathfinding::{find_path, path_cost};
use fogline_world::query;

use crate::session::{Outcome, Session};

const FOG: char = ' ';
const PICKUP: char = '*';

/// Draws the map as the player currently sees it.
///
/// Hidden cells stay blank. Agents are drawn wherever they stand so the
/// headless output remains useful for debugging.
pub(crate) fn frame(session: &Session) -> String {
    let world = session.world();
    let grid = query::grid_view(world);
    let fog = session.fog();
    let (columns, rows) = grid.dimensions();
    let player = query::player_cell(world);
    let exit = query::exit(world);
    let agents = query::agent_view(world);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "frame {} | resources {} | revealed {}/{} | scan layer {}/{}",
        session.frame(),
        query::resources(world),
        fog.revealed_count(),
        grid.cell_count(),
        fog.current_layer(),
        fog.layer_count(),
    );

    for row in 0..rows {
        for column in 0..columns {
            let cell = CellCoord::new(column, row);
            let glyph = if let Some(agent) = agents.iter().find(|agent| agent.cell == cell) {
                agent_glyph(agent.state)
            } else if player == Some(cell) {
                '@'
            } else if !fog.is_revealed(cell) {
                FOG
            } else if exit == Some(cell) {
                'E'
            } else if let Some(kind) = query::trap_at(world, cell) {
                trap_glyph(kind)
            } else if query::pickup_at(world, cell) {
                PICKUP
            } else {
                let terrain = grid.cell_at(cell);
                terrain_glyph(terrain.map(|terrain| (terrain.walkable, terrain.move_cost)))
            };
            out.push(glyph);
        }
        out.push('\n');
    }

    for agent in session.agents().iter() {
        let _ = writeln!(
            out,
            "agent {} {} at ({}, {}) path {}",
            agent.id().get(),
            agent.state().label(),
            agent.cell().column(),
            agent.cell().row(),
            agent.path().len(),
        );
    }
    out
}

/// One-paragraph report of how the run went.
pub(crate) fn summary(session: &Session) -> String {
    let world = session.world();
    let tally = session.tally();
    let mut out = String::new();

    let verdict = match session.outcome() {
        Some(Outcome::Escaped) => String::from("escaped"),
        Some(Outcome::Caught(agent)) => format!("caught by agent {}", agent.get()),
        None => String::from("still sneaking"),
    };
    let _ = writeln!(
        out,
        "{verdict} after {} frames ({:.2}s)",
        session.frame(),
        session.elapsed().as_secs_f64()
    );
    let _ = writeln!(
        out,
        "player steps {} | agent steps {} | hunts {} | scans {}",
        tally.player_steps, tally.agent_steps, tally.hunts, tally.scans
    );
    let _ = writeln!(
        out,
        "traps placed {} | traps sprung {} | data nodes {} | resources left {}",
        tally.traps_placed,
        tally.traps_triggered,
        tally.pickups,
        query::resources(world)
    );
    if let Some(reason) = session.builder().last_rejection() {
        let _ = writeln!(out, "last build rejected: {reason:?}");
    }

    if let (Some(player), Some(exit)) = (session.player(), query::exit(world)) {
        let grid = query::grid_view(world);
        let path = find_path(grid, player, exit);
        match path_cost(grid, player, &path) {
            _ if player == exit => {}
            Some(cost) if !path.is_empty() => {
                let _ = writeln!(out, "exit {} cells away, cost {cost}", path.len());
            }
            _ => {
                let _ = writeln!(out, "exit unreachable");
            }
        }
    }

    out
}

fn agent_glyph(state: AgentState) -> char {
    match state {
        AgentState::Idle => 'i',
        AgentState::Patrol => 'p',
        AgentState::Hunting => 'H',
    }
}

fn trap_glyph(kind: TrapKind) -> char {
    match kind {
        TrapKind::Bind => 'b',
        TrapKind::Gravity => 'g',
    }
}

fn terrain_glyph(terrain: Option<(bool, MoveCost)>) -> char {
    match terrain {
        Some((false, _)) | None => '#',
        Some((true, cost)) if cost == MoveCost::UNIT => '.',
        Some((true, cost)) => char::from_digit(cost.get().min(9), 10).unwrap_or('+'),
    }
}
