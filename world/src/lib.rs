#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Fogline.

mod grid;

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use fogline_core::{
    AgentId, AgentSnapshot, AgentState, BuildError, CellCoord, Command, Direction, Event, Path,
    TrapKind, PICKUP_VALUE, TRAP_COOLDOWN, WALL_BUILD_COST, WELCOME_BANNER,
};
use tracing::{debug, info, warn};

pub use grid::{Grid, GridError};

const DEFAULT_GRID_COLUMNS: u32 = 12;
const DEFAULT_GRID_ROWS: u32 = 12;

/// Time the player needs to walk one cell of a route.
pub const PLAYER_STEP_DURATION: Duration = Duration::from_millis(120);

#[derive(Debug, Default)]
struct Player {
    cell: Option<CellCoord>,
    route: Path,
    accumulator: Duration,
    resources: u32,
}

#[derive(Debug)]
struct AgentRecord {
    id: AgentId,
    cell: CellCoord,
    state: AgentState,
}

#[derive(Clone, Copy, Debug)]
struct Trap {
    kind: TrapKind,
    cooldown: Duration,
}

/// Represents the authoritative Fogline world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    grid: Grid,
    player: Player,
    exit: Option<CellCoord>,
    agents: Vec<AgentRecord>,
    traps: BTreeMap<CellCoord, Trap>,
    pickups: BTreeSet<CellCoord>,
    next_agent_id: u32,
    tick_index: u64,
}

impl World {
    /// Creates a new Fogline world with an open default grid.
    #[must_use]
    pub fn new() -> Self {
        Self {
            banner: WELCOME_BANNER,
            grid: Grid::open(DEFAULT_GRID_COLUMNS, DEFAULT_GRID_ROWS),
            player: Player::default(),
            exit: None,
            agents: Vec::new(),
            traps: BTreeMap::new(),
            pickups: BTreeSet::new(),
            next_agent_id: 0,
            tick_index: 0,
        }
    }

    fn agent_mut(&mut self, agent: AgentId) -> Option<&mut AgentRecord> {
        self.agents.iter_mut().find(|record| record.id == agent)
    }

    fn reset_level(&mut self, grid: Grid) {
        self.grid = grid;
        self.player = Player::default();
        self.exit = None;
        self.agents.clear();
        self.traps.clear();
        self.pickups.clear();
    }

    fn move_player(&mut self, to: CellCoord, out_events: &mut Vec<Event>) {
        let Some(from) = self.player.cell else {
            return;
        };
        self.player.cell = Some(to);
        out_events.push(Event::PlayerMoved { from, to });
        self.report_player_cell(to, out_events);
    }

    fn report_player_cell(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        if self.pickups.remove(&cell) {
            self.player.resources = self.player.resources.saturating_add(PICKUP_VALUE);
            info!(
                column = cell.column(),
                row = cell.row(),
                balance = self.player.resources,
                "data node collected"
            );
            out_events.push(Event::PickupCollected {
                cell,
                amount: PICKUP_VALUE,
            });
            out_events.push(Event::ResourcesChanged {
                balance: self.player.resources,
            });
        }

        if self.exit == Some(cell) {
            info!(column = cell.column(), row = cell.row(), "player reached exit");
            out_events.push(Event::ExitReached { cell });
        }

        for record in self.agents.iter().filter(|record| record.cell == cell) {
            info!(agent = record.id.get(), "player caught");
            out_events.push(Event::PlayerCaught {
                agent: record.id,
                cell,
            });
        }
    }

    fn advance_route(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let Some(current) = self.player.cell else {
            return;
        };
        if self.player.route.is_empty() {
            self.player.accumulator = Duration::ZERO;
            return;
        }

        self.player.accumulator = self.player.accumulator.saturating_add(dt);
        if self.player.accumulator < PLAYER_STEP_DURATION {
            return;
        }
        self.player.accumulator -= PLAYER_STEP_DURATION;

        let Some(next) = self.player.route.peek() else {
            return;
        };
        if current.direction_to(next).is_none() || !self.grid.is_walkable(next) {
            debug!(
                column = next.column(),
                row = next.row(),
                "player route blocked, dropping it"
            );
            self.player.route.clear();
            self.player.accumulator = Duration::ZERO;
            return;
        }

        let _ = self.player.route.advance();
        self.move_player(next, out_events);
    }

    fn validate_build(&self, cell: CellCoord, cost: u32) -> Result<(), BuildError> {
        let Some(terrain) = self.grid.cell_at(cell) else {
            return Err(BuildError::OutOfBounds);
        };
        if !terrain.walkable {
            return Err(BuildError::Blocked);
        }
        if self.traps.contains_key(&cell) || self.pickups.contains(&cell) {
            return Err(BuildError::Occupied);
        }
        if self.player.resources < cost {
            return Err(BuildError::InsufficientResources);
        }
        Ok(())
    }

    fn spend(&mut self, cost: u32, out_events: &mut Vec<Event>) {
        self.player.resources = self.player.resources.saturating_sub(cost);
        out_events.push(Event::ResourcesChanged {
            balance: self.player.resources,
        });
    }

    fn emit_cell_changed(&self, cell: CellCoord, out_events: &mut Vec<Event>) {
        if let Some(terrain) = self.grid.cell_at(cell) {
            out_events.push(Event::CellChanged {
                cell,
                walkable: terrain.walkable,
                move_cost: terrain.move_cost,
            });
        }
    }

    fn step_agent(&mut self, agent: AgentId, to: CellCoord, out_events: &mut Vec<Event>) {
        let walkable = self.grid.is_walkable(to);
        let Some(record) = self.agent_mut(agent) else {
            warn!(agent = agent.get(), "step requested for unknown agent");
            return;
        };
        let from = record.cell;
        if from.direction_to(to).is_none() || !walkable {
            warn!(
                agent = agent.get(),
                column = to.column(),
                row = to.row(),
                "ignoring step onto a non-adjacent or blocked cell"
            );
            return;
        }

        record.cell = to;
        out_events.push(Event::AgentAdvanced { agent, from, to });

        if let Some(trap) = self.traps.get_mut(&to) {
            if trap.cooldown.is_zero() {
                trap.cooldown = TRAP_COOLDOWN;
                debug!(agent = agent.get(), kind = ?trap.kind, "trap triggered");
                out_events.push(Event::TrapTriggered {
                    agent,
                    cell: to,
                    kind: trap.kind,
                });
            }
        }

        if self.player.cell == Some(to) {
            info!(agent = agent.get(), "player caught");
            out_events.push(Event::PlayerCaught { agent, cell: to });
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureGrid { columns, rows } => {
            world.reset_level(Grid::open(columns, rows));
            info!(columns, rows, "grid configured");
            out_events.push(Event::GridConfigured { columns, rows });
        }
        Command::SetWalkable { cell, walkable } => {
            if world.grid.set_walkable(cell, walkable) {
                if !walkable {
                    let _ = world.traps.remove(&cell);
                    let _ = world.pickups.remove(&cell);
                }
                world.emit_cell_changed(cell, out_events);
            } else {
                warn!(column = cell.column(), row = cell.row(), "cell outside grid");
            }
        }
        Command::SetMoveCost { cell, cost } => {
            if world.grid.set_move_cost(cell, cost) {
                world.emit_cell_changed(cell, out_events);
            } else {
                warn!(column = cell.column(), row = cell.row(), "cell outside grid");
            }
        }
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });

            for trap in world.traps.values_mut() {
                trap.cooldown = trap.cooldown.saturating_sub(dt);
            }
            world.advance_route(dt, out_events);
        }
        Command::PlacePlayer { cell } => {
            if !world.grid.is_walkable(cell) {
                warn!(
                    column = cell.column(),
                    row = cell.row(),
                    "ignoring player placement on a blocked cell"
                );
                return;
            }
            world.player.cell = Some(cell);
            world.player.route.clear();
            world.player.accumulator = Duration::ZERO;
            out_events.push(Event::PlayerPlaced { cell });
            world.report_player_cell(cell, out_events);
        }
        Command::MovePlayer { direction } => {
            let Some(current) = world.player.cell else {
                warn!("ignoring move before the player is placed");
                return;
            };
            match neighbour_if_walkable(&world.grid, current, direction) {
                Some(next) => {
                    world.player.route.clear();
                    world.player.accumulator = Duration::ZERO;
                    world.move_player(next, out_events);
                }
                None => debug!(?direction, "player move blocked"),
            }
        }
        Command::RoutePlayer { path } => {
            world.player.route = path;
            world.player.accumulator = Duration::ZERO;
        }
        Command::SetExit { cell } => {
            if world.grid.cell_at(cell).is_some() {
                world.exit = Some(cell);
            } else {
                warn!(column = cell.column(), row = cell.row(), "exit outside grid");
            }
        }
        Command::GrantResources { amount } => {
            world.player.resources = world.player.resources.saturating_add(amount);
            out_events.push(Event::ResourcesChanged {
                balance: world.player.resources,
            });
        }
        Command::PlacePickup { cell } => {
            let taken = world.player.cell == Some(cell) || world.exit == Some(cell);
            if !world.grid.is_walkable(cell) || taken {
                warn!(
                    column = cell.column(),
                    row = cell.row(),
                    "ignoring data node on a blocked or taken cell"
                );
                return;
            }
            if world.pickups.insert(cell) {
                out_events.push(Event::PickupPlaced { cell });
            }
        }
        Command::SpawnAgent {
            cell,
            profile,
            waypoints,
        } => {
            if !world.grid.is_walkable(cell) {
                warn!(
                    column = cell.column(),
                    row = cell.row(),
                    "ignoring agent spawn on a blocked cell"
                );
                return;
            }
            let agent = AgentId::new(world.next_agent_id);
            world.next_agent_id = world.next_agent_id.saturating_add(1);
            world.agents.push(AgentRecord {
                id: agent,
                cell,
                state: AgentState::Idle,
            });
            debug!(
                agent = agent.get(),
                column = cell.column(),
                row = cell.row(),
                "agent spawned"
            );
            out_events.push(Event::AgentSpawned {
                agent,
                cell,
                profile,
                waypoints,
            });
            if world.player.cell == Some(cell) {
                out_events.push(Event::PlayerCaught { agent, cell });
            }
        }
        Command::SetAgentState { agent, state } => match world.agent_mut(agent) {
            Some(record) => {
                let from = record.state;
                if from != state {
                    record.state = state;
                    debug!(
                        agent = agent.get(),
                        from = from.label(),
                        to = state.label(),
                        "agent state changed"
                    );
                    out_events.push(Event::AgentStateChanged {
                        agent,
                        from,
                        to: state,
                    });
                }
            }
            None => warn!(agent = agent.get(), "state change for unknown agent"),
        },
        Command::StepAgent { agent, to } => world.step_agent(agent, to, out_events),
        Command::RemoveAgent { agent } => {
            let before = world.agents.len();
            world.agents.retain(|record| record.id != agent);
            if world.agents.len() != before {
                out_events.push(Event::AgentRemoved { agent });
            }
        }
        Command::BuildWall { cell } => match world.validate_build(cell, WALL_BUILD_COST) {
            Ok(()) => {
                let _ = world.grid.set_walkable(cell, false);
                world.spend(WALL_BUILD_COST, out_events);
                world.emit_cell_changed(cell, out_events);
                out_events.push(Event::WallBuilt { cell });
            }
            Err(reason) => {
                debug!(?reason, "wall rejected");
                out_events.push(Event::BuildRejected { cell, reason });
            }
        },
        Command::PlaceTrap { cell, kind } => match world.validate_build(cell, kind.build_cost()) {
            Ok(()) => {
                let _ = world.grid.set_move_cost(cell, kind.move_cost());
                let _ = world.traps.insert(
                    cell,
                    Trap {
                        kind,
                        cooldown: Duration::ZERO,
                    },
                );
                world.spend(kind.build_cost(), out_events);
                world.emit_cell_changed(cell, out_events);
                out_events.push(Event::TrapPlaced { cell, kind });
            }
            Err(reason) => {
                debug!(?reason, ?kind, "trap rejected");
                out_events.push(Event::BuildRejected { cell, reason });
            }
        },
        Command::RequestScan => match world.player.cell {
            Some(origin) => {
                info!(column = origin.column(), row = origin.row(), "scan requested");
                out_events.push(Event::ScanRequested { origin });
            }
            None => warn!("ignoring scan before the player is placed"),
        },
    }
}

fn neighbour_if_walkable(grid: &Grid, cell: CellCoord, direction: Direction) -> Option<CellCoord> {
    cell.step(direction).filter(|next| grid.is_walkable(*next))
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use fogline_core::{AgentView, CellCoord, GridView, Path, TrapKind};

    use super::{AgentSnapshot, Grid, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the terrain grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Borrowed grid view consumed by pathfinding and fog systems.
    #[must_use]
    pub fn grid_view(world: &World) -> GridView<'_> {
        world.grid.view()
    }

    /// Cell currently occupied by the player, if placed.
    #[must_use]
    pub fn player_cell(world: &World) -> Option<CellCoord> {
        world.player.cell
    }

    /// Route the player is following.
    #[must_use]
    pub fn player_route(world: &World) -> &Path {
        &world.player.route
    }

    /// Player's resource balance.
    #[must_use]
    pub fn resources(world: &World) -> u32 {
        world.player.resources
    }

    /// Level exit, if configured.
    #[must_use]
    pub fn exit(world: &World) -> Option<CellCoord> {
        world.exit
    }

    /// Captures a read-only view of the agents inhabiting the level.
    #[must_use]
    pub fn agent_view(world: &World) -> AgentView {
        AgentView::from_snapshots(
            world
                .agents
                .iter()
                .map(|record| AgentSnapshot {
                    id: record.id,
                    cell: record.cell,
                    state: record.state,
                })
                .collect(),
        )
    }

    /// Trap placed on the provided cell, if any.
    #[must_use]
    pub fn trap_at(world: &World, cell: CellCoord) -> Option<TrapKind> {
        world.traps.get(&cell).map(|trap| trap.kind)
    }

    /// Every placed trap in coordinate order.
    #[must_use]
    pub fn traps(world: &World) -> Vec<(CellCoord, TrapKind)> {
        world
            .traps
            .iter()
            .map(|(cell, trap)| (*cell, trap.kind))
            .collect()
    }

    /// Reports whether a data node lies on the provided cell.
    #[must_use]
    pub fn pickup_at(world: &World, cell: CellCoord) -> bool {
        world.pickups.contains(&cell)
    }

    /// Cells holding uncollected data nodes in coordinate order.
    #[must_use]
    pub fn pickups(world: &World) -> Vec<CellCoord> {
        world.pickups.iter().copied().collect()
    }

    /// Number of ticks processed since the world was created.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}

/// Convenience wrapper for applying a batch of commands in order.
pub fn apply_all(
    world: &mut World,
    commands: impl IntoIterator<Item = Command>,
    out_events: &mut Vec<Event>,
) {
    for command in commands {
        apply(world, command, out_events);
    }
}
