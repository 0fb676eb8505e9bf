//! Turns a [`LevelPlan`] into a validated, fully placed [`Level`].

use std::{collections::BTreeSet, time::Duration};

use fogline_core::{
    AgentProfile, CellCoord, Command, GridView, MoveCost, DEFAULT_SCAN_RADIUS, MAX_SCAN_RADIUS,
};
use fogline_system_pathfinding::scan_layers;
use fogline_world::Grid;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::{
    cave,
    plan::{AgentPlan, LevelError, LevelPlan, Terrain},
};

const MIN_SCATTERED_WALLS: u32 = 3;
const PATROL_REACH: i64 = 4;

/// Playable level with every cell placed and validated.
#[derive(Clone, Debug, PartialEq)]
pub struct Level {
    name: String,
    grid: Grid,
    player: CellCoord,
    exit: CellCoord,
    resources: u32,
    agents: Vec<LevelAgent>,
    pickups: Vec<CellCoord>,
    scan_radius: u32,
}

/// Agent placement resolved for a [`Level`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelAgent {
    /// Spawn cell.
    pub spawn: CellCoord,
    /// Detection range and pace.
    pub profile: AgentProfile,
    /// Patrol route, empty for stationary agents.
    pub waypoints: Vec<CellCoord>,
}

impl Level {
    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Terrain of the level.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Player spawn cell.
    #[must_use]
    pub const fn player(&self) -> CellCoord {
        self.player
    }

    /// Exit cell.
    #[must_use]
    pub const fn exit(&self) -> CellCoord {
        self.exit
    }

    /// Starting resource balance.
    #[must_use]
    pub const fn resources(&self) -> u32 {
        self.resources
    }

    /// Agents populating the level.
    #[must_use]
    pub fn agents(&self) -> &[LevelAgent] {
        &self.agents
    }

    /// Cells holding data nodes.
    #[must_use]
    pub fn pickups(&self) -> &[CellCoord] {
        &self.pickups
    }

    /// Fog scan radius.
    #[must_use]
    pub const fn scan_radius(&self) -> u32 {
        self.scan_radius
    }

    /// Commands that load the level into a world.
    #[must_use]
    pub fn commands(&self) -> Vec<Command> {
        let view = self.grid.view();
        let (columns, rows) = view.dimensions();
        let mut commands = vec![Command::ConfigureGrid { columns, rows }];

        for cell in view.coords() {
            let Some(terrain) = view.cell_at(cell) else {
                continue;
            };
            if !terrain.walkable {
                commands.push(Command::SetWalkable {
                    cell,
                    walkable: false,
                });
            } else if terrain.move_cost != MoveCost::UNIT {
                commands.push(Command::SetMoveCost {
                    cell,
                    cost: terrain.move_cost,
                });
            }
        }

        commands.push(Command::PlacePlayer { cell: self.player });
        commands.push(Command::SetExit { cell: self.exit });
        commands.extend(
            self.pickups
                .iter()
                .map(|cell| Command::PlacePickup { cell: *cell }),
        );
        if self.resources > 0 {
            commands.push(Command::GrantResources {
                amount: self.resources,
            });
        }
        for agent in &self.agents {
            commands.push(Command::SpawnAgent {
                cell: agent.spawn,
                profile: agent.profile,
                waypoints: agent.waypoints.clone(),
            });
        }
        commands
    }
}

impl LevelPlan {
    /// Generates the missing pieces of the plan and validates the result.
    ///
    /// The same plan and seed always yield the same level.
    pub fn resolve(&self) -> Result<Level, LevelError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let grid = self.build_grid(&mut rng)?;
        let view = grid.view();
        let size = view.dimensions().0.max(view.dimensions().1);

        let scan_radius = self.scan_radius.unwrap_or(DEFAULT_SCAN_RADIUS);
        let limit = u32::try_from(view.cell_count())
            .unwrap_or(u32::MAX)
            .min(MAX_SCAN_RADIUS);
        if scan_radius > limit {
            return Err(LevelError::ScanRadiusTooLarge {
                radius: scan_radius,
                limit,
            });
        }

        let player = match self.player {
            Some(cell) => require_walkable(view, cell, "player")?,
            None => nearest_top_left(view).ok_or(LevelError::NoRoom)?,
        };
        let region = reachable_from(view, player);

        let exit = match self.exit {
            Some(cell) => require_walkable(view, cell, "exit")?,
            None => pick_exit(&region, player, size, &mut rng).ok_or(LevelError::BlockedCell {
                role: "exit",
                cell: player,
            })?,
        };

        let mut spawn_candidates: Vec<CellCoord> = region
            .iter()
            .copied()
            .filter(|cell| *cell != exit && cell.manhattan_distance(player) > size / 3)
            .collect();
        spawn_candidates.shuffle(&mut rng);

        let reachable: BTreeSet<CellCoord> = region.iter().copied().collect();
        let mut agents = Vec::with_capacity(self.agents.len());
        for (index, plan) in self.agents.iter().enumerate() {
            let profile = resolve_profile(index, plan)?;
            let spawn = match plan.spawn {
                Some(cell) => require_walkable(view, cell, "agent spawn")?,
                None => spawn_candidates
                    .pop()
                    .or_else(|| fallback_spawn(&region, player, exit))
                    .ok_or(LevelError::BlockedCell {
                        role: "agent spawn",
                        cell: player,
                    })?,
            };
            let waypoints = match &plan.waypoints {
                Some(points) => points
                    .iter()
                    .map(|cell| require_walkable(view, *cell, "waypoint"))
                    .collect::<Result<Vec<_>, _>>()?,
                None => patrol_route(spawn, &reachable, &mut rng),
            };
            debug!(index, ?spawn, waypoints = waypoints.len(), "placed agent");
            agents.push(LevelAgent {
                spawn,
                profile,
                waypoints,
            });
        }

        let pickups = match &self.pickups {
            Some(cells) => cells
                .iter()
                .map(|cell| {
                    if *cell == player || *cell == exit {
                        return Err(LevelError::BlockedCell {
                            role: "pickup",
                            cell: *cell,
                        });
                    }
                    require_walkable(view, *cell, "pickup")
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => scatter_pickups(&region, player, exit, &agents, self.pickup_count, &mut rng),
        };

        let name = self
            .name
            .clone()
            .unwrap_or_else(|| String::from("Untitled"));
        info!(
            level = %name,
            columns = view.dimensions().0,
            rows = view.dimensions().1,
            agents = agents.len(),
            pickups = pickups.len(),
            seed = self.seed,
            "resolved level plan"
        );

        Ok(Level {
            name,
            grid,
            player,
            exit,
            resources: self.resources,
            agents,
            pickups,
            scan_radius,
        })
    }

    fn build_grid(&self, rng: &mut ChaCha8Rng) -> Result<Grid, LevelError> {
        if let Some(layout) = &self.layout {
            let rows: Vec<&str> = layout.iter().map(String::as_str).collect();
            return Ok(Grid::from_rows(&rows)?);
        }

        let (Some(columns), Some(rows)) = (self.columns, self.rows) else {
            return Err(LevelError::MissingDimensions);
        };
        if columns == 0 || rows == 0 {
            return Err(LevelError::MissingDimensions);
        }
        if self.terrain == Terrain::Cave {
            return Ok(cave::generate(columns, rows, rng));
        }

        let mut grid = Grid::open(columns, rows);
        let walls = self
            .walls
            .unwrap_or_else(|| MIN_SCATTERED_WALLS.max(columns.max(rows) / 4));
        if columns >= 3 && rows >= 3 {
            for _ in 0..walls {
                let cell =
                    CellCoord::new(rng.gen_range(1..columns - 1), rng.gen_range(1..rows - 1));
                let _ = grid.set_walkable(cell, false);
            }
        }
        Ok(grid)
    }
}

fn require_walkable(
    grid: GridView<'_>,
    cell: CellCoord,
    role: &'static str,
) -> Result<CellCoord, LevelError> {
    if grid.is_walkable(cell) {
        Ok(cell)
    } else {
        Err(LevelError::BlockedCell { role, cell })
    }
}

fn resolve_profile(index: usize, plan: &AgentPlan) -> Result<AgentProfile, LevelError> {
    let base = plan.archetype.map(|archetype| archetype.profile());
    let range = plan
        .detection_range
        .or_else(|| base.map(|profile| profile.detection_range()));
    let step = plan
        .step_millis
        .map(Duration::from_millis)
        .or_else(|| base.map(|profile| profile.step_duration()));

    match (range, step) {
        (Some(range), Some(step)) => Ok(AgentProfile::new(range, step)?),
        _ => Err(LevelError::MissingProfile { index }),
    }
}

fn nearest_top_left(grid: GridView<'_>) -> Option<CellCoord> {
    grid.coords()
        .filter(|cell| grid.is_walkable(*cell))
        .min_by_key(|cell| {
            let column = u64::from(cell.column());
            let row = u64::from(cell.row());
            column * column + row * row
        })
}

/// Walkable cells connected to `origin`, in scan order.
fn reachable_from(grid: GridView<'_>, origin: CellCoord) -> Vec<CellCoord> {
    let radius = u32::try_from(grid.cell_count()).unwrap_or(u32::MAX);
    scan_layers(grid, origin, radius)
        .iter()
        .flatten()
        .copied()
        .collect()
}

fn pick_exit(
    region: &[CellCoord],
    player: CellCoord,
    size: u32,
    rng: &mut ChaCha8Rng,
) -> Option<CellCoord> {
    let far: Vec<CellCoord> = region
        .iter()
        .copied()
        .filter(|cell| cell.manhattan_distance(player) > size / 2)
        .collect();
    if let Some(cell) = far.choose(rng) {
        return Some(*cell);
    }
    region
        .iter()
        .copied()
        .filter(|cell| *cell != player)
        .max_by_key(|cell| cell.manhattan_distance(player))
}

fn fallback_spawn(region: &[CellCoord], player: CellCoord, exit: CellCoord) -> Option<CellCoord> {
    region
        .iter()
        .copied()
        .filter(|cell| *cell != player && *cell != exit)
        .max_by_key(|cell| cell.manhattan_distance(player))
}

/// Picks up to `count` distinct reachable cells for data nodes, leaving the
/// player, the exit and every agent spawn free.
fn scatter_pickups(
    region: &[CellCoord],
    player: CellCoord,
    exit: CellCoord,
    agents: &[LevelAgent],
    count: u32,
    rng: &mut ChaCha8Rng,
) -> Vec<CellCoord> {
    let mut candidates: Vec<CellCoord> = region
        .iter()
        .copied()
        .filter(|cell| {
            *cell != player && *cell != exit && agents.iter().all(|agent| agent.spawn != *cell)
        })
        .collect();
    candidates.shuffle(rng);
    candidates.truncate(usize::try_from(count).unwrap_or(usize::MAX));
    candidates
}

fn patrol_route(
    home: CellCoord,
    reachable: &BTreeSet<CellCoord>,
    rng: &mut ChaCha8Rng,
) -> Vec<CellCoord> {
    let mut route = vec![home];
    let extra: usize = rng.gen_range(2..=3);
    for _ in 0..extra {
        let column = i64::from(home.column()) + rng.gen_range(-PATROL_REACH..=PATROL_REACH);
        let row = i64::from(home.row()) + rng.gen_range(-PATROL_REACH..=PATROL_REACH);
        let (Ok(column), Ok(row)) = (u32::try_from(column), u32::try_from(row)) else {
            continue;
        };
        let point = CellCoord::new(column, row);
        if reachable.contains(&point) && !route.contains(&point) {
            route.push(point);
        }
    }
    route
}
