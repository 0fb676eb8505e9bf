#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Fogline engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! views such as [`GridView`], and respond exclusively with new command
//! batches.

use std::{num::NonZeroU32, time::Duration};

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Fogline.";

/// Scan radius used when no explicit radius is configured.
pub const DEFAULT_SCAN_RADIUS: u32 = 5;

/// Time each fog layer stays pending before it is revealed.
pub const DEFAULT_LAYER_DURATION: Duration = Duration::from_millis(150);

/// Resources deducted when the player raises a wall.
pub const WALL_BUILD_COST: u32 = 5;

/// Minimum time between two activations of the same trap.
pub const TRAP_COOLDOWN: Duration = Duration::from_secs(1);

/// Resources credited when the player collects a data node.
pub const PICKUP_VALUE: u32 = 10;

/// Largest scan radius a fog configuration accepts.
pub const MAX_SCAN_RADIUS: u32 = 1024;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the grid with an open grid of the provided dimensions.
    ///
    /// This is the level transition: agents, traps, the exit and the player
    /// route are discarded.
    ConfigureGrid {
        /// Number of cell columns in the new grid.
        columns: u32,
        /// Number of cell rows in the new grid.
        rows: u32,
    },
    /// Marks a cell as walkable or blocked.
    SetWalkable {
        /// Cell whose walkability changes.
        cell: CellCoord,
        /// Whether agents may enter the cell.
        walkable: bool,
    },
    /// Replaces the movement cost of a cell.
    SetMoveCost {
        /// Cell whose cost changes.
        cell: CellCoord,
        /// Cost paid when entering the cell.
        cost: MoveCost,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Places the player on the provided cell without walking there.
    PlacePlayer {
        /// Cell the player occupies afterwards.
        cell: CellCoord,
    },
    /// Steps the player one cell in the provided direction.
    MovePlayer {
        /// Direction of the requested step.
        direction: Direction,
    },
    /// Assigns a route the player follows one cell at a time.
    RoutePlayer {
        /// Route produced by the pathfinder for a clicked target.
        path: Path,
    },
    /// Marks the level exit.
    SetExit {
        /// Cell the player must reach to complete the level.
        cell: CellCoord,
    },
    /// Adds resources to the player's balance.
    GrantResources {
        /// Amount credited to the balance.
        amount: u32,
    },
    /// Drops a collectable data node on a walkable cell.
    PlacePickup {
        /// Cell holding the node.
        cell: CellCoord,
    },
    /// Requests that a new agent joins the level.
    SpawnAgent {
        /// Cell the agent occupies when it spawns.
        cell: CellCoord,
        /// Detection and pacing parameters of the agent.
        profile: AgentProfile,
        /// Patrol route the agent cycles through when not hunting.
        waypoints: Vec<CellCoord>,
    },
    /// Records a behaviour state change decided by an agent controller.
    SetAgentState {
        /// Identifier of the agent.
        agent: AgentId,
        /// State the agent entered.
        state: AgentState,
    },
    /// Requests that an agent moves onto an adjacent cell.
    StepAgent {
        /// Identifier of the moving agent.
        agent: AgentId,
        /// Adjacent cell the agent enters.
        to: CellCoord,
    },
    /// Removes an agent from the level.
    RemoveAgent {
        /// Identifier of the agent to remove.
        agent: AgentId,
    },
    /// Requests that a wall is raised on the provided cell.
    BuildWall {
        /// Cell that becomes blocked.
        cell: CellCoord,
    },
    /// Requests that a trap is placed on the provided cell.
    PlaceTrap {
        /// Cell receiving the trap.
        cell: CellCoord,
        /// Type of trap to place.
        kind: TrapKind,
    },
    /// Requests a fog scan centred on the player.
    RequestScan,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Announces that a fresh grid replaced the previous level.
    GridConfigured {
        /// Number of cell columns in the grid.
        columns: u32,
        /// Number of cell rows in the grid.
        rows: u32,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Reports that the terrain of a cell changed.
    CellChanged {
        /// Cell that changed.
        cell: CellCoord,
        /// Walkability after the change.
        walkable: bool,
        /// Movement cost after the change.
        move_cost: MoveCost,
    },
    /// Confirms that the player was placed on a cell.
    PlayerPlaced {
        /// Cell the player occupies.
        cell: CellCoord,
    },
    /// Confirms that the player moved between two cells.
    PlayerMoved {
        /// Cell the player occupied before moving.
        from: CellCoord,
        /// Cell the player occupies after moving.
        to: CellCoord,
    },
    /// Reports that the player stands on the exit.
    ExitReached {
        /// Exit cell.
        cell: CellCoord,
    },
    /// Reports the player's resource balance after a change.
    ResourcesChanged {
        /// Balance after the change.
        balance: u32,
    },
    /// Confirms that a data node was dropped on a cell.
    PickupPlaced {
        /// Cell holding the node.
        cell: CellCoord,
    },
    /// Reports that the player walked onto a data node and took it.
    PickupCollected {
        /// Cell the node was taken from.
        cell: CellCoord,
        /// Resources credited for the node.
        amount: u32,
    },
    /// Confirms that an agent joined the level.
    AgentSpawned {
        /// Identifier assigned by the world.
        agent: AgentId,
        /// Cell the agent occupies.
        cell: CellCoord,
        /// Detection and pacing parameters of the agent.
        profile: AgentProfile,
        /// Patrol route of the agent.
        waypoints: Vec<CellCoord>,
    },
    /// Confirms that an agent changed behaviour state.
    AgentStateChanged {
        /// Identifier of the agent.
        agent: AgentId,
        /// State before the change.
        from: AgentState,
        /// State after the change.
        to: AgentState,
    },
    /// Confirms that an agent moved between two cells.
    AgentAdvanced {
        /// Identifier of the agent.
        agent: AgentId,
        /// Cell the agent occupied before moving.
        from: CellCoord,
        /// Cell the agent occupies after moving.
        to: CellCoord,
    },
    /// Confirms that an agent left the level.
    AgentRemoved {
        /// Identifier of the removed agent.
        agent: AgentId,
    },
    /// Reports that an agent shares a cell with the player.
    PlayerCaught {
        /// Identifier of the agent that caught the player.
        agent: AgentId,
        /// Cell where the capture happened.
        cell: CellCoord,
    },
    /// Confirms that a wall was raised.
    WallBuilt {
        /// Cell that became blocked.
        cell: CellCoord,
    },
    /// Confirms that a trap was placed.
    TrapPlaced {
        /// Cell holding the trap.
        cell: CellCoord,
        /// Type of trap placed.
        kind: TrapKind,
    },
    /// Reports that a build request was rejected.
    BuildRejected {
        /// Cell named in the request.
        cell: CellCoord,
        /// Specific reason the request failed.
        reason: BuildError,
    },
    /// Reports that an agent set off a trap.
    TrapTriggered {
        /// Identifier of the affected agent.
        agent: AgentId,
        /// Cell holding the trap.
        cell: CellCoord,
        /// Type of trap that fired.
        kind: TrapKind,
    },
    /// Announces that a fog scan should start from the provided cell.
    ScanRequested {
        /// Cell the scan expands from.
        origin: CellCoord,
    },
}

/// Cardinal movement directions available on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// All directions in the order neighbours are enumerated.
    pub const ALL: [Direction; 4] = [Self::North, Self::East, Self::South, Self::West];
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Cell adjacent in the provided direction.
    ///
    /// Returns `None` when the step would leave the non-negative quadrant.
    /// Upper bounds are the grid's concern.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<CellCoord> {
        match direction {
            Direction::North => self.row.checked_sub(1).map(|row| Self::new(self.column, row)),
            Direction::East => self
                .column
                .checked_add(1)
                .map(|column| Self::new(column, self.row)),
            Direction::South => self.row.checked_add(1).map(|row| Self::new(self.column, row)),
            Direction::West => self
                .column
                .checked_sub(1)
                .map(|column| Self::new(column, self.row)),
        }
    }

    /// Direction leading from `self` to an orthogonally adjacent cell.
    #[must_use]
    pub fn direction_to(self, to: CellCoord) -> Option<Direction> {
        let column_diff = self.column.abs_diff(to.column);
        let row_diff = self.row.abs_diff(to.row);
        if column_diff + row_diff != 1 {
            return None;
        }

        if column_diff == 1 {
            if to.column > self.column {
                Some(Direction::East)
            } else {
                Some(Direction::West)
            }
        } else if to.row > self.row {
            Some(Direction::South)
        } else {
            Some(Direction::North)
        }
    }
}

/// Positive cost paid when entering a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MoveCost(NonZeroU32);

impl MoveCost {
    /// Cost of plain floor.
    pub const UNIT: Self = Self(NonZeroU32::MIN);

    /// Creates a cost, rejecting zero.
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        match NonZeroU32::new(value) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Numeric cost.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0.get()
    }
}

impl Default for MoveCost {
    fn default() -> Self {
        Self::UNIT
    }
}

/// Terrain attributes of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Whether agents may enter the cell.
    pub walkable: bool,
    /// Cost paid when entering the cell.
    pub move_cost: MoveCost,
}

impl Cell {
    /// Walkable cell with unit cost.
    pub const FLOOR: Self = Self {
        walkable: true,
        move_cost: MoveCost::UNIT,
    };

    /// Blocked cell.
    pub const WALL: Self = Self {
        walkable: false,
        move_cost: MoveCost::UNIT,
    };

    /// Walkable cell with the provided cost.
    #[must_use]
    pub const fn floor_with_cost(move_cost: MoveCost) -> Self {
        Self {
            walkable: true,
            move_cost,
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::FLOOR
    }
}

/// Read-only view into the dense terrain grid.
///
/// Cells are stored in row-major order. Every in-bounds coordinate resolves
/// to exactly one [`Cell`]; out-of-bounds queries yield nothing instead of a
/// default cell.
#[derive(Clone, Copy, Debug)]
pub struct GridView<'a> {
    cells: &'a [Cell],
    columns: u32,
    rows: u32,
}

impl<'a> GridView<'a> {
    /// Captures a new grid view backed by the provided cell slice.
    ///
    /// The slice must hold `columns * rows` cells.
    #[must_use]
    pub fn new(cells: &'a [Cell], columns: u32, rows: u32) -> Self {
        debug_assert_eq!(
            cells.len() as u64,
            u64::from(columns) * u64::from(rows),
            "grid view requires one cell per coordinate"
        );
        Self {
            cells,
            columns,
            rows,
        }
    }

    /// Provides the dimensions of the underlying grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Number of cells covered by the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the coordinate lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Row-major offset of the provided cell, if it lies inside the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Coordinate stored at the provided row-major offset.
    #[must_use]
    pub fn coord(&self, index: usize) -> Option<CellCoord> {
        if index >= self.cells.len() || self.columns == 0 {
            return None;
        }
        let width = usize::try_from(self.columns).ok()?;
        let column = u32::try_from(index % width).ok()?;
        let row = u32::try_from(index / width).ok()?;
        Some(CellCoord::new(column, row))
    }

    /// Terrain of the provided cell, if it lies inside the grid.
    #[must_use]
    pub fn cell_at(&self, cell: CellCoord) -> Option<Cell> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Reports whether the cell exists and may be entered.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.cell_at(cell).is_some_and(|cell| cell.walkable)
    }

    /// Walkable, in-bounds orthogonal neighbours of the provided cell.
    ///
    /// Neighbours are yielded in north, east, south, west order. A cell
    /// outside the grid has no neighbours.
    #[must_use]
    pub fn neighbors(&self, cell: CellCoord) -> Neighbors {
        let mut neighbors = Neighbors::default();
        if !self.contains(cell) {
            return neighbors;
        }

        for direction in Direction::ALL {
            if let Some(candidate) = cell.step(direction) {
                if self.is_walkable(candidate) {
                    neighbors.push(candidate);
                }
            }
        }

        neighbors
    }

    /// Iterator over every coordinate in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = CellCoord> + 'a {
        let columns = self.columns;
        let rows = self.rows;
        (0..rows).flat_map(move |row| (0..columns).map(move |column| CellCoord::new(column, row)))
    }
}

/// Iterator over the walkable neighbours of a cell.
#[derive(Clone, Debug, Default)]
pub struct Neighbors {
    buffer: [Option<CellCoord>; 4],
    len: usize,
    cursor: usize,
}

impl Neighbors {
    fn push(&mut self, cell: CellCoord) {
        if self.len < self.buffer.len() {
            self.buffer[self.len] = Some(cell);
            self.len += 1;
        }
    }
}

impl Iterator for Neighbors {
    type Item = CellCoord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.len {
            return None;
        }

        let value = self.buffer[self.cursor];
        self.cursor += 1;
        value
    }
}

/// Ordered route from (exclusive) start to (inclusive) goal.
///
/// The cells are immutable once planned; a cursor tracks the next cell to
/// enter so stepping never reallocates. An exhausted path means "no plan" or
/// "arrived".
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path {
    cells: Vec<CellCoord>,
    next: usize,
}

impl Path {
    /// Creates a path over the provided cells.
    #[must_use]
    pub fn new(cells: Vec<CellCoord>) -> Self {
        Self { cells, next: 0 }
    }

    /// Path without any remaining cells.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            cells: Vec::new(),
            next: 0,
        }
    }

    /// Reports whether no cells remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.next >= self.cells.len()
    }

    /// Number of cells that remain to be entered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len().saturating_sub(self.next)
    }

    /// Next cell to enter, without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<CellCoord> {
        self.cells.get(self.next).copied()
    }

    /// Consumes and returns the next cell to enter.
    pub fn advance(&mut self) -> Option<CellCoord> {
        let cell = self.peek()?;
        self.next += 1;
        Some(cell)
    }

    /// Cells that remain to be entered.
    #[must_use]
    pub fn remaining(&self) -> &[CellCoord] {
        self.cells.get(self.next..).unwrap_or(&[])
    }

    /// Final cell of the path, if any cells remain.
    #[must_use]
    pub fn goal(&self) -> Option<CellCoord> {
        if self.is_empty() {
            return None;
        }
        self.cells.last().copied()
    }

    /// Drops every remaining cell.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.next = 0;
    }
}

/// Unique identifier assigned to an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Behaviour states of an agent controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentState {
    /// Standing still without a patrol route.
    #[default]
    Idle,
    /// Cycling through patrol waypoints.
    Patrol,
    /// Chasing the player.
    Hunting,
}

impl AgentState {
    /// Upper-case label shown by presentation layers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Patrol => "PATROL",
            Self::Hunting => "HUNTING",
        }
    }
}

/// Detection and pacing parameters of an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AgentProfile {
    detection_range: u32,
    step_duration: Duration,
}

impl AgentProfile {
    /// Creates a profile, rejecting a zero step duration.
    ///
    /// `detection_range` is compared strictly: the player is detected when the
    /// Manhattan distance is below it, so a range of zero never detects.
    pub fn new(detection_range: u32, step_duration: Duration) -> Result<Self, ProfileError> {
        if step_duration.is_zero() {
            return Err(ProfileError::ZeroStepDuration);
        }

        Ok(Self {
            detection_range,
            step_duration,
        })
    }

    /// Manhattan distance below which the player is detected.
    #[must_use]
    pub const fn detection_range(&self) -> u32 {
        self.detection_range
    }

    /// Simulated time the agent needs per step.
    #[must_use]
    pub const fn step_duration(&self) -> Duration {
        self.step_duration
    }
}

/// Reasons an [`AgentProfile`] cannot be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    /// Agents must need a positive amount of time per step.
    #[error("agent step duration must be positive")]
    ZeroStepDuration,
}

/// Predefined agent types with tuned profiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentArchetype {
    /// Balanced guard.
    SecurityAgent,
    /// Fast agent with a long detection range.
    Elf,
    /// Slow agent with a short detection range.
    AlphaBear,
}

impl AgentArchetype {
    /// Human-readable name of the archetype.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SecurityAgent => "Security Agent",
            Self::Elf => "Elf Archer",
            Self::AlphaBear => "Alpha Bear",
        }
    }

    /// Profile assigned to agents of this archetype.
    #[must_use]
    pub const fn profile(self) -> AgentProfile {
        let (detection_range, step_millis) = match self {
            Self::SecurityAgent => (8, 500),
            Self::Elf => (10, 350),
            Self::AlphaBear => (6, 450),
        };
        AgentProfile {
            detection_range,
            step_duration: Duration::from_millis(step_millis),
        }
    }
}

/// Types of traps that can be placed on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrapKind {
    /// Freezes an agent in place.
    Bind,
    /// Halves an agent's pace.
    Gravity,
}

impl TrapKind {
    /// Resources deducted when placing the trap.
    #[must_use]
    pub const fn build_cost(self) -> u32 {
        match self {
            Self::Bind => 15,
            Self::Gravity => 20,
        }
    }

    /// Movement cost of a cell holding the trap.
    #[must_use]
    pub const fn move_cost(self) -> MoveCost {
        match MoveCost::new(5) {
            Some(cost) => cost,
            None => MoveCost::UNIT,
        }
    }

    /// Effect applied to an agent that sets the trap off.
    #[must_use]
    pub const fn effect(self) -> StatusEffect {
        match self {
            Self::Bind => StatusEffect::Frozen {
                duration: Duration::from_secs(3),
            },
            Self::Gravity => StatusEffect::Slowed {
                duration: Duration::from_secs(5),
                pace_percent: 50,
            },
        }
    }
}

/// Temporary modifier applied to an agent's movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusEffect {
    /// The agent does not move at all.
    Frozen {
        /// Remaining time of the effect.
        duration: Duration,
    },
    /// The agent's step timer accumulates only part of the elapsed time.
    Slowed {
        /// Remaining time of the effect.
        duration: Duration,
        /// Share of elapsed time credited to the step timer, in percent.
        pace_percent: u32,
    },
}

/// Reasons a build request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildError {
    /// The requested cell lies outside the grid.
    OutOfBounds,
    /// The requested cell is already blocked.
    Blocked,
    /// The requested cell already holds a trap.
    Occupied,
    /// The player cannot afford the structure.
    InsufficientResources,
}

/// Immutable representation of a single agent's state used for queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentSnapshot {
    /// Unique identifier assigned to the agent.
    pub id: AgentId,
    /// Grid cell currently occupied by the agent.
    pub cell: CellCoord,
    /// Behaviour state last reported by the agent's controller.
    pub state: AgentState,
}

/// Read-only snapshot describing all agents within the level.
#[derive(Clone, Debug, Default)]
pub struct AgentView {
    snapshots: Vec<AgentSnapshot>,
}

impl AgentView {
    /// Creates a new agent view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<AgentSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured agent snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &AgentSnapshot> {
        self.snapshots.iter()
    }

    /// Snapshot of the provided agent, if present.
    #[must_use]
    pub fn get(&self, agent: AgentId) -> Option<&AgentSnapshot> {
        self.snapshots
            .binary_search_by_key(&agent, |snapshot| snapshot.id)
            .ok()
            .and_then(|index| self.snapshots.get(index))
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<AgentSnapshot> {
        self.snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn step_stops_at_origin_edges() {
        let origin = CellCoord::new(0, 0);
        assert_eq!(origin.step(Direction::North), None);
        assert_eq!(origin.step(Direction::West), None);
        assert_eq!(origin.step(Direction::East), Some(CellCoord::new(1, 0)));
        assert_eq!(origin.step(Direction::South), Some(CellCoord::new(0, 1)));
    }

    #[test]
    fn direction_to_only_accepts_orthogonal_neighbors() {
        let origin = CellCoord::new(3, 3);
        assert_eq!(
            origin.direction_to(CellCoord::new(3, 2)),
            Some(Direction::North)
        );
        assert_eq!(
            origin.direction_to(CellCoord::new(4, 3)),
            Some(Direction::East)
        );
        assert_eq!(
            origin.direction_to(CellCoord::new(3, 4)),
            Some(Direction::South)
        );
        assert_eq!(
            origin.direction_to(CellCoord::new(2, 3)),
            Some(Direction::West)
        );
        assert_eq!(origin.direction_to(origin), None);
        assert_eq!(origin.direction_to(CellCoord::new(4, 4)), None);
    }

    #[test]
    fn move_cost_rejects_zero() {
        assert_eq!(MoveCost::new(0), None);
        assert_eq!(MoveCost::new(1), Some(MoveCost::UNIT));
        assert_eq!(MoveCost::default().get(), 1);
    }

    #[test]
    fn neighbors_skip_walls_and_bounds() {
        let mut cells = vec![Cell::FLOOR; 9];
        cells[1] = Cell::WALL;
        let view = GridView::new(&cells, 3, 3);

        let corner: Vec<_> = view.neighbors(CellCoord::new(0, 0)).collect();
        assert_eq!(corner, vec![CellCoord::new(0, 1)]);

        let centre: Vec<_> = view.neighbors(CellCoord::new(1, 1)).collect();
        assert_eq!(
            centre,
            vec![
                CellCoord::new(2, 1),
                CellCoord::new(1, 2),
                CellCoord::new(0, 1)
            ]
        );

        assert_eq!(view.neighbors(CellCoord::new(7, 7)).count(), 0);
        assert_eq!(view.cell_at(CellCoord::new(3, 0)), None);
    }

    #[test]
    fn grid_view_index_round_trips_coordinates() {
        let cells = vec![Cell::FLOOR; 12];
        let view = GridView::new(&cells, 4, 3);
        for coord in view.coords() {
            let index = view.index(coord).expect("coordinate inside grid");
            assert_eq!(view.coord(index), Some(coord));
        }
        assert_eq!(view.coords().count(), 12);
    }

    #[test]
    fn path_cursor_consumes_cells_in_order() {
        let mut path = Path::new(vec![CellCoord::new(1, 0), CellCoord::new(2, 0)]);
        assert_eq!(path.len(), 2);
        assert_eq!(path.goal(), Some(CellCoord::new(2, 0)));
        assert_eq!(path.advance(), Some(CellCoord::new(1, 0)));
        assert_eq!(path.remaining(), &[CellCoord::new(2, 0)]);
        assert_eq!(path.advance(), Some(CellCoord::new(2, 0)));
        assert!(path.is_empty());
        assert_eq!(path.goal(), None);
        assert_eq!(path.advance(), None);
    }

    #[test]
    fn profile_rejects_zero_step_duration() {
        assert_eq!(
            AgentProfile::new(4, Duration::ZERO),
            Err(ProfileError::ZeroStepDuration)
        );
        let profile = AgentProfile::new(4, Duration::from_millis(500)).expect("valid profile");
        assert_eq!(profile.detection_range(), 4);
    }

    #[test]
    fn archetype_profiles_are_valid() {
        for archetype in [
            AgentArchetype::SecurityAgent,
            AgentArchetype::Elf,
            AgentArchetype::AlphaBear,
        ] {
            let profile = archetype.profile();
            assert!(!profile.step_duration().is_zero(), "{}", archetype.name());
        }
        assert_eq!(AgentArchetype::SecurityAgent.profile().detection_range(), 8);
    }

    #[test]
    fn trap_cells_are_costlier_than_floor() {
        assert_eq!(TrapKind::Bind.move_cost().get(), 5);
        assert!(TrapKind::Gravity.move_cost() > MoveCost::UNIT);
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn partially_consumed_path_round_trips_through_bincode() {
        let mut path = Path::new(vec![CellCoord::new(0, 1), CellCoord::new(0, 2)]);
        let _ = path.advance();
        assert_round_trip(&path);
    }

    #[test]
    fn build_error_round_trips_through_bincode() {
        assert_round_trip(&BuildError::InsufficientResources);
    }
}
