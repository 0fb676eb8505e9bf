//! Per-agent behaviour state machine.

use std::time::Duration;

use fogline_core::{AgentId, AgentProfile, AgentState, CellCoord, GridView, Path, StatusEffect};
use fogline_system_pathfinding::find_path;
use tracing::debug;

/// When a hunting agent recomputes its route to the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ReplanPolicy {
    /// Plan a fresh route on every frame spent hunting.
    #[default]
    EveryFrame,
    /// Plan only when the player changed cells or the route ran out.
    WhenTargetMoves,
}

/// Tunables shared by every agent controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AgentConfig {
    /// Re-planning policy applied while hunting.
    pub replan: ReplanPolicy,
    /// Time an agent waits at a reached waypoint before heading on.
    pub patrol_dwell: Duration,
}

/// Outcome of a single controller update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AgentUpdate {
    /// State before the update.
    pub previous: AgentState,
    /// State after the update.
    pub state: AgentState,
    /// Cell entered during the update, if the agent stepped.
    pub step: Option<CellCoord>,
}

impl AgentUpdate {
    /// Reports whether the update changed the behaviour state.
    #[must_use]
    pub fn state_changed(&self) -> bool {
        self.previous != self.state
    }
}

/// Behaviour controller owning a single agent's navigation state.
#[derive(Clone, Debug)]
pub struct Agent {
    id: AgentId,
    cell: CellCoord,
    profile: AgentProfile,
    state: AgentState,
    timer: Duration,
    path: Path,
    waypoints: Vec<CellCoord>,
    waypoint_index: usize,
    dwell: Duration,
    last_target: Option<CellCoord>,
    effect: Option<StatusEffect>,
    config: AgentConfig,
}

impl Agent {
    /// Creates an idle controller for an agent standing on `cell`.
    #[must_use]
    pub fn new(
        id: AgentId,
        cell: CellCoord,
        profile: AgentProfile,
        waypoints: Vec<CellCoord>,
        config: AgentConfig,
    ) -> Self {
        Self {
            id,
            cell,
            profile,
            state: AgentState::Idle,
            timer: Duration::ZERO,
            path: Path::empty(),
            waypoints,
            waypoint_index: 0,
            dwell: Duration::ZERO,
            last_target: None,
            effect: None,
            config,
        }
    }

    /// Identifier of the agent.
    #[must_use]
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Cell the controller believes the agent occupies.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Current behaviour state.
    #[must_use]
    pub const fn state(&self) -> AgentState {
        self.state
    }

    /// Detection and pacing parameters.
    #[must_use]
    pub const fn profile(&self) -> AgentProfile {
        self.profile
    }

    /// Route the agent is following.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Time banked toward the next step.
    #[must_use]
    pub const fn timer(&self) -> Duration {
        self.timer
    }

    /// Patrol route of the agent.
    #[must_use]
    pub fn waypoints(&self) -> &[CellCoord] {
        &self.waypoints
    }

    /// Waypoint the agent is currently heading for, if it patrols.
    #[must_use]
    pub fn current_waypoint(&self) -> Option<CellCoord> {
        self.waypoints.get(self.waypoint_index).copied()
    }

    /// Active status effect, if any.
    #[must_use]
    pub const fn effect(&self) -> Option<StatusEffect> {
        self.effect
    }

    /// Replaces the active status effect.
    pub fn apply_effect(&mut self, effect: StatusEffect) {
        if matches!(effect, StatusEffect::Frozen { .. }) {
            self.path.clear();
        }
        self.effect = Some(effect);
    }

    /// Replaces the current route.
    pub fn assign_path(&mut self, path: Path) {
        self.path = path;
    }

    /// Overrides the controller's position with the world's.
    pub fn sync_cell(&mut self, cell: CellCoord) {
        if self.cell != cell {
            self.cell = cell;
            self.path.clear();
        }
    }

    /// Runs one frame of the state machine followed by step execution.
    ///
    /// `player` is the player's cell captured at the start of the frame. The
    /// transition rule runs even while frozen; the freeze only withholds the
    /// step and the route.
    pub fn update(
        &mut self,
        player: Option<CellCoord>,
        grid: GridView<'_>,
        dt: Duration,
    ) -> AgentUpdate {
        let previous = self.state;
        let pace = self.tick_effect(dt);

        let range = self.profile.detection_range();
        match player {
            Some(target) if self.cell.manhattan_distance(target) < range => {
                self.hunt(target, grid);
            }
            _ => self.roam(grid, pace.unwrap_or(Duration::ZERO)),
        }

        let step = match pace {
            Some(pace) => self.step(grid, pace),
            None => {
                self.path.clear();
                None
            }
        };
        AgentUpdate {
            previous,
            state: self.state,
            step,
        }
    }

    /// Banks `dt` toward the next step and takes it once enough time passed.
    ///
    /// At most one cell is entered per call; surplus time carries over. A
    /// next cell that is no longer walkable drops the whole route and still
    /// uses up the step.
    pub fn step(&mut self, grid: GridView<'_>, dt: Duration) -> Option<CellCoord> {
        let next = self.path.peek()?;
        self.timer = self.timer.saturating_add(dt);
        if self.timer < self.profile.step_duration() {
            return None;
        }

        if self.cell.direction_to(next).is_none() || !grid.is_walkable(next) {
            debug!(
                agent = self.id.get(),
                column = next.column(),
                row = next.row(),
                "route blocked, dropping it"
            );
            self.path.clear();
            self.timer -= self.profile.step_duration();
            return None;
        }

        self.timer -= self.profile.step_duration();
        let _ = self.path.advance();
        self.cell = next;
        Some(next)
    }

    /// Ticks the status effect down and yields the effective frame time, or
    /// `None` while frozen.
    fn tick_effect(&mut self, dt: Duration) -> Option<Duration> {
        match self.effect {
            None => Some(dt),
            Some(StatusEffect::Frozen { duration }) => {
                let remaining = duration.saturating_sub(dt);
                self.effect = if remaining.is_zero() {
                    None
                } else {
                    Some(StatusEffect::Frozen {
                        duration: remaining,
                    })
                };
                None
            }
            Some(StatusEffect::Slowed {
                duration,
                pace_percent,
            }) => {
                let remaining = duration.saturating_sub(dt);
                self.effect = if remaining.is_zero() {
                    None
                } else {
                    Some(StatusEffect::Slowed {
                        duration: remaining,
                        pace_percent,
                    })
                };
                Some(dt * pace_percent / 100)
            }
        }
    }

    fn hunt(&mut self, target: CellCoord, grid: GridView<'_>) {
        if self.state != AgentState::Hunting {
            debug!(agent = self.id.get(), "target detected");
            self.state = AgentState::Hunting;
        }

        let replan = match self.config.replan {
            ReplanPolicy::EveryFrame => true,
            ReplanPolicy::WhenTargetMoves => {
                self.last_target != Some(target) || self.path.is_empty()
            }
        };
        if replan {
            self.path = find_path(grid, self.cell, target);
        }
        self.last_target = Some(target);
    }

    /// `pace` is the frame time after slowing, so dwelling slows down too.
    fn roam(&mut self, grid: GridView<'_>, pace: Duration) {
        if self.state == AgentState::Hunting {
            debug!(agent = self.id.get(), "target lost");
            self.path.clear();
            self.last_target = None;
        }

        if self.waypoints.is_empty() {
            self.state = AgentState::Idle;
            return;
        }
        self.state = AgentState::Patrol;

        if self.current_waypoint() == Some(self.cell) {
            self.waypoint_index = (self.waypoint_index + 1) % self.waypoints.len();
            self.dwell = self.config.patrol_dwell;
        }

        if !self.dwell.is_zero() {
            self.dwell = self.dwell.saturating_sub(pace);
            return;
        }

        if self.path.is_empty() {
            if let Some(waypoint) = self.current_waypoint() {
                self.path = find_path(grid, self.cell, waypoint);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fogline_core::{Cell, MoveCost, TrapKind};

    fn open_cells(columns: u32, rows: u32) -> Vec<Cell> {
        vec![Cell::FLOOR; (columns * rows) as usize]
    }

    fn profile(range: u32, step_millis: u64) -> AgentProfile {
        AgentProfile::new(range, Duration::from_millis(step_millis)).expect("valid profile")
    }

    fn agent_at(cell: CellCoord, profile: AgentProfile, waypoints: Vec<CellCoord>) -> Agent {
        Agent::new(
            AgentId::new(0),
            cell,
            profile,
            waypoints,
            AgentConfig::default(),
        )
    }

    fn straight_path() -> Path {
        Path::new(vec![
            CellCoord::new(1, 0),
            CellCoord::new(2, 0),
            CellCoord::new(3, 0),
        ])
    }

    #[test]
    fn one_step_per_elapsed_step_duration() {
        let cells = open_cells(5, 1);
        let grid = GridView::new(&cells, 5, 1);
        let mut agent = agent_at(CellCoord::new(0, 0), profile(4, 500), Vec::new());
        agent.assign_path(straight_path());

        for expected in 1..=3 {
            let step = agent.step(grid, Duration::from_millis(500));
            assert_eq!(step, Some(CellCoord::new(expected, 0)));
        }
        assert!(agent.path().is_empty());
        assert_eq!(agent.step(grid, Duration::from_millis(500)), None);
    }

    #[test]
    fn fractional_time_carries_over() {
        let cells = open_cells(5, 1);
        let grid = GridView::new(&cells, 5, 1);
        let mut agent = agent_at(CellCoord::new(0, 0), profile(4, 500), Vec::new());
        agent.assign_path(straight_path());

        assert_eq!(agent.step(grid, Duration::from_millis(300)), None);
        assert_eq!(
            agent.step(grid, Duration::from_millis(300)),
            Some(CellCoord::new(1, 0))
        );
        assert_eq!(agent.timer(), Duration::from_millis(100));
    }

    #[test]
    fn detects_player_within_range_and_hunts() {
        let cells = open_cells(6, 6);
        let grid = GridView::new(&cells, 6, 6);
        let mut agent = agent_at(CellCoord::new(0, 0), profile(5, 500), Vec::new());

        let update = agent.update(Some(CellCoord::new(2, 2)), grid, Duration::ZERO);

        assert_eq!(update.previous, AgentState::Idle);
        assert_eq!(update.state, AgentState::Hunting);
        assert!(update.state_changed());
        assert_eq!(agent.path().goal(), Some(CellCoord::new(2, 2)));
        assert_eq!(agent.path().len(), 4);
    }

    #[test]
    fn range_is_exclusive() {
        let cells = open_cells(6, 6);
        let grid = GridView::new(&cells, 6, 6);
        let mut agent = agent_at(CellCoord::new(0, 0), profile(4, 500), Vec::new());

        let update = agent.update(Some(CellCoord::new(2, 2)), grid, Duration::ZERO);

        assert_eq!(update.state, AgentState::Idle);
        assert!(agent.path().is_empty());
    }

    #[test]
    fn losing_the_target_clears_the_chase_route() {
        let cells = open_cells(12, 1);
        let grid = GridView::new(&cells, 12, 1);
        let home = CellCoord::new(0, 0);
        let mut agent = agent_at(CellCoord::new(2, 0), profile(4, 500), Vec::new());

        let _ = agent.update(Some(CellCoord::new(4, 0)), grid, Duration::ZERO);
        assert_eq!(agent.state(), AgentState::Hunting);
        assert!(!agent.path().is_empty());

        let update = agent.update(Some(CellCoord::new(11, 0)), grid, Duration::ZERO);
        assert_eq!(update.state, AgentState::Idle);
        assert!(agent.path().is_empty());

        let mut patroller = agent_at(CellCoord::new(2, 0), profile(4, 500), vec![home]);
        let _ = patroller.update(Some(CellCoord::new(4, 0)), grid, Duration::ZERO);
        let update = patroller.update(Some(CellCoord::new(11, 0)), grid, Duration::ZERO);
        assert_eq!(update.state, AgentState::Patrol);
        assert_eq!(patroller.path().goal(), Some(home));
    }

    #[test]
    fn patrol_cycles_through_waypoints() {
        let cells = open_cells(4, 1);
        let grid = GridView::new(&cells, 4, 1);
        let waypoints = vec![CellCoord::new(0, 0), CellCoord::new(2, 0)];
        let mut agent = agent_at(CellCoord::new(0, 0), profile(1, 100), waypoints);

        let update = agent.update(None, grid, Duration::ZERO);
        assert_eq!(update.state, AgentState::Patrol);
        assert_eq!(agent.current_waypoint(), Some(CellCoord::new(2, 0)));

        let mut visited = Vec::new();
        for _ in 0..4 {
            if let Some(cell) = agent.update(None, grid, Duration::from_millis(100)).step {
                visited.push(cell);
            }
        }
        assert_eq!(
            visited,
            vec![
                CellCoord::new(1, 0),
                CellCoord::new(2, 0),
                CellCoord::new(1, 0),
                CellCoord::new(0, 0),
            ]
        );
    }

    #[test]
    fn patrol_dwell_delays_departure() {
        let cells = open_cells(3, 1);
        let grid = GridView::new(&cells, 3, 1);
        let waypoints = vec![CellCoord::new(0, 0), CellCoord::new(2, 0)];
        let mut agent = Agent::new(
            AgentId::new(1),
            CellCoord::new(0, 0),
            profile(1, 100),
            waypoints,
            AgentConfig {
                patrol_dwell: Duration::from_millis(300),
                ..AgentConfig::default()
            },
        );

        for _ in 0..3 {
            let update = agent.update(None, grid, Duration::from_millis(100));
            assert_eq!(update.step, None);
        }
        let update = agent.update(None, grid, Duration::from_millis(100));
        assert_eq!(update.step, Some(CellCoord::new(1, 0)));
    }

    #[test]
    fn identical_inputs_produce_identical_transitions() {
        let cells = open_cells(8, 8);
        let grid = GridView::new(&cells, 8, 8);
        let players = [
            CellCoord::new(7, 7),
            CellCoord::new(4, 4),
            CellCoord::new(3, 4),
            CellCoord::new(7, 0),
            CellCoord::new(0, 7),
        ];

        let run = || {
            let mut agent = agent_at(
                CellCoord::new(1, 1),
                profile(6, 200),
                vec![CellCoord::new(1, 1), CellCoord::new(1, 5)],
            );
            players
                .iter()
                .map(|player| agent.update(Some(*player), grid, Duration::from_millis(150)))
                .collect::<Vec<_>>()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn blocked_next_cell_drops_the_route() {
        let mut cells = open_cells(3, 1);
        let mut agent = agent_at(CellCoord::new(0, 0), profile(1, 100), Vec::new());
        agent.assign_path(Path::new(vec![CellCoord::new(1, 0), CellCoord::new(2, 0)]));
        cells[1] = Cell::WALL;
        let grid = GridView::new(&cells, 3, 1);

        assert_eq!(agent.step(grid, Duration::from_millis(100)), None);
        assert!(agent.path().is_empty());
        assert_eq!(agent.cell(), CellCoord::new(0, 0));
    }

    #[test]
    fn blocked_step_consumes_the_banked_time() {
        let mut cells = open_cells(3, 2);
        cells[1] = Cell::WALL;
        let grid = GridView::new(&cells, 3, 2);
        let mut agent = agent_at(CellCoord::new(0, 0), profile(1, 100), Vec::new());
        agent.assign_path(Path::new(vec![CellCoord::new(1, 0)]));

        assert_eq!(agent.step(grid, Duration::from_millis(130)), None);
        assert_eq!(agent.timer(), Duration::from_millis(30));

        agent.assign_path(Path::new(vec![CellCoord::new(0, 1)]));
        assert_eq!(agent.step(grid, Duration::from_millis(50)), None);
        assert_eq!(
            agent.step(grid, Duration::from_millis(20)),
            Some(CellCoord::new(0, 1))
        );
    }

    #[test]
    fn frozen_agent_still_follows_the_transition_rule() {
        let cells = open_cells(20, 1);
        let grid = GridView::new(&cells, 20, 1);
        let far = Some(CellCoord::new(19, 0));
        let tick = Duration::from_millis(100);

        let mut agent = agent_at(CellCoord::new(0, 0), profile(4, 100), Vec::new());
        let _ = agent.update(Some(CellCoord::new(2, 0)), grid, Duration::ZERO);
        assert_eq!(agent.state(), AgentState::Hunting);
        agent.apply_effect(TrapKind::Bind.effect());

        let update = agent.update(far, grid, tick);
        assert_eq!(update.previous, AgentState::Hunting);
        assert_eq!(update.state, AgentState::Idle);
        assert_eq!(update.step, None);

        let update = agent.update(Some(CellCoord::new(1, 0)), grid, tick);
        assert_eq!(update.state, AgentState::Hunting);
        assert_eq!(update.step, None);
        assert!(agent.path().is_empty());
        assert_eq!(agent.cell(), CellCoord::new(0, 0));

        let mut patroller = agent_at(
            CellCoord::new(0, 0),
            profile(4, 100),
            vec![CellCoord::new(5, 0)],
        );
        let _ = patroller.update(Some(CellCoord::new(2, 0)), grid, Duration::ZERO);
        patroller.apply_effect(TrapKind::Bind.effect());
        let update = patroller.update(far, grid, tick);
        assert_eq!(update.state, AgentState::Patrol);
        assert!(patroller.path().is_empty());
    }

    #[test]
    fn slowed_agent_dwells_longer() {
        let cells = open_cells(3, 1);
        let grid = GridView::new(&cells, 3, 1);
        let mut agent = Agent::new(
            AgentId::new(1),
            CellCoord::new(0, 0),
            profile(1, 100),
            vec![CellCoord::new(0, 0), CellCoord::new(2, 0)],
            AgentConfig {
                patrol_dwell: Duration::from_millis(300),
                ..AgentConfig::default()
            },
        );
        agent.apply_effect(TrapKind::Gravity.effect());

        for _ in 0..7 {
            let update = agent.update(None, grid, Duration::from_millis(100));
            assert_eq!(update.step, None);
        }
        let update = agent.update(None, grid, Duration::from_millis(100));
        assert_eq!(update.step, Some(CellCoord::new(1, 0)));
    }

    #[test]
    fn freeze_holds_agent_in_place_until_it_expires() {
        let cells = open_cells(5, 1);
        let grid = GridView::new(&cells, 5, 1);
        let mut agent = agent_at(CellCoord::new(0, 0), profile(10, 100), Vec::new());
        agent.apply_effect(TrapKind::Bind.effect());

        for _ in 0..29 {
            let update = agent.update(Some(CellCoord::new(4, 0)), grid, Duration::from_millis(100));
            assert_eq!(update.step, None);
        }
        assert!(agent.effect().is_some());

        let _ = agent.update(Some(CellCoord::new(4, 0)), grid, Duration::from_millis(100));
        assert!(agent.effect().is_none());
        let update = agent.update(Some(CellCoord::new(4, 0)), grid, Duration::from_millis(100));
        assert_eq!(update.step, Some(CellCoord::new(1, 0)));
    }

    #[test]
    fn slow_halves_the_pace() {
        let cells = open_cells(5, 1);
        let grid = GridView::new(&cells, 5, 1);
        let mut agent = agent_at(CellCoord::new(0, 0), profile(10, 100), Vec::new());
        agent.apply_effect(TrapKind::Gravity.effect());

        let first = agent.update(Some(CellCoord::new(4, 0)), grid, Duration::from_millis(100));
        let second = agent.update(Some(CellCoord::new(4, 0)), grid, Duration::from_millis(100));

        assert_eq!(first.step, None);
        assert_eq!(second.step, Some(CellCoord::new(1, 0)));
    }

    #[test]
    fn replan_policy_controls_route_refresh() {
        let cells = open_cells(3, 2);
        let player = CellCoord::new(2, 0);
        let mut every_frame = agent_at(CellCoord::new(0, 0), profile(10, 500), Vec::new());
        let mut lazy = Agent::new(
            AgentId::new(2),
            CellCoord::new(0, 0),
            profile(10, 500),
            Vec::new(),
            AgentConfig {
                replan: ReplanPolicy::WhenTargetMoves,
                ..AgentConfig::default()
            },
        );

        let grid = GridView::new(&cells, 3, 2);
        let _ = every_frame.update(Some(player), grid, Duration::ZERO);
        let _ = lazy.update(Some(player), grid, Duration::ZERO);

        let mut costly = cells.clone();
        costly[1] = Cell::floor_with_cost(MoveCost::new(9).expect("non-zero cost"));
        let grid = GridView::new(&costly, 3, 2);
        let _ = every_frame.update(Some(player), grid, Duration::ZERO);
        let _ = lazy.update(Some(player), grid, Duration::ZERO);

        assert_eq!(every_frame.path().len(), 4);
        assert_eq!(lazy.path().remaining(), &[CellCoord::new(1, 0), player]);
    }
}
