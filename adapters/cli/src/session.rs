//! Frame loop wiring the world to every system with a scripted player.

use std::time::Duration;

use fogline_core::{
    AgentId, AgentState, CellCoord, Command, Event, TrapKind, DEFAULT_LAYER_DURATION,
};
use fogline_system_agents::{AgentConfig, Agents};
use fogline_system_bootstrap::Level;
use fogline_system_builder::{Builder, BuilderInput};
use fogline_system_fog::{FogConfig, FogConfigError, FogReveal};
use fogline_system_pathfinding::find_path;
use fogline_world::{self as world, query, World};
use tracing::{debug, info};

/// Tunables of a headless run.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SessionConfig {
    /// Simulated time per frame.
    pub(crate) frame: Duration,
    /// Frames between player scans, 0 disables them.
    pub(crate) scan_every: u64,
    /// Tunables shared by every agent.
    pub(crate) agents: AgentConfig,
}

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The player reached the exit.
    Escaped,
    /// An agent caught the player.
    Caught(AgentId),
}

/// Counters collected while the run progresses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Tally {
    pub(crate) player_steps: u32,
    pub(crate) agent_steps: u32,
    pub(crate) scans: u32,
    pub(crate) traps_placed: u32,
    pub(crate) traps_triggered: u32,
    pub(crate) hunts: u32,
    pub(crate) pickups: u32,
}

/// World plus systems advanced one frame at a time.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    agents: Agents,
    fog: FogReveal,
    builder: Builder,
    config: SessionConfig,
    frame: u64,
    outcome: Option<Outcome>,
    pending_trap: bool,
    tally: Tally,
}

impl Session {
    /// Loads the level into the world and reveals the player's surroundings.
    pub(crate) fn start(
        world: World,
        level: &Level,
        config: SessionConfig,
    ) -> Result<Self, FogConfigError> {
        let fog_config = FogConfig::new(level.scan_radius(), DEFAULT_LAYER_DURATION)?;
        let (columns, rows) = level.grid().view().dimensions();
        let mut session = Self {
            world,
            agents: Agents::new(config.agents),
            fog: FogReveal::new(fog_config, columns, rows),
            builder: Builder::new(),
            config,
            frame: 0,
            outcome: None,
            pending_trap: false,
            tally: Tally::default(),
        };

        let mut events = Vec::new();
        world::apply_all(&mut session.world, level.commands(), &mut events);
        session.pump(events, BuilderInput::default());

        if let Some(player) = query::player_cell(&session.world) {
            session
                .fog
                .reveal_now(player, query::grid_view(&session.world));
        }
        info!(
            level = level.name(),
            agents = level.agents().len(),
            revealed = session.fog.revealed_count(),
            "level loaded"
        );
        Ok(session)
    }

    /// Runs one frame: scripted input, then the tick, then every system.
    pub(crate) fn advance(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        self.frame = self.frame.saturating_add(1);

        let mut commands = self.scripted_input();
        let builder_input = if self.pending_trap {
            self.pending_trap = false;
            affordable_trap(query::resources(&self.world))
                .map_or_else(BuilderInput::default, |kind| {
                    BuilderInput::new(false, Some(kind), None)
                })
        } else {
            BuilderInput::default()
        };
        commands.push(Command::Tick {
            dt: self.config.frame,
        });

        let mut events = Vec::new();
        world::apply_all(&mut self.world, commands, &mut events);
        self.pump(events, builder_input);
    }

    fn scripted_input(&self) -> Vec<Command> {
        let mut commands = Vec::new();
        let (Some(player), Some(exit)) = (
            query::player_cell(&self.world),
            query::exit(&self.world),
        ) else {
            return commands;
        };

        if self.config.scan_every > 0 && self.frame % self.config.scan_every == 0 {
            commands.push(Command::RequestScan);
        }

        if player != exit && query::player_route(&self.world).is_empty() {
            let path = find_path(query::grid_view(&self.world), player, exit);
            if path.is_empty() {
                debug!(?player, ?exit, "exit unreachable");
            } else {
                commands.push(Command::RoutePlayer { path });
            }
        }
        commands
    }

    fn pump(&mut self, mut events: Vec<Event>, mut builder_input: BuilderInput) {
        while !events.is_empty() {
            self.observe(&events);

            let player = query::player_cell(&self.world);
            let mut commands = Vec::new();
            self.agents.handle(
                &events,
                player,
                query::grid_view(&self.world),
                &mut commands,
            );
            self.fog.handle(&events, query::grid_view(&self.world));
            self.builder
                .handle(&events, builder_input, player, &mut commands);
            builder_input = BuilderInput::default();

            events.clear();
            world::apply_all(&mut self.world, commands, &mut events);
        }
    }

    fn observe(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::PlayerMoved { .. } => self.tally.player_steps += 1,
                Event::AgentAdvanced { .. } => self.tally.agent_steps += 1,
                Event::ScanRequested { .. } => self.tally.scans += 1,
                Event::TrapPlaced { .. } => self.tally.traps_placed += 1,
                Event::TrapTriggered { .. } => self.tally.traps_triggered += 1,
                Event::PickupCollected { .. } => self.tally.pickups += 1,
                Event::AgentStateChanged {
                    to: AgentState::Hunting,
                    ..
                } => {
                    self.tally.hunts += 1;
                    self.pending_trap = true;
                }
                Event::ExitReached { .. } => {
                    if self.outcome.is_none() {
                        self.outcome = Some(Outcome::Escaped);
                    }
                }
                Event::PlayerCaught { agent, .. } => {
                    if self.outcome.is_none() {
                        self.outcome = Some(Outcome::Caught(*agent));
                    }
                }
                _ => {}
            }
        }
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    pub(crate) fn agents(&self) -> &Agents {
        &self.agents
    }

    pub(crate) fn fog(&self) -> &FogReveal {
        &self.fog
    }

    pub(crate) fn builder(&self) -> &Builder {
        &self.builder
    }

    pub(crate) const fn frame(&self) -> u64 {
        self.frame
    }

    pub(crate) const fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub(crate) const fn tally(&self) -> Tally {
        self.tally
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.config
            .frame
            .saturating_mul(u32::try_from(self.frame).unwrap_or(u32::MAX))
    }

    pub(crate) fn player(&self) -> Option<CellCoord> {
        query::player_cell(&self.world)
    }
}

/// Cheapest trap the balance covers.
fn affordable_trap(resources: u32) -> Option<TrapKind> {
    [TrapKind::Bind, TrapKind::Gravity]
        .into_iter()
        .filter(|kind| kind.build_cost() <= resources)
        .min_by_key(|kind| kind.build_cost())
}
