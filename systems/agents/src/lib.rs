#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic agent system that runs each agent's state machine once per
//! frame and proposes state changes and steps to the world.

mod controller;

use std::collections::BTreeMap;

use fogline_core::{AgentId, CellCoord, Command, Event, GridView};
use tracing::debug;

pub use controller::{Agent, AgentConfig, AgentUpdate, ReplanPolicy};

/// Pure system that reacts to world events and emits agent commands.
#[derive(Debug, Default)]
pub struct Agents {
    agents: BTreeMap<AgentId, Agent>,
    config: AgentConfig,
}

impl Agents {
    /// Creates an agent system applying the provided tunables to every agent.
    #[must_use]
    pub fn new(config: AgentConfig) -> Self {
        Self {
            agents: BTreeMap::new(),
            config,
        }
    }

    /// Consumes world events and immutable views to emit agent commands.
    ///
    /// `player` is the player's cell at the start of the frame; every agent
    /// evaluates against that same snapshot.
    pub fn handle(
        &mut self,
        events: &[Event],
        player: Option<CellCoord>,
        grid: GridView<'_>,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            match event {
                Event::GridConfigured { .. } => self.agents.clear(),
                Event::AgentSpawned {
                    agent,
                    cell,
                    profile,
                    waypoints,
                } => {
                    let _ = self.agents.insert(
                        *agent,
                        Agent::new(*agent, *cell, *profile, waypoints.clone(), self.config),
                    );
                }
                Event::AgentRemoved { agent } => {
                    let _ = self.agents.remove(agent);
                }
                Event::AgentAdvanced { agent, to, .. } => {
                    if let Some(controller) = self.agents.get_mut(agent) {
                        controller.sync_cell(*to);
                    }
                }
                Event::TrapTriggered { agent, kind, .. } => {
                    if let Some(controller) = self.agents.get_mut(agent) {
                        debug!(agent = agent.get(), ?kind, "status effect applied");
                        controller.apply_effect(kind.effect());
                    }
                }
                Event::TimeAdvanced { dt } => {
                    for controller in self.agents.values_mut() {
                        let update = controller.update(player, grid, *dt);
                        if update.state_changed() {
                            out.push(Command::SetAgentState {
                                agent: controller.id(),
                                state: update.state,
                            });
                        }
                        if let Some(to) = update.step {
                            out.push(Command::StepAgent {
                                agent: controller.id(),
                                to,
                            });
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// Controller of the provided agent, if known.
    #[must_use]
    pub fn agent(&self, agent: AgentId) -> Option<&Agent> {
        self.agents.get(&agent)
    }

    /// Iterator over every controller in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// Number of agents under control.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Reports whether no agents are under control.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
