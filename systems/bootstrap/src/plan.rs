//! Declarative level plans, as written in TOML or picked from the presets.

use fogline_core::{AgentArchetype, CellCoord, ProfileError};
use fogline_world::GridError;
use serde::{Deserialize, Serialize};

/// Number of built-in levels.
pub const PRESET_COUNT: u32 = 5;

/// Generator filling a plan that has dimensions but no layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    /// Connected cave grown by cellular automata inside a solid border.
    #[default]
    Cave,
    /// Open floor with a few walls scattered inside the border.
    Scatter,
}

/// Description of a level. Anything left out is generated from `seed`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LevelPlan {
    /// Display name of the level.
    #[serde(default)]
    pub name: Option<String>,
    /// Grid width, required when no layout is given.
    #[serde(default)]
    pub columns: Option<u32>,
    /// Grid height, required when no layout is given.
    #[serde(default)]
    pub rows: Option<u32>,
    /// Text layout using `.`, `#` and `1`-`9`; replaces generated terrain.
    #[serde(default)]
    pub layout: Option<Vec<String>>,
    /// Generator used when no layout is given.
    #[serde(default)]
    pub terrain: Terrain,
    /// Number of random walls placed by [`Terrain::Scatter`].
    #[serde(default)]
    pub walls: Option<u32>,
    /// Player spawn cell.
    #[serde(default)]
    pub player: Option<CellCoord>,
    /// Exit cell.
    #[serde(default)]
    pub exit: Option<CellCoord>,
    /// Starting resource balance.
    #[serde(default)]
    pub resources: u32,
    /// Data node cells; generated when absent.
    #[serde(default)]
    pub pickups: Option<Vec<CellCoord>>,
    /// Number of data nodes generated when `pickups` is absent.
    #[serde(default)]
    pub pickup_count: u32,
    /// Agents populating the level.
    #[serde(default)]
    pub agents: Vec<AgentPlan>,
    /// Fog scan radius.
    #[serde(default)]
    pub scan_radius: Option<u32>,
    /// Seed driving every generated piece.
    #[serde(default)]
    pub seed: u64,
}

/// Description of a single agent within a [`LevelPlan`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentPlan {
    /// Archetype supplying default detection range and pace.
    #[serde(default)]
    pub archetype: Option<AgentArchetype>,
    /// Detection range overriding the archetype's.
    #[serde(default)]
    pub detection_range: Option<u32>,
    /// Milliseconds per step overriding the archetype's.
    #[serde(default)]
    pub step_millis: Option<u64>,
    /// Spawn cell; generated when absent.
    #[serde(default)]
    pub spawn: Option<CellCoord>,
    /// Patrol route; generated around the spawn when absent.
    #[serde(default)]
    pub waypoints: Option<Vec<CellCoord>>,
}

impl AgentPlan {
    /// Agent of the provided archetype with generated placement.
    #[must_use]
    pub fn archetype(archetype: AgentArchetype) -> Self {
        Self {
            archetype: Some(archetype),
            ..Self::default()
        }
    }
}

impl LevelPlan {
    /// Parses a plan from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, LevelError> {
        Ok(toml::from_str(contents)?)
    }

    /// Built-in plan for levels `1..=5`.
    ///
    /// Caves are half again as wide as the level's nominal size.
    pub fn preset(level: u32) -> Result<Self, LevelError> {
        let (size, resources, roster): (u32, u32, &[AgentArchetype]) = match level {
            1 => (12, 15, &[AgentArchetype::SecurityAgent]),
            2 => (14, 12, &[AgentArchetype::SecurityAgent]),
            3 => (
                16,
                10,
                &[AgentArchetype::SecurityAgent, AgentArchetype::AlphaBear],
            ),
            4 => (
                18,
                8,
                &[AgentArchetype::SecurityAgent, AgentArchetype::AlphaBear],
            ),
            5 => (
                20,
                5,
                &[
                    AgentArchetype::Elf,
                    AgentArchetype::AlphaBear,
                    AgentArchetype::SecurityAgent,
                ],
            ),
            _ => return Err(LevelError::UnknownLevel(level)),
        };

        let side = size * 3 / 2;
        Ok(Self {
            name: Some(format!("Level {level}")),
            columns: Some(side),
            rows: Some(side),
            resources,
            pickup_count: level + 2,
            agents: roster.iter().copied().map(AgentPlan::archetype).collect(),
            seed: u64::from(level),
            ..Self::default()
        })
    }

    /// Replaces the generation seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Reasons a level plan cannot be turned into a playable level.
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    /// The plan text is not valid TOML or does not match the plan schema.
    #[error("failed to parse level plan")]
    Toml(#[from] toml::de::Error),
    /// The text layout is malformed.
    #[error("invalid level layout")]
    Grid(#[from] GridError),
    /// An agent profile is invalid.
    #[error("invalid agent profile")]
    Profile(#[from] ProfileError),
    /// Neither a layout nor both dimensions were given.
    #[error("level plan needs either a layout or both columns and rows")]
    MissingDimensions,
    /// No preset exists for the requested level.
    #[error("no preset for level {0}; levels run from 1 to 5")]
    UnknownLevel(u32),
    /// An agent has neither an archetype nor explicit range and pace.
    #[error("agent {index} needs an archetype or both detection_range and step_millis")]
    MissingProfile {
        /// Position of the agent in the plan.
        index: usize,
    },
    /// A cell named or generated for the level is unusable.
    #[error("{role} cell ({}, {}) is not a free walkable cell", .cell.column(), .cell.row())]
    BlockedCell {
        /// What the cell was meant for.
        role: &'static str,
        /// Offending cell.
        cell: CellCoord,
    },
    /// The level has no walkable cell for the player.
    #[error("level has no walkable cell")]
    NoRoom,
    /// The fog scan radius is larger than the level can use.
    #[error("scan radius {radius} exceeds the limit of {limit} for this level")]
    ScanRadiusTooLarge {
        /// Requested radius.
        radius: u32,
        /// Largest radius accepted for the level.
        limit: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_cover_five_levels() {
        for level in 1..=PRESET_COUNT {
            let plan = LevelPlan::preset(level).expect("preset exists");
            assert!(!plan.agents.is_empty(), "level {level} has no agents");
        }
        assert!(matches!(
            LevelPlan::preset(6),
            Err(LevelError::UnknownLevel(6))
        ));
        let last = LevelPlan::preset(5).expect("preset exists");
        assert_eq!((last.columns, last.resources), (Some(30), 5));
        assert_eq!(last.pickup_count, 7);
        assert_eq!(last.terrain, Terrain::Cave);
    }

    #[test]
    fn toml_plan_parses_agents_and_cells() {
        let plan = LevelPlan::from_toml(
            r#"
                name = "Corridor"
                layout = ["....", ".#..", "...."]
                player = { column = 0, row = 0 }
                exit = { column = 3, row = 2 }
                resources = 20

                [[agents]]
                archetype = "alpha_bear"
                waypoints = [{ column = 3, row = 0 }, { column = 3, row = 2 }]

                [[agents]]
                detection_range = 3
                step_millis = 250
            "#,
        )
        .expect("valid plan");

        assert_eq!(plan.player, Some(CellCoord::new(0, 0)));
        assert_eq!(plan.agents.len(), 2);
        assert_eq!(plan.agents[0].archetype, Some(AgentArchetype::AlphaBear));
        assert_eq!(plan.agents[1].step_millis, Some(250));
    }

    #[test]
    fn terrain_and_pickups_parse() {
        let plan = LevelPlan::from_toml(
            r#"
                columns = 10
                rows = 8
                terrain = "scatter"
                walls = 6
                pickups = [{ column = 2, row = 3 }]
            "#,
        )
        .expect("valid plan");

        assert_eq!(plan.terrain, Terrain::Scatter);
        assert_eq!(plan.walls, Some(6));
        assert_eq!(plan.pickups, Some(vec![CellCoord::new(2, 3)]));
        assert_eq!(plan.pickup_count, 0);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            LevelPlan::from_toml("colums = 4"),
            Err(LevelError::Toml(_))
        ));
    }
}
