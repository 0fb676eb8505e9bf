#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that prepares Fogline levels.

mod cave;
mod level;
mod plan;

use fogline_world::{query, World};

pub use level::{Level, LevelAgent};
pub use plan::{AgentPlan, LevelError, LevelPlan, Terrain, PRESET_COUNT};

/// Produces data required to greet the player and load levels.
#[derive(Debug, Default)]
pub struct Bootstrap;

impl Bootstrap {
    /// Derives the banner that should be shown when the experience starts.
    #[must_use]
    pub fn welcome_banner<'world>(&self, world: &'world World) -> &'world str {
        query::welcome_banner(world)
    }

    /// Resolves the built-in level with the provided number and seed.
    pub fn preset(&self, level: u32, seed: Option<u64>) -> Result<Level, LevelError> {
        let plan = LevelPlan::preset(level)?;
        match seed {
            Some(seed) => plan.with_seed(seed).resolve(),
            None => plan.resolve(),
        }
    }
}
