#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Fogline levels headlessly.

mod render;
mod session;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use fogline_system_agents::{AgentConfig, ReplanPolicy};
use fogline_system_bootstrap::{Bootstrap, LevelPlan};
use fogline_world::World;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::session::{Session, SessionConfig};

/// Runs a Fogline level with a scripted player and prints the outcome.
#[derive(Parser, Debug)]
#[command(name = "fogline", version, about, long_about = None)]
struct CliArgs {
    /// Built-in level to play, from 1 to 5.
    #[arg(long, default_value_t = 1, conflicts_with = "plan")]
    level: u32,

    /// TOML level plan to play instead of a built-in level.
    #[arg(long, value_name = "FILE")]
    plan: Option<PathBuf>,

    /// Seed overriding the level's generation seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Number of frames to simulate.
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Simulated milliseconds per frame.
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u64).range(1..))]
    frame_ms: u64,

    /// Frames between fog scans triggered by the player; 0 disables them.
    #[arg(long, default_value_t = 40)]
    scan_every: u64,

    /// Frames between map renders; 0 renders only the final frame.
    #[arg(long, default_value_t = 0)]
    render_every: u64,

    /// When hunting agents recompute their path.
    #[arg(long, value_enum, default_value_t = ReplanArg::EveryFrame)]
    replan: ReplanArg,

    /// Minimum log level written to stderr, refined by `RUST_LOG`.
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReplanArg {
    EveryFrame,
    WhenTargetMoves,
}

impl From<ReplanArg> for ReplanPolicy {
    fn from(value: ReplanArg) -> Self {
        match value {
            ReplanArg::EveryFrame => Self::EveryFrame,
            ReplanArg::WhenTargetMoves => Self::WhenTargetMoves,
        }
    }
}

/// Entry point for the Fogline command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(args.log_level.into()))
        .with_writer(std::io::stderr)
        .init();

    let bootstrap = Bootstrap;
    let level = match &args.plan {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read level plan {}", path.display()))?;
            let plan = LevelPlan::from_toml(&contents)
                .with_context(|| format!("failed to parse level plan {}", path.display()))?;
            let plan = match args.seed {
                Some(seed) => plan.with_seed(seed),
                None => plan,
            };
            plan.resolve()
                .with_context(|| format!("invalid level plan {}", path.display()))?
        }
        None => bootstrap
            .preset(args.level, args.seed)
            .with_context(|| format!("failed to prepare level {}", args.level))?,
    };

    let world = World::new();
    println!("{}", bootstrap.welcome_banner(&world));
    println!("{}", level.name());

    let config = SessionConfig {
        frame: Duration::from_millis(args.frame_ms),
        scan_every: args.scan_every,
        agents: AgentConfig {
            replan: args.replan.into(),
            ..AgentConfig::default()
        },
    };
    let mut session = Session::start(world, &level, config)
        .context("failed to configure fog of war for the level")?;
    info!(frames = args.frames, frame_ms = args.frame_ms, "running level");

    for frame in 1..=args.frames {
        session.advance();
        if args.render_every > 0 && frame % args.render_every == 0 {
            println!("{}", render::frame(&session));
        }
        if session.outcome().is_some() {
            break;
        }
    }

    if args.render_every == 0 {
        println!("{}", render::frame(&session));
    }
    println!("{}", render::summary(&session));
    Ok(())
}
