//! ai-sim - run demo enemy archetypes headless.
//!
//! - `ai-sim run --archetype brute --frames 600` - simulate one enemy against a target dummy
//! - `ai-sim describe archer` - print an archetype's tree outline
//! - `ai-sim list` - list the demo archetypes

mod archetypes;
mod world;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ai_bt::{Brain, BrainConfig, BtStatus};
use ai_core::{AgentFacade, SharedAgent, SharedEffects, SharedTarget, Vec2};
use ai_patterns::PatternTuning;
use ai_tools::{TraceLog, TRACE_LOG};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use world::{shared, SimAgent, SimScene, SimTarget};

#[derive(Parser)]
#[command(name = "ai-sim")]
#[command(about = "Run behavior-tree enemies frame by frame", version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate one enemy against a stationary target
    Run {
        #[arg(short, long, default_value = "brute")]
        archetype: String,

        /// Number of frames to simulate
        #[arg(short, long, default_value_t = 600)]
        frames: u32,

        /// Frame delta in milliseconds
        #[arg(long, default_value_t = 16)]
        dt_ms: u64,

        /// Seed for random and weighted choices
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Think every N frames
        #[arg(long, default_value_t = 1)]
        think_every: u32,

        /// Damage per second the enemy takes from the target
        #[arg(long, default_value_t = 0.0)]
        incoming_dps: f32,

        /// YAML file with per-pattern priority and cooldown overrides
        #[arg(long)]
        tuning: Option<PathBuf>,

        /// Brain config as YAML, overriding the flags above
        #[arg(long)]
        brain: Option<PathBuf>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print an archetype's tree outline
    Describe { archetype: String },

    /// List demo archetypes
    List,
}

#[derive(Debug, Serialize)]
struct RunSummary {
    archetype: String,
    frames: u32,
    elapsed_ms: u64,
    statuses: BTreeMap<&'static str, u32>,
    final_state: String,
    final_health: f32,
    final_position: Vec2,
    agent_events: BTreeMap<String, u32>,
    scene: SimScene,
    trace: BTreeMap<String, usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    if cli.json_logs {
        fmt().json().with_env_filter(filter).init();
    } else {
        fmt().with_env_filter(filter).with_target(false).init();
    }

    match cli.command {
        Commands::Run {
            archetype,
            frames,
            dt_ms,
            seed,
            think_every,
            incoming_dps,
            tuning,
            brain,
            json,
        } => {
            let tuning = match tuning {
                Some(path) => PatternTuning::load(&path)?,
                None => PatternTuning::default(),
            };
            let config = match brain {
                Some(path) => load_brain_config(&path)?,
                None => BrainConfig {
                    think_every_ticks: think_every,
                    seed,
                    ..BrainConfig::default()
                },
            };
            let opts = RunOptions {
                frames,
                dt: Duration::from_millis(dt_ms),
                incoming_dps,
            };
            let summary = run(&archetype, &tuning, config, &opts)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
            Ok(())
        }
        Commands::Describe { archetype } => {
            let built = archetypes::build(&archetype, &PatternTuning::default())?;
            print!("{}", built.tree.describe());
            Ok(())
        }
        Commands::List => {
            for name in archetypes::ARCHETYPES {
                println!("{name}");
            }
            Ok(())
        }
    }
}

struct RunOptions {
    frames: u32,
    dt: Duration,
    incoming_dps: f32,
}

fn load_brain_config(path: &Path) -> Result<BrainConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read brain config from {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse brain config from {}", path.display()))
}

fn run(
    name: &str,
    tuning: &PatternTuning,
    config: BrainConfig,
    opts: &RunOptions,
) -> Result<RunSummary> {
    let built = archetypes::build(name, tuning)?;
    tracing::info!(archetype = name, frames = opts.frames, "starting simulation");

    let agent = shared(SimAgent::new(name, built.stats, Vec2::new(0.0, 0.0)));
    let scene = shared(SimScene::default());
    let target = SimTarget {
        position: Vec2::new(14.0, 3.0),
    };

    let agent_handle: SharedAgent = agent.clone();
    let scene_handle: SharedEffects = scene.clone();
    let target_handle: SharedTarget = std::rc::Rc::new(target);

    let mut brain = Brain::new(built.tree, config)
        .with_agent(agent_handle)
        .with_target(target_handle)
        .with_effects(scene_handle);
    brain.tree_mut().blackboard_mut().set(TRACE_LOG, TraceLog::default());

    let mut statuses: BTreeMap<&'static str, u32> = BTreeMap::new();
    let dt_seconds = opts.dt.as_secs_f32();
    for frame in 0..opts.frames {
        {
            let mut agent = agent.borrow_mut();
            agent.step = agent.stats.speed * dt_seconds;
            agent.take_damage(opts.incoming_dps * dt_seconds);
        }

        let status = brain.update(opts.dt);
        *statuses.entry(status_name(status)).or_default() += 1;

        if agent.borrow().is_dead() {
            tracing::info!(frame, "agent died");
            break;
        }
    }

    let trace = brain
        .tree()
        .blackboard()
        .get(TRACE_LOG)
        .map(|log| {
            let mut counts = BTreeMap::new();
            for event in &log.events {
                *counts.entry(event.tag.to_string()).or_default() += 1;
            }
            counts
        })
        .unwrap_or_default();

    let agent = agent.borrow();
    let scene = std::mem::take(&mut *scene.borrow_mut());
    Ok(RunSummary {
        archetype: name.to_owned(),
        frames: statuses.values().sum(),
        elapsed_ms: brain.now().as_millis() as u64,
        statuses,
        final_state: agent.state.clone(),
        final_health: agent.stats.health,
        final_position: agent.position,
        agent_events: agent.events.clone(),
        scene,
        trace,
    })
}

fn status_name(status: BtStatus) -> &'static str {
    match status {
        BtStatus::Running => "running",
        BtStatus::Success => "success",
        BtStatus::Failure => "failure",
    }
}

fn print_summary(summary: &RunSummary) {
    println!("archetype: {}", summary.archetype);
    println!("frames:    {} ({} ms)", summary.frames, summary.elapsed_ms);
    for (status, count) in &summary.statuses {
        println!("  {status:<8} {count}");
    }
    println!("state:     {}", summary.final_state);
    println!("health:    {:.1}", summary.final_health);
    println!(
        "position:  ({:.2}, {:.2})",
        summary.final_position.x, summary.final_position.y
    );
    println!("events:");
    for (kind, count) in &summary.agent_events {
        println!("  {kind:<8} {count}");
    }
    println!("effects:");
    for (kind, count) in &summary.scene.effects {
        println!("  {kind:<12} {count}");
    }
    println!("trace:");
    for (tag, count) in &summary.trace {
        println!("  {tag:<18} {count}");
    }
}
