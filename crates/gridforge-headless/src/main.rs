//! Headless runner: builds or loads a factory, runs it at a fixed frame
//! rate without rendering, and prints a report.
//!
//! ```text
//! gridforge-headless [--config PATH] [--seconds N] [--fps N] [--save PATH] [--load PATH]
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gridforge_core::fixed::fixed64_to_f64;
use gridforge_core::id::{BuildingKind, Resource};
use gridforge_sim::{Engine, GameConfig, GameEvent};
use gridforge_spatial::GridPosition;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Run a factory without a renderer and print what it produced.
#[derive(Debug, Parser)]
#[command(name = "gridforge-headless")]
#[command(about = "Run a gridforge factory headless and print a report")]
struct Args {
    /// New-game config (.ron, .toml or .json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulated seconds to run
    #[arg(long, default_value_t = 60.0, value_parser = parse_seconds)]
    seconds: f64,

    /// Frames per simulated second
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    fps: u32,

    /// Write a bitcode save here when the run ends
    #[arg(long)]
    save: Option<PathBuf>,

    /// Resume from a bitcode save; an unreadable save starts a new game
    #[arg(long)]
    load: Option<PathBuf>,
}

fn parse_seconds(s: &str) -> Result<f64, String> {
    let secs: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("expected a non-negative number of seconds, got {s}"));
    }
    Ok(secs)
}

const LINE: [(i32, BuildingKind); 3] = [
    (0, BuildingKind::IronMiner),
    (1, BuildingKind::Conveyor),
    (2, BuildingKind::Submitter),
];

/// Lines the runner builds before it starts saving iron for research.
const MAX_LINES: i32 = 4;

fn line_cell(spawn: GridPosition, dx: i32, row: i32) -> GridPosition {
    GridPosition::new(spawn.x + dx, spawn.y + row * 2)
}

/// First row at or after `row` whose line cells are all empty.
fn next_free_row(engine: &Engine, spawn: GridPosition, mut row: i32) -> i32 {
    while LINE
        .iter()
        .any(|&(dx, _)| engine.grid().has_building(line_cell(spawn, dx, row)))
    {
        row += 1;
    }
    row
}

/// Build a miner -> belt -> submitter line on `row` below the spawn point
/// if the whole line is affordable.
fn place_line(engine: &mut Engine, spawn: GridPosition, row: i32) -> bool {
    let iron: u32 = LINE
        .iter()
        .flat_map(|&(_, kind)| engine.catalog().get(kind).cost.entries().to_vec())
        .filter(|&(r, _)| r == Resource::Iron)
        .map(|(_, n)| n)
        .sum();
    if !engine.ledger().can_afford(&[(Resource::Iron, iron)]) {
        return false;
    }
    for &(dx, kind) in &LINE {
        engine.select(kind);
        if engine.place_selected(line_cell(spawn, dx, row)).is_err() {
            return false;
        }
    }
    engine.clear_selection();
    true
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GameConfig::default(),
    };

    let save_data = match &args.load {
        Some(path) => Some(std::fs::read(path).with_context(|| format!("reading {}", path.display()))?),
        None => None,
    };
    let mut engine = Engine::restore_or_fresh(save_data.as_deref(), config)?;

    let fps = args.fps;
    let frames = (args.seconds * fps as f64).round() as u64;
    let dt = 1.0 / fps as f64;
    info!(seconds = args.seconds, fps, frames, "starting headless run");

    let spawn = engine.spawn();
    let mut row = 0;
    let mut collected = 0u64;
    for frame in 0..frames {
        if frame % fps as u64 == 0 {
            if engine.research().requirements_met(engine.ledger()).is_ok() {
                let _ = engine.advance_research();
            }
            row = next_free_row(&engine, spawn, row);
            if row < MAX_LINES && place_line(&mut engine, spawn, row) {
                row += 1;
            }
        }
        engine.advance_secs(dt);
        collected += engine
            .drain_events()
            .iter()
            .filter(|e| matches!(e, GameEvent::ItemCollected { .. }))
            .count() as u64;
    }

    report(&engine, collected);

    if let Some(path) = &args.save {
        let bytes = engine.to_bytes()?;
        std::fs::write(path, &bytes).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), bytes = bytes.len(), "save written");
    }
    Ok(())
}

fn report(engine: &Engine, collected: u64) {
    let clock = engine.clock();
    println!(
        "Simulated {:.2}s over {} ticks | buildings: {} | items in transit: {} | collected: {}",
        fixed64_to_f64(clock.elapsed),
        clock.tick,
        engine.buildings().len(),
        engine.items().len(),
        collected
    );

    println!("Resources:");
    for (resource, amount) in engine.resources() {
        if engine.ledger().is_discovered(resource) {
            println!("  {:<12} {:>10.2}", resource.display_name(), fixed64_to_f64(amount));
        }
    }

    let research = engine.research_status();
    println!(
        "Research | level {}/{} | points {} | goal {:.0}%",
        research.level,
        research.max_level,
        research.progress,
        fixed64_to_f64(research.goal_progress) * 100.0
    );

    let power = engine.power_status();
    println!(
        "Power | production {:.1} | consumption {:.1} | efficiency {:.0}%{}",
        fixed64_to_f64(power.production),
        fixed64_to_f64(power.consumption),
        fixed64_to_f64(power.efficiency) * 100.0,
        if power.brownout { " | BROWNOUT" } else { "" }
    );
}
