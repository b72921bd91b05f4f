//! Rolling Cube - headless driver
//!
//! Runs the puzzle core without a window. An autopilot picks the next roll by
//! breadth-first search towards the goal over plain floor tiles, the game
//! advances in fixed 1/60 s frames, and a summary is printed when the frame
//! limit runs out or Ctrl-C is pressed.
//!
//! # Usage
//! ```text
//! rolling-cube --seed 42 --frames 6000 --dump-dir levels/
//! RUST_LOG=debug rolling-cube --config my-config.json
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use rand::{Rng, SeedableRng, rngs::SmallRng};
use rolling_cube::game::layout::save_layout;
use rolling_cube::game::tiles::TileLookup;
use rolling_cube::math::coordinates::{Direction, adjacent_cell};
use rolling_cube::maze::Cell;
use rolling_cube::{Game, GameConfig, GameEvent, HeadlessHost, TileKind};
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

/// Fixed simulation step.
const FRAME: f32 = 1.0 / 60.0;

#[derive(Parser, Debug)]
#[command(
    name = "rolling-cube",
    version,
    about = "Play the rolling-cube puzzle headless with an autopilot"
)]
struct Cli {
    /// JSON game configuration; missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for level generation.
    #[arg(long)]
    seed: Option<u64>,
    /// Side length of every level grid.
    #[arg(long)]
    grid_size: Option<usize>,
    /// Number of 1/60 s frames to simulate.
    #[arg(long, default_value_t = 3_600)]
    frames: u64,
    /// Write every generated level layout into this directory.
    #[arg(long)]
    dump_dir: Option<PathBuf>,
}

#[derive(Debug, Default)]
struct Summary {
    frames: u64,
    steps: u32,
    teleports: u32,
    slides: u32,
    crumbles: u32,
    restarts: u32,
    goals: u32,
    highest_level: u32,
}

impl Summary {
    fn record(&mut self, event: &GameEvent) {
        match event {
            GameEvent::StepStarted { .. } => self.steps += 1,
            GameEvent::Teleported { .. } => self.teleports += 1,
            GameEvent::SlideStarted { .. } => self.slides += 1,
            GameEvent::CrumbleArmed { .. } => self.crumbles += 1,
            GameEvent::Restarted => self.restarts += 1,
            GameEvent::GoalReached { .. } => self.goals += 1,
            GameEvent::LevelBuilt { level, .. } => {
                self.highest_level = self.highest_level.max(*level);
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    init_tracing();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
            .context("failed to install Ctrl-C handler")?;
    }

    let mut autopilot = SmallRng::seed_from_u64(config.rng_seed.unwrap_or_default() ^ 0x5EED);
    let mut game = Game::new(config, HeadlessHost::new())?;
    let mut summary = Summary::default();
    info!(frames = cli.frames, "starting headless run");

    for _ in 0..cli.frames {
        if !running.load(Ordering::SeqCst) {
            warn!("interrupted");
            break;
        }
        if game.is_idle() {
            let direction = next_direction(&game, &mut autopilot);
            game.request_step(direction);
        }
        game.tick(FRAME)?;
        summary.frames += 1;

        for event in game.drain_events() {
            debug!(?event, "game event");
            summary.record(&event);
            if let GameEvent::LevelBuilt { level, .. } = event {
                if let Some(dir) = &cli.dump_dir {
                    if game.current_level() == level {
                        let path = save_layout(dir, level, &game.level().to_text())
                            .with_context(|| format!("failed to dump level {level}"))?;
                        info!(level, path = %path.display(), "level layout saved");
                    }
                }
            }
        }
    }

    println!("Rolling Cube headless run");
    println!("{}", "=".repeat(40));
    println!("frames simulated : {}", summary.frames);
    println!("game time        : {:.2}s", game.elapsed());
    println!("steps            : {}", summary.steps);
    println!("teleports        : {}", summary.teleports);
    println!("slides           : {}", summary.slides);
    println!("crumbles         : {}", summary.crumbles);
    println!("goals reached    : {}", summary.goals);
    println!("restarts         : {}", summary.restarts);
    println!("highest level    : {}", summary.highest_level);
    println!("current level    : {}", game.current_level());
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn load_config(cli: &Cli) -> Result<GameConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => GameConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.rng_seed = Some(seed);
    }
    if let Some(grid_size) = cli.grid_size {
        config.grid_size = grid_size;
    }
    config.validate()?;
    Ok(config)
}

/// First roll of a shortest path to the goal over regular tiles, or a random
/// roll onto anything but a spike when there is no such path.
fn next_direction(game: &Game, rng: &mut SmallRng) -> Direction {
    let level = game.level();
    let start = game.actor_cell();
    let goal = level.goal_cell();
    let walkable = |cell: Cell| cell == goal || level.tile_at(cell) == Some(TileKind::Regular);

    let mut first_step: HashMap<Cell, Direction> = HashMap::new();
    let mut queue = VecDeque::from([start]);
    while let Some(cell) = queue.pop_front() {
        if cell == goal {
            if let Some(direction) = first_step.get(&cell) {
                return *direction;
            }
            break;
        }
        for direction in Direction::ALL {
            let next = adjacent_cell(cell, direction);
            if next == start || first_step.contains_key(&next) || !walkable(next) {
                continue;
            }
            let first = first_step.get(&cell).copied().unwrap_or(direction);
            first_step.insert(next, first);
            queue.push_back(next);
        }
    }

    let safe: Vec<Direction> = Direction::ALL
        .into_iter()
        .filter(|direction| {
            level
                .tile_at(adjacent_cell(start, *direction))
                .is_some_and(|kind| kind != TileKind::Spike)
        })
        .collect();
    if safe.is_empty() {
        Direction::ALL[rng.gen_range(0..Direction::ALL.len())]
    } else {
        safe[rng.gen_range(0..safe.len())]
    }
}
