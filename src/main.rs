//! # Delve Headless Driver
//!
//! Seeded generation and a scripted demo run for inspecting the simulation
//! core from the command line. This is a smoke-test surface, not a game
//! client: rendering and interactive input live downstream.

use clap::Parser;
use delve::{
    CombatCommand, DelveResult, Direction, DungeonGenerator, GameSession, GenerationConfig,
    Generator, Position, RunCompletion,
};
use log::{info, LevelFilter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Command line arguments for the Delve driver.
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(about = "Turn-based dungeon crawler simulation core")]
#[command(version)]
struct Args {
    /// Random seed for the run
    #[arg(short, long, default_value_t = 12345)]
    seed: u64,

    /// Generate and inspect a single depth instead of running the demo
    #[arg(short, long)]
    depth: Option<u32>,

    /// World ticks to simulate in the scripted demo run
    #[arg(short, long, default_value_t = 2400)]
    ticks: u32,

    /// Print generated levels as ASCII maps
    #[arg(long)]
    dump_map: bool,

    /// Print a JSON snapshot of the final session state
    #[arg(long)]
    snapshot: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> DelveResult<()> {
    let args = Args::parse();
    initialize_logging(&args.log_level);

    info!("delve v{} starting with seed {}", delve::VERSION, args.seed);

    if let Some(depth) = args.depth {
        return inspect_depth(&args, depth);
    }
    run_demo(&args)
}

fn initialize_logging(log_level: &str) {
    let level = match log_level.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

/// Generates one level and prints its summary.
fn inspect_depth(args: &Args, depth: u32) -> DelveResult<()> {
    let config = GenerationConfig::new();
    let mut rng = StdRng::seed_from_u64(args.seed);
    let state = DungeonGenerator::new().generate(depth, &config, &mut rng)?;

    println!(
        "depth {}: {} rooms, {} enemies, {} items, entrance {:?}, exit {:?}",
        state.depth,
        state.rooms.len(),
        state.enemies.len(),
        state.items.len(),
        state.entrance,
        state.exit
    );
    if args.dump_map {
        print!("{}", state.grid.to_ascii());
    }
    if args.snapshot {
        println!("{}", serde_json::to_string_pretty(&state)?);
    }
    Ok(())
}

/// Scripted demo: a greedy walker descends toward each level's stairs,
/// auto-attacking through any encounter it stumbles into.
fn run_demo(args: &Args) -> DelveResult<()> {
    let mut session = GameSession::new(args.seed)?;
    let mut walker_rng = StdRng::seed_from_u64(args.seed.wrapping_add(1));

    if args.dump_map {
        print!("{}", session.grid().to_ascii());
    }

    for _ in 0..args.ticks {
        if session.completion() != RunCompletion::Delving {
            break;
        }
        if session.in_combat() {
            autoplay_combat(&mut session)?;
            continue;
        }

        session.tick()?;
        if session.in_combat() || session.completion() != RunCompletion::Delving {
            continue;
        }

        let depth_before = session.depth();
        let direction = walker_direction(&session, &mut walker_rng);
        let _ = session.handle_move_intent(direction)?;
        if args.dump_map && session.depth() != depth_before {
            print!("{}", session.grid().to_ascii());
        }
    }

    let stats = session.run_stats();
    println!(
        "run ended at depth {} ({:?}): {} enemies defeated, {} items, {} steps, {} levels cleared, {} flees",
        session.depth(),
        session.completion(),
        stats.enemies_defeated,
        stats.items_collected,
        stats.steps_taken,
        stats.levels_cleared,
        stats.flees
    );
    if args.snapshot {
        println!("{}", serde_json::to_string_pretty(&session)?);
    }
    Ok(())
}

/// One auto-played party action: attack the first living enemy.
fn autoplay_combat(session: &mut GameSession) -> DelveResult<()> {
    let target = session
        .combat()
        .and_then(|combat| combat.enemies().iter().position(|e| e.alive));
    if let Some(target) = target {
        session.combat_command(CombatCommand::Attack { target })?;
    }
    Ok(())
}

/// Axis-greedy step toward the stairs, with a random nudge so the walker
/// can slip out of dead ends.
fn walker_direction(session: &GameSession, rng: &mut StdRng) -> Direction {
    if rng.gen_bool(0.2) {
        let all = Direction::all();
        return all[rng.gen_range(0..all.len())];
    }
    let here = session.player().position;
    let exit = session.exit();
    let delta = Position::new(exit.x - here.x, exit.y - here.y);
    if delta.x.abs() > delta.y.abs() {
        if delta.x > 0 {
            Direction::East
        } else {
            Direction::West
        }
    } else if delta.y > 0 {
        Direction::South
    } else {
        Direction::North
    }
}
