//! # Crust Demo Entry Point
//!
//! Runs the demo content headlessly: loads a map, talks to the NPC in front
//! of the hero (which leads into a battle), then prints the transcript.

use clap::Parser;
use crust::config::FRAME;
use crust::{
    Content, CrustResult, Direction, HeadlessPresenter, Key, Overworld, OverworldOptions,
    Position, Progress, HERO_ID,
};
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
#[cfg(feature = "dev-tools")]
use tracing::Level;

/// Command line arguments for the Crust demo.
#[derive(Parser, Debug)]
#[command(name = "crust")]
#[command(about = "Headless overworld and pizza battle engine demo")]
#[command(version)]
struct Args {
    /// Random seed for battle decisions
    #[arg(short, long)]
    seed: Option<u64>,

    /// Map to start on
    #[arg(long, default_value = "DemoRoom")]
    map: String,

    /// Content JSON file; the built-in demo content is used if omitted
    #[arg(long)]
    content: Option<PathBuf>,

    /// Save file written when the demo ends
    #[arg(long)]
    save_file: Option<PathBuf>,

    /// Resume from the save file instead of starting fresh
    #[arg(long = "continue")]
    resume: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Simulation ticks to run before exiting
    #[arg(long, default_value_t = 900)]
    ticks: u32,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    if let Err(err) = initialize_logging(&args.log_level) {
        eprintln!("Failed to initialize logging: {}", err);
    }
    info!("Starting Crust v{}", crust::VERSION);

    if let Err(err) = run_demo(&args).await {
        error!("Demo failed: {}", err);
        std::process::exit(1);
    }
}

/// Initializes the logging system based on the specified log level.
fn initialize_logging(log_level: &str) -> CrustResult<()> {
    #[cfg(feature = "dev-tools")]
    {
        let level = match log_level.to_lowercase().as_str() {
            "error" => Level::ERROR,
            "warn" => Level::WARN,
            "info" => Level::INFO,
            "debug" => Level::DEBUG,
            "trace" => Level::TRACE,
            _ => Level::INFO,
        };

        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .init();
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        env_logger::Builder::new()
            .parse_filters(log_level)
            .format_target(false)
            .init();
    }

    Ok(())
}

async fn run_demo(args: &Args) -> CrustResult<()> {
    let content = match &args.content {
        Some(path) => Content::load(path)?,
        None => Content::demo(),
    };
    let seed = args.seed.unwrap_or(12345);
    info!("Using seed {}", seed);

    let mut options = OverworldOptions::new(&args.map).with_seed(seed);
    if args.map == "DemoRoom" {
        // One tile above npcA, facing it.
        options = options.with_hero(Position::from_grid(7, 8), Direction::Down);
    }
    if let Some(path) = &args.save_file {
        options = options.with_save_file(path, args.resume);
    }

    let presenter = Arc::new(HeadlessPresenter::new().with_dismiss_delay(Duration::from_millis(50)));
    let world = Overworld::new(Arc::new(content), presenter.clone(), options)?;
    world.init()?;

    tokio::time::sleep(Duration::from_millis(100)).await;
    world.press_key(Key::Enter);
    world.release_key(Key::Enter);

    tokio::time::sleep(FRAME * args.ticks).await;
    world.shutdown();

    if let Some(path) = &args.save_file {
        let hero = world.actor(HERO_ID)?;
        let map_id = world.map_id().unwrap_or_else(|| args.map.clone());
        Progress::new(map_id, hero.position, hero.direction, world.player().snapshot()).save(path)?;
        info!("Progress saved to {}", path.display());
    }

    for line in presenter.transcript() {
        println!("{}", line);
    }
    println!("frames drawn: {}", presenter.frame_count());
    Ok(())
}
