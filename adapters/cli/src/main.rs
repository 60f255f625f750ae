#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays the Spirit Crypt headlessly.
//!
//! The built-in demo dungeon is generated from a seed, a script of
//! single-character commands is fed to the scheduler, and the resulting map,
//! status line and message log are printed.

mod config;
mod demo;
mod script;
mod view;

use std::{path::PathBuf, rc::Rc};

use anyhow::{Context, Result};
use clap::Parser;
use spirit_crypt_system_generation::{Config as GenerationConfig, DungeonGenerator};
use spirit_crypt_system_turns::{Config as TurnsConfig, Game};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::ConfigFile;

/// Command-line arguments of the headless driver.
#[derive(Debug, Parser)]
#[command(name = "spirit-crypt", version)]
#[command(about = "Plays a scripted run through the Spirit Crypt")]
#[command(after_help = script::SCRIPT_HELP)]
struct Cli {
    /// TOML file overriding the built-in tunables.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Seed for level generation and every roll.
    #[arg(long)]
    seed: Option<u64>,
    /// Room slot columns per level.
    #[arg(long)]
    rooms_x: Option<i32>,
    /// Room slot rows per level.
    #[arg(long)]
    rooms_y: Option<i32>,
    /// Commands to play, one character each.
    #[arg(short, long, default_value = "")]
    script: String,
    /// Print the map after every command, not only at the end.
    #[arg(long)]
    every_turn: bool,
}

/// Entry point for the Spirit Crypt command-line interface.
fn main() -> Result<()> {
    init_tracing();
    run(&Cli::parse())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let mut generation = GenerationConfig::default();
    let mut turns = TurnsConfig::default();
    if let Some(path) = &cli.config {
        ConfigFile::load(path)?.apply(&mut generation, &mut turns);
    }
    if let Some(seed) = cli.seed {
        turns.seed = seed;
    }
    if let Some(rooms_x) = cli.rooms_x {
        generation.rooms_x = rooms_x;
    }
    if let Some(rooms_y) = cli.rooms_y {
        generation.rooms_y = rooms_y;
    }

    let commands = script::parse(&cli.script)?;
    let generator = DungeonGenerator::new(generation, demo::library(), Rc::new(demo::catalog()))
        .context("invalid generation config")?;
    let mut game = Game::new(turns, generator).context("failed to generate the first level")?;

    let mut events = Vec::new();
    for (turn, command) in commands.into_iter().enumerate() {
        if game.outcome().is_some() {
            info!(turn, "script_stopped_after_outcome");
            break;
        }
        game.submit(command, &mut events)
            .with_context(|| format!("failed to resolve command {}", turn + 1))?;
        for event in events.drain(..) {
            debug!(turn, ?event, "turn_event");
        }
        if cli.every_turn {
            println!("{}", view::render(&game));
        }
    }

    print!("{}", view::render(&game));
    println!("{}", view::status(&game));
    for line in game.messages().lines() {
        println!("{}", line.text);
    }
    for line in game.prompt_lines() {
        println!("{line}");
    }
    if let Some(outcome) = game.outcome() {
        println!("{}", view::outcome(outcome));
    }
    Ok(())
}
