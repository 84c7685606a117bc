use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use meeple_tiles::engine::bot_profiles::{load_default_profiles, load_profiles};
use meeple_tiles::engine::bot_strategy::BotStrategy;
use meeple_tiles::engine::models::{Event, GameConfig};
use meeple_tiles::engine::simulator::play_game_with_events;

#[derive(Parser)]
#[command(name = "meeple-tiles", about = "Play one bot-only tile-placement game")]
struct Cli {
    /// Number of seats (1-5)
    #[arg(short = 'n', long, default_value = "2", env = "MEEPLE_PLAYERS")]
    players: usize,

    /// Seed for the deck and the bots (random when omitted)
    #[arg(long, env = "MEEPLE_SEED")]
    seed: Option<u64>,

    /// Keep only the first N tiles of the shuffled deck
    #[arg(long)]
    tile_limit: Option<usize>,

    /// Profile (or difficulty tier) played by every seat
    #[arg(long, default_value = "hard")]
    profile: String,

    /// Path to bot_profiles.toml (default: auto-discover)
    #[arg(long, env = "MEEPLE_BOT_PROFILES")]
    profiles: Option<PathBuf>,

    /// Write every game event as one JSON object per line
    #[arg(long)]
    events: Option<PathBuf>,
}

fn write_event(out: &mut impl Write, event: &Event) -> std::io::Result<()> {
    serde_json::to_writer(&mut *out, event)?;
    writeln!(out)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let profiles = match &cli.profiles {
        Some(path) => load_profiles(path)?,
        None => load_default_profiles(),
    };
    let profile = profiles
        .get(&cli.profile)
        .ok_or_else(|| format!("unknown profile '{}'", cli.profile))?;

    let config = GameConfig {
        num_players: cli.players,
        num_bots: cli.players,
        random_seed: cli.seed,
        tile_limit: cli.tile_limit,
    };
    let base_seed = cli.seed.unwrap_or_else(rand::random);
    let mut strategies = (0..cli.players.max(1))
        .map(|seat| profile.build_strategy(base_seed.wrapping_add(seat as u64)))
        .collect::<Result<Vec<Box<dyn BotStrategy>>, _>>()?;

    let mut log = cli.events.as_ref().map(File::create).transpose()?.map(BufWriter::new);
    let mut write_error = None;
    let result = play_game_with_events(&config, &mut strategies, |event| {
        if write_error.is_some() {
            return;
        }
        if let Some(out) = log.as_mut() {
            if let Err(e) = write_event(out, event) {
                write_error = Some(e);
            }
        }
    })?;
    if let Some(e) = write_error {
        return Err(e.into());
    }
    if let Some(mut out) = log {
        out.flush()?;
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
