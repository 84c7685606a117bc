//! Arena CLI: run bot-vs-bot experiments from the command line.
//!
//! Usage:
//!   cargo run --release --bin arena -- --games 100 --p1-profile hard --p2-profile easy
//!   cargo run --release --bin arena -- --games 50 --p1-jitter 0 --p2-type random --p2-meeple-chance 0.5

use std::path::PathBuf;
use std::process::exit;

use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use meeple_tiles::engine::arena::{run_arena, StrategyFactory};
use meeple_tiles::engine::bot_profiles::{load_default_profiles, load_profiles, BotProfile, BotProfilesFile};
use meeple_tiles::engine::bot_strategy::BotStrategy;

#[derive(Parser)]
#[command(name = "arena", about = "Run bot-vs-bot arena experiments")]
struct Cli {
    /// Number of games to play
    #[arg(long, default_value = "100")]
    games: usize,

    /// Random seed
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Rotate seat positions between games
    #[arg(long, default_value = "true", action = clap::ArgAction::Set)]
    alternate_seats: bool,

    /// Keep only the first N tiles of each shuffled deck
    #[arg(long)]
    tile_limit: Option<usize>,

    /// Path to bot_profiles.toml
    #[arg(long, env = "MEEPLE_BOT_PROFILES")]
    profiles: Option<PathBuf>,

    // --- Player 1 ---
    /// P1 display name
    #[arg(long, default_value = "p1")]
    p1_name: String,

    /// P1 profile name (from bot_profiles.toml)
    #[arg(long)]
    p1_profile: Option<String>,

    /// P1 strategy type: "greedy" or "random"
    #[arg(long, default_value = "greedy")]
    p1_type: String,

    /// P1 evaluation noise amplitude
    #[arg(long)]
    p1_jitter: Option<f64>,

    /// P1 meeple chance (random bot)
    #[arg(long)]
    p1_meeple_chance: Option<f64>,

    // --- Player 2 ---
    /// P2 display name
    #[arg(long, default_value = "p2")]
    p2_name: String,

    /// P2 profile name (from bot_profiles.toml)
    #[arg(long)]
    p2_profile: Option<String>,

    /// P2 strategy type: "greedy" or "random"
    #[arg(long, default_value = "greedy")]
    p2_type: String,

    /// P2 evaluation noise amplitude
    #[arg(long)]
    p2_jitter: Option<f64>,

    /// P2 meeple chance (random bot)
    #[arg(long)]
    p2_meeple_chance: Option<f64>,
}

struct PlayerArgs<'a> {
    name: &'a str,
    profile: Option<&'a str>,
    strategy_type: &'a str,
    jitter: Option<f64>,
    meeple_chance: Option<f64>,
}

/// Start from the named profile, if any, and apply CLI overrides on top.
fn build_player(args: PlayerArgs<'_>, profiles: &BotProfilesFile) -> (String, BotProfile) {
    let Some(prof_name) = args.profile else {
        let profile = BotProfile {
            description: None,
            strategy_type: args.strategy_type.to_string(),
            jitter: args.jitter,
            meeple_chance: args.meeple_chance,
        };
        return (args.name.to_string(), profile);
    };

    let mut profile = match profiles.get(prof_name) {
        Some(p) => p.clone(),
        None => {
            eprintln!("Error: profile '{}' not found", prof_name);
            eprintln!("Available profiles: {:?}", profiles.profiles.keys().collect::<Vec<_>>());
            exit(1);
        }
    };
    if args.jitter.is_some() {
        profile.jitter = args.jitter;
    }
    if args.meeple_chance.is_some() {
        profile.meeple_chance = args.meeple_chance;
    }

    let display_name = if args.name == "p1" || args.name == "p2" { prof_name } else { args.name };
    (display_name.to_string(), profile)
}

fn print_config(name: &str, profile: &BotProfile) {
    match profile.strategy_type.as_str() {
        "random" => eprintln!("  {}: type=random, meeple_chance={:?}", name, profile.meeple_chance),
        other => eprintln!("  {}: type={}, jitter={}", name, other, profile.eval_params().jitter),
    }
}

fn factory(profile: BotProfile) -> StrategyFactory {
    Box::new(move |seed| -> Box<dyn BotStrategy> {
        // Every profile is built once in main before the arena starts.
        match profile.build_strategy(seed) {
            Ok(s) => s,
            Err(e) => unreachable!("{e}"),
        }
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(LevelFilter::WARN.into()))
        .init();

    let cli = Cli::parse();

    let profiles = match &cli.profiles {
        Some(path) => load_profiles(path).unwrap_or_else(|e| {
            eprintln!("Error loading profiles: {}", e);
            exit(1);
        }),
        None => load_default_profiles(),
    };

    let mut players = vec![
        build_player(
            PlayerArgs {
                name: &cli.p1_name,
                profile: cli.p1_profile.as_deref(),
                strategy_type: &cli.p1_type,
                jitter: cli.p1_jitter,
                meeple_chance: cli.p1_meeple_chance,
            },
            &profiles,
        ),
        build_player(
            PlayerArgs {
                name: &cli.p2_name,
                profile: cli.p2_profile.as_deref(),
                strategy_type: &cli.p2_type,
                jitter: cli.p2_jitter,
                meeple_chance: cli.p2_meeple_chance,
            },
            &profiles,
        ),
    ];
    if players[0].0 == players[1].0 {
        players[1].0.push_str("_2");
    }

    eprintln!("Arena: {} games, seed={}, alternate_seats={}", cli.games, cli.seed, cli.alternate_seats);
    for (name, profile) in &players {
        if let Err(e) = profile.build_strategy(0) {
            eprintln!("Error: {}: {}", name, e);
            exit(1);
        }
        print_config(name, profile);
    }
    eprintln!();

    let entries: Vec<(String, StrategyFactory)> =
        players.into_iter().map(|(name, profile)| (name, factory(profile))).collect();

    let total = cli.games;
    let progress_cb = move |done: usize, _total: usize| {
        eprint!("\r  [{}/{}] games completed", done, total);
    };

    let result = run_arena(&entries, cli.games, cli.seed, cli.tile_limit, cli.alternate_seats, Some(&progress_cb));

    eprintln!("\r                                    ");
    println!("{}", result.summary());
}
