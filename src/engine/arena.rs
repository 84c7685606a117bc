//! Bot-vs-bot arena runner. Games are independent and run in parallel.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;

use crate::engine::bot_strategy::BotStrategy;
use crate::engine::models::GameConfig;
use crate::engine::simulator::play_game;
use crate::games::carcassonne::types::MeepleColor;

/// Builds a fresh strategy for one seat of one game from a seed.
pub type StrategyFactory = Box<dyn Fn(u64) -> Box<dyn BotStrategy> + Send + Sync>;

/// Aggregated results from an arena run.
#[derive(Debug, Clone, Default)]
pub struct ArenaResult {
    pub num_games: usize,
    pub wins: HashMap<String, usize>,
    pub draws: usize,
    /// Games that ended with an engine error.
    pub failed: usize,
    pub total_scores: HashMap<String, Vec<f64>>,
    pub game_durations_ms: Vec<f64>,
}

impl ArenaResult {
    fn scores(&self, name: &str) -> &[f64] {
        self.total_scores.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn win_rate(&self, name: &str) -> f64 {
        let wins = self.wins.get(name).copied().unwrap_or(0);
        wins as f64 / self.num_games.max(1) as f64
    }

    pub fn avg_score(&self, name: &str) -> f64 {
        let scores = self.scores(name);
        if scores.is_empty() {
            return 0.0;
        }
        scores.iter().sum::<f64>() / scores.len() as f64
    }

    /// Sample standard deviation of the final scores.
    pub fn score_stddev(&self, name: &str) -> f64 {
        let scores = self.scores(name);
        if scores.len() < 2 {
            return 0.0;
        }
        let mean = self.avg_score(name);
        let sum_sq: f64 = scores.iter().map(|s| (s - mean) * (s - mean)).sum();
        (sum_sq / (scores.len() - 1) as f64).sqrt()
    }

    /// Wilson score interval for the win rate.
    pub fn confidence_interval_95(&self, name: &str) -> (f64, f64) {
        const Z: f64 = 1.96;
        if self.num_games == 0 {
            return (0.0, 0.0);
        }
        let n = self.num_games as f64;
        let p = self.win_rate(name);
        let z2 = Z * Z;
        let scale = 1.0 + z2 / n;
        let mid = (p + z2 / (2.0 * n)) / scale;
        let half = Z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt() / scale;
        ((mid - half).max(0.0), (mid + half).min(1.0))
    }

    pub fn summary(&self) -> String {
        let mut names: Vec<&str> = self.wins.keys().map(String::as_str).collect();
        names.sort_unstable();

        let mut out = format!("Arena Results ({} games)\n{}\n", self.num_games, "=".repeat(60));
        for name in names {
            let (lo, hi) = self.confidence_interval_95(name);
            out += &format!(
                "  {:>12}: {:3} wins ({:5.1}%)  [95% CI: {:.1}%-{:.1}%]  avg={:5.1} +/- {:4.1}\n",
                name,
                self.wins[name],
                100.0 * self.win_rate(name),
                100.0 * lo,
                100.0 * hi,
                self.avg_score(name),
                self.score_stddev(name),
            );
        }
        out += &format!("  {:>12}: {}", "Draws", self.draws);
        if self.failed > 0 {
            out += &format!("\n  {:>12}: {}", "Failed", self.failed);
        }
        if !self.game_durations_ms.is_empty() {
            let total_ms: f64 = self.game_durations_ms.iter().sum();
            out += &format!(
                "\n  Avg game: {:.0}ms  |  Total (cpu): {:.1}s",
                total_ms / self.game_durations_ms.len() as f64,
                total_ms / 1000.0
            );
        }
        out
    }
}

/// How one arena game went, by strategy name.
struct Outcome {
    scores: Vec<(String, f64)>,
    winners: Vec<String>,
    duration_ms: f64,
}

/// Run `num_games` between the named strategies, one seat each. With
/// `alternate_seats` the seating rotates by one every game.
pub fn run_arena(
    entries: &[(String, StrategyFactory)],
    num_games: usize,
    base_seed: u64,
    tile_limit: Option<usize>,
    alternate_seats: bool,
    progress_callback: Option<&(dyn Fn(usize, usize) + Sync)>,
) -> ArenaResult {
    let num_players = entries.len();
    assert!(num_players > 0, "arena needs at least one strategy");

    let done = AtomicUsize::new(0);
    let outcomes: Vec<Option<Outcome>> = (0..num_games)
        .into_par_iter()
        .map(|game_idx| {
            let seed = base_seed + game_idx as u64;
            let seating: Vec<usize> = (0..num_players)
                .map(|seat| if alternate_seats { (seat + game_idx) % num_players } else { seat })
                .collect();

            let mut strategies: Vec<Box<dyn BotStrategy>> = seating
                .iter()
                .enumerate()
                .map(|(seat, &entry)| (entries[entry].1)(seed.wrapping_mul(31).wrapping_add(seat as u64)))
                .collect();
            let config = GameConfig { num_players, num_bots: num_players, random_seed: Some(seed), tile_limit };

            let t0 = Instant::now();
            let result = play_game(&config, &mut strategies);
            let duration_ms = t0.elapsed().as_secs_f64() * 1000.0;

            if let Some(cb) = progress_callback {
                cb(done.fetch_add(1, Ordering::Relaxed) + 1, num_games);
            }

            let result = match result {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(game = game_idx, seed, error = %e, "arena game failed");
                    return None;
                }
            };

            let name_of = |color: MeepleColor| entries[seating[color.index() - 1]].0.clone();
            Some(Outcome {
                scores: result.final_scores.iter().map(|(&c, &s)| (name_of(c), s as f64)).collect(),
                winners: result.winners.iter().map(|&c| name_of(c)).collect(),
                duration_ms,
            })
        })
        .collect();

    let mut result = ArenaResult {
        num_games,
        wins: entries.iter().map(|(n, _)| (n.clone(), 0)).collect(),
        total_scores: entries.iter().map(|(n, _)| (n.clone(), Vec::new())).collect(),
        ..Default::default()
    };

    for outcome in outcomes {
        let Some(outcome) = outcome else {
            result.failed += 1;
            continue;
        };
        result.game_durations_ms.push(outcome.duration_ms);
        for (name, score) in outcome.scores {
            result.total_scores.entry(name).or_default().push(score);
        }
        if let [winner] = outcome.winners.as_slice() {
            *result.wins.entry(winner.clone()).or_default() += 1;
        } else {
            result.draws += 1;
        }
    }

    tracing::info!(games = num_games, draws = result.draws, failed = result.failed, "arena finished");
    result
}
