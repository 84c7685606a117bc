//! Engine data types shared by the turn controller, bots and the arena.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::games::carcassonne::types::{MeepleColor, Position, Tile, MEEPLES_PER_PLAYER};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub color: MeepleColor,
    /// Meeples still in hand.
    pub meeples: u32,
    pub points: u32,
    #[serde(default)]
    pub is_bot: bool,
}

impl Player {
    pub fn new(color: MeepleColor, is_bot: bool) -> Self {
        Self { color, meeples: MEEPLES_PER_PLAYER, points: 0, is_bot }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameConfig {
    #[serde(default = "default_num_players")]
    pub num_players: usize,
    /// The last `num_bots` seats are played by bots.
    #[serde(default)]
    pub num_bots: usize,
    pub random_seed: Option<u64>,
    /// Keep only the first N draws of the shuffled deck.
    #[serde(default)]
    pub tile_limit: Option<usize>,
}

fn default_num_players() -> usize {
    2
}

impl Default for GameConfig {
    fn default() -> Self {
        Self { num_players: default_num_players(), num_bots: 0, random_seed: None, tile_limit: None }
    }
}

/// Where and how the drawn tile goes. `rotation` counts clockwise quarter
/// turns applied to the tile as drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnChoice {
    pub pos: Position,
    pub rotation: u8,
    #[serde(default)]
    pub meeple: Option<usize>,
}

/// The turn in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Turn {
    /// Seat of the acting player.
    pub seat: usize,
    pub tile: Tile,
    /// The drawn tile fits nowhere.
    pub skipped: bool,
    pub choice: Option<TurnChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_type: String,
    #[serde(default)]
    pub player: Option<MeepleColor>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Event {
    pub fn new(event_type: &str, player: Option<MeepleColor>, payload: serde_json::Value) -> Self {
        Self { event_type: event_type.to_string(), player, payload }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameResult {
    pub winners: Vec<MeepleColor>,
    pub final_scores: BTreeMap<MeepleColor, u32>,
    #[serde(default = "default_reason")]
    pub reason: String,
}

fn default_reason() -> String {
    "normal".to_string()
}
