//! Turn controller: draws tiles, validates and commits placements, scores
//! after every turn and at the end, and hands points and meeples back to
//! the players.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;

use crate::engine::models::{Event, GameConfig, GameResult, Player, Turn, TurnChoice};
use crate::error::GameError;

use super::board::Board;
use super::deck::Deck;
use super::scoring::{collect_all_points, collect_points, ScoredFeature, ScoringMode};
use super::types::*;

pub struct Game {
    board: Board,
    deck: Deck,
    players: Vec<Player>,
    seat: Option<usize>,
    turn: Option<Turn>,
    history: Vec<Turn>,
    finished: bool,
}

impl Game {
    /// Shuffle the deck, put the starting tile in the middle of the board and
    /// seat the players. The last `num_bots` seats are bots.
    pub fn new(config: &GameConfig) -> Self {
        let num_players = config.num_players.clamp(1, MEEPLE_COLOR_COUNT);
        if num_players != config.num_players {
            tracing::warn!(requested = config.num_players, num_players, "player count clamped");
        }
        let num_bots = config.num_bots.min(num_players);

        let mut rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut deck = Deck::shuffled(&mut rng);
        if let Some(limit) = config.tile_limit {
            deck.truncate_to(limit);
        }

        let mut board = Board::new();
        if let Some(start) = deck.draw() {
            board.place_permanent(start, Position::center());
        }

        let players = (0..num_players)
            .filter_map(|seat| MeepleColor::for_seat(seat).map(|c| Player::new(c, seat >= num_players - num_bots)))
            .collect();

        tracing::info!(
            players = num_players,
            bots = num_bots,
            seed = ?config.random_seed,
            tiles = deck.len(),
            "game started"
        );

        Self { board, deck, players, seat: None, turn: None, history: Vec::new(), finished: false }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Mutable board access for search code; previews staged through it are
    /// expected to be cleared again.
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.seat.and_then(|s| self.players.get(s))
    }

    pub fn current_turn(&self) -> Option<&Turn> {
        self.turn.as_ref()
    }

    /// Committed turns, oldest first.
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn tiles_left(&self) -> usize {
        self.deck.len()
    }

    /// Draws each player can still expect.
    pub fn remaining_draws(&self) -> u32 {
        (self.deck.len() / self.players.len().max(1)) as u32
    }

    pub fn is_over(&self) -> bool {
        self.finished
    }

    /// Pass play to the next seat and draw a tile. Returns the turn in
    /// progress if there already is one, `None` once the game is over or the
    /// deck is empty.
    pub fn start_turn(&mut self) -> Option<Turn> {
        if self.finished {
            return None;
        }
        if let Some(turn) = self.turn {
            return Some(turn);
        }
        let tile = self.deck.draw()?;

        let seat = self.seat.map_or(0, |s| (s + 1) % self.players.len());
        self.seat = Some(seat);
        let skipped = !self.board.has_any_legal_position(&tile);
        if skipped {
            tracing::debug!(seat, shape = tile.shape, "drawn tile fits nowhere, turn skipped");
        }

        let turn = Turn { seat, tile, skipped, choice: None };
        self.turn = Some(turn);
        Some(turn)
    }

    /// Segments that could take a meeple if the drawn tile went to `pos`
    /// turned `rotation` times. All false when the player has no meeples.
    pub fn meeple_options(&mut self, pos: Position, rotation: u8) -> Result<[bool; SEGMENT_COUNT], GameError> {
        let turn = self.active_turn()?;
        let tile = turn.tile.rotated(rotation);
        if !self.board.edge_compatible(&tile, pos) {
            return Err(GameError::IllegalPlacement { x: pos.x, y: pos.y, rotation });
        }
        if self.players[turn.seat].meeples == 0 {
            return Ok([false; SEGMENT_COUNT]);
        }
        let trial = self.board.trial(tile, pos);
        Ok(trial.valid_meeple_segments(pos))
    }

    /// Finish the turn in progress. A skipped turn ignores `choice`; any other
    /// turn needs one. Scores the board afterwards and ends the game when the
    /// deck is empty.
    pub fn commit_turn(&mut self, choice: Option<TurnChoice>) -> Result<Vec<Event>, GameError> {
        let mut turn = self.active_turn()?;
        let color = self.players[turn.seat].color;
        let mut events = Vec::new();

        if turn.skipped {
            events.push(Event::new("turn_skipped", Some(color), json!({ "shape": turn.tile.shape })));
        } else {
            let choice = choice.ok_or(GameError::MissingPlacement)?;
            self.place(turn, choice, &mut events)?;
            turn.choice = Some(choice);

            let mut scored = Vec::new();
            collect_points(&mut self.board, choice.pos, ScoringMode::Incremental, |f| scored.push(f));
            for feature in &scored {
                events.extend(award_majority(&mut self.players, feature));
            }
        }

        self.turn = None;
        self.history.push(turn);

        if self.deck.is_empty() {
            events.extend(self.finish());
        }
        Ok(events)
    }

    /// Final scoring. Runs once; later calls return nothing.
    pub fn finish(&mut self) -> Vec<Event> {
        if self.finished {
            return Vec::new();
        }

        let mut events = Vec::new();
        let mut scored = Vec::new();
        collect_all_points(&mut self.board, ScoringMode::Final, |f| scored.push(f));
        for feature in &scored {
            events.extend(award_majority(&mut self.players, feature));
        }

        self.finished = true;
        self.turn = None;
        if let Some(result) = self.result() {
            tracing::info!(winners = ?result.winners, scores = ?result.final_scores, "game over");
            events.push(Event::new("game_over", None, json!(result)));
        }
        events
    }

    /// Final standings once the game is over.
    pub fn result(&self) -> Option<GameResult> {
        if !self.finished {
            return None;
        }
        let best = self.players.iter().map(|p| p.points).max().unwrap_or(0);
        Some(GameResult {
            winners: self.players.iter().filter(|p| p.points == best).map(|p| p.color).collect(),
            final_scores: self.players.iter().map(|p| (p.color, p.points)).collect(),
            reason: "normal".to_string(),
        })
    }

    fn active_turn(&self) -> Result<Turn, GameError> {
        if self.finished {
            return Err(GameError::GameOver);
        }
        self.turn.ok_or(GameError::NoActiveTurn)
    }

    fn place(&mut self, turn: Turn, choice: TurnChoice, events: &mut Vec<Event>) -> Result<(), GameError> {
        let tile = turn.tile.rotated(choice.rotation);
        let pos = choice.pos;
        if !self.board.edge_compatible(&tile, pos) {
            return Err(GameError::IllegalPlacement { x: pos.x, y: pos.y, rotation: choice.rotation });
        }

        let player = &self.players[turn.seat];
        if let Some(segment) = choice.meeple {
            if player.meeples == 0 {
                return Err(GameError::NoMeeplesLeft(player.color));
            }
            let trial = self.board.trial(tile, pos);
            let valid = trial.valid_meeple_segments(pos);
            if !valid.get(segment).copied().unwrap_or(false) {
                return Err(GameError::IllegalMeeple { segment });
            }
        }

        let color = player.color;
        self.board.place_permanent(tile, pos);
        events.push(Event::new(
            "tile_placed",
            Some(color),
            json!({ "shape": tile.shape, "position": pos, "rotation": choice.rotation }),
        ));

        if let Some(segment) = choice.meeple {
            self.board.place_meeple(Meeple { color, segment }, pos);
            self.players[turn.seat].meeples -= 1;
            events.push(Event::new("meeple_placed", Some(color), json!({ "position": pos, "segment": segment })));
        }
        Ok(())
    }
}

/// Pay a scored structure to the majority holders and return every meeple in
/// it to its owner. Structures nobody stands in pay nobody.
pub fn award_majority(players: &mut [Player], feature: &ScoredFeature) -> Vec<Event> {
    let mut events = Vec::new();
    let winners = feature.winners();

    for player in players.iter_mut() {
        let returned = feature.meeples.get(player.color);
        if returned > 0 {
            player.meeples += returned;
            events.push(Event::new(
                "meeple_returned",
                Some(player.color),
                json!({ "count": returned, "position": feature.locations[player.color.index()] }),
            ));
        }
        if winners.contains(&player.color) {
            player.points += feature.points;
        }
    }

    if !winners.is_empty() {
        events.push(Event::new(
            "feature_scored",
            None,
            json!({
                "feature": feature.feature_type,
                "origin": feature.origin,
                "points": feature.points,
                "winners": winners,
            }),
        ));
    }
    events
}
