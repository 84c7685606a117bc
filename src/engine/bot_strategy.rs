//! Bot strategy trait and implementations.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::engine::models::{Player, TurnChoice};
use crate::games::carcassonne::board::Board;
use crate::games::carcassonne::evaluator::{choose_placement, EvalParams, Mover};
use crate::games::carcassonne::types::Tile;

/// A bot strategy picks a placement for the drawn tile. `remaining` is the
/// number of draws each player can still expect. The board may be used for
/// trial placements but must be handed back unchanged.
pub trait BotStrategy: Send {
    fn choose_placement(
        &mut self,
        board: &mut Board,
        player: &Player,
        tile: &Tile,
        remaining: u32,
    ) -> Option<TurnChoice>;
}

/// One-ply expected-value search.
pub struct GreedyStrategy {
    pub params: EvalParams,
    rng: StdRng,
}

impl GreedyStrategy {
    pub fn new(seed: u64, params: EvalParams) -> Self {
        Self { params, rng: StdRng::seed_from_u64(seed) }
    }
}

impl BotStrategy for GreedyStrategy {
    fn choose_placement(
        &mut self,
        board: &mut Board,
        player: &Player,
        tile: &Tile,
        remaining: u32,
    ) -> Option<TurnChoice> {
        let mover = Mover { color: player.color, supply: player.meeples };
        choose_placement(board, tile, mover, remaining, &self.params, &mut self.rng).map(|p| TurnChoice {
            pos: p.pos,
            rotation: p.rotation,
            meeple: p.meeple,
        })
    }
}

/// Picks a uniformly random legal placement, and with probability
/// `meeple_chance` a random segment that can take a meeple.
pub struct RandomStrategy {
    pub meeple_chance: f64,
    rng: StdRng,
}

impl RandomStrategy {
    pub fn new(seed: u64, meeple_chance: f64) -> Self {
        Self { meeple_chance: meeple_chance.clamp(0.0, 1.0), rng: StdRng::seed_from_u64(seed) }
    }
}

impl BotStrategy for RandomStrategy {
    fn choose_placement(
        &mut self,
        board: &mut Board,
        player: &Player,
        tile: &Tile,
        _remaining: u32,
    ) -> Option<TurnChoice> {
        let legal = board.legal_placements(tile);
        let &(pos, rotation) = legal.choose(&mut self.rng)?;

        let mut meeple = None;
        if player.meeples > 0 && self.rng.gen_bool(self.meeple_chance) {
            let trial = board.trial(tile.rotated(rotation), pos);
            let valid: Vec<usize> = trial
                .valid_meeple_segments(pos)
                .iter()
                .enumerate()
                .filter(|&(_, &ok)| ok)
                .map(|(i, _)| i)
                .collect();
            meeple = valid.choose(&mut self.rng).copied();
        }

        Some(TurnChoice { pos, rotation, meeple })
    }
}
