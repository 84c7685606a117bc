//! The draw pile.

use rand::seq::SliceRandom;
use rand::Rng;

use super::tiles::CATALOG;
use super::types::Tile;

/// Tiles waiting to be drawn; the top of the pile is the end of the vector.
#[derive(Debug, Clone)]
pub struct Deck {
    tiles: Vec<Tile>,
}

impl Deck {
    /// Every catalog tile in catalog order, unshuffled.
    pub fn standard() -> Self {
        let tiles = CATALOG
            .iter()
            .flat_map(|shape| std::iter::repeat(shape.tile).take(shape.count))
            .collect();
        Self { tiles }
    }

    /// Standard deck shuffled with `rng`, the starting tile on top.
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::standard();
        deck.tiles.shuffle(rng);
        if let Some(i) = deck.tiles.iter().position(|t| t.starting) {
            let top = deck.tiles.len() - 1;
            deck.tiles.swap(i, top);
        }
        deck
    }

    /// Keep only the top `n` tiles.
    pub fn truncate_to(&mut self, n: usize) {
        if n < self.tiles.len() {
            self.tiles.drain(..self.tiles.len() - n);
        }
    }

    pub fn draw(&mut self) -> Option<Tile> {
        self.tiles.pop()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}
