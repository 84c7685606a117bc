//! Tile-placement rules engine: board topology, structure traversal,
//! scoring, a greedy one-ply bot and a bot-vs-bot arena.

pub mod engine;
pub mod error;
pub mod games;

pub use error::{GameError, ProfileError};
