pub mod board;
pub mod deck;
pub mod evaluator;
pub mod features;
pub mod game;
pub mod meeples;
pub mod scoring;
pub mod tiles;
pub mod types;
