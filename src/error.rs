use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::games::carcassonne::types::MeepleColor;

/// Caller mistakes reported by the turn controller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("no turn in progress")]
    NoActiveTurn,
    #[error("the game is over")]
    GameOver,
    #[error("the drawn tile fits somewhere and must be placed")]
    MissingPlacement,
    #[error("tile does not fit at ({x}, {y}) with rotation {rotation}")]
    IllegalPlacement { x: i32, y: i32, rotation: u8 },
    #[error("segment {segment} cannot take a meeple")]
    IllegalMeeple { segment: usize },
    #[error("{0} has no meeples left")]
    NoMeeplesLeft(MeepleColor),
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("unknown strategy type: {0}")]
    UnknownStrategy(String),
}
